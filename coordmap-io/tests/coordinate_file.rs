
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use coordmap_core::geometry::Point2;
use coordmap_core::registry::ShapeRegistry;
use coordmap_core::shape::{Polygon, Shape, ShapeKind};
use coordmap_io::{
    CoordinateFile, DiagnosticsSink, IoError, LOAD_SUCCESS_MESSAGE, RecordError,
    SAVE_SUCCESS_MESSAGE, ShapeLoader, ShapeSaver,
};
use golden::assert_golden;

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

fn temp_file_with(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

#[test]
fn load_basic_shapes_matches_expected_registry() {
    let mut diagnostics = DiagnosticsSink::new();
    let registry = CoordinateFile::new().load(&fixture("basic_shapes.txt"), &mut diagnostics);
    assert_golden("basic_shapes", &registry, diagnostics.entries());

    let shapes: Vec<_> = registry.shapes().map(|(_, shape)| shape.clone()).collect();
    assert_eq!(shapes[0], Shape::Point(Point2::new(1.0, 2.0)));
    match &shapes[2] {
        Shape::Polygon(polygon) => assert_eq!(polygon.vertices().len(), 3),
        other => panic!("expected polygon, got {other:?}"),
    }
}

#[test]
fn malformed_lines_are_skipped_and_reported_in_order() {
    let mut registry = ShapeRegistry::new();
    let mut diagnostics = DiagnosticsSink::new();
    let report = CoordinateFile::new()
        .load_into(&fixture("mixed_records.txt"), &mut registry, &mut diagnostics)
        .expect("file-level load succeeds");
    assert_golden("mixed_records", &registry, diagnostics.entries());

    // 6 行中 3 行无法解析。
    assert_eq!(report.shapes, 3);
    assert_eq!(registry.len(), 3);
    let lines: Vec<usize> = report.failures.iter().map(|failure| failure.line).collect();
    assert_eq!(lines, vec![2, 3, 5]);
    assert!(matches!(report.failures[0].error, RecordError::Uneven { count: 3 }));
    assert!(matches!(report.failures[1].error, RecordError::InvalidValue { .. }));
    assert!(matches!(report.failures[2].error, RecordError::Uneven { count: 1 }));

    assert_eq!(diagnostics.len(), 3);
    assert!(
        diagnostics
            .iter()
            .all(|diagnostic| diagnostic.message() != LOAD_SUCCESS_MESSAGE)
    );
}

#[test]
fn uneven_single_line_produces_one_diagnostic() {
    let file = temp_file_with("1 2 3\n");
    let mut diagnostics = DiagnosticsSink::new();
    let registry = CoordinateFile::new().load(file.path(), &mut diagnostics);

    assert!(registry.is_empty());
    assert_eq!(diagnostics.len(), 1);
    let message = diagnostics.entries()[0].message();
    assert!(message.starts_with("line 1:"), "unexpected message {message:?}");
    assert!(message.contains("even"));
}

#[test]
fn invalid_value_single_line_produces_one_diagnostic() {
    let file = temp_file_with("a b\n");
    let mut diagnostics = DiagnosticsSink::new();
    let registry = CoordinateFile::new().load(file.path(), &mut diagnostics);

    assert!(registry.is_empty());
    assert_eq!(diagnostics.len(), 1);
    let message = diagnostics.entries()[0].message();
    assert!(message.starts_with("line 1:"), "unexpected message {message:?}");
    assert!(message.contains("invalid coordinate value"));
}

#[test]
fn nonexistent_path_stops_before_reading() {
    let mut registry = ShapeRegistry::new();
    let mut diagnostics = DiagnosticsSink::new();
    let result = CoordinateFile::new().load_into(
        &fixture("does_not_exist.txt"),
        &mut registry,
        &mut diagnostics,
    );

    assert!(matches!(result, Err(IoError::NotFound { .. })));
    assert!(registry.is_empty());
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn empty_file_loads_cleanly() {
    let mut diagnostics = DiagnosticsSink::new();
    let registry = CoordinateFile::new().load(&fixture("empty.txt"), &mut diagnostics);
    assert!(registry.is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.entries()[0].message(), LOAD_SUCCESS_MESSAGE);
}

#[test]
fn windows_line_endings_are_accepted() {
    let mut diagnostics = DiagnosticsSink::new();
    let registry = CoordinateFile::new().load(&fixture("crlf.txt"), &mut diagnostics);
    let kinds: Vec<_> = registry.shapes().map(|(_, shape)| shape.kind()).collect();
    assert_eq!(kinds, vec![ShapeKind::Point, ShapeKind::Segment]);
    assert_eq!(diagnostics.entries().last().unwrap().message(), LOAD_SUCCESS_MESSAGE);
}

#[test]
fn save_writes_one_line_per_shape_in_insertion_order() {
    let file = temp_file_with("stale contents that must be replaced\n");
    let mut registry = ShapeRegistry::new();
    registry.insert(Shape::Point(Point2::new(3.5, -1.0)));
    let polygon = Polygon::new(vec![
        Point2::new(0.0, 0.0),
        Point2::new(2.0, 0.0),
        Point2::new(1.0, 1.5),
    ])
    .expect("polygon with three vertices");
    registry.insert(Shape::Polygon(polygon));

    let mut diagnostics = DiagnosticsSink::new();
    let report = CoordinateFile::new()
        .save(file.path(), &registry, &mut diagnostics)
        .expect("save succeeds");

    assert_eq!(report.shapes, 2);
    let written = fs::read_to_string(file.path()).expect("read saved file");
    assert_eq!(written, "3.5 -1\n0 0 2 0 1 1.5\n");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.entries()[0].message(), SAVE_SUCCESS_MESSAGE);
}

#[test]
fn save_then_reload_preserves_shapes() {
    let mut diagnostics = DiagnosticsSink::new();
    let storage = CoordinateFile::new();
    let original = storage.load(&fixture("mixed_records.txt"), &mut diagnostics);

    let target = temp_file_with("");
    diagnostics.clear();
    storage
        .save(target.path(), &original, &mut diagnostics)
        .expect("save succeeds");

    diagnostics.clear();
    let reloaded = storage.load(target.path(), &mut diagnostics);
    assert_eq!(diagnostics.entries()[0].message(), LOAD_SUCCESS_MESSAGE);

    let before: Vec<_> = original.shapes().map(|(_, shape)| shape.clone()).collect();
    let after: Vec<_> = reloaded.shapes().map(|(_, shape)| shape.clone()).collect();
    assert_eq!(before, after);
}

#[test]
fn save_after_removal_omits_removed_shape() {
    let mut diagnostics = DiagnosticsSink::new();
    let storage = CoordinateFile::new();
    let mut registry = storage.load(&fixture("basic_shapes.txt"), &mut diagnostics);
    let segment = registry
        .handles()
        .nth(1)
        .expect("segment handle present");
    registry.remove(segment);

    let target = temp_file_with("");
    storage
        .save(target.path(), &registry, &mut diagnostics)
        .expect("save succeeds");
    let written = fs::read_to_string(target.path()).expect("read saved file");
    assert_eq!(written, "1 2\n0 0 1 1 1 0\n");
}
