pub mod command;

pub mod errors {
    use coordmap_io::IoError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("no coordinate file has been opened")]
        NoSourcePath,
        #[error("shape with handle {0} not found")]
        ShapeNotFound(u64),
        #[error(transparent)]
        Io(#[from] IoError),
    }
}

pub mod session {
    use std::path::{Path, PathBuf};

    use coordmap_core::geometry::Bounds2D;
    use coordmap_core::registry::{ShapeHandle, ShapeRegistry};
    use coordmap_core::shape::Shape;
    use coordmap_io::{
        CoordinateFile, Diagnostic, DiagnosticsSink, LoadReport, SaveReport, ShapeLoader,
        ShapeSaver,
    };
    use tracing::debug;

    use crate::errors::EngineError;

    /// 会话负责持有图形注册表与诊断收集器，并串联文件加载与保存。
    ///
    /// 每次加载或保存前清空诊断，结果留在会话中供展示层读取。
    #[derive(Debug, Default)]
    pub struct CoordinateSession {
        storage: CoordinateFile,
        registry: ShapeRegistry,
        diagnostics: DiagnosticsSink,
        source_path: Option<PathBuf>,
        focused: Option<ShapeHandle>,
    }

    impl CoordinateSession {
        pub fn new() -> Self {
            Self::default()
        }

        /// 从文件加载并整体替换当前图形集合。
        ///
        /// 文件级错误时注册表为空且不再记录源路径，错误同时出现在诊断与返回值中。
        pub fn load_from(&mut self, path: impl AsRef<Path>) -> Result<LoadReport, EngineError> {
            let path = path.as_ref();
            self.diagnostics.clear();
            self.focused = None;
            self.source_path = None;

            let report = self
                .storage
                .load_into(path, &mut self.registry, &mut self.diagnostics)?;
            self.source_path = Some(path.to_path_buf());
            debug!(
                shapes = report.shapes,
                failed_lines = report.failures.len(),
                "会话已替换图形集合"
            );
            Ok(report)
        }

        /// 将当前图形集合写入已存在的文件。
        pub fn save_to(&mut self, path: impl AsRef<Path>) -> Result<SaveReport, EngineError> {
            self.diagnostics.clear();
            let report = self
                .storage
                .save(path.as_ref(), &self.registry, &mut self.diagnostics)?;
            Ok(report)
        }

        /// 写回最近一次加载所用的路径。
        pub fn save(&mut self) -> Result<SaveReport, EngineError> {
            let path = self.source_path.clone().ok_or(EngineError::NoSourcePath)?;
            self.save_to(path)
        }

        /// 删除指定图形；句柄不存在时为空操作。
        pub fn remove(&mut self, handle: ShapeHandle) -> Option<Shape> {
            if self.focused == Some(handle) {
                self.focused = None;
            }
            let removed = self.registry.remove(handle);
            debug!(handle = handle.get(), removed = removed.is_some(), "删除图形");
            removed
        }

        /// 按插入顺序返回当前图形，供渲染层绘制。
        #[inline]
        pub fn current_shapes(&self) -> impl Iterator<Item = &(ShapeHandle, Shape)> {
            self.registry.shapes()
        }

        #[inline]
        pub fn shape(&self, handle: ShapeHandle) -> Option<&Shape> {
            self.registry.get(handle)
        }

        #[inline]
        pub fn shape_count(&self) -> usize {
            self.registry.len()
        }

        #[inline]
        pub fn bounds(&self) -> Option<Bounds2D> {
            self.registry.bounds()
        }

        #[inline]
        pub fn registry(&self) -> &ShapeRegistry {
            &self.registry
        }

        /// 最近一次加载或保存产生的诊断。
        #[inline]
        pub fn diagnostics(&self) -> &[Diagnostic] {
            self.diagnostics.entries()
        }

        pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
            self.diagnostics.drain()
        }

        #[inline]
        pub fn source_path(&self) -> Option<&Path> {
            self.source_path.as_deref()
        }

        /// 聚焦指定图形。若图形不存在则返回错误。
        pub fn focus(&mut self, handle: ShapeHandle) -> Result<(), EngineError> {
            if !self.registry.contains(handle) {
                return Err(EngineError::ShapeNotFound(handle.get()));
            }
            self.focused = Some(handle);
            Ok(())
        }

        #[inline]
        pub fn focused(&self) -> Option<ShapeHandle> {
            self.focused
        }

        #[inline]
        pub fn clear_focus(&mut self) {
            self.focused = None;
        }

        /// 删除当前聚焦的图形并清除焦点。没有焦点或图形已不存在时返回 `None`。
        pub fn remove_focused(&mut self) -> Option<(ShapeHandle, Shape)> {
            let handle = self.focused.take()?;
            self.registry.remove(handle).map(|shape| (handle, shape))
        }
    }

    #[cfg(test)]
    mod tests {
        use std::fs;
        use std::io::Write;

        use coordmap_core::geometry::Point2;
        use coordmap_core::shape::ShapeKind;
        use coordmap_io::{IoError, LOAD_SUCCESS_MESSAGE, SAVE_SUCCESS_MESSAGE};

        use super::*;

        fn temp_file_with(content: &str) -> tempfile::NamedTempFile {
            let mut file = tempfile::NamedTempFile::new().expect("create temp file");
            file.write_all(content.as_bytes()).expect("write temp file");
            file
        }

        #[test]
        fn load_populates_shapes_and_success_diagnostic() {
            let file = temp_file_with("1.0 2.0\n0 0 5 5\n0 0 1 1 1 0\n");
            let mut session = CoordinateSession::new();

            let report = session.load_from(file.path()).expect("load succeeds");
            assert_eq!(report.shapes, 3);
            let kinds: Vec<_> = session
                .current_shapes()
                .map(|(_, shape)| shape.kind())
                .collect();
            assert_eq!(
                kinds,
                vec![ShapeKind::Point, ShapeKind::Segment, ShapeKind::Polygon]
            );
            assert_eq!(session.diagnostics().len(), 1);
            assert_eq!(session.diagnostics()[0].message(), LOAD_SUCCESS_MESSAGE);
            assert_eq!(session.source_path(), Some(file.path()));
        }

        #[test]
        fn reload_replaces_previous_shapes_and_diagnostics() {
            let first = temp_file_with("1 2\n3 4\n");
            let second = temp_file_with("5 6 7 8\nbad line\n");
            let mut session = CoordinateSession::new();

            session.load_from(first.path()).expect("first load");
            let stale: Vec<_> = session.registry().handles().collect();

            session.load_from(second.path()).expect("second load");
            assert_eq!(session.shape_count(), 1);
            for handle in stale {
                assert!(session.shape(handle).is_none());
            }
            assert_eq!(session.diagnostics().len(), 1);
            assert!(session.diagnostics()[0].message().starts_with("line 2:"));
        }

        #[test]
        fn missing_file_empties_registry() {
            let file = temp_file_with("1 2\n");
            let mut session = CoordinateSession::new();
            session.load_from(file.path()).expect("initial load");

            let dir = tempfile::tempdir().expect("temp dir");
            let err = session
                .load_from(dir.path().join("absent.txt"))
                .unwrap_err();
            assert!(matches!(err, EngineError::Io(IoError::NotFound { .. })));
            assert_eq!(session.shape_count(), 0);
            assert_eq!(session.diagnostics().len(), 1);
        }

        #[test]
        fn remove_twice_is_a_no_op() {
            let file = temp_file_with("1 2\n3 4\n");
            let mut session = CoordinateSession::new();
            session.load_from(file.path()).expect("load");
            session.take_diagnostics();

            let first = session.registry().handles().next().expect("first handle");
            assert!(session.remove(first).is_some());
            let after_first: Vec<_> = session.registry().handles().collect();
            assert!(session.remove(first).is_none());
            let after_second: Vec<_> = session.registry().handles().collect();
            assert_eq!(after_first, after_second);
            assert!(session.diagnostics().is_empty());
        }

        #[test]
        fn save_writes_back_to_source_path() {
            let file = temp_file_with("1 2\n0 0 1 1 1 0\n9 9 8 8\n");
            let mut session = CoordinateSession::new();
            session.load_from(file.path()).expect("load");
            let segment = session.registry().handles().nth(2).expect("segment");
            session.remove(segment);

            session.save().expect("save to source");
            assert_eq!(session.diagnostics().len(), 1);
            assert_eq!(session.diagnostics()[0].message(), SAVE_SUCCESS_MESSAGE);
            let written = fs::read_to_string(file.path()).expect("read back");
            assert_eq!(written, "1 2\n0 0 1 1 1 0\n");
        }

        #[test]
        fn failed_load_forgets_source_path() {
            let good = temp_file_with("1 2\n");
            let mut broken = tempfile::NamedTempFile::new().expect("create temp file");
            broken
                .write_all(b"1 2\n\xff\xfe 3\n0 0 5 5\n")
                .expect("write temp file");
            let mut session = CoordinateSession::new();
            session.load_from(good.path()).expect("initial load");

            let err = session.load_from(broken.path()).unwrap_err();
            assert!(matches!(err, EngineError::Io(IoError::ReadError { .. })));
            assert!(session.source_path().is_none());

            assert!(matches!(session.save(), Err(EngineError::NoSourcePath)));
            assert_eq!(
                fs::read(broken.path()).expect("read back"),
                b"1 2\n\xff\xfe 3\n0 0 5 5\n"
            );
            assert_eq!(fs::read_to_string(good.path()).expect("read back"), "1 2\n");
        }

        #[test]
        fn save_without_source_is_rejected() {
            let mut session = CoordinateSession::new();
            assert!(matches!(session.save(), Err(EngineError::NoSourcePath)));
        }

        #[test]
        fn focus_and_remove_focused() {
            let file = temp_file_with("1 2\n3 4\n");
            let mut session = CoordinateSession::new();
            session.load_from(file.path()).expect("load");
            let handles: Vec<_> = session.registry().handles().collect();

            assert!(matches!(
                session.focus(ShapeHandle::new(99)),
                Err(EngineError::ShapeNotFound(99))
            ));
            session.focus(handles[1]).expect("focus existing shape");
            assert_eq!(session.focused(), Some(handles[1]));

            let (removed, shape) = session.remove_focused().expect("focused shape removed");
            assert_eq!(removed, handles[1]);
            assert_eq!(shape, Shape::Point(Point2::new(3.0, 4.0)));
            assert!(session.focused().is_none());
            assert!(session.remove_focused().is_none());
        }

        #[test]
        fn removing_focused_handle_directly_clears_focus() {
            let file = temp_file_with("1 2\n");
            let mut session = CoordinateSession::new();
            session.load_from(file.path()).expect("load");
            let handle = session.registry().handles().next().expect("handle");
            session.focus(handle).expect("focus");
            session.remove(handle);
            assert!(session.focused().is_none());
        }
    }
}
