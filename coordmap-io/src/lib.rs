pub mod diagnostics;
pub mod record;

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use coordmap_core::registry::ShapeRegistry;
use coordmap_core::shape::{CoordinatesError, Shape};
use thiserror::Error;
use tracing::{info, warn};

pub use diagnostics::{Diagnostic, DiagnosticsSink};
pub use record::{RecordError, parse_record, render_record, render_shape};

/// 整份文档读取成功且没有任何行级错误时追加的消息。
pub const LOAD_SUCCESS_MESSAGE: &str = "document read without errors";
/// 保存完成后追加的消息。
pub const SAVE_SUCCESS_MESSAGE: &str = "document saved without errors";

/// 文件级错误：出现时整次加载或保存立即中止。
#[derive(Debug, Error)]
pub enum IoError {
    #[error("file {path:?} does not exist")]
    NotFound { path: PathBuf },
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shape #{handle} cannot be written: {source}")]
    InvalidShape {
        handle: u64,
        #[source]
        source: CoordinatesError,
    },
}

/// 某一行（从 1 开始计数）被跳过的原因。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFailure {
    pub line: usize,
    pub error: RecordError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub shapes: usize,
    pub failures: Vec<LineFailure>,
}

impl LoadReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub shapes: usize,
}

pub trait ShapeLoader {
    /// 清空 `registry` 并以文件内容重新填充，所有消息写入 `diagnostics`。
    ///
    /// 文件级错误会同时记录到 `diagnostics` 并返回，此时 `registry` 为空。
    fn load_into(
        &self,
        path: &Path,
        registry: &mut ShapeRegistry,
        diagnostics: &mut DiagnosticsSink,
    ) -> Result<LoadReport, IoError>;

    fn load(&self, path: &Path, diagnostics: &mut DiagnosticsSink) -> ShapeRegistry {
        let mut registry = ShapeRegistry::new();
        // 文件级错误已写入 diagnostics。
        let _ = self.load_into(path, &mut registry, diagnostics);
        registry
    }
}

pub trait ShapeSaver {
    /// 按插入顺序覆盖写入目标文件，目标文件必须已存在。
    fn save(
        &self,
        path: &Path,
        registry: &ShapeRegistry,
        diagnostics: &mut DiagnosticsSink,
    ) -> Result<SaveReport, IoError>;
}

/// 以空格分隔的纯文本坐标文件，每行一条记录。
#[derive(Debug, Default, Clone, Copy)]
pub struct CoordinateFile;

impl CoordinateFile {
    pub fn new() -> Self {
        Self
    }
}

impl ShapeLoader for CoordinateFile {
    fn load_into(
        &self,
        path: &Path,
        registry: &mut ShapeRegistry,
        diagnostics: &mut DiagnosticsSink,
    ) -> Result<LoadReport, IoError> {
        registry.clear();

        let content = match read_existing(path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "无法读取坐标文件");
                diagnostics.push(err.to_string());
                return Err(err);
            }
        };

        let mut report = LoadReport::default();
        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            // 末行单独的 `\r` 不会被 `lines` 去掉。
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            match parse_record(raw) {
                Ok(coordinates) => {
                    registry.insert(Shape::classify(&coordinates));
                }
                Err(error) => {
                    warn!(line, kind = error.kind(), error = %error, "跳过无法解析的坐标记录");
                    diagnostics.push(format!("line {line}: {error}"));
                    report.failures.push(LineFailure { line, error });
                }
            }
        }
        report.shapes = registry.len();

        if report.is_clean() {
            diagnostics.push(LOAD_SUCCESS_MESSAGE);
        }
        info!(
            path = %path.display(),
            shapes = report.shapes,
            failed_lines = report.failures.len(),
            "坐标文件加载完成"
        );
        Ok(report)
    }
}

impl ShapeSaver for CoordinateFile {
    fn save(
        &self,
        path: &Path,
        registry: &ShapeRegistry,
        diagnostics: &mut DiagnosticsSink,
    ) -> Result<SaveReport, IoError> {
        match write_records(path, registry) {
            Ok(report) => {
                info!(path = %path.display(), shapes = report.shapes, "坐标文件保存完成");
                diagnostics.push(SAVE_SUCCESS_MESSAGE);
                Ok(report)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "无法保存坐标文件");
                diagnostics.push(err.to_string());
                Err(err)
            }
        }
    }
}

/// 加载与保存共用的前置检查：路径必须指向已存在的文件。
fn ensure_existing_file(path: &Path) -> Result<(), IoError> {
    if path.as_os_str().is_empty() || !path.exists() {
        return Err(IoError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn read_existing(path: &Path) -> Result<String, IoError> {
    ensure_existing_file(path)?;
    fs::read_to_string(path).map_err(|source| IoError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

fn write_records(path: &Path, registry: &ShapeRegistry) -> Result<SaveReport, IoError> {
    ensure_existing_file(path)?;
    // 先渲染全部记录，任一图形无效时不触碰目标文件。
    let lines = registry
        .shapes()
        .map(|(handle, shape)| {
            render_shape(shape).map_err(|source| IoError::InvalidShape {
                handle: handle.get(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let write_error = |source| IoError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    // 不使用 create(true)：保存目标必须事先存在。
    let file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    for line in &lines {
        writeln!(writer, "{line}").map_err(write_error)?;
    }
    writer.flush().map_err(write_error)?;

    Ok(SaveReport {
        shapes: registry.len(),
    })
}
