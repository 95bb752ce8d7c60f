use std::env;
use std::path::{Path, PathBuf};

use coordmap_config::AppConfig;
use coordmap_engine::session::CoordinateSession;
use tracing::{info, warn};

const STARTUP_FILE_ENV: &str = "COORDMAP_FILE";

/// 会话初始内容的来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSource {
    File(PathBuf),
    Empty,
}

/// 统一封装初始化后的会话与来源信息。
#[derive(Debug)]
pub struct LoadedSession {
    pub session: CoordinateSession,
    pub source: SessionSource,
}

/// 依次尝试命令行指定路径、环境变量 `COORDMAP_FILE` 与配置中的 `startup_file`，
/// 都未提供时返回空会话。
///
/// 文件级错误不会中断启动，诊断保留在会话中由调用方展示。
pub fn open_session(config: &AppConfig, initial_path: Option<&Path>) -> LoadedSession {
    let mut session = CoordinateSession::new();
    let Some(path) = startup_path(config, initial_path) else {
        return LoadedSession {
            session,
            source: SessionSource::Empty,
        };
    };

    match session.load_from(&path) {
        Ok(report) => {
            info!(
                path = %path.display(),
                shapes = report.shapes,
                failed_lines = report.failures.len(),
                "启动时加载坐标文件"
            );
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "启动时加载坐标文件失败");
        }
    }

    LoadedSession {
        session,
        source: SessionSource::File(path),
    }
}

fn startup_path(config: &AppConfig, initial_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = initial_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env::var_os(STARTUP_FILE_ENV) {
        return Some(PathBuf::from(path));
    }
    config.files.startup_file.clone()
}
