use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("无法打开命令脚本 {path:?}: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("终端读写失败: {0}")]
    Terminal(#[from] std::io::Error),
}
