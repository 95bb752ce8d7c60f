pub mod cli;
pub mod errors;
pub mod loader;

use std::path::Path;

use coordmap_config::AppConfig;
use errors::FrontendError;
use tracing::info;

/// 启动文本前端：可选地加载初始文件，随后从标准输入或脚本逐行读取命令。
pub fn run_cli(
    config: &AppConfig,
    initial_path: Option<&Path>,
    script: Option<&Path>,
) -> Result<(), FrontendError> {
    info!(initial = ?initial_path, script = ?script, "启动文本前端");
    cli::run(config, initial_path, script)
}
