use std::path::PathBuf;

use coordmap_config::{AppConfig, ConfigError};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut script: Option<PathBuf> = None;
    let mut initial_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--script" => {
                let Some(path) = args.next() else {
                    eprintln!("`--script` 需要提供命令脚本路径");
                    std::process::exit(1);
                };
                script = Some(PathBuf::from(path));
            }
            other if other.starts_with("--") => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
            other => {
                if initial_path.is_some() {
                    eprintln!("只能指定一个坐标文件：{other}");
                    std::process::exit(1);
                }
                initial_path = Some(PathBuf::from(other));
            }
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动 coordmap");

    if let Err(err) =
        coordmap_frontend::run_cli(&config, initial_path.as_deref(), script.as_deref())
    {
        error!(error = %err, "文本前端异常退出");
        std::process::exit(1);
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    // 日志写入 stderr，stdout 留给命令输出。
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
