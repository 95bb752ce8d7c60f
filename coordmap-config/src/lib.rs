use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `COORDMAP_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("COORDMAP_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 文本前端的交互设置。
#[derive(Debug, Clone, Deserialize)]
pub struct FrontendConfig {
    #[serde(default = "FrontendConfig::default_prompt")]
    pub prompt: String,
    /// 执行脚本时是否先回显每条命令。
    #[serde(default)]
    pub echo_commands: bool,
}

impl FrontendConfig {
    fn default_prompt() -> String {
        "coordmap> ".to_string()
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            prompt: Self::default_prompt(),
            echo_commands: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// 启动时自动加载的坐标文件。
    #[serde(default)]
    pub startup_file: Option<PathBuf>,
    /// 不带路径的 `save` 是否写回最近加载的文件。
    #[serde(default = "FilesConfig::default_save_to_source")]
    pub save_to_source: bool,
}

impl FilesConfig {
    fn default_save_to_source() -> bool {
        true
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            startup_file: None,
            save_to_source: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
