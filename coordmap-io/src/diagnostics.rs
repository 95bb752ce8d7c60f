use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// 一条面向用户的状态或错误消息。成功与失败都只是普通文本，没有等级字段。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostic(String);

impl Diagnostic {
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Diagnostic {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 只追加的诊断收集器。何时清空由调用方决定，通常在每次加载或保存之前。
#[derive(Debug, Default, Clone)]
pub struct DiagnosticsSink {
    entries: Vec<Diagnostic>,
}

impl DiagnosticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(message);
        debug!(message = diagnostic.message(), "记录诊断信息");
        self.entries.push(diagnostic);
    }

    #[inline]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 取出全部诊断并清空收集器。
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
