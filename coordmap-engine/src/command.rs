use std::collections::HashMap;

use coordmap_core::registry::ShapeHandle;
use coordmap_io::render_shape;

use crate::session::CoordinateSession;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
    /// 命令名之后的原始文本，仅去掉首尾空白，路径中的连续空格与制表符保持不变。
    pub rest: String,
}

impl CommandRequest {
    /// 将一行输入拆为命令名与参数；空行返回 `None`。
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let mut parts = line.split_whitespace();
        let name = parts.next()?.to_string();
        let args = parts.map(str::to_string).collect();
        let rest = line[name.len()..].trim().to_string();
        Some(Self { name, args, rest })
    }

    fn path_arg(&self) -> Option<&str> {
        if self.rest.is_empty() {
            None
        } else {
            Some(&self.rest)
        }
    }

    fn handle_arg(&self) -> Result<ShapeHandle, CommandResponse> {
        let raw = self
            .args
            .first()
            .ok_or_else(|| CommandResponse::err(format!("用法: {} <handle>", self.name)))?;
        raw.parse::<ShapeHandle>()
            .map_err(|_| CommandResponse::err(format!("无效的图形句柄: {raw}")))
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub session: &'a mut CoordinateSession,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(LoadCommand);
        bus.register(SaveCommand);
        bus.register(RemoveCommand);
        bus.register(FocusCommand);
        bus.register(DeleteFocusedCommand);
        bus.register(ListCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

struct LoadCommand;

impl CommandHandler for LoadCommand {
    fn name(&self) -> &'static str {
        "load"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let Some(path) = request.path_arg() else {
            return CommandResponse::err("用法: load <path>");
        };
        match context.session.load_from(path) {
            Ok(report) if report.is_clean() => {
                CommandResponse::ok(format!("已从 {path} 加载 {} 个图形", report.shapes))
            }
            Ok(report) => CommandResponse::ok(format!(
                "已从 {path} 加载 {} 个图形，跳过 {} 行",
                report.shapes,
                report.failures.len()
            )),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct SaveCommand;

impl CommandHandler for SaveCommand {
    fn name(&self) -> &'static str {
        "save"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let result = match request.path_arg() {
            Some(path) => context.session.save_to(path),
            None => context.session.save(),
        };
        match result {
            Ok(report) => CommandResponse::ok(format!("已保存 {} 个图形", report.shapes)),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct RemoveCommand;

impl CommandHandler for RemoveCommand {
    fn name(&self) -> &'static str {
        "remove"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let handle = match request.handle_arg() {
            Ok(handle) => handle,
            Err(response) => return response,
        };
        // 句柄不存在时删除为空操作，不视为失败。
        match context.session.remove(handle) {
            Some(shape) => CommandResponse::ok(format!("已删除{} {handle}", shape.kind())),
            None => CommandResponse::ok(format!("图形 {handle} 不存在，无需删除")),
        }
    }
}

struct FocusCommand;

impl CommandHandler for FocusCommand {
    fn name(&self) -> &'static str {
        "focus"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let handle = match request.handle_arg() {
            Ok(handle) => handle,
            Err(response) => return response,
        };
        match context.session.focus(handle) {
            Ok(()) => CommandResponse::ok(format!("已聚焦图形 {handle}")),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct DeleteFocusedCommand;

impl CommandHandler for DeleteFocusedCommand {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        match context.session.remove_focused() {
            Some((handle, shape)) => {
                CommandResponse::ok(format!("已删除聚焦的{} {handle}", shape.kind()))
            }
            None => CommandResponse::err("当前没有聚焦的图形"),
        }
    }
}

struct ListCommand;

impl CommandHandler for ListCommand {
    fn name(&self) -> &'static str {
        "list"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let focused = context.session.focused();
        let mut lines = vec![format!("共 {} 个图形", context.session.shape_count())];
        for (handle, shape) in context.session.current_shapes() {
            let marker = if focused == Some(*handle) { "*" } else { " " };
            let record = render_shape(shape).unwrap_or_else(|err| format!("<{err}>"));
            lines.push(format!("{marker} {handle} {}: {record}", shape.kind()));
        }
        CommandResponse::ok(lines.join("\n"))
    }
}
