use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use coordmap_config::AppConfig;
use coordmap_core::shape::Shape;
use coordmap_engine::command::{CommandBus, CommandContext, CommandRequest, CommandResponse};
use coordmap_engine::session::CoordinateSession;
use coordmap_io::{Diagnostic, render_shape};
use tracing::{debug, warn};

use crate::errors::FrontendError;
use crate::loader::{SessionSource, open_session};

const QUIT_COMMANDS: [&str; 2] = ["quit", "exit"];

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub prompt: String,
    pub echo_commands: bool,
    pub save_to_source: bool,
    /// 交互模式下输出提示符与命令列表。
    pub interactive: bool,
}

impl CliOptions {
    pub fn from_config(config: &AppConfig, interactive: bool) -> Self {
        Self {
            prompt: config.frontend.prompt.clone(),
            echo_commands: config.frontend.echo_commands,
            save_to_source: config.files.save_to_source,
            interactive,
        }
    }
}

pub(crate) fn run(
    config: &AppConfig,
    initial_path: Option<&Path>,
    script: Option<&Path>,
) -> Result<(), FrontendError> {
    let loaded = open_session(config, initial_path);
    let mut session = loaded.session;

    let stdout = io::stdout();
    let mut output = stdout.lock();

    match &loaded.source {
        SessionSource::File(path) => {
            writeln!(output, "已打开坐标文件：{}", path.display())?;
        }
        SessionSource::Empty => {
            writeln!(output, "尚未打开坐标文件，使用 `load <path>` 加载。")?;
        }
    }
    write_diagnostics(&mut output, &session.take_diagnostics())?;
    write_shapes(&mut output, &session)?;

    match script {
        Some(path) => {
            let file = File::open(path).map_err(|source| FrontendError::Script {
                path: path.to_path_buf(),
                source,
            })?;
            let options = CliOptions::from_config(config, false);
            run_commands(&mut session, BufReader::new(file), &mut output, &options)
        }
        None => {
            let options = CliOptions::from_config(config, true);
            let stdin = io::stdin();
            run_commands(&mut session, stdin.lock(), &mut output, &options)
        }
    }
}

/// 逐行读取命令并分发，每条命令后输出响应与本次产生的诊断。
///
/// 输入结束或遇到 `quit` / `exit` 时返回。
pub fn run_commands<R: BufRead, W: Write>(
    session: &mut CoordinateSession,
    input: R,
    output: &mut W,
    options: &CliOptions,
) -> Result<(), FrontendError> {
    let bus = CommandBus::new();
    if options.interactive {
        let mut commands: Vec<&str> = bus.available_commands().copied().collect();
        commands.sort_unstable();
        commands.extend(QUIT_COMMANDS);
        writeln!(output, "支持的命令: {}", commands.join(", "))?;
    }

    let mut lines = input.lines();
    loop {
        if options.interactive {
            write!(output, "{}", options.prompt)?;
            output.flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let Some(request) = CommandRequest::parse(&line) else {
            continue;
        };
        if options.echo_commands {
            writeln!(output, "{}{}", options.prompt, line.trim())?;
        }
        if QUIT_COMMANDS.contains(&request.name.as_str()) {
            break;
        }

        let writes_back = request.name == "save" && request.args.is_empty();
        let response = if writes_back && !options.save_to_source {
            CommandResponse::err("未启用写回源文件，请使用 `save <path>`")
        } else {
            let mut context = CommandContext {
                session: &mut *session,
            };
            bus.dispatch(&request, &mut context)
        };

        if response.success {
            debug!(command = %request.name, "命令执行成功");
        } else {
            warn!(command = %request.name, message = ?response.message, "命令执行失败");
        }
        write_response(output, &response)?;
        // 失败时诊断只含同一条文件级错误，已随响应输出。
        let diagnostics = session.take_diagnostics();
        if response.success {
            write_diagnostics(output, &diagnostics)?;
        }
    }
    Ok(())
}

fn write_response<W: Write>(output: &mut W, response: &CommandResponse) -> io::Result<()> {
    let Some(message) = &response.message else {
        return Ok(());
    };
    if response.success {
        writeln!(output, "{message}")
    } else {
        writeln!(output, "错误: {message}")
    }
}

fn write_diagnostics<W: Write>(output: &mut W, diagnostics: &[Diagnostic]) -> io::Result<()> {
    for diagnostic in diagnostics {
        writeln!(output, "  [状态] {diagnostic}")?;
    }
    Ok(())
}

/// 输出当前图形概览。
pub fn write_shapes<W: Write>(output: &mut W, session: &CoordinateSession) -> io::Result<()> {
    writeln!(output, "当前图形（共 {} 个）：", session.shape_count())?;
    for (handle, shape) in session.current_shapes() {
        let detail = match shape {
            Shape::Point(point) => format!("点 ({:.2}, {:.2})", point.x(), point.y()),
            Shape::Segment(segment) => format!(
                "线段 ({:.2}, {:.2}) -> ({:.2}, {:.2})",
                segment.start.x(),
                segment.start.y(),
                segment.end.x(),
                segment.end.y()
            ),
            Shape::Polygon(polygon) => {
                format!("多边形，{} 个顶点", polygon.vertices().len())
            }
        };
        let record = render_shape(shape).unwrap_or_else(|err| format!("<{err}>"));
        writeln!(output, "  - {handle} {detail}: {record}")?;
    }
    if let Some(bounds) = session.bounds() {
        writeln!(
            output,
            "范围: ({:.2}, {:.2}) - ({:.2}, {:.2})",
            bounds.min().x(),
            bounds.min().y(),
            bounds.max().x(),
            bounds.max().y()
        )?;
    }
    Ok(())
}
