use coordmap_core::shape::{Coordinates, CoordinatesError, Shape};
use thiserror::Error;

/// 单行记录的解析错误，仅影响当前行。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("the number of coordinates must be even and at least two (found {count})")]
    Uneven { count: usize },
    #[error("invalid coordinate value {token:?} at position {position}")]
    InvalidValue { token: String, position: usize },
}

impl RecordError {
    /// 简短的错误类别名称，用于日志字段。
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::Uneven { .. } => "uneven",
            RecordError::InvalidValue { .. } => "invalid_value",
        }
    }
}

/// 将一行文本解析为坐标序列。
///
/// 以单个空格分隔，连续空格会产生空记号并导致数值解析失败。记号数量在数值解析之前检查。
pub fn parse_record(line: &str) -> Result<Coordinates, RecordError> {
    let tokens: Vec<&str> = line.split(' ').collect();
    let count = tokens.len();
    if count < 2 || count % 2 != 0 {
        return Err(RecordError::Uneven { count });
    }

    let mut values = Vec::with_capacity(count);
    for (index, token) in tokens.iter().enumerate() {
        values.push(parse_coordinate(token, index + 1)?);
    }

    Coordinates::try_from(values).map_err(|err| match err {
        CoordinatesError::Uneven { count } => RecordError::Uneven { count },
        CoordinatesError::NonFinite { position } => RecordError::InvalidValue {
            token: tokens[position - 1].to_string(),
            position,
        },
    })
}

/// 将坐标序列渲染为一行，数值之间以单个空格分隔，不含换行符。
pub fn render_record(coordinates: &Coordinates) -> String {
    let mut line = String::new();
    for (index, value) in coordinates.as_slice().iter().enumerate() {
        if index > 0 {
            line.push(' ');
        }
        line.push_str(&value.to_string());
    }
    line
}

/// 展开图形并渲染为一行；含非有限值的图形无法渲染。
pub fn render_shape(shape: &Shape) -> Result<String, CoordinatesError> {
    shape.flatten().map(|coordinates| render_record(&coordinates))
}

// 溢出得到的无穷大与字面量 inf/NaN 一并视为非法值。
fn parse_coordinate(token: &str, position: usize) -> Result<f64, RecordError> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(RecordError::InvalidValue {
            token: token.to_string(),
            position,
        }),
    }
}
