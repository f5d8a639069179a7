//! # 空白分隔数值文本解析器
//!
//! 读取 `disp_random.dat` / `force_random.dat` 这类纯数值文本文件。
//!
//! ## 格式说明
//! ```text
//! # 注释行（# 之后的内容被忽略）
//! 0.01  -0.02  0.00
//! 0.00   0.03  0.01
//! ...
//! ```
//! 每行列数不要求一致，最终按行优先展平。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 和 `commands/` 使用

use crate::error::{FclassoError, Result};
use std::fs;
use std::path::Path;

/// 展平后的数值表
#[derive(Debug, Clone)]
pub struct NumericTable {
    pub values: Vec<f64>,
}

/// 读取数值文本文件
pub fn load_matrix_text(path: &Path) -> Result<NumericTable> {
    if !path.exists() {
        return Err(FclassoError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| FclassoError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_matrix_content(&content, &path.display().to_string())
}

/// 从字符串内容解析数值表
pub fn parse_matrix_content(content: &str, source_name: &str) -> Result<NumericTable> {
    let mut values = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let data = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };

        for token in data.split_whitespace() {
            let value: f64 = token.parse().map_err(|_| FclassoError::ParseError {
                format: "dat".to_string(),
                path: source_name.to_string(),
                reason: format!("Invalid number '{}' at line {}", token, line_no + 1),
            })?;
            values.push(value);
        }
    }

    Ok(NumericTable { values })
}
