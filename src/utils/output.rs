//! # 美化输出工具
//!
//! 提供统一的终端输出样式：带颜色的状态前缀、标题栏与数组打印。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块使用
//! - 使用 `colored` crate
//! - 使用 `report/export.rs` 的指数格式

use crate::report::export::format_exp;
use colored::Colorize;

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印分隔线
pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}

/// 打印数组，numpy 风格的方括号列表
pub fn print_array(label: &str, values: &[f64]) {
    println!("{} {}", label.bold(), format_array(values));
}

fn format_array(values: &[f64]) -> String {
    let body: Vec<String> = values.iter().map(|v| format_exp(*v, 8)).collect();
    format!("[{}]", body.join(" "))
}
