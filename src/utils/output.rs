//! # 美化输出工具
//!
//! 提供统一的终端输出样式。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块和 `main.rs` 使用
//! - 使用 `colored` crate

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

/// 打印单层的力学状态：通过为绿色，失效为红色
pub fn print_layer_status(name: &str, stress_mpa: f64, limit_mpa: f64, failed: bool) {
    let tag = if failed {
        "[FAIL]".red().bold()
    } else {
        "[PASS]".green().bold()
    };
    println!(
        "{} {:<12} {:>10.1} MPa / {:.1} MPa",
        tag, name, stress_mpa, limit_mpa
    );
}

/// 打印 `key: value` 形式的摘要行
pub fn print_field(key: &str, value: &str) {
    println!("  {:<20} {}", format!("{}:", key).dimmed(), value);
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
