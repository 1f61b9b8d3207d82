//! # xraywin - X 射线探测器窗口几何优化
//!
//! 软 X 射线探测器窗口由肋条支撑层和薄膜组成：支撑越稀疏透过率越高，
//! 但必须承受两倍大气压的压差。本工具在力学约束下搜索透过率最高的几何。
//!
//! ## 子命令
//! - `optimize`  - 差分进化搜索最优几何
//! - `spectrum`  - 计算指定几何的透过率谱
//! - `materials` - 列出材料库
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── optimizer/ (拓扑、目标函数、差分进化)
//!   │     ├── mechanics/ (梁、薄膜、窗口装配)
//!   │     ├── xray/      (衰减表、谱导出)
//!   │     └── models/    (材料库、透过率谱)
//!   ├── utils/      (插值、输出、进度条)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod error;
mod mechanics;
mod models;
mod optimizer;
mod utils;
mod xray;

use clap::Parser;
use cli::Cli;
use env_logger::Env;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
