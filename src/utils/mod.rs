//! # 工具函数模块
//!
//! 提供插值、美化输出、进度条等工具。
//!
//! ## 依赖关系
//! - 被 `models/`, `xray/`, `optimizer/`, `commands/` 使用
//! - 子模块: interp, output, progress

pub mod interp;
pub mod output;
pub mod progress;
