//! # materials 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/materials.rs`

use super::DataArgs;

use clap::Args;

/// materials 子命令参数
#[derive(Args, Debug)]
pub struct MaterialsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Also load each material's attenuation data and show its energy range
    #[arg(long, default_value_t = false)]
    pub attenuation: bool,
}
