//! # spectrum 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/spectrum.rs`

use super::{DataArgs, WeightingArgs, WindowArgs};
use crate::models::spectrum::DEFAULT_ENERGY_STEP;

use clap::Args;
use std::path::PathBuf;

/// spectrum 子命令参数
#[derive(Args, Debug)]
pub struct SpectrumArgs {
    /// Free parameters in m, comma separated
    /// (two-layer: primary spacing; three-layer: primary spacing, secondary spacing, secondary width)
    #[arg(long)]
    pub params: String,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    #[command(flatten)]
    pub weighting: WeightingArgs,

    /// Energy grid in eV as "START-STOP" (STOP exclusive)
    #[arg(long, default_value = "10-10000")]
    pub range: String,

    /// Energy grid step in eV
    #[arg(long, default_value_t = DEFAULT_ENERGY_STEP)]
    pub step: f64,

    /// Write the spectrum to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
