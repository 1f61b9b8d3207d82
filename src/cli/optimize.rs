//! # optimize 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/optimize.rs`

use super::{DataArgs, WeightingArgs, WindowArgs};

use clap::Args;
use std::path::PathBuf;

/// optimize 子命令参数
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    #[command(flatten)]
    pub weighting: WeightingArgs,

    /// Search bounds per free parameter in m (e.g., "100e-6:2000e-6")
    #[arg(long)]
    pub bounds: Option<String>,

    // ─────────────────────────────────────────────────────────────
    // 差分进化参数
    // ─────────────────────────────────────────────────────────────
    /// Population size multiplier (population = popsize × free parameters)
    #[arg(long, default_value_t = 15)]
    pub popsize: usize,

    /// Maximum number of generations
    #[arg(long, default_value_t = 1000)]
    pub max_generations: usize,

    /// Relative convergence tolerance
    #[arg(long, default_value_t = 0.01)]
    pub tol: f64,

    /// Absolute convergence tolerance
    #[arg(long, default_value_t = 0.0)]
    pub atol: f64,

    /// Mutation factor dither range (e.g., "0.5-1.0")
    #[arg(long, default_value = "0.5-1.0")]
    pub mutation: String,

    /// Crossover probability
    #[arg(long, default_value_t = 0.7)]
    pub recombination: f64,

    /// Random seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Write the optimal window's spectrum to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
