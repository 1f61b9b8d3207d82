//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `optimize`: 差分进化搜索最优窗口几何
//! - `spectrum`: 计算指定几何窗口的透过率谱
//! - `materials`: 列出材料库
//!
//! 各子命令共用的参数组（数据目录、窗口结构、能量权重）定义在本文件，
//! 通过 `#[command(flatten)]` 嵌入。
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: optimize, spectrum, materials

pub mod materials;
pub mod optimize;
pub mod spectrum;

use crate::mechanics::TEST_PRESSURE;
use crate::optimizer::Topology;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// xraywin - X 射线探测器窗口几何优化
#[derive(Parser)]
#[command(name = "xraywin")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Optimize support geometry of soft x-ray detector windows", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Search the support geometry that maximizes window transmission
    Optimize(optimize::OptimizeArgs),

    /// Compute the transmission spectrum of a window with fixed geometry
    Spectrum(spectrum::SpectrumArgs),

    /// List the material catalog
    Materials(materials::MaterialsArgs),
}

// ─────────────────────────────────────────────────────────────
// 共用参数组
// ─────────────────────────────────────────────────────────────

/// 数据目录参数
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Data directory holding materials.csv and xray/<material>.csv
    #[arg(long, env = "XRAYWIN_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Material table (default: <data-dir>/materials.csv)
    #[arg(long)]
    pub materials: Option<PathBuf>,
}

/// 窗口拓扑
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TopologyArg {
    /// Primary ribs + membrane (1 free parameter)
    Two,
    /// Primary ribs + secondary ribs + membrane (3 free parameters)
    Three,
}

impl From<TopologyArg> for Topology {
    fn from(arg: TopologyArg) -> Self {
        match arg {
            TopologyArg::Two => Topology::TwoLayer,
            TopologyArg::Three => Topology::ThreeLayer,
        }
    }
}

/// 窗口结构参数：拓扑、各层材料、固定几何
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Window topology
    #[arg(long, value_enum, default_value = "two")]
    pub topology: TopologyArg,

    /// Primary rib material
    #[arg(long, default_value = "silicon")]
    pub primary: String,

    /// Secondary rib material (three-layer only, default: same as primary)
    #[arg(long)]
    pub secondary: Option<String>,

    /// Membrane material
    #[arg(long, default_value = "polymer")]
    pub membrane: String,

    /// Omit the light-blocking layer
    #[arg(long, default_value_t = false)]
    pub no_light_block: bool,

    /// Light-blocking layer material
    #[arg(long, default_value = "aluminum")]
    pub light_block_material: String,

    /// Light-blocking layer thickness in m
    #[arg(long, default_value_t = 30e-9)]
    pub light_block_thickness: f64,

    /// Omit the gas-barrier layer
    #[arg(long, default_value_t = false)]
    pub no_gas_barrier: bool,

    /// Gas-barrier layer material
    #[arg(long, default_value = "boron")]
    pub gas_barrier_material: String,

    /// Gas-barrier layer thickness in m
    #[arg(long, default_value_t = 20e-9)]
    pub gas_barrier_thickness: f64,

    /// Primary rib width in m
    #[arg(long, default_value_t = 60e-6)]
    pub primary_width: f64,

    /// Primary rib span in m
    #[arg(long, default_value_t = 10.2e-3)]
    pub primary_length: f64,

    /// Primary rib height in m
    #[arg(long, default_value_t = 380e-6)]
    pub primary_height: f64,

    /// Secondary rib height in m
    #[arg(long, default_value_t = 45e-6)]
    pub secondary_height: f64,

    /// Design pressure differential in Pa
    #[arg(long, default_value_t = TEST_PRESSURE)]
    pub pressure: f64,

    /// Membrane thickness as a multiple of its minimum safe thickness (>= 1)
    #[arg(long, default_value_t = 1.01, conflicts_with = "membrane_thickness")]
    pub membrane_margin: f64,

    /// Fixed membrane thickness in m instead of the derived minimum (e.g., 300e-9)
    #[arg(long)]
    pub membrane_thickness: Option<f64>,
}

/// 能量权重参数
#[derive(Args, Debug, Clone)]
pub struct WeightingArgs {
    /// Integrate transmission over an energy band in eV (e.g., "100-2000")
    #[arg(long, conflicts_with = "energies")]
    pub band: Option<String>,

    /// Sum transmission at these energies in eV (default: light-element lines)
    #[arg(long)]
    pub energies: Option<String>,
}
