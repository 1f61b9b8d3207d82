//! # 力学模块
//!
//! X 射线探测器窗口各支撑层的应力 / 失效模型，以及把多层组合为
//! 一个窗口的装配逻辑。
//!
//! ## 层的两阶段构造
//! 1. `BeamBuilder` / `MembraneBuilder` 收集原始几何参数（可缺省）
//! 2. `finalize()` 计算最大应力，返回不可变的 `MechanicalLayer`
//!
//! 因此 `failure()` 只存在于已定型的层上，不会在应力算出之前被调用。
//!
//! ## 子模块
//! - `beam`: 固支梁肋条层
//! - `membrane`: 长条薄膜层
//! - `window`: 多层窗口装配与透过率
//!
//! ## 依赖关系
//! - 被 `optimizer/` 和 `commands/` 使用
//! - 使用 `models/material.rs` 的 MaterialRef
//! - 使用 `xray/attenuation.rs` 计算透过率

pub mod beam;
pub mod membrane;
pub mod window;

pub use beam::{BeamBuilder, BeamLayer};
pub use membrane::{MembraneBuilder, MembraneLayer};
pub use window::{WindowStack, XrayLayer};

use crate::error::{Result, XrwError};
use crate::models::MaterialRef;

/// 大气压（Pa）
pub const ATM_PRESSURE: f64 = 101.3e3;

/// 测试压差（Pa）：两倍大气压
pub const TEST_PRESSURE: f64 = 2.0 * ATM_PRESSURE;

/// 取出必需参数；未设置或为 NaN 时报 MissingParameter
pub(crate) fn require(layer: &str, parameter: &str, value: Option<f64>) -> Result<f64> {
    match value {
        Some(v) if !v.is_nan() => {
            if v.is_finite() {
                Ok(v)
            } else {
                Err(XrwError::invalid(layer, parameter, v))
            }
        }
        _ => Err(XrwError::missing(layer, parameter)),
    }
}

/// 不承受压力的功能薄层（遮光层、阻气层）
///
/// 厚度固定、开口率为 0；由下方结构支撑，因此不参与失效判断。
#[derive(Debug, Clone)]
pub struct FilmLayer {
    name: String,
    material: MaterialRef,
    thickness: f64,
}

impl FilmLayer {
    pub fn new(
        name: impl Into<String>,
        material: MaterialRef,
        thickness: f64,
    ) -> Result<MechanicalLayer> {
        let name = name.into();
        let thickness = require(&name, "thickness", Some(thickness))?;
        if thickness < 0.0 {
            return Err(XrwError::invalid(&name, "thickness", thickness));
        }

        Ok(MechanicalLayer::Film(FilmLayer {
            name,
            material,
            thickness,
        }))
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }
}

/// 窗口中的一层
#[derive(Debug, Clone)]
pub enum MechanicalLayer {
    Beam(BeamLayer),
    Membrane(MembraneLayer),
    Film(FilmLayer),
}

impl MechanicalLayer {
    pub fn name(&self) -> &str {
        match self {
            MechanicalLayer::Beam(l) => &l.name,
            MechanicalLayer::Membrane(l) => &l.name,
            MechanicalLayer::Film(l) => &l.name,
        }
    }

    pub fn material(&self) -> &MaterialRef {
        match self {
            MechanicalLayer::Beam(l) => &l.material,
            MechanicalLayer::Membrane(l) => &l.material,
            MechanicalLayer::Film(l) => &l.material,
        }
    }

    /// 层类型名称
    pub fn kind(&self) -> &'static str {
        match self {
            MechanicalLayer::Beam(_) => "beam",
            MechanicalLayer::Membrane(_) => "membrane",
            MechanicalLayer::Film(_) => "film",
        }
    }

    /// X 射线需要穿过的材料厚度（m）
    pub fn xray_thickness(&self) -> f64 {
        match self {
            MechanicalLayer::Beam(l) => l.xray_thickness(),
            MechanicalLayer::Membrane(l) => l.thickness(),
            MechanicalLayer::Film(l) => l.thickness,
        }
    }

    /// 开口率：准直光束不经过材料的比例（0 - 1）
    pub fn open_area(&self) -> f64 {
        match self {
            MechanicalLayer::Beam(l) => l.open_area(),
            MechanicalLayer::Membrane(_) | MechanicalLayer::Film(_) => 0.0,
        }
    }

    /// 定型时算出的最大应力（Pa），功能薄层为 0
    pub fn max_stress(&self) -> f64 {
        match self {
            MechanicalLayer::Beam(l) => l.max_stress(),
            MechanicalLayer::Membrane(l) => l.max_stress(),
            MechanicalLayer::Film(_) => 0.0,
        }
    }

    /// 最大应力严格大于极限应力时失效
    pub fn failure(&self) -> bool {
        self.max_stress() > self.material().properties().ultimate_stress
    }

    /// 该层在 X 射线视角下的描述
    pub fn to_xray_layer(&self) -> XrayLayer {
        XrayLayer::new(
            self.name(),
            self.material(),
            self.xray_thickness(),
            self.open_area(),
        )
    }
}

impl std::fmt::Display for MechanicalLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.failure() { "FAIL" } else { "ok" };
        match self {
            MechanicalLayer::Beam(l) => {
                writeln!(f, "{}: BeamLayer | OA {:4.1}%", l.name, l.open_area() * 100.0)?;
                writeln!(f, "  Spacing:  \t{:7.1} µm", l.spacing() * 1e6)?;
                writeln!(f, "  Width:    \t{:7.1} µm", l.width() * 1e6)?;
                writeln!(f, "  Length:   \t{:7.1} µm", l.length() * 1e6)?;
                writeln!(f, "  Height:   \t{:7.1} µm", l.height() * 1e6)?;
                writeln!(f, "  Material: \t{}", l.material.name())?;
                writeln!(f, "  Pressure: \t{:7.1} kPa", l.pressure() / 1e3)?;
                write!(f, "  Stress:   \t{:7.1} MPa ({})", l.max_stress() / 1e6, status)
            }
            MechanicalLayer::Membrane(l) => {
                writeln!(f, "{}: MembraneLayer | OA  0.0%", l.name)?;
                writeln!(f, "  Width:     \t{:7.1} µm", l.width() * 1e6)?;
                writeln!(f, "  Thickness: \t{}", window::format_thickness(l.thickness()))?;
                writeln!(f, "  Material:  \t{}", l.material.name())?;
                writeln!(f, "  Pressure:  \t{:7.1} kPa", l.pressure() / 1e3)?;
                write!(f, "  Stress:    \t{:7.1} MPa ({})", l.max_stress() / 1e6, status)
            }
            MechanicalLayer::Film(l) => {
                writeln!(f, "{}: FilmLayer | OA  0.0%", l.name)?;
                writeln!(f, "  Thickness: \t{}", window::format_thickness(l.thickness))?;
                write!(f, "  Material:  \t{}", l.material.name())
            }
        }
    }
}
