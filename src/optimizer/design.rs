//! # 窗口拓扑
//!
//! 把设计变量翻译成具体的 `WindowStack`。
//!
//! ## 拓扑
//! | 拓扑 | 设计变量 | 派生几何 |
//! |------|----------|----------|
//! | 两层 | 主肋间距 | 薄膜宽 = 主肋间距 |
//! | 三层 | 主肋间距、次肋间距、次肋宽 | 次肋跨度 = 主肋间距，薄膜宽 = 次肋间距 |
//!
//! 薄膜厚度默认取 `calc_min_thickness() × margin`，也可以固定为给定值；
//! 之后可选地追加遮光层与阻气层。
//!
//! ## 依赖关系
//! - 被 `optimizer/objective.rs` 和 `commands/` 使用
//! - 使用 `mechanics/` 的层构造器

use super::params::ParameterBounds;
use crate::error::{Result, XrwError};
use crate::mechanics::{
    BeamBuilder, FilmLayer, MechanicalLayer, MembraneBuilder, WindowStack, TEST_PRESSURE,
};
use crate::models::MaterialRef;

/// 遮光层默认材料与厚度
pub const LIGHT_BLOCK_MATERIAL: &str = "aluminum";
pub const LIGHT_BLOCK_THICKNESS: f64 = 30e-9;

/// 阻气层默认材料与厚度
pub const GAS_BARRIER_MATERIAL: &str = "boron";
pub const GAS_BARRIER_THICKNESS: f64 = 20e-9;

/// 支撑结构拓扑
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// 主肋 + 薄膜
    TwoLayer,
    /// 主肋 + 次肋 + 薄膜
    ThreeLayer,
}

impl Topology {
    /// 设计变量个数
    pub fn dim(self) -> usize {
        match self {
            Topology::TwoLayer => 1,
            Topology::ThreeLayer => 3,
        }
    }

    /// 设计变量名称（用于输出）
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            Topology::TwoLayer => &["primary spacing"],
            Topology::ThreeLayer => &["primary spacing", "secondary spacing", "secondary width"],
        }
    }

    /// 默认搜索边界（m）
    pub fn default_bounds(self) -> ParameterBounds {
        let (lower, upper) = match self {
            Topology::TwoLayer => (vec![100e-6], vec![2000e-6]),
            Topology::ThreeLayer => (vec![100e-6, 1e-6, 5e-6], vec![2000e-6, 200e-6, 30e-6]),
        };
        ParameterBounds::from_parts(lower, upper)
    }
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::TwoLayer => write!(f, "two-layer"),
            Topology::ThreeLayer => write!(f, "three-layer"),
        }
    }
}

/// 不参与优化的固定几何
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedGeometry {
    /// 主肋宽（m）
    pub primary_width: f64,
    /// 主肋跨度（m）
    pub primary_length: f64,
    /// 主肋高（m）
    pub primary_height: f64,
    /// 次肋高（m）
    pub secondary_height: f64,
    /// 设计压差（Pa）
    pub pressure: f64,
    /// 薄膜厚度相对最小厚度的放大系数
    pub membrane_margin: f64,
    /// 固定薄膜厚度（m）；设置后忽略 `membrane_margin`
    pub membrane_thickness: Option<f64>,
}

impl Default for FixedGeometry {
    fn default() -> Self {
        Self {
            primary_width: 60e-6,
            primary_length: 10.2e-3,
            primary_height: 380e-6,
            secondary_height: 45e-6,
            pressure: TEST_PRESSURE,
            membrane_margin: 1.01,
            membrane_thickness: None,
        }
    }
}

/// 一个固定材料、固定拓扑的窗口设计
#[derive(Debug, Clone)]
pub struct WindowDesign {
    topology: Topology,
    primary: MaterialRef,
    secondary: MaterialRef,
    membrane: MaterialRef,
    light_block: Option<(MaterialRef, f64)>,
    gas_barrier: Option<(MaterialRef, f64)>,
    geometry: FixedGeometry,
}

impl WindowDesign {
    /// 两层窗口：主肋 + 薄膜
    pub fn two_layer(primary: MaterialRef, membrane: MaterialRef) -> Self {
        Self {
            topology: Topology::TwoLayer,
            secondary: primary.clone(),
            primary,
            membrane,
            light_block: None,
            gas_barrier: None,
            geometry: FixedGeometry::default(),
        }
    }

    /// 三层窗口：主肋 + 次肋 + 薄膜
    pub fn three_layer(primary: MaterialRef, secondary: MaterialRef, membrane: MaterialRef) -> Self {
        Self {
            topology: Topology::ThreeLayer,
            primary,
            secondary,
            membrane,
            light_block: None,
            gas_barrier: None,
            geometry: FixedGeometry::default(),
        }
    }

    pub fn with_light_block(mut self, material: MaterialRef, thickness: f64) -> Self {
        self.light_block = Some((material, thickness));
        self
    }

    pub fn with_gas_barrier(mut self, material: MaterialRef, thickness: f64) -> Self {
        self.gas_barrier = Some((material, thickness));
        self
    }

    pub fn with_geometry(mut self, geometry: FixedGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// 参与计算的全部材料（去重前）
    pub fn materials(&self) -> Vec<&MaterialRef> {
        let mut materials = vec![&self.primary];
        if self.topology == Topology::ThreeLayer {
            materials.push(&self.secondary);
        }
        materials.push(&self.membrane);
        materials.extend(self.light_block.iter().map(|(m, _)| m));
        materials.extend(self.gas_barrier.iter().map(|(m, _)| m));
        materials
    }

    /// 根据设计变量构造窗口
    ///
    /// 不做可行性判断：返回的窗口可能有层失效，由调用方决定如何处理。
    pub fn build(&self, params: &[f64]) -> Result<WindowStack> {
        if params.len() != self.topology.dim() {
            return Err(XrwError::InvalidArgument(format!(
                "{} window expects {} parameters, got {}",
                self.topology,
                self.topology.dim(),
                params.len()
            )));
        }

        let g = &self.geometry;
        let primary_spacing = params[0];
        let primary = BeamBuilder::new("Primary", self.primary.clone())
            .spacing(primary_spacing)
            .width(g.primary_width)
            .length(g.primary_length)
            .height(g.primary_height)
            .pressure(g.pressure)
            .finalize()?;

        let mut stack = WindowStack::new(self.topology.to_string()).with_layer(primary);

        let membrane_width = match self.topology {
            Topology::TwoLayer => primary_spacing,
            Topology::ThreeLayer => {
                let (secondary_spacing, secondary_width) = (params[1], params[2]);
                let secondary = BeamBuilder::new("Secondary", self.secondary.clone())
                    .spacing(secondary_spacing)
                    .width(secondary_width)
                    .length(primary_spacing)
                    .height(g.secondary_height)
                    .pressure(g.pressure)
                    .finalize()?;
                stack = stack.with_layer(secondary);
                secondary_spacing
            }
        };

        stack = stack.with_layer(self.membrane_layer(membrane_width)?);

        if let Some((material, thickness)) = &self.light_block {
            stack = stack.with_layer(FilmLayer::new("Light Block", material.clone(), *thickness)?);
        }
        if let Some((material, thickness)) = &self.gas_barrier {
            stack = stack.with_layer(FilmLayer::new("Gas Barrier", material.clone(), *thickness)?);
        }

        Ok(stack)
    }

    fn membrane_layer(&self, width: f64) -> Result<MechanicalLayer> {
        let builder = MembraneBuilder::new("Membrane", self.membrane.clone())
            .width(width)
            .pressure(self.geometry.pressure);
        let thickness = match self.geometry.membrane_thickness {
            Some(thickness) => thickness,
            None => builder.calc_min_thickness()? * self.geometry.membrane_margin,
        };
        builder.thickness(thickness).finalize()
    }
}
