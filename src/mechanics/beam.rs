//! # 梁（肋条）支撑层
//!
//! 把肋条支撑层建模为两端固支的 Euler–Bernoulli 梁，承受均布压力载荷。
//!
//! ## 公式
//! ```text
//! q     = (s + w) · p              线载荷 (N/m)
//! M_max = q·L² / 12                固支梁最大弯矩
//! I/c   = w·h² / 6                 截面模量
//! σ_max = q·L² / (2·w·h²)
//! δ_max = q·L⁴ / (32·E·w·h³)
//! open  = s / (s + w)
//! ```
//! 其中 s 为肋间距，w 为肋宽，L 为跨度，h 为梁高（即 X 射线穿过的厚度）。
//!
//! ## 依赖关系
//! - 被 `mechanics/mod.rs` 的 MechanicalLayer 包装
//! - 被 `optimizer/design.rs` 构造

use super::{require, MechanicalLayer, TEST_PRESSURE};
use crate::error::{Result, XrwError};
use crate::models::MaterialRef;

/// 固支梁最大弯曲应力
pub fn bending_stress(spacing: f64, width: f64, length: f64, height: f64, pressure: f64) -> f64 {
    let dist_load = (spacing + width) * pressure;
    dist_load * length * length / (2.0 * width * height * height)
}

/// 应力恰好等于 `ultimate` 时的肋间距
pub fn max_spacing(ultimate: f64, width: f64, length: f64, height: f64, pressure: f64) -> f64 {
    2.0 * ultimate * width * height * height / (pressure * length * length) - width
}

/// 梁层几何参数（未定型）
#[derive(Debug, Clone)]
pub struct BeamBuilder {
    name: String,
    material: MaterialRef,
    spacing: Option<f64>,
    width: Option<f64>,
    length: Option<f64>,
    height: Option<f64>,
    pressure: f64,
}

impl BeamBuilder {
    /// 创建梁层，压力默认为测试压力（两倍大气压）
    pub fn new(name: impl Into<String>, material: MaterialRef) -> Self {
        Self {
            name: name.into(),
            material,
            spacing: None,
            width: None,
            length: None,
            height: None,
            pressure: TEST_PRESSURE,
        }
    }

    /// 肋间距（m）
    pub fn spacing(mut self, spacing: f64) -> Self {
        self.spacing = Some(spacing);
        self
    }

    /// 肋宽（m）
    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// 跨度（m）
    pub fn length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    /// 梁高（m）
    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// 压差（Pa）
    pub fn pressure(mut self, pressure: f64) -> Self {
        self.pressure = pressure;
        self
    }

    /// 读取并检查全部几何参数
    fn geometry(&self) -> Result<BeamGeometry> {
        let layer = self.name.as_str();
        let geometry = BeamGeometry {
            spacing: require(layer, "spacing", self.spacing)?,
            width: require(layer, "width", self.width)?,
            length: require(layer, "length", self.length)?,
            height: require(layer, "height", self.height)?,
            pressure: require(layer, "pressure", Some(self.pressure))?,
        };

        if geometry.spacing < 0.0 {
            return Err(XrwError::invalid(layer, "spacing", geometry.spacing));
        }
        if geometry.width <= 0.0 {
            return Err(XrwError::invalid(layer, "width", geometry.width));
        }
        if geometry.length <= 0.0 {
            return Err(XrwError::invalid(layer, "length", geometry.length));
        }
        if geometry.height <= 0.0 {
            return Err(XrwError::invalid(layer, "height", geometry.height));
        }
        if geometry.pressure < 0.0 {
            return Err(XrwError::invalid(layer, "pressure", geometry.pressure));
        }

        Ok(geometry)
    }

    /// 计算最大弯曲应力（Pa）
    pub fn calc_stress(&self) -> Result<f64> {
        let g = self.geometry()?;
        let stress = bending_stress(g.spacing, g.width, g.length, g.height, g.pressure);
        if !stress.is_finite() {
            return Err(XrwError::invalid(&self.name, "max_stress", stress));
        }
        Ok(stress)
    }

    /// 应力恰好等于极限应力时的肋间距（m）
    ///
    /// 只需要 width、length、height，spacing 可以未设置。
    pub fn calc_max_spacing(&self) -> Result<f64> {
        let layer = self.name.as_str();
        let w = require(layer, "width", self.width)?;
        let l = require(layer, "length", self.length)?;
        let h = require(layer, "height", self.height)?;
        let p = self.pressure;
        if !(p > 0.0) {
            return Err(XrwError::invalid(layer, "pressure", p));
        }

        let s = self.material.properties().ultimate_stress;
        Ok(max_spacing(s, w, l, h, p))
    }

    /// 计算应力并定型为不可变的层
    pub fn finalize(self) -> Result<MechanicalLayer> {
        let g = self.geometry()?;
        let max_stress = self.calc_stress()?;

        Ok(MechanicalLayer::Beam(BeamLayer {
            name: self.name,
            material: self.material,
            spacing: g.spacing,
            width: g.width,
            length: g.length,
            height: g.height,
            pressure: g.pressure,
            max_stress,
        }))
    }
}

#[derive(Debug, Clone, Copy)]
struct BeamGeometry {
    spacing: f64,
    width: f64,
    length: f64,
    height: f64,
    pressure: f64,
}

/// 已定型的梁层
#[derive(Debug, Clone)]
pub struct BeamLayer {
    pub(super) name: String,
    pub(super) material: MaterialRef,
    spacing: f64,
    width: f64,
    length: f64,
    height: f64,
    pressure: f64,
    max_stress: f64,
}

impl BeamLayer {
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn max_stress(&self) -> f64 {
        self.max_stress
    }

    /// X 射线穿过肋条材料的厚度即梁高
    pub fn xray_thickness(&self) -> f64 {
        self.height
    }

    /// 开口率 s / (s + w)
    pub fn open_area(&self) -> f64 {
        self.spacing / (self.spacing + self.width)
    }

    /// 保持其余几何不变时允许的最大肋间距（m）；不受压时不受限，返回 `None`
    pub fn calc_max_spacing(&self) -> Option<f64> {
        if !(self.pressure > 0.0) {
            return None;
        }
        Some(max_spacing(
            self.material.properties().ultimate_stress,
            self.width,
            self.length,
            self.height,
            self.pressure,
        ))
    }

    /// 最大挠度（m）
    pub fn calc_max_deflection(&self) -> f64 {
        let dist_load = (self.spacing + self.width) * self.pressure;
        dist_load * self.length.powi(4)
            / (32.0 * self.material.properties().modulus * self.width * self.height.powi(3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanics::tests::{material_ref, silicon};
    use approx::assert_relative_eq;

    fn primary() -> BeamBuilder {
        BeamBuilder::new("Primary", silicon())
            .spacing(190e-6)
            .width(60e-6)
            .length(10.2e-3)
            .height(380e-6)
    }

    #[test]
    fn test_bending_stress_closed_form() {
        let stress = primary().calc_stress().unwrap();
        // (190e-6 + 60e-6) · 202.6e3 · (10.2e-3)² / (2 · 60e-6 · (380e-6)²)
        let expected = 250e-6 * 202.6e3 * 10.2e-3 * 10.2e-3 / (2.0 * 60e-6 * 380e-6 * 380e-6);
        assert_relative_eq!(stress, expected, max_relative = 1e-12);
        assert_relative_eq!(stress, 304.110457e6, max_relative = 1e-8);
    }

    #[test]
    fn test_finalize_stores_stress() {
        let layer = primary().finalize().unwrap();
        assert_relative_eq!(layer.max_stress(), primary().calc_stress().unwrap());
        assert!(!layer.failure());
        assert_relative_eq!(layer.open_area(), 0.76, max_relative = 1e-12);
        assert_eq!(layer.xray_thickness(), 380e-6);
    }

    #[test]
    fn test_missing_parameter() {
        let builder = BeamBuilder::new("Primary", silicon())
            .width(60e-6)
            .length(10.2e-3)
            .height(380e-6);
        assert!(matches!(
            builder.calc_stress(),
            Err(XrwError::MissingParameter { ref parameter, .. }) if parameter == "spacing"
        ));

        let nan = primary().height(f64::NAN);
        assert!(matches!(
            nan.finalize(),
            Err(XrwError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_degenerate_geometry() {
        assert!(matches!(
            primary().width(0.0).calc_stress(),
            Err(XrwError::InvalidParameter { .. })
        ));
        assert!(matches!(
            primary().height(-1.0).calc_stress(),
            Err(XrwError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_failure_is_strict_inequality() {
        let stress = primary().calc_stress().unwrap();

        let at_limit = BeamBuilder::new("Primary", material_ref("edge", 150e9, stress, 0.17, 0.0))
            .spacing(190e-6)
            .width(60e-6)
            .length(10.2e-3)
            .height(380e-6)
            .finalize()
            .unwrap();
        assert!(!at_limit.failure());

        let below = BeamBuilder::new(
            "Primary",
            material_ref("weak", 150e9, stress * 0.999, 0.17, 0.0),
        )
        .spacing(190e-6)
        .width(60e-6)
        .length(10.2e-3)
        .height(380e-6)
        .finalize()
        .unwrap();
        assert!(below.failure());
    }

    #[test]
    fn test_max_spacing_reaches_ultimate_stress() {
        let max_spacing = primary().calc_max_spacing().unwrap();
        let stress = primary().spacing(max_spacing).calc_stress().unwrap();
        assert_relative_eq!(stress, 7e9, max_relative = 1e-9);
    }

    #[test]
    fn test_layer_max_spacing_matches_builder() {
        let MechanicalLayer::Beam(beam) = primary().finalize().unwrap() else {
            panic!("expected beam layer");
        };
        let max_spacing = beam.calc_max_spacing().unwrap();
        assert_relative_eq!(
            max_spacing,
            primary().calc_max_spacing().unwrap(),
            max_relative = 1e-12
        );
        assert!(max_spacing > beam.spacing());
    }

    #[test]
    fn test_unloaded_beam_spacing_is_unbounded() {
        let MechanicalLayer::Beam(beam) = primary().pressure(0.0).finalize().unwrap() else {
            panic!("expected beam layer");
        };
        assert_eq!(beam.max_stress(), 0.0);
        assert!(beam.calc_max_spacing().is_none());
    }

    #[test]
    fn test_max_deflection() {
        let layer = primary().finalize().unwrap();
        let MechanicalLayer::Beam(beam) = layer else {
            panic!("expected beam layer");
        };
        let expected = 250e-6 * 202.6e3 * 10.2e-3_f64.powi(4)
            / (32.0 * 150e9 * 60e-6 * 380e-6_f64.powi(3));
        assert_relative_eq!(beam.calc_max_deflection(), expected, max_relative = 1e-12);
    }
}
