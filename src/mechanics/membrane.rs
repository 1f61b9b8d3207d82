//! # 矩形薄膜层
//!
//! 承压薄膜，按无限长条带处理（长度远大于宽度）。
//! 使用大挠度薄板的闭式解：
//!
//! ```text
//! a     = width / 2
//! σ_max = ( E·p²·a² / (6·t²·(1-ν²)) )^(1/3)
//! t_min = p·a / 2.4495 · sqrt( E / ((1-ν²)·σ_u³) )
//! w_max = 2 · 2.4495 · t / p · sqrt( (1-ν²)·σ_u³ / E )
//! ```
//!
//! 薄膜是实心的，开口率为 0。
//!
//! ## 依赖关系
//! - 被 `mechanics/mod.rs` 的 MechanicalLayer 包装
//! - 被 `optimizer/design.rs` 构造

use super::{require, MechanicalLayer, TEST_PRESSURE};
use crate::error::{Result, XrwError};
use crate::models::MaterialRef;

/// 反解公式中的常数（≈ √6）
const SQRT_SIX: f64 = 2.4495;

/// 长条薄膜最大应力
pub fn membrane_stress(
    modulus: f64,
    poisson: f64,
    width: f64,
    thickness: f64,
    pressure: f64,
) -> f64 {
    let a = width / 2.0;
    (modulus * pressure * pressure * a * a
        / (6.0 * thickness * thickness * (1.0 - poisson * poisson)))
        .cbrt()
}

/// 给定厚度下能承受压力的最大全宽
fn max_width(modulus: f64, poisson: f64, ultimate: f64, thickness: f64, pressure: f64) -> f64 {
    2.0 * SQRT_SIX * thickness / pressure
        * ((1.0 - poisson * poisson) * ultimate.powi(3) / modulus).sqrt()
}

/// 薄膜层几何参数（未定型）
#[derive(Debug, Clone)]
pub struct MembraneBuilder {
    name: String,
    material: MaterialRef,
    width: Option<f64>,
    thickness: Option<f64>,
    pressure: f64,
}

impl MembraneBuilder {
    /// 创建薄膜层，压力默认为测试压力（两倍大气压）
    pub fn new(name: impl Into<String>, material: MaterialRef) -> Self {
        Self {
            name: name.into(),
            material,
            width: None,
            thickness: None,
            pressure: TEST_PRESSURE,
        }
    }

    /// 薄膜全宽（m）
    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// 薄膜厚度（m）
    pub fn thickness(mut self, thickness: f64) -> Self {
        self.thickness = Some(thickness);
        self
    }

    /// 压差（Pa）
    pub fn pressure(mut self, pressure: f64) -> Self {
        self.pressure = pressure;
        self
    }

    /// 1 - ν²
    fn poisson_factor(&self) -> Result<f64> {
        let nu = self.material.properties().poisson_ratio;
        let factor = 1.0 - nu * nu;
        if !(factor > 0.0) {
            return Err(XrwError::invalid(&self.name, "poisson_ratio", nu));
        }
        Ok(factor)
    }

    fn positive(&self, parameter: &str, value: Option<f64>) -> Result<f64> {
        let value = require(&self.name, parameter, value)?;
        if value <= 0.0 {
            return Err(XrwError::invalid(&self.name, parameter, value));
        }
        Ok(value)
    }

    fn checked_pressure(&self) -> Result<f64> {
        let p = require(&self.name, "pressure", Some(self.pressure))?;
        if p < 0.0 {
            return Err(XrwError::invalid(&self.name, "pressure", p));
        }
        Ok(p)
    }

    /// 计算最大应力（Pa）
    pub fn calc_stress(&self) -> Result<f64> {
        let width = self.positive("width", self.width)?;
        let thickness = self.positive("thickness", self.thickness)?;
        let pressure = self.checked_pressure()?;
        self.poisson_factor()?;

        let props = self.material.properties();
        let stress = membrane_stress(
            props.modulus,
            props.poisson_ratio,
            width,
            thickness,
            pressure,
        );
        if !stress.is_finite() {
            return Err(XrwError::invalid(&self.name, "max_stress", stress));
        }
        Ok(stress)
    }

    /// 承受当前压力所需的最小厚度（m）
    ///
    /// 结果小于材料最小可加工厚度时，返回最小可加工厚度。
    pub fn calc_min_thickness(&self) -> Result<f64> {
        let width = self.positive("width", self.width)?;
        let pressure = self.checked_pressure()?;
        let factor = self.poisson_factor()?;

        let props = self.material.properties();
        let s = props.ultimate_stress;
        let a = width / 2.0;

        let t = pressure * a / SQRT_SIX * (props.modulus / (factor * s * s * s)).sqrt();
        if !t.is_finite() {
            return Err(XrwError::invalid(&self.name, "thickness", t));
        }

        Ok(t.max(props.min_thickness))
    }

    /// 给定厚度下能承受当前压力的最大全宽（m）
    pub fn calc_max_width(&self) -> Result<f64> {
        let thickness = self.positive("thickness", self.thickness)?;
        let pressure = self.positive("pressure", Some(self.pressure))?;
        self.poisson_factor()?;

        let props = self.material.properties();
        let w = max_width(
            props.modulus,
            props.poisson_ratio,
            props.ultimate_stress,
            thickness,
            pressure,
        );
        if !w.is_finite() {
            return Err(XrwError::invalid(&self.name, "width", w));
        }
        Ok(w)
    }

    /// 计算应力并定型为不可变的层
    pub fn finalize(self) -> Result<MechanicalLayer> {
        let max_stress = self.calc_stress()?;
        let width = self.positive("width", self.width)?;
        let thickness = self.positive("thickness", self.thickness)?;

        Ok(MechanicalLayer::Membrane(MembraneLayer {
            name: self.name,
            material: self.material,
            width,
            thickness,
            pressure: self.pressure,
            max_stress,
        }))
    }
}

/// 已定型的薄膜层
#[derive(Debug, Clone)]
pub struct MembraneLayer {
    pub(super) name: String,
    pub(super) material: MaterialRef,
    width: f64,
    thickness: f64,
    pressure: f64,
    max_stress: f64,
}

impl MembraneLayer {
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn max_stress(&self) -> f64 {
        self.max_stress
    }

    /// 当前厚度下允许的最大全宽（m）；不受压时不受限，返回 `None`
    pub fn calc_max_width(&self) -> Option<f64> {
        if !(self.pressure > 0.0) {
            return None;
        }
        let props = self.material.properties();
        Some(max_width(
            props.modulus,
            props.poisson_ratio,
            props.ultimate_stress,
            self.thickness,
            self.pressure,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanics::tests::{material_ref, polymer, silicon};
    use approx::assert_relative_eq;

    #[test]
    fn test_stress_closed_form() {
        let stress = MembraneBuilder::new("Membrane", silicon())
            .width(100e-6)
            .thickness(100e-9)
            .calc_stress()
            .unwrap();

        let a: f64 = 50e-6;
        let expected = (150e9 * 202.6e3_f64.powi(2) * a * a
            / (6.0 * 100e-9_f64.powi(2) * (1.0 - 0.17 * 0.17)))
            .powf(1.0 / 3.0);
        assert_relative_eq!(stress, expected, max_relative = 1e-12);
    }

    #[test]
    fn test_min_thickness_inverts_stress() {
        let materials = [silicon(), polymer(), material_ref("SiNx", 250e9, 6e9, 0.23, 0.0)];
        for material in materials {
            for width in [10e-6, 100e-6, 190e-6, 1000e-6] {
                let builder = MembraneBuilder::new("Membrane", material.clone()).width(width);
                let t_min = builder.calc_min_thickness().unwrap();
                let layer = builder.thickness(t_min * 1.01).finalize().unwrap();

                assert!(
                    layer.max_stress() < material.properties().ultimate_stress,
                    "{} at width {}",
                    material.name(),
                    width
                );
                assert!(!layer.failure());
            }
        }
    }

    #[test]
    fn test_min_thickness_clamp() {
        // 很窄的薄膜，公式结果远小于最小可加工厚度
        let material = material_ref("floor", 3e9, 200e6, 0.35, 50e-9);
        let builder = MembraneBuilder::new("Membrane", material.clone()).width(1e-6);
        assert_eq!(builder.calc_min_thickness().unwrap(), 50e-9);

        let unclamped = MembraneBuilder::new("Membrane", material_ref("free", 3e9, 200e6, 0.35, 0.0))
            .width(1e-6)
            .calc_min_thickness()
            .unwrap();
        assert!(unclamped < 50e-9);
    }

    #[test]
    fn test_max_width_is_dual_of_min_thickness() {
        let material = material_ref("free", 3e9, 200e6, 0.35, 0.0);
        let width = MembraneBuilder::new("Membrane", material.clone())
            .thickness(300e-9)
            .calc_max_width()
            .unwrap();
        let thickness = MembraneBuilder::new("Membrane", material)
            .width(width)
            .calc_min_thickness()
            .unwrap();
        assert_relative_eq!(thickness, 300e-9, max_relative = 1e-9);
    }

    #[test]
    fn test_layer_max_width_covers_own_width() {
        let builder = MembraneBuilder::new("Membrane", polymer()).width(190e-6);
        let t = builder.calc_min_thickness().unwrap();
        let MechanicalLayer::Membrane(layer) = builder.thickness(t * 1.01).finalize().unwrap() else {
            panic!("expected membrane layer");
        };
        assert_relative_eq!(
            layer.calc_max_width().unwrap(),
            190e-6 * 1.01,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_unloaded_membrane_width_is_unbounded() {
        let MechanicalLayer::Membrane(layer) = MembraneBuilder::new("Membrane", polymer())
            .width(190e-6)
            .thickness(300e-9)
            .pressure(0.0)
            .finalize()
            .unwrap()
        else {
            panic!("expected membrane layer");
        };
        assert_eq!(layer.max_stress(), 0.0);
        assert!(layer.calc_max_width().is_none());
    }

    #[test]
    fn test_missing_parameters() {
        let no_width = MembraneBuilder::new("Membrane", polymer()).thickness(300e-9);
        assert!(matches!(
            no_width.calc_min_thickness(),
            Err(XrwError::MissingParameter { .. })
        ));
        assert!(matches!(
            no_width.calc_stress(),
            Err(XrwError::MissingParameter { .. })
        ));

        let no_thickness = MembraneBuilder::new("Membrane", polymer()).width(190e-6);
        assert!(matches!(
            no_thickness.calc_max_width(),
            Err(XrwError::MissingParameter { .. })
        ));
        assert!(matches!(
            no_thickness.clone().thickness(f64::NAN).finalize(),
            Err(XrwError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_zero_thickness_is_invalid() {
        let builder = MembraneBuilder::new("Membrane", polymer())
            .width(190e-6)
            .thickness(0.0);
        assert!(matches!(
            builder.calc_stress(),
            Err(XrwError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_membrane_is_solid() {
        let layer = MembraneBuilder::new("Membrane", silicon())
            .width(100e-6)
            .thickness(100e-9)
            .finalize()
            .unwrap();
        assert_eq!(layer.open_area(), 0.0);
        assert_eq!(layer.xray_thickness(), 100e-9);
    }
}
