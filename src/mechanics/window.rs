//! # 多层窗口装配
//!
//! 把有序的 `MechanicalLayer` 组合为一个窗口，并计算整体 X 射线透过率。
//!
//! ## 透过率模型
//! ```text
//! T_layer(E) = (1 - open) · T_material(E, t) + open
//! T_stack(E) = Π T_layer(E)
//! ```
//! 即光子要么从开口处无衰减通过，要么穿过整层材料厚度（按面积线性混合）。
//!
//! ## 依赖关系
//! - 被 `optimizer/design.rs` 和 `commands/` 使用
//! - 使用 `mechanics/mod.rs` 的 MechanicalLayer
//! - 使用 `models/spectrum.rs` 生成谱

use super::MechanicalLayer;
use crate::error::Result;
use crate::models::spectrum::{self, Spectrum};
use crate::models::MaterialRef;
use crate::xray::AttenuationTable;

use std::sync::Arc;

/// 按量级格式化厚度（输入单位 m）
pub fn format_thickness(thickness: f64) -> String {
    let microns = thickness * 1e6;
    if microns < 1.0 {
        format!("{:6.2} nm", microns * 1000.0)
    } else if microns > 1000.0 {
        format!("{:6.2} mm", microns / 1000.0)
    } else {
        format!("{:6.2} µm", microns)
    }
}

/// 单层的 X 射线视角：穿透厚度、开口率、衰减数据
#[derive(Debug, Clone)]
pub struct XrayLayer {
    pub name: String,
    pub material: String,
    pub thickness: f64,
    pub open_area: f64,
    attenuation: Arc<AttenuationTable>,
}

impl XrayLayer {
    pub fn new(name: &str, material: &MaterialRef, thickness: f64, open_area: f64) -> Self {
        Self {
            name: name.to_string(),
            material: material.name().to_string(),
            thickness,
            open_area,
            attenuation: Arc::clone(material.attenuation()),
        }
    }

    /// 该层在能量 `energy`（eV）下的透过率
    pub fn transmission(&self, energy: f64) -> Result<f64> {
        let through = self.attenuation.transmission(energy, self.thickness)?;
        Ok((1.0 - self.open_area) * through + self.open_area)
    }
}

impl std::fmt::Display for XrayLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}):\t{} | OA {:4.1}%",
            self.name,
            self.material,
            format_thickness(self.thickness),
            self.open_area * 100.0
        )
    }
}

/// 多层窗口
#[derive(Debug, Clone, Default)]
pub struct WindowStack {
    name: String,
    layers: Vec<MechanicalLayer>,
}

impl WindowStack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: Vec::new(),
        }
    }

    /// 在光路末端追加一层
    pub fn with_layer(mut self, layer: MechanicalLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layers(&self) -> &[MechanicalLayer] {
        &self.layers
    }

    /// 应力超限的层
    pub fn failed_layers(&self) -> Vec<&MechanicalLayer> {
        self.layers.iter().filter(|l| l.failure()).collect()
    }

    /// 所有层都能承受设计压力
    pub fn is_feasible(&self) -> bool {
        !self.layers.iter().any(|l| l.failure())
    }

    /// 各层的 X 射线视角
    pub fn xray_layers(&self) -> Vec<XrayLayer> {
        self.layers.iter().map(|l| l.to_xray_layer()).collect()
    }

    /// 整个窗口在能量 `energy`（eV）下的透过率
    pub fn transmission(&self, energy: f64) -> Result<f64> {
        stack_transmission(&self.xray_layers(), energy)
    }

    /// 在给定能量序列（严格递增）上计算透过率谱
    pub fn spectrum(&self, energies: &[f64]) -> Result<Spectrum> {
        let layers = self.xray_layers();
        let transmissions = energies
            .iter()
            .map(|e| stack_transmission(&layers, *e))
            .collect::<Result<Vec<f64>>>()?;

        Spectrum::new(energies.to_vec(), transmissions)
    }

    /// 默认能量网格（10 - 10000 eV，步长 1 eV）上的谱
    pub fn default_spectrum(&self) -> Result<Spectrum> {
        self.spectrum(&spectrum::default_energies())
    }
}

impl std::fmt::Display for WindowStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        for layer in self.xray_layers() {
            writeln!(f, "{}", layer)?;
        }
        Ok(())
    }
}

fn stack_transmission(layers: &[XrayLayer], energy: f64) -> Result<f64> {
    layers
        .iter()
        .try_fold(1.0, |total, layer| -> Result<f64> {
            Ok(total * layer.transmission(energy)?)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XrwError;
    use crate::mechanics::tests::{material_ref, polymer, silicon};
    use crate::mechanics::{BeamBuilder, FilmLayer, MembraneBuilder};
    use approx::assert_relative_eq;

    fn primary(spacing: f64) -> MechanicalLayer {
        BeamBuilder::new("Primary", silicon())
            .spacing(spacing)
            .width(60e-6)
            .length(10.2e-3)
            .height(380e-6)
            .finalize()
            .unwrap()
    }

    fn membrane(width: f64) -> MechanicalLayer {
        let builder = MembraneBuilder::new("Membrane", polymer()).width(width);
        let t = builder.calc_min_thickness().unwrap();
        builder.thickness(t * 1.01).finalize().unwrap()
    }

    #[test]
    fn test_layer_transmission_mixes_open_area() {
        let layer = primary(190e-6).to_xray_layer();
        let through = silicon().attenuation().transmission(500.0, 380e-6).unwrap();
        assert_relative_eq!(
            layer.transmission(500.0).unwrap(),
            0.24 * through + 0.76,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_stack_transmission_is_multiplicative() {
        let beam = primary(190e-6);
        let membrane = membrane(190e-6);
        let stack = WindowStack::new("two-layer")
            .with_layer(beam.clone())
            .with_layer(membrane.clone());

        for energy in [10.0, 54.3, 277.0, 1740.0, 9999.0] {
            let expected = beam.to_xray_layer().transmission(energy).unwrap()
                * membrane.to_xray_layer().transmission(energy).unwrap();
            assert_relative_eq!(
                stack.transmission(energy).unwrap(),
                expected,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn test_spectrum_matches_pointwise_transmission() {
        let stack = WindowStack::new("w")
            .with_layer(primary(190e-6))
            .with_layer(FilmLayer::new("Light Block", silicon(), 30e-9).unwrap());
        let energies = [100.0, 200.0, 300.0];
        let spectrum = stack.spectrum(&energies).unwrap();

        assert_eq!(spectrum.energies(), &energies);
        for (e, t) in spectrum.points() {
            assert_eq!(t, stack.transmission(e).unwrap());
        }
    }

    #[test]
    fn test_default_spectrum_domain() {
        let stack = WindowStack::new("w").with_layer(primary(190e-6));
        let spectrum = stack.default_spectrum().unwrap();
        assert_eq!(spectrum.len(), 9990);
        assert_eq!(spectrum.energies()[0], 10.0);
    }

    #[test]
    fn test_out_of_range_propagates() {
        let stack = WindowStack::new("w").with_layer(primary(190e-6));
        assert!(matches!(
            stack.transmission(5.0),
            Err(XrwError::OutOfRange { .. })
        ));
        assert!(stack.spectrum(&[100.0, 20_000.0]).is_err());
    }

    #[test]
    fn test_feasibility() {
        let ok = WindowStack::new("ok")
            .with_layer(primary(190e-6))
            .with_layer(membrane(190e-6));
        assert!(ok.is_feasible());
        assert!(ok.failed_layers().is_empty());

        // 极弱的肋条材料
        let weak = BeamBuilder::new("Primary", material_ref("weak", 150e9, 1e6, 0.17, 0.0))
            .spacing(190e-6)
            .width(60e-6)
            .length(10.2e-3)
            .height(380e-6)
            .finalize()
            .unwrap();
        let bad = WindowStack::new("bad")
            .with_layer(weak)
            .with_layer(membrane(190e-6));
        assert!(!bad.is_feasible());
        assert_eq!(bad.failed_layers().len(), 1);
        assert_eq!(bad.failed_layers()[0].name(), "Primary");
    }

    #[test]
    fn test_format_thickness() {
        assert_eq!(format_thickness(30e-9), " 30.00 nm");
        assert_eq!(format_thickness(380e-6), "380.00 µm");
        assert_eq!(format_thickness(10.2e-3), " 10.20 mm");
    }

    #[test]
    fn test_empty_stack_is_transparent() {
        let stack = WindowStack::new("empty");
        assert_eq!(stack.transmission(123.0).unwrap(), 1.0);
    }
}
