//! # X 射线衰减表
//!
//! 保存单一材料在参考厚度下测得的 能量 → 透过率 曲线，
//! 并按 Beer–Lambert 规律换算到任意厚度：
//!
//! ```text
//! T(E, t) = T_ref(E) ^ (t / t_ref)
//! ```
//!
//! `T_ref(E)` 由采样点分段线性插值得到，超出采样范围不外推。
//!
//! ## 文件格式
//! ```text
//! Energy,Transmission,Thickness,Density
//! 10,0.1,1e-7,2330
//! 11,0.12,,
//! ...
//! ```
//! `Thickness` 与 `Density` 只读取第一行，`Density` 仅作记录。
//!
//! ## 依赖关系
//! - 被 `models/material.rs`（目录缓存）和 `mechanics/` 使用
//! - 使用 `utils/interp.rs` 插值
//! - 使用 `csv` + `serde` 读取文件

use crate::error::{Result, XrwError};
use crate::utils::interp;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CSV 中的一行
#[derive(Debug, Deserialize)]
struct AttenuationRecord {
    #[serde(rename = "Energy")]
    energy: f64,
    #[serde(rename = "Transmission")]
    transmission: f64,
    #[serde(rename = "Thickness", default)]
    thickness: Option<f64>,
    #[serde(rename = "Density", default)]
    density: Option<f64>,
}

/// 单一材料的衰减数据
#[derive(Debug, Clone)]
pub struct AttenuationTable {
    /// 材料名称
    material: String,
    /// 能量采样点（eV，严格递增）
    energies: Vec<f64>,
    /// 参考厚度下的透过率（0 < T <= 1）
    transmissions: Vec<f64>,
    /// 参考厚度（m）
    thickness: f64,
    /// 密度（kg/m³），仅作记录
    density: Option<f64>,
}

impl AttenuationTable {
    /// 由采样数据创建衰减表，并检查数据合法性
    pub fn new(
        material: impl Into<String>,
        energies: Vec<f64>,
        transmissions: Vec<f64>,
        thickness: f64,
        density: Option<f64>,
    ) -> Result<Self> {
        let material = material.into();
        let reject = |reason: String| XrwError::ParseError {
            format: "attenuation".to_string(),
            path: material.clone(),
            reason,
        };

        if energies.len() != transmissions.len() {
            return Err(reject(format!(
                "{} energies but {} transmissions",
                energies.len(),
                transmissions.len()
            )));
        }
        if energies.len() < 2 {
            return Err(reject("at least two energy samples are required".to_string()));
        }
        if !interp::is_strictly_increasing(&energies) {
            return Err(reject("energies must be strictly increasing".to_string()));
        }
        if let Some(bad) = transmissions
            .iter()
            .find(|t| !(**t > 0.0 && **t <= 1.0))
        {
            return Err(reject(format!("transmission {} is outside (0, 1]", bad)));
        }
        if !(thickness.is_finite() && thickness > 0.0) {
            return Err(reject(format!(
                "reference thickness {} must be positive",
                thickness
            )));
        }

        Ok(Self {
            material,
            energies,
            transmissions,
            thickness,
            density,
        })
    }

    /// 从 CSV 文件读取衰减表
    pub fn load(path: &Path, material: &str) -> Result<Self> {
        if !path.is_file() {
            return Err(XrwError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let parse_error = |reason: String| XrwError::ParseError {
            format: "attenuation CSV".to_string(),
            path: path.display().to_string(),
            reason,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut energies = Vec::new();
        let mut transmissions = Vec::new();
        let mut thickness = None;
        let mut density = None;

        for (row, record) in rdr.deserialize::<AttenuationRecord>().enumerate() {
            let record = record.map_err(|e| parse_error(e.to_string()))?;
            if row == 0 {
                thickness = record.thickness;
                density = record.density;
            }
            energies.push(record.energy);
            transmissions.push(record.transmission);
        }

        let thickness =
            thickness.ok_or_else(|| parse_error("missing reference Thickness".to_string()))?;

        Self::new(material, energies, transmissions, thickness, density).map_err(|e| match e {
            XrwError::ParseError { reason, .. } => parse_error(reason),
            other => other,
        })
    }

    /// 材料衰减文件的约定路径：`<dir>/<material>.csv`
    pub fn path_for(dir: &Path, material: &str) -> PathBuf {
        dir.join(format!("{}.csv", material))
    }

    /// 材料名称
    pub fn material(&self) -> &str {
        &self.material
    }

    /// 参考厚度（m）
    pub fn reference_thickness(&self) -> f64 {
        self.thickness
    }

    pub fn density(&self) -> Option<f64> {
        self.density
    }

    /// 采样能量范围（eV）
    pub fn energy_range(&self) -> (f64, f64) {
        (self.energies[0], self.energies[self.energies.len() - 1])
    }

    /// 参考厚度下的插值透过率
    pub fn reference_transmission(&self, energy: f64) -> Result<f64> {
        interp::linear(&self.energies, &self.transmissions, energy).ok_or_else(|| {
            let (min, max) = self.energy_range();
            XrwError::OutOfRange {
                material: self.material.clone(),
                energy,
                min,
                max,
            }
        })
    }

    /// 指定能量与厚度下的透过率
    pub fn transmission(&self, energy: f64, thickness: f64) -> Result<f64> {
        if !(thickness.is_finite() && thickness >= 0.0) {
            return Err(XrwError::invalid(&self.material, "thickness", thickness));
        }
        let t_ref = self.reference_transmission(energy)?;
        Ok(t_ref.powf(thickness / self.thickness))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;

    /// 测试用合成衰减表
    pub fn synthetic_table() -> AttenuationTable {
        AttenuationTable::new(
            "synthetic",
            vec![10.0, 11.0, 12.0, 20.0],
            vec![0.1, 0.3, 0.5, 0.9],
            100e-9,
            Some(1000.0),
        )
        .unwrap()
    }

    #[test]
    fn test_reference_thickness_is_identity() {
        let table = synthetic_table();
        assert_eq!(table.transmission(10.0, 100e-9).unwrap(), 0.1);
        assert_eq!(table.transmission(20.0, 100e-9).unwrap(), 0.9);
    }

    #[test]
    fn test_linear_interpolation_between_samples() {
        let table = synthetic_table();
        assert_relative_eq!(
            table.transmission(10.5, 100e-9).unwrap(),
            0.2,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            table.transmission(16.0, 100e-9).unwrap(),
            0.7,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_thickness_scaling_is_exponential() {
        let table = synthetic_table();
        assert_relative_eq!(
            table.transmission(10.0, 200e-9).unwrap(),
            0.01,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            table.transmission(10.0, 50e-9).unwrap(),
            0.1_f64.sqrt(),
            epsilon = 1e-12
        );
        assert_eq!(table.transmission(11.0, 0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_out_of_range_energy() {
        let table = synthetic_table();
        for energy in [9.99, 20.01, f64::NAN] {
            match table.transmission(energy, 100e-9) {
                Err(XrwError::OutOfRange { min, max, .. }) => {
                    assert_eq!(min, 10.0);
                    assert_eq!(max, 20.0);
                }
                other => panic!("expected OutOfRange, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_rejects_invalid_tables() {
        assert!(AttenuationTable::new("x", vec![10.0, 10.0], vec![0.5, 0.5], 1e-7, None).is_err());
        assert!(AttenuationTable::new("x", vec![10.0, 11.0], vec![0.0, 0.5], 1e-7, None).is_err());
        assert!(AttenuationTable::new("x", vec![10.0, 11.0], vec![0.5, 1.5], 1e-7, None).is_err());
        assert!(AttenuationTable::new("x", vec![10.0, 11.0], vec![0.5, 0.6], 0.0, None).is_err());
        assert!(AttenuationTable::new("x", vec![10.0], vec![0.5], 1e-7, None).is_err());
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = AttenuationTable::path_for(dir.path(), "test_xray_data");
        fs::write(
            &path,
            "Energy,Transmission,Thickness,Density\n10,0.1,1e-7,2330\n11,0.3,,\n12,0.5,,\n",
        )
        .unwrap();

        let table = AttenuationTable::load(&path, "test_xray_data").unwrap();
        assert_eq!(table.energy_range(), (10.0, 12.0));
        assert_eq!(table.reference_thickness(), 1e-7);
        assert_eq!(table.density(), Some(2330.0));
        assert_eq!(table.transmission(10.0, 1e-7).unwrap(), 0.1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = AttenuationTable::path_for(dir.path(), "nothing");
        assert!(matches!(
            AttenuationTable::load(&path, "nothing"),
            Err(XrwError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "Energy,Transmission,Thickness\n10,abc,1e-7\n").unwrap();
        assert!(matches!(
            AttenuationTable::load(&path, "bad"),
            Err(XrwError::ParseError { .. })
        ));
    }
}
