//! # 材料与材料目录
//!
//! `Material` 保存力学常数；`MaterialCatalog` 在启动时从材料表加载一次，
//! 之后以只读引用传给各个使用者。各材料的 X 射线衰减表在首次使用时
//! 惰性加载并缓存。
//!
//! ## 材料表格式
//! ```text
//! name,youngs_modulus,ultimate_stress,poisson_ratio,min_thickness
//! silicon,150e9,7e9,0.17,
//! polymer,3e9,200e6,0.35,20e-9
//! ```
//!
//! ## 依赖关系
//! - 被 `mechanics/`, `optimizer/`, `commands/` 使用
//! - 使用 `xray/attenuation.rs` 加载衰减数据
//! - 使用 `csv` + `serde` 读取材料表

use crate::error::{Result, XrwError};
use crate::xray::AttenuationTable;

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 材料表中的一行
#[derive(Debug, Deserialize)]
struct MaterialRecord {
    name: String,
    youngs_modulus: f64,
    ultimate_stress: f64,
    poisson_ratio: f64,
    #[serde(default)]
    min_thickness: Option<f64>,
}

/// 材料力学常数
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// 材料名称（目录主键，也是衰减文件名）
    pub name: String,
    /// 杨氏模量 E（Pa）
    pub modulus: f64,
    /// 极限应力（Pa）
    pub ultimate_stress: f64,
    /// 泊松比 ν，0 < ν < 1
    pub poisson_ratio: f64,
    /// 最小可加工厚度（m）
    pub min_thickness: f64,
}

impl Material {
    pub fn new(
        name: impl Into<String>,
        modulus: f64,
        ultimate_stress: f64,
        poisson_ratio: f64,
        min_thickness: f64,
    ) -> Result<Self> {
        let name = name.into();

        if !(modulus.is_finite() && modulus > 0.0) {
            return Err(XrwError::invalid(&name, "youngs_modulus", modulus));
        }
        if !(ultimate_stress.is_finite() && ultimate_stress > 0.0) {
            return Err(XrwError::invalid(&name, "ultimate_stress", ultimate_stress));
        }
        if !(poisson_ratio > 0.0 && poisson_ratio < 1.0) {
            return Err(XrwError::invalid(&name, "poisson_ratio", poisson_ratio));
        }
        if !(min_thickness.is_finite() && min_thickness >= 0.0) {
            return Err(XrwError::invalid(&name, "min_thickness", min_thickness));
        }

        Ok(Self {
            name,
            modulus,
            ultimate_stress,
            poisson_ratio,
            min_thickness,
        })
    }

    /// 双轴模量 E / (1 - ν)
    pub fn biaxial_modulus(&self) -> f64 {
        self.modulus / (1.0 - self.poisson_ratio)
    }
}

/// 已解析的材料：力学常数 + 衰减表
///
/// 克隆只复制两个 `Arc`，层对象通过它引用（而非拥有）目录中的数据。
#[derive(Debug, Clone)]
pub struct MaterialRef {
    material: Arc<Material>,
    attenuation: Arc<AttenuationTable>,
}

impl MaterialRef {
    pub fn new(material: Arc<Material>, attenuation: Arc<AttenuationTable>) -> Self {
        Self {
            material,
            attenuation,
        }
    }

    pub fn name(&self) -> &str {
        &self.material.name
    }

    pub fn properties(&self) -> &Material {
        &self.material
    }

    pub fn attenuation(&self) -> &Arc<AttenuationTable> {
        &self.attenuation
    }
}

/// 材料目录
#[derive(Debug)]
pub struct MaterialCatalog {
    /// 按材料表顺序保存
    materials: Vec<Arc<Material>>,
    /// 名称 → 下标
    index: HashMap<String, usize>,
    /// 衰减数据目录（None 表示只使用手动注册的衰减表）
    xray_dir: Option<PathBuf>,
    /// 已加载的衰减表
    attenuation: Mutex<HashMap<String, Arc<AttenuationTable>>>,
}

impl MaterialCatalog {
    /// 材料表默认文件名
    pub const MATERIALS_FILE: &'static str = "materials.csv";
    /// 衰减数据默认子目录
    pub const XRAY_SUBDIR: &'static str = "xray";

    /// 由材料列表创建目录（名称必须唯一）
    pub fn from_materials(materials: Vec<Material>, xray_dir: Option<PathBuf>) -> Result<Self> {
        let mut index = HashMap::new();
        let mut stored = Vec::with_capacity(materials.len());

        for material in materials {
            if index.contains_key(&material.name) {
                return Err(XrwError::InvalidArgument(format!(
                    "Duplicate material '{}' in material table",
                    material.name
                )));
            }
            index.insert(material.name.clone(), stored.len());
            stored.push(Arc::new(material));
        }

        Ok(Self {
            materials: stored,
            index,
            xray_dir,
            attenuation: Mutex::new(HashMap::new()),
        })
    }

    /// 从材料表 CSV 加载目录
    pub fn load(path: &Path, xray_dir: Option<PathBuf>) -> Result<Self> {
        if !path.is_file() {
            return Err(XrwError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut materials = Vec::new();
        for record in rdr.deserialize::<MaterialRecord>() {
            let record = record.map_err(|e| XrwError::ParseError {
                format: "material CSV".to_string(),
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            materials.push(Material::new(
                record.name,
                record.youngs_modulus,
                record.ultimate_stress,
                record.poisson_ratio,
                record.min_thickness.unwrap_or(0.0),
            )?);
        }

        log::debug!(
            "Loaded {} materials from '{}'",
            materials.len(),
            path.display()
        );

        Self::from_materials(materials, xray_dir)
    }

    /// 按约定布局加载：`<dir>/materials.csv` 与 `<dir>/xray/`
    pub fn from_data_dir(dir: &Path) -> Result<Self> {
        Self::load(
            &dir.join(Self::MATERIALS_FILE),
            Some(dir.join(Self::XRAY_SUBDIR)),
        )
    }

    /// 所有材料（材料表顺序）
    pub fn materials(&self) -> impl Iterator<Item = &Arc<Material>> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// 按名称查找材料
    pub fn get(&self, name: &str) -> Result<Arc<Material>> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.materials[i]))
            .ok_or_else(|| XrwError::UnknownMaterial {
                name: name.to_string(),
            })
    }

    /// 手动注册衰减表（覆盖同名的已缓存表）
    #[cfg(test)]
    pub fn insert_attenuation(&self, table: AttenuationTable) -> Result<()> {
        let mut cache = self.lock_cache()?;
        cache.insert(table.material().to_string(), Arc::new(table));
        Ok(())
    }

    /// 获取材料的衰减表，首次使用时从 `<xray_dir>/<name>.csv` 加载
    pub fn attenuation(&self, name: &str) -> Result<Arc<AttenuationTable>> {
        let mut cache = self.lock_cache()?;
        if let Some(table) = cache.get(name) {
            return Ok(Arc::clone(table));
        }

        let path = match &self.xray_dir {
            Some(dir) => AttenuationTable::path_for(dir, name),
            None => {
                return Err(XrwError::FileNotFound {
                    path: format!("{}.csv", name),
                })
            }
        };

        let table = Arc::new(AttenuationTable::load(&path, name)?);
        log::debug!(
            "Loaded attenuation data for '{}' ({:.1} - {:.1} eV)",
            table.material(),
            table.energy_range().0,
            table.energy_range().1
        );
        cache.insert(name.to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// 解析材料名称为力学常数 + 衰减表
    pub fn resolve(&self, name: &str) -> Result<MaterialRef> {
        let material = self.get(name)?;
        let attenuation = self.attenuation(name)?;
        Ok(MaterialRef::new(material, attenuation))
    }

    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Arc<AttenuationTable>>>> {
        self.attenuation
            .lock()
            .map_err(|_| XrwError::Other("attenuation cache lock poisoned".to_string()))
    }
}
