//! # 窗口几何优化
//!
//! 在给定边界内寻找透过率得分最高、且所有层都能承受设计压力的几何参数。
//!
//! ## 流程
//! ```text
//! Scenario ──resolve(catalog)──► WindowDesign ──► Objective
//!                                                    │
//!                 DifferentialEvolution ◄────────────┘
//!                         │
//!                         ▼
//!                 OptimizationResult
//! ```
//!
//! 力学失效不是错误：失效的设计得分为 0（无透过），由优化器自然淘汰。
//!
//! ## 子模块
//! - `params`: 设计变量与边界
//! - `design`: 拓扑 → WindowStack
//! - `objective`: 得分函数
//! - `evolution`: 差分进化
//!
//! ## 依赖关系
//! - 被 `commands/optimize.rs` 使用
//! - 使用 `mechanics/` 和 `models/`

pub mod design;
pub mod evolution;
pub mod objective;
pub mod params;

pub use design::{FixedGeometry, Topology, WindowDesign};
pub use evolution::{DifferentialEvolution, EvolutionConfig};
pub use objective::{Evaluation, Objective, INFEASIBLE_SCORE};
pub use params::{ParameterBounds, ParameterVector};

use crate::error::{Result, XrwError};
use crate::models::{EnergyWeighting, MaterialCatalog};

use std::sync::atomic::AtomicBool;

/// 优化结果
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// 最优设计变量（物理单位）
    pub params: ParameterVector,
    /// 最优得分（负的透过率得分）
    pub score: f64,
    /// 实际运行的代数
    pub generations: usize,
    /// 目标函数评估次数
    pub evaluations: usize,
    /// 是否满足收敛判据
    pub converged: bool,
    pub message: String,
}

/// 辅助薄层：材料名 + 厚度（m）
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliaryLayer {
    pub material: String,
    pub thickness: f64,
}

/// 以材料名描述的优化场景
#[derive(Debug, Clone)]
pub struct Scenario {
    pub topology: Topology,
    pub primary: String,
    /// 三层拓扑的次肋材料，未设置时与主肋相同
    pub secondary: Option<String>,
    pub membrane: String,
    pub light_block: Option<AuxiliaryLayer>,
    pub gas_barrier: Option<AuxiliaryLayer>,
    pub geometry: FixedGeometry,
    /// 未设置时使用拓扑的默认边界
    pub bounds: Option<ParameterBounds>,
    pub weighting: EnergyWeighting,
}

impl Scenario {
    /// 默认场景：硅主肋 + 聚合物薄膜，带遮光层与阻气层
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            primary: "silicon".to_string(),
            secondary: None,
            membrane: "polymer".to_string(),
            light_block: Some(AuxiliaryLayer {
                material: design::LIGHT_BLOCK_MATERIAL.to_string(),
                thickness: design::LIGHT_BLOCK_THICKNESS,
            }),
            gas_barrier: Some(AuxiliaryLayer {
                material: design::GAS_BARRIER_MATERIAL.to_string(),
                thickness: design::GAS_BARRIER_THICKNESS,
            }),
            geometry: FixedGeometry::default(),
            bounds: None,
            weighting: EnergyWeighting::default(),
        }
    }

    /// 实际使用的搜索边界
    pub fn bounds(&self) -> Result<ParameterBounds> {
        let bounds = self
            .bounds
            .clone()
            .unwrap_or_else(|| self.topology.default_bounds());
        if bounds.dim() != self.topology.dim() {
            return Err(XrwError::InvalidArgument(format!(
                "{} window has {} free parameters but {} bounds were given",
                self.topology,
                self.topology.dim(),
                bounds.dim()
            )));
        }
        Ok(bounds)
    }

    /// 从材料库解析材料，构造窗口设计
    pub fn resolve(&self, catalog: &MaterialCatalog) -> Result<WindowDesign> {
        let primary = catalog.resolve(&self.primary)?;
        let membrane = catalog.resolve(&self.membrane)?;

        let mut design = match self.topology {
            Topology::TwoLayer => WindowDesign::two_layer(primary, membrane),
            Topology::ThreeLayer => {
                let secondary = match &self.secondary {
                    Some(name) => catalog.resolve(name)?,
                    None => primary.clone(),
                };
                WindowDesign::three_layer(primary, secondary, membrane)
            }
        };

        if let Some(layer) = &self.light_block {
            design = design.with_light_block(catalog.resolve(&layer.material)?, layer.thickness);
        }
        if let Some(layer) = &self.gas_barrier {
            design = design.with_gas_barrier(catalog.resolve(&layer.material)?, layer.thickness);
        }

        Ok(design.with_geometry(self.geometry))
    }
}

/// 窗口设计优化器
pub struct DesignOptimizer {
    objective: Objective,
    bounds: ParameterBounds,
    engine: DifferentialEvolution,
}

impl DesignOptimizer {
    pub fn new(objective: Objective, bounds: ParameterBounds, config: EvolutionConfig) -> Result<Self> {
        if bounds.dim() != objective.dim() {
            return Err(XrwError::InvalidArgument(format!(
                "objective takes {} parameters but {} bounds were given",
                objective.dim(),
                bounds.dim()
            )));
        }

        Ok(Self {
            objective,
            bounds,
            engine: DifferentialEvolution::new(config)?.with_penalty(INFEASIBLE_SCORE),
        })
    }

    /// 从场景直接构造：解析材料（首次使用时加载衰减数据）并建立目标函数
    pub fn from_scenario(
        catalog: &MaterialCatalog,
        scenario: &Scenario,
        config: EvolutionConfig,
    ) -> Result<Self> {
        let design = scenario.resolve(catalog)?;
        log::debug!(
            "resolved materials: {}",
            design
                .materials()
                .iter()
                .map(|m| m.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let objective = Objective::new(design, scenario.weighting.clone())?;
        Self::new(objective, scenario.bounds()?, config)
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn bounds(&self) -> &ParameterBounds {
        &self.bounds
    }

    /// 运行优化，`cancel` 置位后在下一代开始前停止
    pub fn run(&self, cancel: Option<&AtomicBool>) -> Result<OptimizationResult> {
        log::info!(
            "optimizing {} window over {} ({})",
            self.objective.design().topology(),
            self.bounds,
            self.objective.weighting()
        );

        self.engine
            .minimize(&self.bounds, |p| self.objective.score(p), cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanics::tests::synthetic_attenuation;
    use crate::mechanics::MechanicalLayer;
    use crate::models::Material;
    use approx::assert_relative_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// 合成材料库：衰减系数各不相同
    fn catalog() -> MaterialCatalog {
        let materials = vec![
            Material::new("silicon", 150e9, 7e9, 0.17, 0.0).unwrap(),
            Material::new("polymer", 3e9, 200e6, 0.35, 20e-9).unwrap(),
            Material::new("aluminum", 70e9, 300e6, 0.33, 0.0).unwrap(),
            Material::new("boron", 400e9, 3e9, 0.2, 0.0).unwrap(),
        ];
        let catalog = MaterialCatalog::from_materials(materials, None).unwrap();
        for (name, k) in [("silicon", 0.5), ("polymer", 0.3), ("aluminum", 0.8), ("boron", 0.4)] {
            catalog.insert_attenuation(synthetic_attenuation(name, k)).unwrap();
        }
        catalog
    }

    fn quick_config() -> EvolutionConfig {
        EvolutionConfig {
            popsize: 8,
            max_generations: 60,
            seed: Some(42),
            jobs: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_scenario_resolves_materials() {
        let design = Scenario::new(Topology::ThreeLayer).resolve(&catalog()).unwrap();
        let names: Vec<&str> = design.materials().iter().map(|m| m.name()).collect();
        assert_eq!(names, ["silicon", "silicon", "polymer", "aluminum", "boron"]);
    }

    #[test]
    fn test_unknown_material() {
        let mut scenario = Scenario::new(Topology::TwoLayer);
        scenario.membrane = "unobtainium".to_string();
        assert!(matches!(
            scenario.resolve(&catalog()),
            Err(XrwError::UnknownMaterial { .. })
        ));
    }

    #[test]
    fn test_bounds_dimension_checked() {
        let mut scenario = Scenario::new(Topology::ThreeLayer);
        scenario.bounds = Some(ParameterBounds::parse("1e-4:2e-3").unwrap());
        assert!(scenario.bounds().is_err());
        assert!(DesignOptimizer::from_scenario(&catalog(), &scenario, quick_config()).is_err());
    }

    #[test]
    fn test_two_layer_optimization() {
        let scenario = Scenario::new(Topology::TwoLayer);
        let optimizer = DesignOptimizer::from_scenario(&catalog(), &scenario, quick_config()).unwrap();
        let result = optimizer.run(None).unwrap();

        assert!(optimizer.bounds().contains(&result.params));
        assert!(result.score < INFEASIBLE_SCORE);

        // 报告的得分与重新评估一致，且设计可行
        let evaluation = optimizer.objective().evaluate(&result.params).unwrap();
        assert!(evaluation.is_feasible());
        assert_relative_eq!(evaluation.score(), result.score, max_relative = 1e-12);

        // 不差于搜索区间内的一个普通可行点
        assert!(result.score <= optimizer.objective().score(&[190e-6]).unwrap());
    }

    /// 弱主肋：只有约 186 µm 以下的间距可行，初始种群可能全部不可行
    #[test]
    fn test_narrow_feasible_region_is_found() {
        let catalog = catalog();
        let weak = Material::new("weak", 150e9, 300e6, 0.17, 0.0).unwrap();
        let catalog = MaterialCatalog::from_materials(
            catalog.materials().map(|m| (**m).clone()).chain([weak]).collect(),
            None,
        )
        .unwrap();
        for (name, k) in [
            ("weak", 0.5),
            ("polymer", 0.3),
            ("aluminum", 0.8),
            ("boron", 0.4),
        ] {
            catalog.insert_attenuation(synthetic_attenuation(name, k)).unwrap();
        }

        let mut scenario = Scenario::new(Topology::TwoLayer);
        scenario.primary = "weak".to_string();

        for seed in 0..10 {
            let config = EvolutionConfig {
                seed: Some(seed),
                jobs: 2,
                ..Default::default()
            };
            let optimizer = DesignOptimizer::from_scenario(&catalog, &scenario, config).unwrap();
            let result = optimizer.run(None).unwrap();

            assert!(result.score < INFEASIBLE_SCORE, "seed {}: {}", seed, result.message);
            assert!(optimizer.objective().evaluate(&result.params).unwrap().is_feasible());
            assert!(result.params[0] < 187e-6);
        }
    }

    #[test]
    fn test_three_layer_optimization_is_feasible() {
        let scenario = Scenario::new(Topology::ThreeLayer);
        let optimizer = DesignOptimizer::from_scenario(&catalog(), &scenario, quick_config()).unwrap();
        let result = optimizer.run(None).unwrap();

        assert_eq!(result.params.len(), 3);
        assert!(optimizer.bounds().contains(&result.params));
        assert!(optimizer.objective().evaluate(&result.params).unwrap().is_feasible());
    }

    /// 在 `dir` 下写入 AP3 窗口用到的材料表与衰减表
    ///
    /// 衰减表只覆盖 250 - 300 eV，277 eV 落在 270 与 280 两个采样点之间。
    fn write_ap3_data(dir: &Path) {
        fs::write(
            dir.join(MaterialCatalog::MATERIALS_FILE),
            "name,youngs_modulus,ultimate_stress,poisson_ratio,min_thickness\n\
             silicon,150e9,7e9,0.17,\n\
             polymer,3e9,200e6,0.35,20e-9\n\
             aluminum,70e9,300e6,0.33,\n\
             boron,400e9,3e9,0.2,\n",
        )
        .unwrap();

        let xray = dir.join(MaterialCatalog::XRAY_SUBDIR);
        fs::create_dir_all(&xray).unwrap();
        let tables = [
            ("silicon", "1e-6", [0.40, 0.45, 0.47, 0.50]),
            ("polymer", "1e-6", [0.30, 0.33, 0.35, 0.38]),
            ("aluminum", "1e-7", [0.60, 0.64, 0.66, 0.70]),
            ("boron", "1e-7", [0.50, 0.55, 0.57, 0.60]),
        ];
        for (name, thickness, transmissions) in tables {
            let mut csv = String::from("Energy,Transmission,Thickness,Density\n");
            for (energy, t) in [250, 270, 280, 300].iter().zip(transmissions) {
                csv.push_str(&format!("{},{},{},\n", energy, t, thickness));
            }
            fs::write(xray.join(format!("{}.csv", name)), csv).unwrap();
        }
    }

    /// 回归：AP3 窗口（190 µm 间距硅主肋、300 nm 聚合物膜、30 nm Al、20 nm B）
    /// 在 277 eV 的透过率
    #[test]
    fn test_ap3_reference_point() {
        let dir = TempDir::new().unwrap();
        write_ap3_data(dir.path());
        let catalog = MaterialCatalog::from_data_dir(dir.path()).unwrap();

        let mut scenario = Scenario::new(Topology::TwoLayer);
        scenario.geometry.membrane_thickness = Some(300e-9);
        let stack = scenario.resolve(&catalog).unwrap().build(&[190e-6]).unwrap();

        assert!(stack.is_feasible());
        let MechanicalLayer::Membrane(membrane) = &stack.layers()[1] else {
            panic!("expected membrane");
        };
        assert_eq!(membrane.thickness(), 300e-9);

        // 0.76 (肋间开口) × 0.72605 (膜) × 0.88039 (Al) × 0.89178 (B)
        assert_relative_eq!(
            stack.transmission(277.0).unwrap(),
            0.43322176794437317,
            max_relative = 1e-9
        );

        // 衰减表之外没有外推
        assert!(matches!(
            stack.transmission(500.0),
            Err(XrwError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_cancelled_run_returns_best_so_far() {
        let scenario = Scenario::new(Topology::TwoLayer);
        let optimizer = DesignOptimizer::from_scenario(&catalog(), &scenario, quick_config()).unwrap();
        let cancel = AtomicBool::new(true);
        let result = optimizer.run(Some(&cancel)).unwrap();

        assert!(!result.converged);
        assert_eq!(result.generations, 0);
        assert!(optimizer.bounds().contains(&result.params));
    }
}
