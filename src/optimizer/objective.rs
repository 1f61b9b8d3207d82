//! # 目标函数
//!
//! 设计变量 → 标量得分（越小越好）。
//!
//! ## 评估流程
//! 1. `WindowDesign::build` 构造窗口
//! 2. 任一层失效 → 得分 `INFEASIBLE_SCORE`（0，即“无透过”）
//! 3. 否则计算谱并按 `EnergyWeighting` 归约，取负号
//!
//! 离散能量模式只需要每个目标能量两侧相邻的采样点，因此只在这些点上
//! 计算透过率；结果与在完整能量网格上插值完全一致。
//!
//! ## 依赖关系
//! - 被 `optimizer/evolution.rs` 调用
//! - 使用 `optimizer/design.rs` 构造窗口
//! - 使用 `models/spectrum.rs` 归约

use super::design::WindowDesign;
use crate::error::{Result, XrwError};
use crate::models::spectrum::{self, EnergyWeighting};
use crate::utils::interp;

/// 不可行设计的得分
pub const INFEASIBLE_SCORE: f64 = 0.0;

/// 单次评估结果
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// 所有层都能承受压力
    Feasible { score: f64 },
    /// 有层失效
    Infeasible { failed_layers: Vec<String> },
}

impl Evaluation {
    /// 供优化器比较的得分
    pub fn score(&self) -> f64 {
        match self {
            Evaluation::Feasible { score } => *score,
            Evaluation::Infeasible { .. } => INFEASIBLE_SCORE,
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, Evaluation::Feasible { .. })
    }
}

/// 目标函数：窗口设计 + 能量归约方式 + 能量网格
#[derive(Debug, Clone)]
pub struct Objective {
    design: WindowDesign,
    weighting: EnergyWeighting,
    /// 实际需要计算透过率的能量
    samples: Vec<f64>,
}

impl Objective {
    /// 在默认能量网格（10 - 9999 eV）上构造
    pub fn new(design: WindowDesign, weighting: EnergyWeighting) -> Result<Self> {
        Self::with_domain(design, weighting, &spectrum::default_energies())
    }

    /// 在指定能量网格上构造，网格须严格递增
    pub fn with_domain(
        design: WindowDesign,
        weighting: EnergyWeighting,
        domain: &[f64],
    ) -> Result<Self> {
        if !interp::is_strictly_increasing(domain) {
            return Err(XrwError::InvalidArgument(
                "energy domain must be strictly increasing".to_string(),
            ));
        }

        let samples = match &weighting {
            EnergyWeighting::Band {
                min_energy,
                max_energy,
            } => {
                if !(min_energy <= max_energy) {
                    return Err(XrwError::InvalidRange(format!(
                        "{}-{} eV",
                        min_energy, max_energy
                    )));
                }
                domain
                    .iter()
                    .copied()
                    .filter(|e| *e >= *min_energy && *e <= *max_energy)
                    .collect()
            }
            EnergyWeighting::Discrete(energies) => bracketing_samples(domain, energies)?,
        };

        Ok(Self {
            design,
            weighting,
            samples,
        })
    }

    pub fn design(&self) -> &WindowDesign {
        &self.design
    }

    pub fn weighting(&self) -> &EnergyWeighting {
        &self.weighting
    }

    /// 设计变量个数
    pub fn dim(&self) -> usize {
        self.design.topology().dim()
    }

    /// 评估一组设计变量
    pub fn evaluate(&self, params: &[f64]) -> Result<Evaluation> {
        let stack = self.design.build(params)?;
        if !stack.is_feasible() {
            return Ok(Evaluation::Infeasible {
                failed_layers: stack
                    .failed_layers()
                    .iter()
                    .map(|l| l.name().to_string())
                    .collect(),
            });
        }

        let score = -stack.spectrum(&self.samples)?.integrate(&self.weighting)?;
        if !score.is_finite() {
            return Err(XrwError::NonFiniteScore {
                params: params.to_vec(),
            });
        }

        Ok(Evaluation::Feasible { score })
    }

    /// 只返回得分
    pub fn score(&self, params: &[f64]) -> Result<f64> {
        Ok(self.evaluate(params)?.score())
    }
}

/// 每个目标能量两侧相邻的网格点（去重、递增）
fn bracketing_samples(domain: &[f64], energies: &[f64]) -> Result<Vec<f64>> {
    let (min, max) = match (domain.first(), domain.last()) {
        (Some(min), Some(max)) => (*min, *max),
        _ => {
            return Err(XrwError::InvalidArgument(
                "energy domain is empty".to_string(),
            ))
        }
    };

    let mut indices = Vec::with_capacity(energies.len() * 2);
    for &energy in energies {
        if !(energy >= min && energy <= max) {
            return Err(XrwError::OutOfRange {
                material: "spectrum".to_string(),
                energy,
                min,
                max,
            });
        }
        let upper = domain.partition_point(|e| *e <= energy);
        indices.push(upper - 1);
        if upper < domain.len() {
            indices.push(upper);
        }
    }

    indices.sort_unstable();
    indices.dedup();
    Ok(indices.into_iter().map(|i| domain[i]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanics::tests::{material_ref, polymer, silicon};
    use crate::models::spectrum::OPTIMIZATION_ENERGIES;
    use approx::assert_relative_eq;

    fn design() -> WindowDesign {
        WindowDesign::two_layer(silicon(), polymer())
    }

    #[test]
    fn test_infeasible_scores_zero() {
        let weak = WindowDesign::two_layer(material_ref("weak", 150e9, 100e6, 0.17, 0.0), polymer());
        let objective = Objective::new(weak, EnergyWeighting::default()).unwrap();

        let evaluation = objective.evaluate(&[2000e-6]).unwrap();
        assert_eq!(evaluation.score(), INFEASIBLE_SCORE);
        assert_eq!(
            evaluation,
            Evaluation::Infeasible {
                failed_layers: vec!["Primary".to_string()]
            }
        );
    }

    #[test]
    fn test_feasible_scores_below_infeasible() {
        let objective = Objective::new(design(), EnergyWeighting::default()).unwrap();
        let evaluation = objective.evaluate(&[190e-6]).unwrap();
        assert!(evaluation.is_feasible());
        assert!(evaluation.score() < INFEASIBLE_SCORE);
    }

    #[test]
    fn test_discrete_matches_full_spectrum() {
        let energies = vec![54.3, 108.5, 277.0, 1740.0, 10.0, 9999.0];
        let weighting = EnergyWeighting::Discrete(energies);
        let objective = Objective::new(design(), weighting.clone()).unwrap();

        let stack = design().build(&[190e-6]).unwrap();
        let expected = -stack.default_spectrum().unwrap().integrate(&weighting).unwrap();
        assert_relative_eq!(objective.score(&[190e-6]).unwrap(), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_band_matches_full_spectrum() {
        let weighting = EnergyWeighting::Band {
            min_energy: 100.0,
            max_energy: 2000.0,
        };
        let objective = Objective::new(design(), weighting.clone()).unwrap();

        let stack = design().build(&[300e-6]).unwrap();
        let expected = -stack.default_spectrum().unwrap().integrate(&weighting).unwrap();
        assert_relative_eq!(objective.score(&[300e-6]).unwrap(), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_wider_spacing_transmits_more_while_feasible() {
        let objective = Objective::new(design(), EnergyWeighting::default()).unwrap();
        let narrow = objective.score(&[150e-6]).unwrap();
        let wide = objective.score(&[400e-6]).unwrap();
        assert!(wide < narrow);
    }

    #[test]
    fn test_bracketing_samples() {
        let domain: Vec<f64> = (10..20).map(|e| e as f64).collect();
        assert_eq!(bracketing_samples(&domain, &[12.5]).unwrap(), vec![12.0, 13.0]);
        assert_eq!(bracketing_samples(&domain, &[12.0]).unwrap(), vec![12.0, 13.0]);
        assert_eq!(bracketing_samples(&domain, &[19.0]).unwrap(), vec![19.0]);
        assert_eq!(
            bracketing_samples(&domain, &[12.5, 12.2]).unwrap(),
            vec![12.0, 13.0]
        );
        assert!(matches!(
            bracketing_samples(&domain, &[25.0]),
            Err(XrwError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_energy_outside_domain_fails_construction() {
        let weighting = EnergyWeighting::Discrete(vec![5.0]);
        assert!(Objective::new(design(), weighting).is_err());

        let inverted = EnergyWeighting::Band {
            min_energy: 500.0,
            max_energy: 100.0,
        };
        assert!(Objective::new(design(), inverted).is_err());
    }

    #[test]
    fn test_default_energies_are_inside_domain() {
        let weighting = EnergyWeighting::Discrete(OPTIMIZATION_ENERGIES.to_vec());
        assert!(Objective::new(design(), weighting).is_ok());
    }
}
