//! # 透过率谱
//!
//! 一组有序的 (能量, 透过率) 数据点，以及把谱归约为标量得分的两种方式：
//!
//! - 能带积分：对 `[min, max]` 内的采样点做 Simpson 积分
//! - 离散能量：在给定能量处插值透过率并**求和**（不是积分，也不按间距加权）
//!
//! ## 依赖关系
//! - 被 `mechanics/window.rs` 生成
//! - 被 `optimizer/objective.rs` 和 `xray/export.rs` 使用
//! - 使用 `utils/interp.rs` 插值

use crate::error::{Result, XrwError};
use crate::utils::interp;

/// 默认谱的能量范围（eV），左闭右开，步长 1 eV
pub const DEFAULT_ENERGY_START: f64 = 10.0;
pub const DEFAULT_ENERGY_STOP: f64 = 10_000.0;
pub const DEFAULT_ENERGY_STEP: f64 = 1.0;

/// 默认优化能量（eV）：Li, Be, B, C, N, O, F, Na, Si 的特征线附近
pub const OPTIMIZATION_ENERGIES: [f64; 9] =
    [54.3, 108.5, 183.3, 277.0, 392.4, 524.9, 676.8, 1041.0, 1740.0];

/// 常用轻元素 K 线能量（eV）
pub const REFERENCE_LINES: [(&str, f64); 7] = [
    ("Li", 54.33),
    ("Be", 108.5),
    ("B", 183.3),
    ("C", 277.0),
    ("N", 392.4),
    ("O", 524.9),
    ("Si", 1739.9),
];

/// 生成等间距能量网格 `[start, stop)`
pub fn energy_grid(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    if !(start.is_finite() && stop.is_finite() && step.is_finite()) || step <= 0.0 || stop <= start
    {
        return Err(XrwError::InvalidRange(format!(
            "{}-{} step {} (must be start < stop, step > 0)",
            start, stop, step
        )));
    }

    let n = ((stop - start) / step).ceil() as usize;
    Ok((0..n)
        .map(|i| start + i as f64 * step)
        .filter(|e| *e < stop)
        .collect())
}

/// 默认能量网格：10 eV 到 10 000 eV（不含），步长 1 eV
pub fn default_energies() -> Vec<f64> {
    (DEFAULT_ENERGY_START as usize..DEFAULT_ENERGY_STOP as usize)
        .map(|e| e as f64)
        .collect()
}

/// 谱 → 标量得分的归约方式
#[derive(Debug, Clone, PartialEq)]
pub enum EnergyWeighting {
    /// 对 `[min_energy, max_energy]` 内的采样点积分
    Band { min_energy: f64, max_energy: f64 },
    /// 在各能量处插值后求和
    Discrete(Vec<f64>),
}

impl Default for EnergyWeighting {
    fn default() -> Self {
        EnergyWeighting::Discrete(OPTIMIZATION_ENERGIES.to_vec())
    }
}

impl std::fmt::Display for EnergyWeighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnergyWeighting::Band {
                min_energy,
                max_energy,
            } => write!(f, "band integral {} - {} eV", min_energy, max_energy),
            EnergyWeighting::Discrete(energies) => {
                write!(f, "sum over {} energies", energies.len())
            }
        }
    }
}

/// 透过率谱
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    energies: Vec<f64>,
    transmissions: Vec<f64>,
}

impl Spectrum {
    /// 创建谱，能量须严格递增
    pub fn new(energies: Vec<f64>, transmissions: Vec<f64>) -> Result<Self> {
        if energies.len() != transmissions.len() {
            return Err(XrwError::InvalidArgument(format!(
                "spectrum has {} energies but {} transmissions",
                energies.len(),
                transmissions.len()
            )));
        }
        if !interp::is_strictly_increasing(&energies) {
            return Err(XrwError::InvalidArgument(
                "spectrum energies must be strictly increasing".to_string(),
            ));
        }

        Ok(Self {
            energies,
            transmissions,
        })
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    /// (能量, 透过率) 数据点
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.energies
            .iter()
            .copied()
            .zip(self.transmissions.iter().copied())
    }

    /// 谱上插值
    pub fn interpolate(&self, energy: f64) -> Result<f64> {
        interp::linear(&self.energies, &self.transmissions, energy).ok_or_else(|| {
            XrwError::OutOfRange {
                material: "spectrum".to_string(),
                energy,
                min: self.energies.first().copied().unwrap_or(f64::NAN),
                max: self.energies.last().copied().unwrap_or(f64::NAN),
            }
        })
    }

    /// 按归约方式计算得分
    pub fn integrate(&self, weighting: &EnergyWeighting) -> Result<f64> {
        match weighting {
            EnergyWeighting::Band {
                min_energy,
                max_energy,
            } => Ok(self.band_integral(*min_energy, *max_energy)),
            EnergyWeighting::Discrete(energies) => self.discrete_sum(energies),
        }
    }

    /// 对 `[min_energy, max_energy]` 内的采样点做 Simpson 积分
    pub fn band_integral(&self, min_energy: f64, max_energy: f64) -> f64 {
        let (e, t): (Vec<f64>, Vec<f64>) = self
            .points()
            .filter(|(e, _)| *e >= min_energy && *e <= max_energy)
            .unzip();

        simpson(&t, &e)
    }

    /// 各能量处插值透过率之和
    ///
    /// 注意这是求和而非积分：结果与能量个数成正比，与能带积分的单位不同。
    pub fn discrete_sum(&self, energies: &[f64]) -> Result<f64> {
        energies
            .iter()
            .map(|e| self.interpolate(*e))
            .sum::<Result<f64>>()
    }
}

/// 非等间距复合 Simpson 积分
///
/// 区间数为奇数时，最后一个区间使用 Cartwright 修正。
/// 少于两个点返回 0，两个点退化为梯形公式。
pub fn simpson(y: &[f64], x: &[f64]) -> f64 {
    let n = y.len().min(x.len());
    match n {
        0 | 1 => return 0.0,
        2 => return 0.5 * (x[1] - x[0]) * (y[0] + y[1]),
        _ => {}
    }

    // 偶数个区间覆盖到的最后一个点
    let even_end = if (n - 1) % 2 == 0 { n - 1 } else { n - 2 };

    let mut total = 0.0;
    let mut i = 0;
    while i + 2 <= even_end {
        let h0 = x[i + 1] - x[i];
        let h1 = x[i + 2] - x[i + 1];
        let hsum = h0 + h1;
        let hprod = h0 * h1;
        let h0_div_h1 = h0 / h1;
        total += hsum / 6.0
            * (y[i] * (2.0 - 1.0 / h0_div_h1)
                + y[i + 1] * (hsum * hsum / hprod)
                + y[i + 2] * (2.0 - h0_div_h1));
        i += 2;
    }

    if even_end != n - 1 {
        let h0 = x[n - 2] - x[n - 3];
        let h1 = x[n - 1] - x[n - 2];
        let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
        let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
        let eta = h1 * h1 * h1 / (6.0 * h0 * (h0 + h1));
        total += alpha * y[n - 1] + beta * y[n - 2] - eta * y[n - 3];
    }

    total
}
