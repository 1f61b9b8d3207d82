//! # 设计变量与边界
//!
//! 优化器在单位超立方体 `[0, 1]^n` 中搜索，通过 `ParameterBounds`
//! 映射到物理参数。
//!
//! ## 依赖关系
//! - 被 `optimizer/evolution.rs`, `optimizer/design.rs` 使用
//! - 被 `cli/` 解析 `--bounds` 参数

use crate::error::{Result, XrwError};

use std::ops::Deref;

/// 一组设计变量（定长、有序）
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterVector(Vec<f64>);

impl ParameterVector {
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for ParameterVector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for ParameterVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// 每个设计变量的上下界
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ParameterBounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.is_empty() || lower.len() != upper.len() {
            return Err(XrwError::InvalidRange(format!(
                "{} lower bounds vs {} upper bounds",
                lower.len(),
                upper.len()
            )));
        }
        for (i, (lo, hi)) in lower.iter().zip(&upper).enumerate() {
            if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                return Err(XrwError::InvalidRange(format!(
                    "parameter {}: {}:{} (must be finite with lower <= upper)",
                    i, lo, hi
                )));
            }
        }

        Ok(Self { lower, upper })
    }

    /// 内置常量边界，跳过检查
    pub(super) fn from_parts(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self { lower, upper }
    }

    /// 解析 `"lo:hi,lo:hi,..."` 格式
    pub fn parse(input: &str) -> Result<Self> {
        let mut lower = Vec::new();
        let mut upper = Vec::new();

        for pair in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (lo, hi) = pair
                .split_once(':')
                .ok_or_else(|| XrwError::InvalidRange(pair.to_string()))?;
            lower.push(
                lo.trim()
                    .parse::<f64>()
                    .map_err(|_| XrwError::InvalidRange(pair.to_string()))?,
            );
            upper.push(
                hi.trim()
                    .parse::<f64>()
                    .map_err(|_| XrwError::InvalidRange(pair.to_string()))?,
            );
        }

        Self::new(lower, upper)
    }

    /// 设计变量个数
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// 单位坐标 → 物理参数
    pub fn scale(&self, unit: &[f64]) -> ParameterVector {
        unit.iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(u, (lo, hi))| lo + u * (hi - lo))
            .collect::<Vec<f64>>()
            .into()
    }

    /// 参数是否在边界内
    pub fn contains(&self, params: &[f64]) -> bool {
        params.len() == self.dim()
            && params
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(p, (lo, hi))| *p >= *lo && *p <= *hi)
    }
}

impl std::fmt::Display for ParameterBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pairs: Vec<String> = self
            .lower
            .iter()
            .zip(&self.upper)
            .map(|(lo, hi)| format!("{:e}:{:e}", lo, hi))
            .collect();
        write!(f, "{}", pairs.join(","))
    }
}
