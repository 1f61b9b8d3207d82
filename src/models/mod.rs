//! # 数据模型模块
//!
//! 定义材料、材料目录与透过率谱。
//!
//! ## 依赖关系
//! - 被 `mechanics/`, `optimizer/` 和 `commands/` 使用
//! - 子模块: material, spectrum

pub mod material;
pub mod spectrum;

pub use material::{Material, MaterialCatalog, MaterialRef};
pub use spectrum::{EnergyWeighting, Spectrum};
