//! # X 射线模块
//!
//! 材料衰减数据与透过率谱导出。
//!
//! ## 子模块
//! - `attenuation`: 衰减表加载与厚度换算
//! - `export`: 谱数据导出
//!
//! ## 依赖关系
//! - 被 `models/material.rs`, `mechanics/` 和 `commands/` 使用

pub mod attenuation;
pub mod export;

pub use attenuation::AttenuationTable;
