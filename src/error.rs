//! # 统一错误处理模块
//!
//! 定义 xraywin 的所有错误类型，使用 `thiserror` 派生。
//!
//! 机械失效（应力超过极限）不是错误，而是评估结果的一种，
//! 由优化器折算为最差得分。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// xraywin 统一错误类型
#[derive(Error, Debug)]
pub enum XrwError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误（加载失败）
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unknown material '{name}' (not in material table)")]
    UnknownMaterial { name: String },

    // ─────────────────────────────────────────────────────────────
    // 数值 / 物理模型错误
    // ─────────────────────────────────────────────────────────────
    #[error("Energy {energy} eV is outside the sampled range of '{material}' ({min} - {max} eV)")]
    OutOfRange {
        material: String,
        energy: f64,
        min: f64,
        max: f64,
    },

    #[error("Layer '{layer}': missing parameter '{parameter}'")]
    MissingParameter { layer: String, parameter: String },

    #[error("Layer '{layer}': invalid value {value} for '{parameter}'")]
    InvalidParameter {
        layer: String,
        parameter: String,
        value: f64,
    },

    #[error("Objective produced a non-finite score for parameters {params:?}")]
    NonFiniteScore { params: Vec<f64> },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl XrwError {
    /// 构造缺失参数错误
    pub fn missing(layer: &str, parameter: &str) -> Self {
        XrwError::MissingParameter {
            layer: layer.to_string(),
            parameter: parameter.to_string(),
        }
    }

    /// 构造非法参数错误
    pub fn invalid(layer: &str, parameter: &str, value: f64) -> Self {
        XrwError::InvalidParameter {
            layer: layer.to_string(),
            parameter: parameter.to_string(),
            value,
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, XrwError>;
