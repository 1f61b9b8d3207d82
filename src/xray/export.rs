//! # 透过率谱导出
//!
//! 导出谱数据到 CSV（`Energy,Transmission` 两列，与衰减表列名一致）。
//!
//! ## 依赖关系
//! - 被 `commands/spectrum.rs` 和 `commands/optimize.rs` 调用
//! - 使用 `models/spectrum.rs` 的 Spectrum 结构
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{Result, XrwError};
use crate::models::Spectrum;

use std::path::Path;

/// 导出谱为 CSV 格式
pub fn to_csv(spectrum: &Spectrum, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["Energy", "Transmission"])?;

    for (energy, transmission) in spectrum.points() {
        wtr.write_record(&[format!("{}", energy), format!("{:.8e}", transmission)])?;
    }

    wtr.flush().map_err(|e| XrwError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
