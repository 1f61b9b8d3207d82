//! # materials 子命令实现
//!
//! 以表格列出材料库，可选加载各材料的衰减数据并显示能量范围。
//!
//! ## 依赖关系
//! - 使用 `cli/materials.rs` 定义的 MaterialsArgs
//! - 使用 `models/material.rs` 的 MaterialCatalog

use super::open_catalog;
use crate::cli::materials::MaterialsArgs;
use crate::error::Result;
use crate::mechanics::window::format_thickness;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 材料表格行
#[derive(Debug, Clone, Tabled)]
struct MaterialRow {
    #[tabled(rename = "Material")]
    name: String,
    #[tabled(rename = "E (GPa)")]
    modulus: String,
    #[tabled(rename = "σu (MPa)")]
    ultimate_stress: String,
    #[tabled(rename = "ν")]
    poisson_ratio: String,
    #[tabled(rename = "E/(1-ν) (GPa)")]
    biaxial_modulus: String,
    #[tabled(rename = "Min thickness")]
    min_thickness: String,
    #[tabled(rename = "X-ray data (eV)")]
    xray_range: String,
}

/// 执行材料列表
pub fn execute(args: MaterialsArgs) -> Result<()> {
    output::print_header("Material Catalog");

    let catalog = open_catalog(&args.data)?;
    if catalog.is_empty() {
        output::print_warning("Material table is empty");
        return Ok(());
    }

    let mut missing = 0;
    let rows: Vec<MaterialRow> = catalog
        .materials()
        .map(|m| {
            let xray_range = if args.attenuation {
                match catalog.attenuation(&m.name) {
                    Ok(table) => {
                        let (min, max) = table.energy_range();
                        let density = table
                            .density()
                            .map(|d| format!(", {:.0} kg/m³", d))
                            .unwrap_or_default();
                        format!(
                            "{:.0} - {:.0} @ {}{}",
                            min,
                            max,
                            format_thickness(table.reference_thickness()).trim(),
                            density
                        )
                    }
                    Err(e) => {
                        log::warn!("{}", e);
                        missing += 1;
                        "missing".to_string()
                    }
                }
            } else {
                "-".to_string()
            };

            MaterialRow {
                name: m.name.clone(),
                modulus: format!("{:.1}", m.modulus / 1e9),
                ultimate_stress: format!("{:.1}", m.ultimate_stress / 1e6),
                poisson_ratio: format!("{:.3}", m.poisson_ratio),
                biaxial_modulus: format!("{:.1}", m.biaxial_modulus() / 1e9),
                min_thickness: format_thickness(m.min_thickness).trim().to_string(),
                xray_range,
            }
        })
        .collect();

    println!("{}", Table::new(&rows));

    output::print_success(&format!("{} materials", catalog.len()));
    if missing > 0 {
        output::print_warning(&format!(
            "{} materials have no readable attenuation data",
            missing
        ));
    }

    Ok(())
}
