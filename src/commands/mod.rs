//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑，以及各命令共用的参数解析与结果展示。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `models/`, `mechanics/`, `optimizer/`, `utils/`
//! - 子模块: optimize, spectrum, materials

pub mod materials;
pub mod optimize;
pub mod spectrum;

use crate::cli::{Commands, DataArgs, WeightingArgs, WindowArgs};
use crate::error::{Result, XrwError};
use crate::mechanics::window::format_thickness;
use crate::mechanics::{MechanicalLayer, WindowStack};
use crate::models::spectrum::REFERENCE_LINES;
use crate::models::{EnergyWeighting, MaterialCatalog};
use crate::optimizer::{AuxiliaryLayer, FixedGeometry, Scenario};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Optimize(args) => optimize::execute(args),
        Commands::Spectrum(args) => spectrum::execute(args),
        Commands::Materials(args) => materials::execute(args),
    }
}

// ─────────────────────────────────────────────────────────────
// 参数解析
// ─────────────────────────────────────────────────────────────

/// 打开材料库；衰减数据在首次使用时才加载
fn open_catalog(data: &DataArgs) -> Result<MaterialCatalog> {
    let catalog = match &data.materials {
        Some(path) => MaterialCatalog::load(
            path,
            Some(data.data_dir.join(MaterialCatalog::XRAY_SUBDIR)),
        )?,
        None => MaterialCatalog::from_data_dir(&data.data_dir)?,
    };
    log::info!("Loaded {} materials", catalog.len());
    Ok(catalog)
}

/// 由命令行参数构造优化场景（不含边界）
fn build_scenario(window: &WindowArgs, weighting: &WeightingArgs) -> Result<Scenario> {
    // 系数小于 1 时薄膜必然超限
    if !(window.membrane_margin >= 1.0) {
        return Err(XrwError::InvalidArgument(format!(
            "membrane margin {} must be at least 1",
            window.membrane_margin
        )));
    }
    if let Some(thickness) = window.membrane_thickness {
        if !(thickness.is_finite() && thickness > 0.0) {
            return Err(XrwError::InvalidArgument(format!(
                "membrane thickness {} must be positive",
                thickness
            )));
        }
    }

    let mut scenario = Scenario::new(window.topology.into());

    scenario.primary = window.primary.clone();
    scenario.secondary = window.secondary.clone();
    scenario.membrane = window.membrane.clone();
    scenario.light_block = (!window.no_light_block).then(|| AuxiliaryLayer {
        material: window.light_block_material.clone(),
        thickness: window.light_block_thickness,
    });
    scenario.gas_barrier = (!window.no_gas_barrier).then(|| AuxiliaryLayer {
        material: window.gas_barrier_material.clone(),
        thickness: window.gas_barrier_thickness,
    });
    scenario.geometry = FixedGeometry {
        primary_width: window.primary_width,
        primary_length: window.primary_length,
        primary_height: window.primary_height,
        secondary_height: window.secondary_height,
        pressure: window.pressure,
        membrane_margin: window.membrane_margin,
        membrane_thickness: window.membrane_thickness,
    };
    scenario.weighting = parse_weighting(weighting)?;

    Ok(scenario)
}

/// 解析能量权重：`--band` 或 `--energies`，都未给出时使用默认能量
fn parse_weighting(args: &WeightingArgs) -> Result<EnergyWeighting> {
    if let Some(band) = &args.band {
        let (min_energy, max_energy) = parse_pair(band)?;
        if min_energy < 0.0 || max_energy <= min_energy {
            return Err(XrwError::InvalidRange(format!(
                "{} (must be 0 <= min < max)",
                band
            )));
        }
        return Ok(EnergyWeighting::Band {
            min_energy,
            max_energy,
        });
    }

    match &args.energies {
        Some(list) => Ok(EnergyWeighting::Discrete(parse_list(list)?)),
        None => Ok(EnergyWeighting::default()),
    }
}

/// 解析 `"MIN-MAX"`
///
/// 分隔符是第一个不属于指数（`e-`/`E-`）的 `-`，因此 `5e-1-1.0` 也能解析。
fn parse_pair(range: &str) -> Result<(f64, f64)> {
    let bytes = range.as_bytes();
    let sep = (1..bytes.len())
        .find(|&i| bytes[i] == b'-' && !matches!(bytes[i - 1], b'e' | b'E'))
        .ok_or_else(|| XrwError::InvalidRange(range.to_string()))?;
    let (lo, hi) = (&range[..sep], &range[sep + 1..]);

    let lo: f64 = lo
        .trim()
        .parse()
        .map_err(|_| XrwError::InvalidRange(range.to_string()))?;
    let hi: f64 = hi
        .trim()
        .parse()
        .map_err(|_| XrwError::InvalidRange(range.to_string()))?;

    Ok((lo, hi))
}

/// 解析逗号分隔的数值列表
fn parse_list(list: &str) -> Result<Vec<f64>> {
    let values = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| XrwError::InvalidArgument(format!("'{}' is not a number", s)))
        })
        .collect::<Result<Vec<f64>>>()?;

    if values.is_empty() {
        return Err(XrwError::InvalidArgument(format!(
            "empty value list '{}'",
            list
        )));
    }
    Ok(values)
}

// ─────────────────────────────────────────────────────────────
// 结果展示
// ─────────────────────────────────────────────────────────────

/// 打印各层结构与力学校核
fn print_layers(stack: &WindowStack) {
    #[derive(Tabled)]
    struct LayerRow {
        #[tabled(rename = "Layer")]
        name: String,
        #[tabled(rename = "Type")]
        kind: String,
        #[tabled(rename = "Material")]
        material: String,
        #[tabled(rename = "Thickness")]
        thickness: String,
        #[tabled(rename = "Open area (%)")]
        open_area: String,
    }

    let rows: Vec<LayerRow> = stack
        .layers()
        .iter()
        .map(|l| LayerRow {
            name: l.name().to_string(),
            kind: l.kind().to_string(),
            material: l.material().name().to_string(),
            thickness: format_thickness(l.xray_thickness()).trim().to_string(),
            open_area: format!("{:.1}", l.open_area() * 100.0),
        })
        .collect();

    output::print_header(&format!("Window Layers ({})", stack.name()));
    println!("{}", Table::new(&rows));

    output::print_header("Mechanical Check");
    for layer in stack.layers() {
        log::debug!("{}", layer);
        if matches!(layer, MechanicalLayer::Film(_)) {
            continue;
        }
        output::print_layer_status(
            layer.name(),
            layer.max_stress() / 1e6,
            layer.material().properties().ultimate_stress / 1e6,
            layer.failure(),
        );
        match layer {
            MechanicalLayer::Beam(beam) => {
                output::print_field("max spacing", &format_limit(beam.calc_max_spacing()));
                output::print_field(
                    "max deflection",
                    &format!("{:.3} µm", beam.calc_max_deflection() * 1e6),
                );
            }
            MechanicalLayer::Membrane(membrane) => {
                output::print_field("max width", &format_limit(membrane.calc_max_width()));
            }
            MechanicalLayer::Film(_) => {}
        }
    }
}

/// 尺寸上限；不受压的层没有上限
fn format_limit(limit: Option<f64>) -> String {
    match limit {
        Some(value) => format!("{:.1} µm", value * 1e6),
        None => "unbounded".to_string(),
    }
}

/// 打印轻元素特征线处的透过率
fn print_transmission_summary(stack: &WindowStack) -> Result<()> {
    #[derive(Tabled)]
    struct LineRow {
        #[tabled(rename = "Line")]
        element: String,
        #[tabled(rename = "Energy (eV)")]
        energy: String,
        #[tabled(rename = "Transmission (%)")]
        transmission: String,
    }

    let rows = REFERENCE_LINES
        .iter()
        .map(|(element, energy)| {
            Ok(LineRow {
                element: element.to_string(),
                energy: format!("{:.1}", energy),
                transmission: format!("{:.2}", stack.transmission(*energy)? * 100.0),
            })
        })
        .collect::<Result<Vec<LineRow>>>()?;

    output::print_header("Transmission at Light-Element K Lines");
    println!("{}", Table::new(&rows));
    Ok(())
}
