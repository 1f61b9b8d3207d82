//! # spectrum 子命令实现
//!
//! 按给定设计变量构造一个窗口，报告各层力学校核、特征线透过率和得分，
//! 可选导出完整透过率谱。
//!
//! ## 依赖关系
//! - 使用 `cli/spectrum.rs` 定义的 SpectrumArgs
//! - 使用 `optimizer/` 的 Scenario / Objective 构造与评估窗口
//! - 使用 `xray/export.rs` 导出谱

use super::{
    build_scenario, open_catalog, parse_list, parse_pair, print_layers,
    print_transmission_summary,
};
use crate::cli::spectrum::SpectrumArgs;
use crate::error::{Result, XrwError};
use crate::models::spectrum;
use crate::optimizer::{Evaluation, Objective};
use crate::utils::output;
use crate::xray::export;

/// 执行谱计算
pub fn execute(args: SpectrumArgs) -> Result<()> {
    output::print_header("X-Ray Window Transmission Spectrum");

    let catalog = open_catalog(&args.data)?;
    let scenario = build_scenario(&args.window, &args.weighting)?;
    let params = parse_list(&args.params)?;

    let topology = scenario.topology;
    if params.len() != topology.dim() {
        return Err(XrwError::InvalidArgument(format!(
            "{} window needs {} parameters ({}), got {}",
            topology,
            topology.dim(),
            topology.parameter_names().join(", "),
            params.len()
        )));
    }

    let (start, stop) = parse_pair(&args.range)?;
    let energies = spectrum::energy_grid(start, stop, args.step)?;

    let design = scenario.resolve(&catalog)?;
    let stack = design.build(&params)?;
    log::debug!("{}", stack);

    output::print_info(&format!("Topology: {}", topology));
    for (name, value) in topology.parameter_names().iter().zip(&params) {
        output::print_field(name, &format!("{:.2} µm", value * 1e6));
    }

    print_layers(&stack);
    print_transmission_summary(&stack)?;

    let objective = Objective::with_domain(design, scenario.weighting.clone(), &energies)?;
    match objective.evaluate(&params)? {
        Evaluation::Feasible { score } => {
            output::print_success(&format!(
                "Window holds {:.1} kPa; score {:.6} ({})",
                scenario.geometry.pressure / 1e3,
                -score,
                scenario.weighting
            ));
        }
        Evaluation::Infeasible { failed_layers } => {
            output::print_warning(&format!(
                "Window fails at {:.1} kPa: {}",
                scenario.geometry.pressure / 1e3,
                failed_layers.join(", ")
            ));
        }
    }

    if let Some(path) = &args.output {
        let spectrum = stack.spectrum(&energies)?;
        export::to_csv(&spectrum, path)?;
        output::print_success(&format!(
            "Spectrum ({} points) saved to '{}'",
            spectrum.len(),
            path.display()
        ));
    }

    Ok(())
}
