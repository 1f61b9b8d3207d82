//! # optimize 子命令实现
//!
//! 用差分进化搜索窗口支撑结构的最优几何，并报告最优窗口的结构与透过率。
//!
//! ## 依赖关系
//! - 使用 `cli/optimize.rs` 定义的 OptimizeArgs
//! - 使用 `optimizer/` 进行优化
//! - 使用 `xray/export.rs` 导出谱

use super::{build_scenario, open_catalog, parse_pair, print_layers, print_transmission_summary};
use crate::cli::optimize::OptimizeArgs;
use crate::error::Result;
use crate::optimizer::{DesignOptimizer, EvolutionConfig, ParameterBounds};
use crate::utils::{output, progress};
use crate::xray::export;

/// 执行优化
pub fn execute(args: OptimizeArgs) -> Result<()> {
    output::print_header("X-Ray Window Geometry Optimization");

    let catalog = open_catalog(&args.data)?;
    let mut scenario = build_scenario(&args.window, &args.weighting)?;
    if let Some(bounds) = &args.bounds {
        scenario.bounds = Some(ParameterBounds::parse(bounds)?);
    }

    let config = EvolutionConfig {
        popsize: args.popsize,
        max_generations: args.max_generations,
        tol: args.tol,
        atol: args.atol,
        mutation: parse_pair(&args.mutation)?,
        recombination: args.recombination,
        seed: args.seed,
        jobs: args.jobs,
        show_progress: !args.no_progress,
    };

    let spinner = progress::create_spinner("Loading attenuation data...");
    let optimizer = DesignOptimizer::from_scenario(&catalog, &scenario, config);
    spinner.finish_and_clear();
    let optimizer = optimizer?;

    let topology = scenario.topology;
    output::print_info(&format!("Topology: {}", topology));
    let bounds = optimizer.bounds();
    for (i, name) in topology.parameter_names().iter().enumerate() {
        output::print_field(
            name,
            &format!(
                "{:.1} - {:.1} µm",
                bounds.lower()[i] * 1e6,
                bounds.upper()[i] * 1e6
            ),
        );
    }
    output::print_info(&format!("Objective: {}", optimizer.objective().weighting()));

    let result = optimizer.run(None)?;
    output::print_separator();

    if result.converged {
        output::print_success(&result.message);
    } else {
        output::print_warning(&result.message);
    }

    output::print_header("Optimal Geometry");
    for (name, value) in topology.parameter_names().iter().zip(result.params.iter()) {
        output::print_field(name, &format!("{:.2} µm", value * 1e6));
    }
    output::print_field("score", &format!("{:.6}", result.score));
    output::print_field("generations", &result.generations.to_string());
    output::print_field("evaluations", &result.evaluations.to_string());

    let evaluation = optimizer.objective().evaluate(&result.params)?;
    if !evaluation.is_feasible() {
        output::print_warning("No mechanically feasible design was found within the bounds");
        return Ok(());
    }

    let stack = optimizer.objective().design().build(&result.params)?;
    print_layers(&stack);
    print_transmission_summary(&stack)?;

    if let Some(path) = &args.output {
        let spectrum = stack.default_spectrum()?;
        export::to_csv(&spectrum, path)?;
        output::print_success(&format!("Spectrum saved to '{}'", path.display()));
    }

    Ok(())
}
