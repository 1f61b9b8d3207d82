//! # 差分进化
//!
//! 有界、无梯度的全局最小化。
//!
//! ## 算法
//! - 策略 `best/1/bin`：`trial = best + F · (x_r1 - x_r2)`，二项交叉
//! - 变异系数 `F` 每代在 `mutation` 区间内抖动
//! - 拉丁超立方初始化，全部在单位超立方体内进行
//! - 越界分量重新均匀抽样
//! - 延迟更新：一代内所有试验向量并行评估，评估完成后统一选择
//! - 收敛：`std(scores) <= atol + tol · |mean(scores)|`
//! - 设置了惩罚得分时，最优个体仍处于惩罚平台上就不算收敛，
//!   且该代改为在整个区域内均匀抽样（平台上的差分向量不含任何信息）
//!
//! ## 依赖关系
//! - 被 `optimizer/mod.rs` 的 DesignOptimizer 调用
//! - 使用 `rayon` 线程池并行评估
//! - 使用 `rand` 生成随机数，`utils/progress.rs` 显示进度

use super::params::ParameterBounds;
use super::OptimizationResult;
use crate::error::{Result, XrwError};
use crate::utils::progress;

use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// 差分进化参数
#[derive(Debug, Clone)]
pub struct EvolutionConfig {
    /// 种群规模 = popsize × 维数（至少 5）
    pub popsize: usize,
    pub max_generations: usize,
    /// 相对收敛容差
    pub tol: f64,
    /// 绝对收敛容差
    pub atol: f64,
    /// 变异系数抖动区间
    pub mutation: (f64, f64),
    /// 交叉概率
    pub recombination: f64,
    /// 随机种子，未设置时使用系统熵
    pub seed: Option<u64>,
    /// 并行线程数，0 表示使用全部 CPU
    pub jobs: usize,
    /// 是否显示进度条
    pub show_progress: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            popsize: 15,
            max_generations: 1000,
            tol: 0.01,
            atol: 0.0,
            mutation: (0.5, 1.0),
            recombination: 0.7,
            seed: None,
            jobs: 0,
            show_progress: false,
        }
    }
}

impl EvolutionConfig {
    /// 检查参数取值
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = self.mutation;
        if !(0.0..=2.0).contains(&lo) || !(0.0..=2.0).contains(&hi) || lo > hi {
            return Err(XrwError::InvalidArgument(format!(
                "mutation must satisfy 0 <= lo <= hi <= 2, got {}-{}",
                lo, hi
            )));
        }
        if !(0.0..=1.0).contains(&self.recombination) {
            return Err(XrwError::InvalidArgument(format!(
                "recombination must be within [0, 1], got {}",
                self.recombination
            )));
        }
        if self.popsize == 0 {
            return Err(XrwError::InvalidArgument(
                "popsize must be at least 1".to_string(),
            ));
        }
        if !(self.tol >= 0.0 && self.atol >= 0.0) {
            return Err(XrwError::InvalidArgument(format!(
                "tolerances must be non-negative, got tol={} atol={}",
                self.tol, self.atol
            )));
        }
        Ok(())
    }
}

/// 差分进化最小化器
pub struct DifferentialEvolution {
    config: EvolutionConfig,
    /// 不可行解的得分；得分不低于它的个体视为不可行
    penalty: Option<f64>,
}

impl DifferentialEvolution {
    pub fn new(config: EvolutionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            penalty: None,
        })
    }

    /// 声明目标函数用 `score` 表示不可行解
    pub fn with_penalty(mut self, score: f64) -> Self {
        self.penalty = Some(score);
        self
    }

    fn is_infeasible(&self, score: f64) -> bool {
        self.penalty.map_or(false, |penalty| score >= penalty)
    }

    /// 在 `bounds` 内最小化 `objective`
    ///
    /// 任一次评估出错即终止整个运行；`cancel` 在每代之间检查，
    /// 被取消时返回当前最优解且 `converged = false`。
    pub fn minimize<F>(
        &self,
        bounds: &ParameterBounds,
        objective: F,
        cancel: Option<&AtomicBool>,
    ) -> Result<OptimizationResult>
    where
        F: Fn(&[f64]) -> Result<f64> + Sync + Send,
    {
        let config = &self.config;
        let dim = bounds.dim();
        let np = (config.popsize * dim).max(5);
        let jobs = if config.jobs == 0 {
            num_cpus::get()
        } else {
            config.jobs
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| XrwError::Other(format!("failed to build thread pool: {}", e)))?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let evaluate = |members: &[Vec<f64>]| -> Result<Vec<f64>> {
            pool.install(|| {
                members
                    .par_iter()
                    .map(|unit| {
                        let params = bounds.scale(unit);
                        let score = objective(&params)?;
                        if score.is_finite() {
                            Ok(score)
                        } else {
                            Err(XrwError::NonFiniteScore {
                                params: params.into_inner(),
                            })
                        }
                    })
                    .collect()
            })
        };

        log::debug!(
            "differential evolution: dim={}, population={}, threads={}",
            dim,
            np,
            jobs
        );

        let mut population = latin_hypercube(np, dim, &mut rng);
        let mut scores = evaluate(&population)?;
        let mut evaluations = np;
        let mut best = argmin(&scores);

        let pb = if config.show_progress {
            progress::create_progress_bar(config.max_generations as u64, "Evolving")
        } else {
            ProgressBar::hidden()
        };

        let mut generations = 0;
        let mut converged = false;
        let mut message = format!(
            "maximum number of generations ({}) reached",
            config.max_generations
        );

        while generations < config.max_generations {
            if cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
                message = format!("cancelled after {} generations", generations);
                log::info!("{}", message);
                break;
            }

            let factor = rng.gen_range(config.mutation.0..=config.mutation.1);
            let exploring = self.is_infeasible(scores[best]);
            let trials: Vec<Vec<f64>> = (0..np)
                .map(|i| {
                    if exploring {
                        (0..dim).map(|_| rng.gen::<f64>()).collect()
                    } else {
                        self.trial(&population, i, best, factor, &mut rng)
                    }
                })
                .collect();

            let trial_scores = evaluate(&trials)?;
            evaluations += np;
            generations += 1;

            for (i, (trial, score)) in trials.into_iter().zip(trial_scores).enumerate() {
                if score <= scores[i] {
                    population[i] = trial;
                    scores[i] = score;
                }
            }
            best = argmin(&scores);

            let (mean, std) = mean_std(&scores);
            log::debug!(
                "generation {}: best={:.6}, mean={:.6}, std={:.3e}",
                generations,
                scores[best],
                mean,
                std
            );
            pb.set_message(format!("best {:.4}", scores[best]));
            pb.inc(1);

            let settled = std <= config.atol + config.tol * mean.abs();
            if settled && !self.is_infeasible(scores[best]) {
                converged = true;
                message = format!("converged after {} generations", generations);
                log::info!("{}", message);
                break;
            }
        }

        pb.finish_and_clear();

        if self.is_infeasible(scores[best]) {
            message = format!("{}; no feasible design found", message);
            log::warn!("{}", message);
        }

        Ok(OptimizationResult {
            params: bounds.scale(&population[best]),
            score: scores[best],
            generations,
            evaluations,
            converged,
            message,
        })
    }

    /// 为第 `i` 个个体生成试验向量（单位坐标）
    fn trial(
        &self,
        population: &[Vec<f64>],
        i: usize,
        best: usize,
        factor: f64,
        rng: &mut StdRng,
    ) -> Vec<f64> {
        let np = population.len();
        let dim = population[i].len();

        let picks: Vec<usize> = rand::seq::index::sample(rng, np, 3)
            .into_iter()
            .filter(|&r| r != i)
            .take(2)
            .collect();
        let (r1, r2) = (picks[0], picks[1]);

        let mut trial = population[i].clone();
        let forced = rng.gen_range(0..dim);
        for d in 0..dim {
            if d == forced || rng.gen::<f64>() < self.config.recombination {
                trial[d] = population[best][d] + factor * (population[r1][d] - population[r2][d]);
            }
            if !(0.0..=1.0).contains(&trial[d]) {
                trial[d] = rng.gen::<f64>();
            }
        }
        trial
    }
}

/// 拉丁超立方抽样：每一维的 `n` 个分层各取一个点
fn latin_hypercube(n: usize, dim: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut population = vec![vec![0.0; dim]; n];
    let mut strata: Vec<usize> = (0..n).collect();

    for d in 0..dim {
        strata.shuffle(rng);
        for (member, &stratum) in population.iter_mut().zip(&strata) {
            member[d] = (stratum as f64 + rng.gen::<f64>()) / n as f64;
        }
    }
    population
}

fn argmin(scores: &[f64]) -> usize {
    scores
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn mean_std(scores: &[f64]) -> (f64, f64) {
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
