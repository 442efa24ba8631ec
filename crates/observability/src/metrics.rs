//! 遥测引擎指标收集模块
//!
//! Link accounting, clock jumps, postprocess passes and merges are recorded
//! through the `metrics` facade; without an installed recorder they are no-ops.

use std::collections::BTreeMap;

use metrics::{counter, gauge, histogram};

/// 记录链路消息
pub fn record_link_message(outcome: &str, bytes: u64) {
    counter!(
        "telemetry_link_messages_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
    counter!("telemetry_link_bytes_total").increment(bytes);
}

/// 记录被拒绝的时间跳变
pub fn record_time_jump(system_id: u32, direction: &str) {
    counter!(
        "telemetry_time_jumps_rejected_total",
        "system_id" => system_id.to_string(),
        "direction" => direction.to_string()
    )
    .increment(1);
}

/// 记录已跟踪的记录
pub fn record_tracked(kind: &str) {
    counter!("telemetry_records_tracked_total", "kind" => kind.to_string()).increment(1);
}

/// 记录后处理步骤结果与耗时
pub fn record_pass(pass: &str, outcome: &str, duration_ms: f64) {
    counter!(
        "telemetry_pass_runs_total",
        "pass" => pass.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("telemetry_pass_duration_ms", "pass" => pass.to_string()).record(duration_ms);
}

/// 记录合并结果
pub fn record_merge(merged: usize, copied: usize, replaced: usize, skipped: usize) {
    counter!("telemetry_merge_units_total", "action" => "merged").increment(merged as u64);
    counter!("telemetry_merge_units_total", "action" => "copied").increment(copied as u64);
    counter!("telemetry_merge_units_total", "action" => "replaced").increment(replaced as u64);
    counter!("telemetry_merge_units_total", "action" => "skipped").increment(skipped as u64);
}

/// 记录系统中的数据单元数量
pub fn record_unit_count(system_id: u32, units: usize) {
    gauge!("telemetry_units", "system_id" => system_id.to_string()).set(units as f64);
}

/// 后处理指标聚合器
///
/// 在内存中聚合每个步骤的耗时和结果，便于输出摘要。
#[derive(Debug, Clone, Default)]
pub struct PassMetricsAggregator {
    /// Per-pass duration statistics (ms)
    pub durations: BTreeMap<String, RunningStats>,
    /// Per-pass outcome counts
    pub outcomes: BTreeMap<String, BTreeMap<String, u64>>,
}

impl PassMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, pass: &str, outcome: &str, duration_ms: f64) {
        self.durations
            .entry(pass.to_string())
            .or_default()
            .push(duration_ms);
        *self
            .outcomes
            .entry(pass.to_string())
            .or_default()
            .entry(outcome.to_string())
            .or_insert(0) += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> Vec<PassSummary> {
        self.durations
            .iter()
            .map(|(pass, stats)| PassSummary {
                pass: pass.clone(),
                duration_ms: StatsSummary::from(stats),
                outcomes: self.outcomes.get(pass).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 单个步骤的摘要
#[derive(Debug, Clone, Default)]
pub struct PassSummary {
    pub pass: String,
    pub duration_ms: StatsSummary,
    pub outcomes: BTreeMap<String, u64>,
}

impl std::fmt::Display for PassSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let outcomes: Vec<String> = self
            .outcomes
            .iter()
            .map(|(outcome, count)| format!("{outcome}={count}"))
            .collect();
        write!(
            f,
            "{}: [{}] duration(ms) {}",
            self.pass,
            outcomes.join(", "),
            self.duration_ms
        )
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
