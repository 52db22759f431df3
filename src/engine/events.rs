// ==========================================
// 合金熔体活度计算 - 外推系数诊断报告
// ==========================================
// 职责: 定义贡献系数报告 trait，计算层不依赖具体输出方式
// 说明: 计算层只调用 trait；日志/界面/收集器由调用方注入
// ==========================================

use crate::engine::extrapolation::ExtrapolationModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// 子体系标签 → (贡献者标签 → 系数)
pub type ContributionMap = BTreeMap<String, BTreeMap<String, f64>>;

/// 一次贡献系数报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionReport {
    /// 三元体系名（如 "Fe-C-Si"）
    pub system: String,
    pub model: ExtrapolationModel,
    pub temperature: f64,
    pub contributions: ContributionMap,
    /// 完整合金成分（回显字符串）
    pub alloy: String,
}

// ==========================================
// 报告 Trait
// ==========================================

/// 贡献系数报告者
///
/// 仅当合金上下文含 3 个及以上不同元素时由 TernaryMelts 调用
pub trait ContributionReporter: Send + Sync {
    fn report(
        &self,
        system: &str,
        model: ExtrapolationModel,
        temperature: f64,
        contributions: &ContributionMap,
        alloy: &str,
    );
}

/// 空操作报告者
#[derive(Debug, Clone, Default)]
pub struct NoOpReporter;

impl ContributionReporter for NoOpReporter {
    fn report(&self, system: &str, model: ExtrapolationModel, _: f64, _: &ContributionMap, _: &str) {
        tracing::trace!("NoOpReporter: 跳过贡献系数报告 - system={}, model={}", system, model);
    }
}

/// 以结构化日志输出贡献系数
#[derive(Debug, Clone, Default)]
pub struct TracingReporter;

impl ContributionReporter for TracingReporter {
    fn report(
        &self,
        system: &str,
        model: ExtrapolationModel,
        temperature: f64,
        contributions: &ContributionMap,
        alloy: &str,
    ) {
        for (subsystem, values) in contributions {
            for (contributor, value) in values {
                tracing::info!(
                    system,
                    model = %model,
                    temperature,
                    alloy,
                    subsystem = %subsystem,
                    contributor = %contributor,
                    value,
                    "外推贡献系数"
                );
            }
        }
    }
}

/// 收集报告，供 API 回传
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: Mutex<Vec<ContributionReport>>,
}

impl CollectingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 取出已收集的报告（清空内部缓冲）
    pub fn take(&self) -> Vec<ContributionReport> {
        match self.reports.lock() {
            Ok(mut reports) => std::mem::take(&mut *reports),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl ContributionReporter for CollectingReporter {
    fn report(
        &self,
        system: &str,
        model: ExtrapolationModel,
        temperature: f64,
        contributions: &ContributionMap,
        alloy: &str,
    ) {
        let report = ContributionReport {
            system: system.to_string(),
            model,
            temperature,
            contributions: contributions.clone(),
            alloy: alloy.to_string(),
        };
        match self.reports.lock() {
            Ok(mut reports) => reports.push(report),
            Err(poisoned) => poisoned.into_inner().push(report),
        }
    }
}
