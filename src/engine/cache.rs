// ==========================================
// 合金熔体活度计算 - 外推系数缓存
// ==========================================
// 键: (模型, 有序元素, λ, 过剩熵开关, 物态, 温度)
// 浮点字段以归一化位模式存储（-0.0 → 0.0）
// ==========================================

use crate::domain::types::PhaseState;
use crate::engine::extrapolation::ExtrapolationModel;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ExtrapolationModel,
    pub elements: Vec<String>,
    pub lambda_bits: u64,
    pub entropy: bool,
    pub state: PhaseState,
    pub temperature_bits: u64,
}

impl CacheKey {
    pub fn new(
        kind: ExtrapolationModel,
        elements: &[&str],
        lambda: f64,
        entropy: bool,
        state: PhaseState,
        temperature: f64,
    ) -> Self {
        Self {
            kind,
            elements: elements.iter().map(|s| s.to_string()).collect(),
            lambda_bits: float_bits(lambda),
            entropy,
            state,
            temperature_bits: float_bits(temperature),
        }
    }
}

fn float_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// 线程安全的系数缓存
#[derive(Debug, Default)]
pub struct ContributionCache {
    entries: Mutex<HashMap<CacheKey, f64>>,
}

impl ContributionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<f64> {
        match self.entries.lock() {
            Ok(map) => map.get(key).copied(),
            Err(poisoned) => poisoned.into_inner().get(key).copied(),
        }
    }

    pub fn insert(&self, key: CacheKey, value: f64) {
        match self.entries.lock() {
            Ok(mut map) => {
                map.insert(key, value);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, value);
            }
        }
    }

    /// 命中则返回缓存值，否则计算并写入
    pub fn get_or_insert_with<F>(&self, key: CacheKey, compute: F) -> f64
    where
        F: FnOnce() -> f64,
    {
        if let Some(v) = self.get(&key) {
            return v;
        }
        // 计算期间不持锁（外推计算可能递归查询缓存）
        let value = compute();
        self.insert(key, value);
        value
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(map) => map.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match self.entries.lock() {
            Ok(mut map) => map.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}
