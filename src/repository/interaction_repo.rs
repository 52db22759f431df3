// ==========================================
// 合金熔体活度计算 - 实验相互作用参数仓储 (Melt)
// ==========================================
// 表: first_order / second_order / lnY0
// 规则:
// - 经验数据表按非对称方式存储，查询时依次尝试 (i, j) 与 (j, i)
// - 温度字段为 "T" 时按 a/T+b 求值，否则要求温度精确一致
// - 查询缺失 → NaN（debug 日志）；参数库不可达 → NaN（warn 日志），不抛错
// ==========================================

use crate::db::open_readonly_connection;
use crate::domain::interaction::{InteractionParameterRecord, ParameterLookup};
use crate::domain::types::ConcentrationUnit;
use crate::engine::unit_conversion;
use crate::repository::element_repo::ElementRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::temperature_formula::resolve_coefficient;
use rusqlite::{params, Connection};

// ==========================================
// FirstOrderEstimator - 一阶系数估算器
// ==========================================
/// 无实验一阶参数时的计算值来源（摩尔口径 ε_i^j）
pub trait FirstOrderEstimator {
    fn estimate_first_order(&self, solvent: &str, solute_i: &str, solute_j: &str, temperature: f64) -> f64;
}

/// 参数表原始行
#[derive(Debug, Clone)]
struct CoefficientRow {
    mass_text: Option<String>,
    mole_text: Option<String>,
    temperature: String,
    rank: Option<String>,
    reference: Option<String>,
}

impl CoefficientRow {
    fn resolve(&self, unit: ConcentrationUnit, temperature: f64) -> f64 {
        let text = match unit {
            ConcentrationUnit::Mass => self.mass_text.as_deref(),
            ConcentrationUnit::Mole => self.mole_text.as_deref(),
        };
        resolve_coefficient(text, &self.temperature, temperature)
    }
}

// ==========================================
// InteractionParameterStore - 实验参数查询与口径换算
// ==========================================
pub struct InteractionParameterStore {
    db_path: String,
    elements: ElementRepository,
}

impl InteractionParameterStore {
    /// 创建新的 InteractionParameterStore 实例（每次查询使用短连接）
    pub fn new(db_path: &str) -> Self {
        Self {
            db_path: db_path.to_string(),
            elements: ElementRepository::new(db_path),
        }
    }

    fn get_conn(&self) -> RepositoryResult<Connection> {
        open_readonly_connection(&self.db_path).map_err(|e| {
            RepositoryError::DatabaseConnectionError(format!("{}: {}", self.db_path, e))
        })
    }

    // ==========================================
    // 一阶参数
    // ==========================================

    /// 查询一阶相互作用参数 e_i^j / ε_i^j
    ///
    /// 先按 (i, j) 查询；未命中时按 (j, i) 查询并通过互易关系换算，
    /// 结果中 swapped 记录命中顺序
    pub fn first_order(
        &self,
        solvent: &str,
        solute_i: &str,
        solute_j: &str,
        temperature: f64,
        unit: ConcentrationUnit,
    ) -> ParameterLookup {
        let result = self
            .lookup_first_order(solvent, solute_i, solute_j, temperature, unit)
            .and_then(|direct| match direct {
                Some(found) => Ok(Some(found)),
                None if solute_i != solute_j => {
                    self.lookup_first_order(solvent, solute_j, solute_i, temperature, unit)
                        .map(|swapped| {
                            swapped.map(|mut found| {
                                found.value =
                                    self.reciprocal(found.value, solute_i, solute_j, unit);
                                found.swapped = true;
                                found
                            })
                        })
                }
                None => Ok(None),
            });

        match result {
            Ok(Some(found)) => found,
            Ok(None) => {
                tracing::debug!(
                    solvent, solute_i, solute_j, temperature, unit = %unit,
                    "first_order 无适用数据"
                );
                ParameterLookup::not_found(unit)
            }
            Err(e) => {
                tracing::warn!(solvent, solute_i, solute_j, error = %e, "first_order 查询失败，按无数据处理");
                ParameterLookup::not_found(unit)
            }
        }
    }

    fn lookup_first_order(
        &self,
        solvent: &str,
        solute_i: &str,
        solute_j: &str,
        temperature: f64,
        unit: ConcentrationUnit,
    ) -> RepositoryResult<Option<ParameterLookup>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT eji, sji, T, Rank, reference
            FROM first_order
            WHERE solv = ?1 AND solui = ?2 AND soluj = ?3
            ORDER BY Rank ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![solvent, solute_i, solute_j], |row| {
                Ok(CoefficientRow {
                    mass_text: row.get(0)?,
                    mole_text: row.get(1)?,
                    temperature: row.get(2)?,
                    rank: row.get(3)?,
                    reference: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(first_resolved(&rows, unit, temperature))
    }

    /// 互易换算: 由 (j, i) 记录得到 (i, j) 的系数
    fn reciprocal(&self, value_j_i: f64, solute_i: &str, solute_j: &str, unit: ConcentrationUnit) -> f64 {
        match unit {
            // ε_i^j = ε_j^i
            ConcentrationUnit::Mole => value_j_i,
            ConcentrationUnit::Mass => unit_conversion::mass_reciprocal(
                value_j_i,
                self.elements.atomic_mass(solute_i),
                self.elements.atomic_mass(solute_j),
            ),
        }
    }

    /// 一阶参数（摩尔口径）：优先取 sji，缺失时由 eji 换算
    pub fn first_order_in_mole(&self, solvent: &str, solute_i: &str, solute_j: &str, temperature: f64) -> f64 {
        let mole = self.first_order(solvent, solute_i, solute_j, temperature, ConcentrationUnit::Mole);
        if mole.is_found() {
            return mole.value;
        }
        let mass = self.first_order(solvent, solute_i, solute_j, temperature, ConcentrationUnit::Mass);
        if !mass.is_found() {
            return f64::NAN;
        }
        self.mass_to_mole(mass.value, solute_j, solvent)
    }

    // ==========================================
    // 二阶参数
    // ==========================================

    /// 查询二阶相互作用参数
    ///
    /// - solute_k 为 None: r_i^{j} / ρ_i^{j}（ri_ij / pi_ij 列）
    /// - solute_k 为 Some: r_i^{j,k} / ρ_i^{j,k}（ri_jk / pi_jk 列），j/k 两种顺序均可命中
    pub fn second_order(
        &self,
        solvent: &str,
        solute_i: &str,
        solute_j: &str,
        solute_k: Option<&str>,
        temperature: f64,
        unit: ConcentrationUnit,
    ) -> ParameterLookup {
        let result = match solute_k {
            None => self.lookup_second_order(solvent, solute_i, solute_j, None, temperature, unit),
            Some(k) => self
                .lookup_second_order(solvent, solute_i, solute_j, Some(k), temperature, unit)
                .and_then(|direct| match direct {
                    Some(found) => Ok(Some(found)),
                    None => self
                        .lookup_second_order(solvent, solute_i, k, Some(solute_j), temperature, unit)
                        .map(|swapped| {
                            swapped.map(|mut found| {
                                found.swapped = true;
                                found
                            })
                        }),
                }),
        };

        match result {
            Ok(Some(found)) => found,
            Ok(None) => {
                tracing::debug!(solvent, solute_i, solute_j, ?solute_k, temperature, "second_order 无适用数据");
                ParameterLookup::not_found(unit)
            }
            Err(e) => {
                tracing::warn!(solvent, solute_i, solute_j, error = %e, "second_order 查询失败，按无数据处理");
                ParameterLookup::not_found(unit)
            }
        }
    }

    fn lookup_second_order(
        &self,
        solvent: &str,
        solute_i: &str,
        solute_j: &str,
        solute_k: Option<&str>,
        temperature: f64,
        unit: ConcentrationUnit,
    ) -> RepositoryResult<Option<ParameterLookup>> {
        let conn = self.get_conn()?;

        let rows = match solute_k {
            None => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT ri_ij, pi_ij, T, Rank, reference
                    FROM second_order
                    WHERE solv = ?1 AND solui = ?2 AND soluj = ?3 AND soluk IS NULL
                    ORDER BY Rank ASC
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![solvent, solute_i, solute_j], map_coefficient_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            Some(k) => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT ri_jk, pi_jk, T, Rank, reference
                    FROM second_order
                    WHERE solv = ?1 AND solui = ?2 AND soluj = ?3 AND soluk = ?4
                    ORDER BY Rank ASC
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![solvent, solute_i, solute_j, k], map_coefficient_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };

        Ok(first_resolved(&rows, unit, temperature))
    }

    /// 二阶参数（摩尔口径）
    ///
    /// 优先取 pi_* 列；否则由 ri_* 列按 Lupis 关系换算，换算所需的
    /// e_i^j / e_i^k 缺少实验值时使用估算器给出的 ε 再转为质量口径
    pub fn second_order_in_mole(
        &self,
        solvent: &str,
        solute_i: &str,
        solute_j: &str,
        solute_k: Option<&str>,
        temperature: f64,
        estimator: &dyn FirstOrderEstimator,
    ) -> f64 {
        let mole = self.second_order(solvent, solute_i, solute_j, solute_k, temperature, ConcentrationUnit::Mole);
        if mole.is_found() {
            return mole.value;
        }

        let mass = self.second_order(solvent, solute_i, solute_j, solute_k, temperature, ConcentrationUnit::Mass);
        if !mass.is_found() {
            return f64::NAN;
        }

        let k = solute_k.unwrap_or(solute_j);
        let e_i_j = self.first_order_mass_or_estimate(solvent, solute_i, solute_j, temperature, estimator);
        let e_i_k = if k == solute_j {
            e_i_j
        } else {
            self.first_order_mass_or_estimate(solvent, solute_i, k, temperature, estimator)
        };

        unit_conversion::second_order_mass_to_mole(
            mass.value,
            e_i_j,
            e_i_k,
            self.elements.atomic_mass(solute_j),
            self.elements.atomic_mass(k),
            self.elements.atomic_mass(solvent),
            solute_k.is_none(),
        )
    }

    fn first_order_mass_or_estimate(
        &self,
        solvent: &str,
        solute_i: &str,
        solute_j: &str,
        temperature: f64,
        estimator: &dyn FirstOrderEstimator,
    ) -> f64 {
        let experimental = self.first_order(solvent, solute_i, solute_j, temperature, ConcentrationUnit::Mass);
        if experimental.is_found() {
            return experimental.value;
        }
        let estimated = estimator.estimate_first_order(solvent, solute_i, solute_j, temperature);
        tracing::debug!(solvent, solute_i, solute_j, estimated, "无实验一阶参数，使用估算值");
        self.mole_to_mass(estimated, solute_j, solvent)
    }

    // ==========================================
    // 无限稀活度系数
    // ==========================================

    /// 查询 ln γ°（优先 lnYi0 列，缺失时取 ln(Yi0)）
    pub fn ln_y0(&self, solvent: &str, solute: &str, temperature: f64) -> ParameterLookup {
        match self.lookup_ln_y0(solvent, solute, temperature) {
            Ok(Some(found)) => found,
            Ok(None) => {
                tracing::debug!(solvent, solute, temperature, "lnY0 无适用数据");
                ParameterLookup::not_found(ConcentrationUnit::Mole)
            }
            Err(e) => {
                tracing::warn!(solvent, solute, error = %e, "lnY0 查询失败，按无数据处理");
                ParameterLookup::not_found(ConcentrationUnit::Mole)
            }
        }
    }

    fn lookup_ln_y0(&self, solvent: &str, solute: &str, temperature: f64) -> RepositoryResult<Option<ParameterLookup>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT lnYi0, Yi0, T FROM lnY0 WHERE solv = ?1 AND solui = ?2")?;
        let rows = stmt
            .query_map(params![solvent, solute], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for (ln_text, gamma_text, t_field) in rows {
            let mut value = resolve_coefficient(ln_text.as_deref(), &t_field, temperature);
            if value.is_nan() {
                let gamma = resolve_coefficient(gamma_text.as_deref(), &t_field, temperature);
                if gamma > 0.0 {
                    value = gamma.ln();
                }
            }
            if !value.is_nan() {
                return Ok(Some(ParameterLookup {
                    value,
                    unit: ConcentrationUnit::Mole,
                    swapped: false,
                    rank: None,
                    reference: None,
                }));
            }
        }
        Ok(None)
    }

    // ==========================================
    // 口径换算（按元素符号查原子量）
    // ==========================================

    /// ε_i^j → e_i^j
    pub fn mole_to_mass(&self, s: f64, solute_j: &str, matrix: &str) -> f64 {
        unit_conversion::mole_to_mass(
            s,
            self.elements.atomic_mass(solute_j),
            self.elements.atomic_mass(matrix),
        )
    }

    /// e_i^j → ε_i^j（保留两位小数）
    pub fn mass_to_mole(&self, e: f64, solute_j: &str, matrix: &str) -> f64 {
        unit_conversion::mass_to_mole(
            e,
            self.elements.atomic_mass(solute_j),
            self.elements.atomic_mass(matrix),
        )
    }

    // ==========================================
    // 列表查询
    // ==========================================

    /// 列出某溶剂下全部一阶参数记录
    pub fn first_order_records(&self, solvent: &str) -> RepositoryResult<Vec<InteractionParameterRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT solui, soluj, eji, sji, T, Rank, reference
            FROM first_order
            WHERE solv = ?1
            ORDER BY solui ASC, soluj ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![solvent], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut records = Vec::new();
        for (solute_i, solute_j, eji, sji, temperature, rank, reference) in rows {
            let (coefficient, unit) = match (eji, sji) {
                (Some(e), _) if !e.trim().is_empty() => (e, ConcentrationUnit::Mass),
                (_, Some(s)) if !s.trim().is_empty() => (s, ConcentrationUnit::Mole),
                _ => continue,
            };
            records.push(InteractionParameterRecord {
                solvent: solvent.to_string(),
                solute_i,
                solute_j,
                solute_k: None,
                coefficient,
                unit,
                temperature,
                rank,
                reference,
            });
        }
        Ok(records)
    }
}

fn map_coefficient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CoefficientRow> {
    Ok(CoefficientRow {
        mass_text: row.get(0)?,
        mole_text: row.get(1)?,
        temperature: row.get(2)?,
        rank: row.get(3)?,
        reference: row.get(4)?,
    })
}

/// 取第一条在请求温度下可求值的记录
fn first_resolved(rows: &[CoefficientRow], unit: ConcentrationUnit, temperature: f64) -> Option<ParameterLookup> {
    rows.iter().find_map(|row| {
        let value = row.resolve(unit, temperature);
        if value.is_nan() {
            None
        } else {
            Some(ParameterLookup {
                value,
                unit,
                swapped: false,
                rank: row.rank.clone(),
                reference: row.reference.clone(),
            })
        }
    })
}
