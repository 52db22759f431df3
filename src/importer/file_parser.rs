// ==========================================
// 合金熔体活度计算 - CSV 文件解析
// ==========================================
// 输出: 行号 + (列名 → 单元格文本)
// 约定: 列名与单元格去除首尾空白；完全空白的行跳过
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 一行原始记录
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 文件行号（表头为第 1 行）
    pub row_number: usize,
    pub fields: HashMap<String, String>,
}

impl RawRecord {
    /// 非空单元格
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

pub struct CsvParser;

impl CsvParser {
    /// 解析 CSV 文件
    pub fn parse_file(&self, file_path: &Path) -> ImportResult<(Vec<String>, Vec<RawRecord>)> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(ext.to_string_lossy().to_string()));
            }
        }

        let file = File::open(file_path)?;
        self.parse_reader(file)
    }

    /// 解析任意输入流
    pub fn parse_reader<R: Read>(&self, source: R) -> ImportResult<(Vec<String>, Vec<RawRecord>)> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut records = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let fields: HashMap<String, String> = record
                .iter()
                .enumerate()
                .filter_map(|(col_idx, value)| {
                    headers
                        .get(col_idx)
                        .map(|header| (header.clone(), value.trim().to_string()))
                })
                .collect();

            // 跳过完全空白的行
            if fields.values().all(|v| v.is_empty()) {
                continue;
            }

            let row_number = record
                .position()
                .map(|pos| pos.line() as usize)
                .unwrap_or(row_idx + 2);
            records.push(RawRecord {
                row_number,
                fields,
            });
        }

        Ok((headers, records))
    }
}
