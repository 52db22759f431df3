// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时参数库创建、配置写入、CSV 临时文件
// ==========================================

#![allow(dead_code)]

use miedema_melts::db;
use rusqlite::{params, Connection};
use std::error::Error;
use std::io::Write;
use tempfile::NamedTempFile;

/// 创建临时参数库并写入 schema 与内置参数
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("临时路径非 UTF-8")?.to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_seeded(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建只有 schema、没有任何参数的临时参数库
pub fn create_empty_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("临时路径非 UTF-8")?.to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(db::open_sqlite_connection(db_path)?)
}

/// 写入一条配置
pub fn insert_test_config(conn: &Connection, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

/// 将 CSV 文本写入带 .csv 后缀的临时文件
pub fn write_csv(content: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// 相对误差断言
pub fn assert_close(actual: f64, expected: f64, rel_tol: f64) {
    let scale = expected.abs().max(1e-12);
    assert!(
        ((actual - expected) / scale).abs() <= rel_tol,
        "actual={} expected={} rel_tol={}",
        actual,
        expected,
        rel_tol
    );
}
