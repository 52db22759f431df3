// ==========================================
// 参数库初始化工具
// ==========================================
// 用法: seed_parameter_db [db_path] [--elements file.csv] [--first-order file.csv]
// 行为: 已有文件先备份再重建；写入 schema 与内置参数；可选追加 CSV 参数
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::Local;
use std::fs;
use std::path::Path;

use miedema_melts::db::{self, open_sqlite_connection};
use miedema_melts::importer::ParameterImporter;
use miedema_melts::logging;

struct Args {
    db_path: String,
    elements_csv: Option<String>,
    first_order_csv: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut db_path = None;
    let mut elements_csv = None;
    let mut first_order_csv = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--elements" => {
                elements_csv = Some(args.next().context("--elements 缺少文件路径")?);
            }
            "--first-order" => {
                first_order_csv = Some(args.next().context("--first-order 缺少文件路径")?);
            }
            other if other.starts_with("--") => bail!("未知参数: {}", other),
            other => db_path = Some(other.to_string()),
        }
    }

    Ok(Args {
        db_path: db_path.unwrap_or_else(db::default_db_path),
        elements_csv,
        first_order_csv,
    })
}

fn main() -> Result<()> {
    logging::init();
    let args = parse_args()?;

    backup_and_reset_db(&args.db_path)?;

    let conn = open_sqlite_connection(&args.db_path)
        .with_context(|| format!("无法打开参数库: {}", args.db_path))?;
    db::init_seeded(&conn).context("写入 schema 与内置参数失败")?;
    drop(conn);

    if args.elements_csv.is_some() || args.first_order_csv.is_some() {
        let importer = ParameterImporter::new(&args.db_path)?;
        if let Some(path) = &args.elements_csv {
            let summary = importer.import_elements(Path::new(path))?;
            print_violations(path, &summary);
        }
        if let Some(path) = &args.first_order_csv {
            let summary = importer.import_first_order(Path::new(path))?;
            print_violations(path, &summary);
        }
    }

    print_quick_counts(&args.db_path)?;
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<()> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path).with_context(|| format!("备份失败: {}", backup_path))?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn print_violations(path: &str, summary: &miedema_melts::importer::ImportSummary) {
    eprintln!(
        "{}: imported={} blocked={}",
        path, summary.imported, summary.blocked
    );
    for v in &summary.violations {
        eprintln!("  row {} [{}] {}", v.row_number, v.field, v.message);
    }
}

fn print_quick_counts(db_path: &str) -> Result<()> {
    let conn = open_sqlite_connection(db_path)?;
    for table in ["MiedemaParameter", "first_order", "second_order", "lnY0"] {
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        println!("{:<18} {}", table, count);
    }
    println!("schema_version     {:?}", db::read_schema_version(&conn)?);
    Ok(())
}
