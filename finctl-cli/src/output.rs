//! Rendering of gateway results as text or JSON

use std::io::Write;

use anyhow::Result;
use finctl_core::{AccountSummaryRow, ServerInfo, TransactionRow};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn from_flag(json: bool) -> Self {
        if json {
            Format::Json
        } else {
            Format::Text
        }
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn server_info(out: &mut impl Write, format: Format, info: &ServerInfo) -> Result<()> {
    match format {
        Format::Json => write_json(out, info),
        Format::Text => {
            writeln!(out, "Connected to MySQL")?;
            writeln!(
                out,
                "Current database: {}",
                info.database.as_deref().unwrap_or("(none)")
            )?;
            writeln!(out, "MySQL version: {}", info.version)?;
            Ok(())
        }
    }
}

pub fn transactions(out: &mut impl Write, format: Format, rows: &[TransactionRow]) -> Result<()> {
    match format {
        Format::Json => write_json(out, rows),
        Format::Text => {
            if rows.is_empty() {
                writeln!(out, "No transactions found.")?;
            }
            for row in rows {
                writeln!(
                    out,
                    "#{:<6} {}  {:<24} {:<16} {:>12}",
                    row.transaction_id,
                    row.date,
                    format!("{} {}", row.first_name, row.last_name),
                    row.category,
                    row.amount
                )?;
            }
            Ok(())
        }
    }
}

pub fn added(out: &mut impl Write, format: Format, transaction_id: u64) -> Result<()> {
    match format {
        Format::Json => write_json(out, &serde_json::json!({ "transaction_id": transaction_id })),
        Format::Text => {
            writeln!(out, "Transaction #{} added.", transaction_id)?;
            Ok(())
        }
    }
}

pub fn user_summary(
    out: &mut impl Write,
    format: Format,
    user_id: i64,
    rows: &[AccountSummaryRow],
) -> Result<()> {
    match format {
        Format::Json => write_json(out, rows),
        Format::Text => {
            if rows.is_empty() {
                writeln!(out, "User {} has no accounts.", user_id)?;
            }
            for row in rows {
                writeln!(
                    out,
                    "{:<24} {:<20} {:>12}",
                    format!("{} {}", row.first_name, row.last_name),
                    row.account_name,
                    row.balance
                )?;
            }
            Ok(())
        }
    }
}
