//! Row types returned by the gateway, plus the write payload.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Result of the health check introspection query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// `None` when the session has no default schema
    pub database: Option<String>,
    pub version: String,
}

/// One line of the transaction listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TransactionRow {
    pub transaction_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub category: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

/// One account of a user summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AccountSummaryRow {
    pub first_name: String,
    pub last_name: String,
    pub account_name: String,
    pub balance: Decimal,
}

/// Fields bound into the transaction insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTransaction {
    pub account_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
}

impl NewTransaction {
    pub fn new(
        account_id: i64,
        category_id: i64,
        amount: Decimal,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            category_id,
            amount,
            date,
            description: description.into(),
        }
    }
}

impl TransactionRow {
    /// True when the row carries the amount and date of `new`
    pub fn matches(&self, new: &NewTransaction) -> bool {
        self.amount == new.amount && self.date == new.date
    }
}
