//! Data access gateway for the finance database.
//!
//! Every operation is one unit of work on its own connection:
//! acquire, run a single statement (plus commit for writes), release.
//! The connection is closed on every exit path, and a failed insert is
//! rolled back before the connection goes away. There is no pool and no
//! shared state beyond the immutable [`DbConfig`].

use futures::future::BoxFuture;
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;
use tracing::{debug, error, info, warn};

use crate::config::DbConfig;
use crate::error::{FinanceError, Result};
use crate::models::{AccountSummaryRow, NewTransaction, ServerInfo, TransactionRow};

const HEALTH_CHECK_SQL: &str = "SELECT DATABASE(), VERSION()";

// `user` and `transaction` are reserved words in MySQL.
const LIST_TRANSACTIONS_SQL: &str = r#"
    SELECT CAST(t.transaction_id AS SIGNED) AS transaction_id,
           u.first_name,
           u.last_name,
           c.name AS category,
           t.amount,
           CAST(t.transaction_date AS DATE) AS date
    FROM `transaction` t
    JOIN account a ON t.account_id = a.account_id
    JOIN `user` u ON a.user_id = u.user_id
    JOIN category c ON t.category_id = c.category_id
    ORDER BY t.transaction_date DESC, t.transaction_id DESC
"#;

const INSERT_TRANSACTION_SQL: &str = r#"
    INSERT INTO `transaction` (account_id, category_id, amount, transaction_date, description)
    VALUES (?, ?, ?, ?, ?)
"#;

const SUMMARIZE_USER_SQL: &str = r#"
    SELECT u.first_name, u.last_name, a.account_name, a.balance
    FROM account a
    JOIN `user` u ON u.user_id = a.user_id
    WHERE u.user_id = ?
    ORDER BY a.account_id
"#;

/// Mediates all access to the finance database
#[derive(Debug, Clone)]
pub struct Gateway {
    config: DbConfig,
}

impl Gateway {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Open a fresh connection. The caller owns it and must close it.
    pub async fn connect(&self) -> Result<MySqlConnection> {
        debug!(
            host = %self.config.host,
            port = self.config.port,
            database = %self.config.database,
            "acquiring connection"
        );

        MySqlConnection::connect_with(&self.config.connect_options())
            .await
            .map_err(|source| {
                error!(
                    host = %self.config.host,
                    port = self.config.port,
                    error = %source,
                    "could not connect to MySQL"
                );
                FinanceError::connection(&self.config.host, self.config.port, source)
            })
    }

    /// Report the active database name and server version
    pub async fn health_check(&self) -> Result<ServerInfo> {
        self.with_connection("health_check", |conn| {
            Box::pin(async move {
                let (database, version) =
                    sqlx::query_as::<_, (Option<String>, String)>(HEALTH_CHECK_SQL)
                        .fetch_one(&mut *conn)
                        .await
                        .map_err(|e| FinanceError::query("health_check", e))?;

                Ok(ServerInfo { database, version })
            })
        })
        .await
    }

    /// All transactions, most recent first
    pub async fn list_transactions(&self) -> Result<Vec<TransactionRow>> {
        self.with_connection("list_transactions", |conn| {
            Box::pin(async move {
                sqlx::query_as::<_, TransactionRow>(LIST_TRANSACTIONS_SQL)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(|e| FinanceError::query("list_transactions", e))
            })
        })
        .await
    }

    /// Insert one transaction atomically and return its id.
    ///
    /// On failure the transaction is rolled back and the cause is
    /// returned as [`FinanceError::Insert`]. Nothing is retried.
    pub async fn add_transaction(&self, new: NewTransaction) -> Result<u64> {
        self.with_connection("add_transaction", move |conn| {
            Box::pin(async move {
                let mut tx = conn.begin().await.map_err(FinanceError::insert)?;

                let inserted = sqlx::query(INSERT_TRANSACTION_SQL)
                    .bind(new.account_id)
                    .bind(new.category_id)
                    .bind(new.amount)
                    .bind(new.date)
                    .bind(&new.description)
                    .execute(&mut *tx)
                    .await;

                match inserted {
                    Ok(done) => {
                        tx.commit().await.map_err(FinanceError::insert)?;
                        let transaction_id = done.last_insert_id();
                        info!(
                            transaction_id,
                            account_id = new.account_id,
                            category_id = new.category_id,
                            amount = %new.amount,
                            "transaction added"
                        );
                        Ok(transaction_id)
                    }
                    Err(source) => {
                        warn!(error = %source, "insert failed, rolling back");
                        if let Err(rollback_err) = tx.rollback().await {
                            error!(error = %rollback_err, "rollback failed");
                        }
                        Err(FinanceError::insert(source))
                    }
                }
            })
        })
        .await
    }

    /// Accounts owned by `user_id`; empty when the user has none
    pub async fn summarize_user(&self, user_id: i64) -> Result<Vec<AccountSummaryRow>> {
        self.with_connection("summarize_user", move |conn| {
            Box::pin(async move {
                sqlx::query_as::<_, AccountSummaryRow>(SUMMARIZE_USER_SQL)
                    .bind(user_id)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(|e| FinanceError::query("summarize_user", e))
            })
        })
        .await
    }

    /// Run `body` on a fresh connection and close it whatever the outcome
    async fn with_connection<T, F>(&self, operation: &'static str, body: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut MySqlConnection) -> BoxFuture<'c, Result<T>>,
    {
        let mut conn = self.connect().await?;
        let outcome = body(&mut conn).await;
        release(conn, operation).await;
        outcome
    }
}

async fn release(conn: MySqlConnection, operation: &'static str) {
    match conn.close().await {
        Ok(()) => debug!(operation, "connection released"),
        Err(err) => warn!(operation, error = %err, "connection did not close cleanly"),
    }
}
