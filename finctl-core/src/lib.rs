pub mod config;
pub mod error;
pub mod gateway;
pub mod models;

pub use config::{load_dotenv, DatabaseSection, DbConfig};
pub use error::{FinanceError, Result};
pub use gateway::Gateway;
pub use models::{AccountSummaryRow, NewTransaction, ServerInfo, TransactionRow};
