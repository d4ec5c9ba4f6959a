//! # Statement DTOs
//!
//! [`StatementData`] is both the model's JSON output and the body the client
//! posts back to save.

use crate::model::store::models::{Transaction, TransactionType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub date: String,
    pub description: String,
    /// Positive amount in dollars
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementData {
    #[serde(default)]
    pub transactions: Vec<StatementLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCountResponse {
    pub num_pages: u32,
    /// Handle for the stashed upload, usable once with `/api/statements/extract`
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: String,
    /// `MM/DD/YYYY`
    pub date: String,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl From<Transaction> for TransactionView {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            date: t.date.format("%m/%d/%Y").to_string(),
            description: t.description,
            amount: t.amount as f64 / 100.0,
            kind: t.kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionList {
    pub transactions: Vec<TransactionView>,
}
