//! Database row types and insert payloads.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// region: --- Users

/// User entity representing a complete user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub security_questions_answered: bool,
    pub application_environment_role: String,
    /// Set when the account was deleted by its owner
    pub inactive_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.inactive_at.is_none()
    }
}

/// Data structure for creating a new user.
///
/// Password should be hashed before creating.
#[derive(Debug, Clone)]
pub struct UserForCreate {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl UserForCreate {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            username,
            email,
            password_hash,
        }
    }
}

// endregion: --- Users

// region: --- Security questions

/// Three question/answer pairs. Answers must already be hashed.
#[derive(Debug, Clone)]
pub struct SecurityQuestionsForCreate {
    pub user_id: String,
    pub entries: [(String, String); 3],
}

// endregion: --- Security questions

// region: --- Receipts

/// Receipt joined with its merchant name.
#[derive(Debug, Clone, FromRow)]
pub struct ReceiptRow {
    pub id: i64,
    pub user_id: String,
    pub merchant: String,
    /// Cents
    pub total: i64,
    pub currency_type: String,
    pub date: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct PurchasedItem {
    pub id: i64,
    pub receipt_id: i64,
    pub name: String,
    /// Cents. `None` when the receipt showed no price for the line.
    pub price: Option<i64>,
    pub currency_type: String,
}

/// A receipt with its items.
#[derive(Debug, Clone)]
pub struct ReceiptWithItems {
    pub receipt: ReceiptRow,
    pub items: Vec<PurchasedItem>,
}

#[derive(Debug, Clone)]
pub struct ItemForCreate {
    pub name: String,
    pub price: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ReceiptForCreate {
    pub user_id: String,
    pub merchant: String,
    pub total: i64,
    pub date: String,
    pub notes: Option<String>,
    pub items: Vec<ItemForCreate>,
}

// endregion: --- Receipts

// region: --- Transactions

/// Direction of a bank statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(format!("Invalid transaction type: {other}")),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub description: String,
    /// Positive cents
    pub amount: i64,
    #[sqlx(rename = "type")]
    pub kind: TransactionType,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct TransactionForCreate {
    pub date: NaiveDate,
    pub description: String,
    pub amount: i64,
    pub kind: TransactionType,
}

// endregion: --- Transactions

// region: --- Token usage

/// Token counts reported by the completion API for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenCounts {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

// endregion: --- Token usage

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_parse() {
        assert_eq!("credit".parse::<TransactionType>().unwrap(), TransactionType::Credit);
        assert_eq!(" DEBIT ".parse::<TransactionType>().unwrap(), TransactionType::Debit);
        assert!("refund".parse::<TransactionType>().is_err());
    }
}
