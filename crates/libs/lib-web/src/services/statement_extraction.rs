//! # Statement Extraction
//!
//! Sends the text of selected statement pages to the completion model and
//! converts the reviewed result into rows for storage.

use crate::services::llm::{ChatMessage, CompletionClient, CompletionRequest, ResponseFormat};
use lib_core::dto::{StatementData, StatementLine};
use lib_core::model::models::{TokenCounts, TransactionForCreate, TransactionType};
use lib_core::AppError;
use lib_utils::currency::MAX_CENTS;
use lib_utils::parse_us_date;
use serde_json::{json, Value};

pub const STATEMENT_SCHEMA_NAME: &str = "statement_response";
const STATEMENT_MAX_TOKENS: u32 = 16384;
const STATEMENT_TEMPERATURE: f32 = 0.7;

const STATEMENT_PROMPT: &str = "You are given the text of one or more bank statement pages. \
List every transaction with its date (MM/DD/YYYY), its description and its amount. \
Amounts are positive numbers with two decimals. \
Use type \"debit\" for purchases, withdrawals, fees and other expenses, \
and type \"credit\" for deposits, refunds and other incoming money. \
Skip balances, totals and summary lines.";

pub fn statement_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "transactions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "date": { "type": "string" },
                        "description": { "type": "string" },
                        "amount": { "type": "number" },
                        "type": { "type": "string", "enum": ["credit", "debit"] }
                    },
                    "required": ["date", "description", "amount", "type"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["transactions"],
        "additionalProperties": false
    })
}

pub fn build_request(model: &str, statement_text: &str) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(STATEMENT_PROMPT),
            ChatMessage::user(statement_text),
        ],
        max_tokens: Some(STATEMENT_MAX_TOKENS),
        temperature: Some(STATEMENT_TEMPERATURE),
        response_format: Some(ResponseFormat::strict_schema(
            STATEMENT_SCHEMA_NAME,
            statement_schema(),
        )),
    }
}

pub async fn extract_statement(
    llm: &dyn CompletionClient,
    model: &str,
    statement_text: &str,
) -> Result<(StatementData, TokenCounts), AppError> {
    let completion = llm.complete(build_request(model, statement_text)).await?;

    let data: StatementData = serde_json::from_str(&completion.content)
        .map_err(|e| AppError::Decoding(format!("Statement response is not valid JSON: {e}")))?;

    Ok((data, completion.usage))
}

/// Validate one reviewed line and convert its amount to cents.
pub fn to_transaction(line: &StatementLine) -> Result<TransactionForCreate, AppError> {
    let date = parse_us_date(&line.date)
        .map_err(|_| AppError::InvalidInput("Invalid date format".to_string()))?;

    let kind: TransactionType = line
        .kind
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid transaction type: {}", line.kind)))?;

    let cents = (line.amount * 100.0).round();
    if !cents.is_finite() || cents < 0.0 || cents > MAX_CENTS as f64 {
        return Err(AppError::InvalidInput("Invalid amount".to_string()));
    }

    Ok(TransactionForCreate {
        date,
        description: line.description.trim().to_string(),
        amount: cents as i64,
        kind,
    })
}
