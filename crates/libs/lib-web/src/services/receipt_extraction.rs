//! # Receipt Extraction
//!
//! Turns a receipt photo into an [`ExtractedReceipt`] through the completion
//! model, then normalizes every amount to a two-decimal string.

use crate::services::llm::{ChatMessage, CompletionClient, CompletionRequest, ResponseFormat};
use lib_core::dto::{ExtractedReceipt, ReceiptLine};
use lib_core::model::models::TokenCounts;
use lib_core::AppError;
use lib_utils::{format_cents, parse_currency};
use serde_json::{json, Value};
use tracing::{debug, warn};

pub const RECEIPT_SCHEMA_NAME: &str = "receipt_response";
const RECEIPT_MAX_TOKENS: u32 = 3000;

const RECEIPT_PROMPT: &str = "Extract the data from this receipt image. Return the merchant name, \
the purchase date, the receipt total and every purchased item with its price. \
When an item shows a quantity and a unit price, the item price is the line total. \
Some items have no price (bags, coupons with no amount); return an empty string for those. \
Copy values exactly as printed and never guess a value you cannot read; leave it empty instead. \
If the image is not a receipt, return empty strings and an empty item list.";

/// JSON schema the model must follow.
pub fn receipt_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "merchant": { "type": "string" },
            "date": { "type": "string" },
            "total": { "type": "string" },
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "price": { "type": "string" }
                    },
                    "required": ["name", "price"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["merchant", "date", "total", "items"],
        "additionalProperties": false
    })
}

pub fn build_request(model: &str, mime_type: &str, image_b64: &str) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user_with_image(
            RECEIPT_PROMPT,
            format!("data:{mime_type};base64,{image_b64}"),
        )],
        max_tokens: Some(RECEIPT_MAX_TOKENS),
        temperature: None,
        response_format: Some(ResponseFormat::strict_schema(RECEIPT_SCHEMA_NAME, receipt_schema())),
    }
}

/// Run extraction and return the normalized receipt with the usage to record.
pub async fn extract_receipt(
    llm: &dyn CompletionClient,
    model: &str,
    mime_type: &str,
    image_b64: &str,
) -> Result<(ExtractedReceipt, TokenCounts), AppError> {
    let completion = llm.complete(build_request(model, mime_type, image_b64)).await?;
    debug!("[RECEIPTS] Model returned {} bytes", completion.content.len());

    let receipt: ExtractedReceipt = serde_json::from_str(&completion.content)
        .map_err(|e| AppError::Decoding(format!("Receipt response is not valid JSON: {e}")))?;

    Ok((normalize_receipt(receipt), completion.usage))
}

/// Rewrite the total and item prices as `"12.34"`.
///
/// Empty values stay empty. Values that cannot be parsed become empty too,
/// leaving the user to fill them in during review.
pub fn normalize_receipt(receipt: ExtractedReceipt) -> ExtractedReceipt {
    ExtractedReceipt {
        total: normalize_amount(&receipt.total, "total"),
        items: receipt
            .items
            .into_iter()
            .map(|item| ReceiptLine {
                price: normalize_amount(&item.price, &item.name),
                name: item.name,
            })
            .collect(),
        ..receipt
    }
}

fn normalize_amount(raw: &str, field: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    match parse_currency(raw) {
        Ok(cents) => format_cents(cents),
        Err(e) => {
            warn!("[RECEIPTS] Dropping unparseable amount for {}: {}", field, e);
            String::new()
        }
    }
}
