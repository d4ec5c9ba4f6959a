//! # Receipt DTOs
//!
//! [`ExtractedReceipt`] doubles as the JSON shape the completion model is asked
//! to produce, so every field tolerates being absent.

use crate::model::store::models::{PurchasedItem, ReceiptWithItems};
use lib_utils::{format_cents, format_cents_to_usd, format_time};
use serde::{Deserialize, Serialize};

/// One line of a receipt as extracted or as edited by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptLine {
    #[serde(default)]
    pub name: String,
    /// Decimal string such as `"3.49"`, empty when the receipt shows no price
    #[serde(default)]
    pub price: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedReceipt {
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub items: Vec<ReceiptLine>,
}

/// Extraction result returned to the client for review, with the uploaded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPreview {
    #[serde(flatten)]
    pub receipt: ExtractedReceipt,
    /// Base64 image bytes
    pub image: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceiptRequest {
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<ReceiptLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedReceipt {
    pub receipt_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItemView {
    pub id: i64,
    pub name: String,
    /// Cents
    pub price: Option<i64>,
    pub price_formatted: Option<String>,
}

impl From<PurchasedItem> for ReceiptItemView {
    fn from(item: PurchasedItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price,
            price_formatted: item.price.map(format_cents),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    pub id: i64,
    pub merchant: String,
    pub date: String,
    /// Cents
    pub total: i64,
    pub total_formatted: String,
    pub currency_type: String,
    pub notes: Option<String>,
    pub items: Vec<ReceiptItemView>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ReceiptWithItems> for ReceiptView {
    fn from(ReceiptWithItems { receipt, items }: ReceiptWithItems) -> Self {
        Self {
            id: receipt.id,
            merchant: receipt.merchant,
            date: receipt.date,
            total: receipt.total,
            total_formatted: format_cents_to_usd(receipt.total),
            currency_type: receipt.currency_type,
            notes: receipt.notes,
            items: items.into_iter().map(ReceiptItemView::from).collect(),
            created_at: format_time(receipt.created_at.and_utc()),
            updated_at: format_time(receipt.updated_at.and_utc()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub records_per_page: u32,
    pub total_records: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(current_page: u32, records_per_page: u32, total_records: i64) -> Self {
        let per_page = i64::from(records_per_page.max(1));
        Self {
            current_page,
            records_per_page,
            total_records,
            total_pages: (total_records + per_page - 1) / per_page,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptPage {
    pub receipts: Vec<ReceiptView>,
    pub pagination: Pagination,
}

/// Raw `?page=&records=` values. Parsed by the handler so bad input is a 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptListQuery {
    pub page: Option<String>,
    pub records: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptIdsRequest {
    #[serde(default)]
    pub receipt_ids: Vec<i64>,
}
