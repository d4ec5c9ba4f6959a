//! # Receipt Handlers
//!
//! Upload and extraction of receipt images, and saving, browsing, deleting
//! and exporting reviewed receipts.
//!
//! ## Flow
//!
//! ```text
//! POST /api/receipts/upload  (image) -> ReceiptPreview for review
//! POST /api/receipts         (reviewed receipt) -> { receiptId }
//! ```
//!
//! Amounts arrive as dollar strings and are stored as cents.

use super::multipart_error;
use crate::middleware::CurrentUser;
use crate::services::receipt_extraction::extract_receipt;
use crate::services::CompletionClient;
use axum::extract::{Extension, Json, Multipart, Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use lib_core::dto::{
    ApiResponse, ReceiptIdsRequest, ReceiptListQuery, ReceiptPage, ReceiptPreview, ReceiptView,
    Pagination, SaveReceiptRequest, SavedReceipt,
};
use lib_core::model::models::{ItemForCreate, ReceiptForCreate, ReceiptRow};
use lib_core::model::store::{ReceiptRepository, TokenUsageRepository};
use lib_core::{AppError, Config, DbPool};
use lib_utils::{b64_encode, format_cents_to_usd, format_us_date, parse_currency, sanitize_input};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_RECORDS: u32 = 10;
const MAX_RECORDS: u32 = 100;

const CSV_HEADER: &str = "Date,Merchant,Total,Notes,ID,CreatedAt,UpdatedAt";

// region: --- Upload

/// Extract a receipt from the multipart `image` field.
///
/// Nothing is stored except the token usage; the client reviews the preview
/// and saves it separately.
#[instrument(skip_all, fields(user_id = %current.id()))]
pub async fn upload_receipt(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    State(llm): State<Arc<dyn CompletionClient>>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<ReceiptPreview>, AppError> {
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some("image") {
            continue;
        }
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        image = Some((mime_type, bytes));
        break;
    }

    let (mime_type, bytes) = image
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or_else(|| AppError::InvalidInput("No image file provided".to_string()))?;

    if !mime_type.starts_with("image/") {
        warn!("[RECEIPTS] Rejected upload with content type {:?}", mime_type);
        return Err(AppError::InvalidInput("File must be an image".to_string()));
    }

    info!("[RECEIPTS] Extracting {} ({} bytes)", mime_type, bytes.len());
    let image_b64 = b64_encode(&bytes);
    let model = &config.llm.receipt_model;

    let (receipt, usage) = extract_receipt(llm.as_ref(), model, &mime_type, &image_b64).await?;
    TokenUsageRepository::record(&pool, current.id(), model, usage).await?;

    debug!(
        "[RECEIPTS] Extracted {} items from {:?}",
        receipt.items.len(),
        receipt.merchant
    );

    Ok(Json(ReceiptPreview {
        receipt,
        image: image_b64,
        mime_type,
    }))
}

// endregion: --- Upload

// region: --- Save

/// Parse an optional item price. Blank and `nil` mean the receipt shows no price.
fn parse_item_price(name: &str, raw: &str) -> Result<Option<i64>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "nil" {
        return Ok(None);
    }
    parse_currency(raw)
        .map(Some)
        .map_err(|_| AppError::InvalidInput(format!("Invalid price for item: {name}")))
}

fn to_receipt(user_id: &str, req: SaveReceiptRequest) -> Result<ReceiptForCreate, AppError> {
    let merchant = sanitize_input(&req.merchant);
    if merchant.is_empty() {
        return Err(AppError::InvalidInput("Merchant is required".to_string()));
    }

    let total = parse_currency(&req.total)
        .map_err(|_| AppError::InvalidInput("Invalid total".to_string()))?;

    let mut items = Vec::with_capacity(req.items.len());
    for line in &req.items {
        let name = sanitize_input(&line.name);
        if name.is_empty() {
            // Blank rows left over from the review form
            if line.price.trim().is_empty() {
                continue;
            }
            return Err(AppError::InvalidInput("Item name is required".to_string()));
        }
        let price = parse_item_price(&name, &line.price)?;
        items.push(ItemForCreate { name, price });
    }

    let notes = req
        .notes
        .as_deref()
        .map(sanitize_input)
        .filter(|n| !n.is_empty());

    Ok(ReceiptForCreate {
        user_id: user_id.to_string(),
        merchant,
        total,
        date: req.date.trim().to_string(),
        notes,
        items,
    })
}

#[instrument(skip(pool, current, req), fields(user_id = %current.id()))]
pub async fn save_receipt(
    State(pool): State<DbPool>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<SaveReceiptRequest>,
) -> Result<Json<ApiResponse<SavedReceipt>>, AppError> {
    let receipt = to_receipt(current.id(), req)?;
    let receipt_id = ReceiptRepository::save(&pool, &receipt).await?;

    info!(
        "[RECEIPTS] Saved receipt {} with {} items",
        receipt_id,
        receipt.items.len()
    );
    Ok(Json(ApiResponse::with_data(
        "Receipt saved successfully",
        SavedReceipt { receipt_id },
    )))
}

// endregion: --- Save

// region: --- Browse

/// Positive integer query value, `default` when absent or blank.
fn parse_query_number(raw: Option<&str>, default: u32, name: &str) -> Result<u32, AppError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid {name} parameter"))),
    }
}

#[instrument(skip(pool, current), fields(user_id = %current.id()))]
pub async fn list_receipts(
    State(pool): State<DbPool>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ReceiptListQuery>,
) -> Result<Json<ReceiptPage>, AppError> {
    let page = parse_query_number(query.page.as_deref(), DEFAULT_PAGE, "page")?;
    let records =
        parse_query_number(query.records.as_deref(), DEFAULT_RECORDS, "records")?.min(MAX_RECORDS);

    let (receipts, total) = ReceiptRepository::list(&pool, current.id(), page, records).await?;

    Ok(Json(ReceiptPage {
        receipts: receipts.into_iter().map(ReceiptView::from).collect(),
        pagination: Pagination::new(page, records, total),
    }))
}

/// One receipt with its items. Receipts of other users are reported as missing.
pub async fn get_receipt(
    State(pool): State<DbPool>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ReceiptView>, AppError> {
    let receipt_id: i64 = id
        .parse()
        .map_err(|_| AppError::InvalidInput("Invalid receipt id".to_string()))?;

    ReceiptRepository::find_by_id(&pool, current.id(), receipt_id)
        .await?
        .map(|receipt| Json(ReceiptView::from(receipt)))
        .ok_or_else(|| AppError::NotFound("Receipt not found".to_string()))
}

// endregion: --- Browse

// region: --- Delete / Export

#[instrument(skip(pool, current, req), fields(user_id = %current.id()))]
pub async fn delete_receipts(
    State(pool): State<DbPool>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ReceiptIdsRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let owned = ReceiptRepository::owned_ids(&pool, current.id(), &req.receipt_ids).await?;
    if owned.is_empty() {
        return Err(AppError::NotFound("No valid receipts found".to_string()));
    }

    let deleted = ReceiptRepository::delete_many(&pool, current.id(), &owned).await?;

    info!("[RECEIPTS] Deleted {} receipts", deleted);
    Ok(Json(ApiResponse::message(format!(
        "Successfully deleted {deleted} receipts"
    ))))
}

/// Quote a CSV field when it contains a separator, a quote or a line break.
fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn receipts_csv(rows: &[ReceiptRow]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for row in rows {
        let fields = [
            escape_csv(&row.date),
            escape_csv(&row.merchant),
            escape_csv(&format_cents_to_usd(row.total)),
            escape_csv(row.notes.as_deref().unwrap_or_default()),
            row.id.to_string(),
            format_us_date(row.created_at.and_utc()),
            format_us_date(row.updated_at.and_utc()),
        ];
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }
    csv
}

/// Download the selected receipts as `receipts.csv`.
#[instrument(skip(pool, current, req), fields(user_id = %current.id()))]
pub async fn export_receipts(
    State(pool): State<DbPool>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ReceiptIdsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let owned = ReceiptRepository::owned_ids(&pool, current.id(), &req.receipt_ids).await?;
    if owned.is_empty() {
        return Err(AppError::NotFound("No valid receipts found".to_string()));
    }

    let rows = ReceiptRepository::export_rows(&pool, current.id(), &owned).await?;
    info!("[RECEIPTS] Exporting {} receipts", rows.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"receipts.csv\""),
        ],
        receipts_csv(&rows),
    ))
}

// endregion: --- Delete / Export

#[cfg(test)]
mod tests;
