//! # Statement Handlers
//!
//! Bank statement PDFs go through two calls:
//!
//! ```text
//! POST /api/statements/page-count  (file)            -> { numPages, fileId }
//! POST /api/statements/extract     (fileId | file, pages) -> { transactions }
//! ```
//!
//! The first call stashes the upload so the second can name pages without
//! sending the file again. Reviewed transactions are saved with
//! `POST /api/statements`.

use super::{internal, multipart_error};
use crate::middleware::CurrentUser;
use crate::services::pdf::{parse_pages, validate_pdf};
use crate::services::statement_extraction::{extract_statement as run_extraction, to_transaction};
use crate::services::upload_stash::statement_path;
use crate::services::{CompletionClient, PdfTextSource, PdfUploadStash};
use axum::body::Bytes;
use axum::extract::{Extension, Json, Multipart, State};
use lib_core::dto::{ApiResponse, PageCountResponse, StatementData, TransactionList, TransactionView};
use lib_core::model::store::{TokenUsageRepository, TransactionRepository};
use lib_core::{AppError, Config, DbPool};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

/// Fields accepted by the statement multipart endpoints.
#[derive(Default)]
struct StatementForm {
    file: Option<Bytes>,
    file_id: Option<String>,
    pages: Option<String>,
}

impl StatementForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("file") => form.file = Some(field.bytes().await.map_err(multipart_error)?),
                Some("fileId") => form.file_id = Some(field.text().await.map_err(multipart_error)?),
                Some("pages") => form.pages = Some(field.text().await.map_err(multipart_error)?),
                _ => {}
            }
        }
        Ok(form)
    }
}

/// Validate the upload and write it into a fresh temp dir.
async fn store_pdf(bytes: &[u8]) -> Result<TempDir, AppError> {
    validate_pdf(bytes)?;
    let dir = TempDir::new().map_err(internal)?;
    tokio::fs::write(statement_path(&dir), bytes)
        .await
        .map_err(internal)?;
    Ok(dir)
}

/// Count the pages of an uploaded statement and keep it for extraction.
#[instrument(skip_all, fields(user_id = %current.id()))]
pub async fn page_count(
    State(pdf): State<Arc<dyn PdfTextSource>>,
    State(uploads): State<PdfUploadStash>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<PageCountResponse>, AppError> {
    let form = StatementForm::read(multipart).await?;
    let bytes = form
        .file
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::InvalidInput("No PDF file provided".to_string()))?;

    let dir = store_pdf(&bytes).await?;
    let num_pages = pdf.page_count(&statement_path(&dir)).await?;
    let file_id = uploads.insert(current.id(), dir);

    info!("[STATEMENTS] Stored {} page statement as {}", num_pages, file_id);
    Ok(Json(PageCountResponse { num_pages, file_id }))
}

/// Extract transactions from the selected pages.
///
/// A `fileId` from `page_count` is consumed; a `file` is used directly.
#[instrument(skip_all, fields(user_id = %current.id()))]
pub async fn extract_statement(
    State(pool): State<DbPool>,
    State(config): State<Config>,
    State(llm): State<Arc<dyn CompletionClient>>,
    State(pdf): State<Arc<dyn PdfTextSource>>,
    State(uploads): State<PdfUploadStash>,
    Extension(current): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<StatementData>, AppError> {
    let form = StatementForm::read(multipart).await?;
    let pages = parse_pages(form.pages.as_deref().unwrap_or_default())?;

    let dir = match (form.file.filter(|b| !b.is_empty()), form.file_id) {
        (Some(bytes), _) => store_pdf(&bytes).await?,
        (None, Some(file_id)) => uploads.take(current.id(), file_id.trim()).ok_or_else(|| {
            warn!("[STATEMENTS] Unknown or expired upload {}", file_id);
            AppError::NotFound("Uploaded file not found or expired".to_string())
        })?,
        (None, None) => return Err(AppError::InvalidInput("No PDF file provided".to_string())),
    };
    let path = statement_path(&dir);

    let num_pages = pdf.page_count(&path).await?;
    if pages.iter().any(|page| *page > num_pages) {
        return Err(AppError::InvalidInput("Invalid page number".to_string()));
    }

    let mut texts = Vec::with_capacity(pages.len());
    for page in &pages {
        texts.push(pdf.page_text(&path, *page).await?);
    }
    let statement_text = texts.join("\n\n");
    debug!(
        "[STATEMENTS] Extracted {} chars from pages {:?}",
        statement_text.len(),
        pages
    );

    let model = &config.llm.statement_model;
    let (data, usage) = run_extraction(llm.as_ref(), model, &statement_text).await?;
    TokenUsageRepository::record(&pool, current.id(), model, usage).await?;

    info!("[STATEMENTS] Model found {} transactions", data.transactions.len());
    Ok(Json(data))
}

/// Save reviewed transactions. One bad line rejects the whole statement.
#[instrument(skip(pool, current, data), fields(user_id = %current.id()))]
pub async fn save_statement(
    State(pool): State<DbPool>,
    Extension(current): Extension<CurrentUser>,
    Json(data): Json<StatementData>,
) -> Result<Json<ApiResponse>, AppError> {
    if data.transactions.is_empty() {
        return Err(AppError::InvalidInput("No transactions provided".to_string()));
    }

    let rows = data
        .transactions
        .iter()
        .map(to_transaction)
        .collect::<Result<Vec<_>, _>>()?;

    let saved = TransactionRepository::save_all(&pool, current.id(), &rows).await?;

    info!("[STATEMENTS] Saved {} transactions", saved);
    Ok(Json(ApiResponse::message(format!(
        "Successfully saved {saved} transactions"
    ))))
}

pub async fn list_transactions(
    State(pool): State<DbPool>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<TransactionList>, AppError> {
    let transactions = TransactionRepository::list_for_user(&pool, current.id()).await?;
    Ok(Json(TransactionList {
        transactions: transactions.into_iter().map(TransactionView::from).collect(),
    }))
}

#[cfg(test)]
mod tests;
