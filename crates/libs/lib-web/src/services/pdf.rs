//! # PDF Statement Text
//!
//! Page counting and per-page text extraction for uploaded bank statements.
//!
//! Both run as external programs:
//! - `pdfinfo <pdf>` prints a `Pages:` line
//! - `python3 scripts/pdf_extractor.py <pdf> <page>` prints
//!   `{"success": bool, "text": str, "error": str}`
//!
//! Handlers use the [`PdfTextSource`] trait so tests never spawn processes.

use async_trait::async_trait;
use lib_core::config::PdfSettings;
use lib_core::AppError;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Largest statement accepted (50 MB).
pub const MAX_PDF_BYTES: usize = 50 * 1024 * 1024;

/// File name used for a stored upload inside its temp dir.
pub const STATEMENT_FILE_NAME: &str = "statement.pdf";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("{0} not found (install it or set the matching PDF_* variable)")]
    NotAvailable(String),

    #[error("PDF tool failed: {0}")]
    Failed(String),

    #[error("Unreadable PDF tool output: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<PdfError> for AppError {
    fn from(err: PdfError) -> Self {
        match err {
            PdfError::Io(e) => AppError::Internal(format!("PDF temp file error: {e}")),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

#[async_trait]
pub trait PdfTextSource: Send + Sync {
    async fn page_count(&self, pdf: &Path) -> Result<u32, PdfError>;

    /// Text of one 1-based page.
    async fn page_text(&self, pdf: &Path, page: u32) -> Result<String, PdfError>;
}

/// Runs the configured sidecar programs.
pub struct SidecarPdf {
    settings: PdfSettings,
}

impl SidecarPdf {
    pub fn new(settings: PdfSettings) -> Self {
        Self { settings }
    }
}

#[derive(Debug, Deserialize)]
struct ExtractorOutput {
    success: bool,
    #[serde(default)]
    text: String,
    #[serde(default)]
    error: Option<String>,
}

async fn run(program: &str, args: &[&OsStr]) -> Result<String, PdfError> {
    let output = Command::new(program).args(args).output().await;

    match output {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(PdfError::Failed(format!("{program} failed: {}", stderr.trim())))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PdfError::NotAvailable(program.to_string()))
        }
        Err(e) => Err(PdfError::Io(e)),
    }
}

#[async_trait]
impl PdfTextSource for SidecarPdf {
    async fn page_count(&self, pdf: &Path) -> Result<u32, PdfError> {
        let stdout = run(&self.settings.info_program, &[pdf.as_os_str()]).await?;
        parse_page_count(&stdout)
    }

    async fn page_text(&self, pdf: &Path, page: u32) -> Result<String, PdfError> {
        debug!("[PDF] Extracting page {} of {}", page, pdf.display());
        let page_arg = page.to_string();
        let stdout = run(
            &self.settings.extractor_program,
            &[
                OsStr::new(&self.settings.extractor_script),
                pdf.as_os_str(),
                OsStr::new(&page_arg),
            ],
        )
        .await?;

        parse_extractor_output(&stdout)
    }
}

/// Read the `Pages:` line of `pdfinfo` output.
pub fn parse_page_count(stdout: &str) -> Result<u32, PdfError> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse::<u32>().ok())
        .ok_or_else(|| PdfError::Parse("no Pages: line".to_string()))
}

fn parse_extractor_output(stdout: &str) -> Result<String, PdfError> {
    let output: ExtractorOutput =
        serde_json::from_str(stdout.trim()).map_err(|e| PdfError::Parse(e.to_string()))?;

    if output.success {
        Ok(output.text)
    } else {
        Err(PdfError::Failed(
            output.error.unwrap_or_else(|| "unknown extractor error".to_string()),
        ))
    }
}

/// Reject uploads that are not PDFs or are too large.
pub fn validate_pdf(bytes: &[u8]) -> Result<(), AppError> {
    if bytes.len() > MAX_PDF_BYTES {
        return Err(AppError::InvalidInput("File exceeds the 50MB limit".to_string()));
    }
    if !bytes.starts_with(b"%PDF") {
        return Err(AppError::InvalidInput("File is not a valid PDF".to_string()));
    }
    Ok(())
}

/// Parse `"1, 3,4"` into page numbers.
///
/// Every entry must be a positive integer. Repeated pages are read once,
/// in the order they first appear.
pub fn parse_pages(raw: &str) -> Result<Vec<u32>, AppError> {
    let invalid = || AppError::InvalidInput("Invalid page number".to_string());

    if raw.trim().is_empty() {
        return Err(invalid());
    }

    let mut pages = Vec::new();
    for part in raw.split(',') {
        let page = match part.trim().parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => return Err(invalid()),
        };
        if !pages.contains(&page) {
            pages.push(page);
        }
    }
    Ok(pages)
}
