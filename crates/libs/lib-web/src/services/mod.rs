//! # Services Layer
//!
//! Business logic and integrations used by the HTTP handlers:
//!
//! ```text
//! Handlers (HTTP) → Services (extraction, PDF, LLM) → Repository/External programs
//! ```
//!
//! ## Module Organization
//!
//! - [`llm`] - Chat-completions client behind the [`CompletionClient`] trait
//! - [`pdf`] - PDF page counting and page text via sidecar programs
//! - [`upload_stash`] - Short-lived storage of uploaded statements
//! - [`receipt_extraction`] - Receipt image to structured receipt
//! - [`statement_extraction`] - Statement text to transactions
//!
//! ## Error Handling
//!
//! Integration errors ([`LlmError`], [`PdfError`]) convert into `AppError`,
//! mostly as `Upstream` (502).

pub mod llm;
pub mod pdf;
pub mod receipt_extraction;
pub mod statement_extraction;
pub mod upload_stash;

pub use llm::{CompletionClient, LlmError, OpenAiClient};
pub use pdf::{PdfError, PdfTextSource, SidecarPdf};
pub use upload_stash::PdfUploadStash;
