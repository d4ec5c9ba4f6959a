//! # Statement Handler Tests


use crate::handlers::test_support::*;
use axum::http::StatusCode;
use serde_json::{json, Value};

const PDF: &[u8] = b"%PDF-1.7\n1 0 obj\n<< >>\nendobj\n%%EOF\n";

fn statement_reply() -> Value {
    json!({
        "transactions": [
            { "date": "03/01/2024", "description": "Coffee", "amount": 4.5, "type": "debit" },
            { "date": "03/02/2024", "description": "Payroll", "amount": 2500.0, "type": "credit" }
        ]
    })
}
