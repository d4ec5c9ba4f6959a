//! # Receipt Handler Tests


use crate::handlers::test_support::*;
use axum::http::StatusCode;
use serde_json::{json, Value};

/// Save a receipt through the API and return its id.
async fn save(app: &TestApp, cookie: &str, body: Value) -> i64 {
    let res = app
        .send(json_request("POST", "/api/receipts", Some(cookie), body))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["data"]["receiptId"].as_i64().unwrap()
}

fn receipt_body(merchant: &str, total: &str) -> Value {
    json!({
        "merchant": merchant,
        "date": "03/14/2024",
        "total": total,
        "notes": "weekly shop",
        "items": [
            { "name": "Milk", "price": "3.49" },
            { "name": "Bag", "price": "" }
        ]
    })
}
