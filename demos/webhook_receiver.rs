//! Local subscriber for trying out deliveries.
//!
//! ```text
//! WEBHOOK_SECRET=s3cret cargo run --example webhook_receiver
//! isp-cli webhooks create http://127.0.0.1:8081/hook -e '*' --secret s3cret
//! isp-cli emit invoice.paid '{"invoice_id": 1}'
//! ```

use std::net::SocketAddr;

use axum::{body::Bytes, http::HeaderMap, http::StatusCode, routing::post, Router};
use isp_ops::webhooks::signing::{verify_signature, EVENT_HEADER, SIGNATURE_HEADER};

async fn receive(headers: HeaderMap, body: Bytes) -> StatusCode {
    let event = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("?");
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    let verdict = match (std::env::var("WEBHOOK_SECRET").ok(), signature) {
        (Some(secret), Some(sig)) if verify_signature(&secret, &body, sig) => "valid signature",
        (Some(_), Some(_)) => "INVALID signature",
        (Some(_), None) => "missing signature",
        (None, _) => "unchecked",
    };
    println!("{} ({}): {}", event, verdict, String::from_utf8_lossy(&body));

    if verdict.starts_with("INVALID") || verdict.starts_with("missing") {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::OK
    }
}

#[tokio::main]
async fn main() {
    let app = Router::new().route("/hook", post(receive));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8081));
    println!("Webhook receiver listening on http://{}/hook", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
