//! Webhook fan-out against loopback subscribers.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use common::{start_programmable_subscriber, start_subscriber, unreachable_url};
use isp_ops::config::WebhookConfig;
use isp_ops::webhooks::signing::{
    verify_signature, DELIVERY_ID_HEADER, EVENT_HEADER, SIGNATURE_HEADER, WEBHOOK_ID_HEADER,
};
use isp_ops::webhooks::{DeliveryLog, NewWebhook, WebhookDispatcher, WebhookRegistry, TEST_EVENT};

fn dispatcher() -> WebhookDispatcher {
    let config = WebhookConfig {
        delivery_timeout_ms: 2_000,
        ..WebhookConfig::default()
    };
    WebhookDispatcher::new(WebhookRegistry::new(None), DeliveryLog::new(10), &config).unwrap()
}

fn hook(url: String, events: &[&str], secret: Option<&str>) -> NewWebhook {
    NewWebhook {
        url,
        events: events.iter().map(|e| e.to_string()).collect(),
        secret: secret.map(str::to_string),
        ..NewWebhook::default()
    }
}

#[tokio::test]
async fn test_signed_delivery_verifies() {
    let subscriber = start_subscriber(200, "ok").await;
    let dispatcher = dispatcher();
    let created = dispatcher
        .registry()
        .create(hook(subscriber.url(), &["invoice.paid"], Some("s3cret")))
        .unwrap();

    let report = dispatcher
        .dispatch("invoice.paid", json!({ "invoice_id": 42, "amount": "19.99" }))
        .await
        .unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.succeeded, 1);

    let received = subscriber.received();
    assert_eq!(received.len(), 1);
    let request = &received[0];

    let signature = request.header(SIGNATURE_HEADER).unwrap();
    assert!(signature.starts_with("sha256="));
    assert!(verify_signature("s3cret", &request.body, signature));
    assert!(!verify_signature("wrong", &request.body, signature));

    assert_eq!(request.header(EVENT_HEADER), Some("invoice.paid"));
    assert_eq!(request.header(WEBHOOK_ID_HEADER), Some(created.id.to_string().as_str()));
    assert_eq!(
        request.header(DELIVERY_ID_HEADER),
        Some(report.deliveries[0].id.to_string().as_str())
    );

    let envelope = request.json();
    assert_eq!(envelope["event"], "invoice.paid");
    assert_eq!(envelope["webhook_id"], created.id.to_string());
    assert_eq!(envelope["data"]["invoice_id"], 42);
    assert!(envelope["timestamp"].is_string());
}

#[tokio::test]
async fn test_unsigned_delivery_has_no_signature() {
    let subscriber = start_subscriber(204, "").await;
    let dispatcher = dispatcher();
    dispatcher
        .registry()
        .create(hook(subscriber.url(), &["*"], None))
        .unwrap();

    let report = dispatcher.dispatch("customer.created", json!({})).await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert!(subscriber.received()[0].header(SIGNATURE_HEADER).is_none());
}

#[tokio::test]
async fn test_fan_out_is_concurrent() {
    let dispatcher = dispatcher();
    let mut subscribers = Vec::new();
    for _ in 0..5 {
        let sub = start_programmable_subscriber(|| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            (200, "slow".to_string())
        })
        .await;
        dispatcher
            .registry()
            .create(hook(sub.url(), &["session.started"], None))
            .unwrap();
        subscribers.push(sub);
    }

    let start = std::time::Instant::now();
    let report = dispatcher.dispatch("session.started", json!({})).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(report.attempted, 5);
    assert_eq!(report.succeeded, 5);
    // Sequential delivery would take at least 1.5s.
    assert!(elapsed < Duration::from_millis(1_200), "took {:?}", elapsed);
    assert!(subscribers.iter().all(|s| s.count() == 1));
}

#[tokio::test]
async fn test_failures_are_isolated_and_logged() {
    let ok = start_subscriber(200, "fine").await;
    let failing = start_subscriber(500, "boom").await;
    let dispatcher = dispatcher();

    let ok_hook = dispatcher
        .registry()
        .create(hook(ok.url(), &["invoice.paid"], None))
        .unwrap();
    let failing_hook = dispatcher
        .registry()
        .create(hook(failing.url(), &["invoice.paid"], None))
        .unwrap();
    let dead_hook = dispatcher
        .registry()
        .create(hook(unreachable_url().await, &["invoice.paid"], None))
        .unwrap();

    let report = dispatcher.dispatch("invoice.paid", json!({ "n": 1 })).await.unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 2);

    let (ok_log, _) = dispatcher.log().list(ok_hook.id, 0, 10);
    assert!(ok_log[0].success);
    assert_eq!(ok_log[0].response_status, Some(200));
    assert_eq!(ok_log[0].response_body.as_deref(), Some("fine"));

    let (failing_log, _) = dispatcher.log().list(failing_hook.id, 0, 10);
    assert!(!failing_log[0].success);
    assert_eq!(failing_log[0].response_status, Some(500));
    assert_eq!(failing_log[0].response_body.as_deref(), Some("boom"));
    assert!(failing_log[0].error.is_none());

    let (dead_log, _) = dispatcher.log().list(dead_hook.id, 0, 10);
    assert!(!dead_log[0].success);
    assert!(dead_log[0].response_status.is_none());
    assert!(dead_log[0].error.is_some());
}

#[tokio::test]
async fn test_only_matching_active_subscribers_receive() {
    let paid = start_subscriber(200, "").await;
    let created = start_subscriber(200, "").await;
    let inactive = start_subscriber(200, "").await;
    let dispatcher = dispatcher();

    dispatcher
        .registry()
        .create(hook(paid.url(), &["invoice.paid"], None))
        .unwrap();
    dispatcher
        .registry()
        .create(hook(created.url(), &["invoice.created"], None))
        .unwrap();
    dispatcher
        .registry()
        .create(NewWebhook {
            is_active: Some(false),
            ..hook(inactive.url(), &["*"], None)
        })
        .unwrap();

    let report = dispatcher.dispatch("invoice.paid", json!({})).await.unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(paid.count(), 1);
    assert_eq!(created.count(), 0);
    assert_eq!(inactive.count(), 0);
}

#[tokio::test]
async fn test_no_subscribers_is_an_empty_report() {
    let report = dispatcher().dispatch("invoice.paid", json!({})).await.unwrap();
    assert_eq!(report.attempted, 0);
    assert!(report.deliveries.is_empty());
}

#[tokio::test]
async fn test_invalid_event_name_rejected() {
    assert!(dispatcher().dispatch("Invoice Paid", json!({})).await.is_err());
}

#[tokio::test]
async fn test_send_test_ignores_event_filter() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let subscriber = start_programmable_subscriber(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (200, "ok".to_string())
        }
    })
    .await;
    let dispatcher = dispatcher();
    let created = dispatcher
        .registry()
        .create(hook(subscriber.url(), &["invoice.paid"], Some("k")))
        .unwrap();

    let delivery = dispatcher.send_test(created.id).await.unwrap();
    assert!(delivery.success);
    assert_eq!(delivery.event, TEST_EVENT);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(subscriber.received()[0].header(EVENT_HEADER), Some(TEST_EVENT));
}

#[tokio::test]
async fn test_delivery_log_is_bounded() {
    let subscriber = start_subscriber(200, "").await;
    let config = WebhookConfig::default();
    let dispatcher =
        WebhookDispatcher::new(WebhookRegistry::new(None), DeliveryLog::new(3), &config).unwrap();
    let created = dispatcher
        .registry()
        .create(hook(subscriber.url(), &["invoice.paid"], None))
        .unwrap();

    for n in 0..5 {
        dispatcher.dispatch("invoice.paid", json!({ "n": n })).await.unwrap();
    }

    let (entries, total) = dispatcher.log().list(created.id, 0, 10);
    assert_eq!(total, 3);
    assert_eq!(entries[0].payload["data"]["n"], 4);
    assert_eq!(entries[2].payload["data"]["n"], 2);
}

#[tokio::test]
async fn test_long_response_body_is_capped() {
    // 9 ASCII bytes then a 3-byte character straddling the 10-byte cap.
    let body = format!("abcdefghi€{}", "x".repeat(64 * 1024));
    let subscriber = start_programmable_subscriber(move || {
        let body = body.clone();
        async move { (200, body) }
    })
    .await;
    let config = WebhookConfig {
        delivery_timeout_ms: 2_000,
        max_response_body_bytes: 10,
        ..WebhookConfig::default()
    };
    let dispatcher =
        WebhookDispatcher::new(WebhookRegistry::new(None), DeliveryLog::new(10), &config).unwrap();
    dispatcher
        .registry()
        .create(hook(subscriber.url(), &["invoice.paid"], None))
        .unwrap();

    let report = dispatcher.dispatch("invoice.paid", json!({})).await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.deliveries[0].response_body.as_deref(), Some("abcdefghi"));
}

#[tokio::test]
async fn test_delivery_for_deleted_webhook_is_not_logged() {
    let subscriber = start_programmable_subscriber(|| async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        (200, "ok".to_string())
    })
    .await;
    let dispatcher = dispatcher();
    let created = dispatcher
        .registry()
        .create(hook(subscriber.url(), &["invoice.paid"], None))
        .unwrap();

    let in_flight = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.dispatch("invoice.paid", json!({})).await })
    };
    while subscriber.count() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    dispatcher.registry().delete(created.id).unwrap();
    dispatcher.log().remove(created.id);

    let report = in_flight.await.unwrap().unwrap();
    assert_eq!(report.succeeded, 1);
    let (deliveries, total) = dispatcher.log().list(created.id, 0, 10);
    assert!(deliveries.is_empty());
    assert_eq!(total, 0);
}
