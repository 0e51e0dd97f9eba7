//! Accepted messages turn into status webhooks at the configured receiver.

mod common;

use std::time::Duration;

use common::{
    spawn_server, start_programmable_receiver, start_webhook_receiver, test_config, ADMIN_KEY,
    API_KEY, PHONE_NUMBER_ID,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use wabiz_mock::config::BusinessConfig;

const WAIT: Duration = Duration::from_secs(5);

async fn send_text(client: &reqwest::Client, url: &str) -> String {
    let res = client
        .post(url)
        .bearer_auth(API_KEY)
        .json(&json!({
            "messaging_product": "whatsapp",
            "to": "+1 555 010 2030",
            "type": "text",
            "text": { "body": "Hello World" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    body["messages"][0]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_status_timeline_delivered_in_order() {
    let mut receiver = start_webhook_receiver().await;
    let mut config = test_config();
    config.webhook.url = Some(receiver.url.clone());
    let server = spawn_server(config).await;
    let client = reqwest::Client::new();

    let message_id = send_text(
        &client,
        &server.url(&format!("/v1/{PHONE_NUMBER_ID}/messages")),
    )
    .await;

    let business = BusinessConfig::default();
    let mut seen = Vec::new();
    let mut stamps = Vec::new();
    for _ in 0..3 {
        let delivery = receiver.next(WAIT).await.expect("webhook not delivered");
        assert_eq!(delivery.content_type.as_deref(), Some("application/json"));

        let payload = delivery.body;
        assert_eq!(payload["object"], "whatsapp_business_account");
        assert_eq!(payload["entry"][0]["id"], business.account_id.as_str());

        let change = &payload["entry"][0]["changes"][0];
        assert_eq!(change["field"], "messages");

        let value = change["value"].as_object().unwrap();
        assert_eq!(value["messaging_product"], "whatsapp");
        assert_eq!(value["metadata"]["phone_number_id"], PHONE_NUMBER_ID);
        assert_eq!(
            value["metadata"]["display_phone_number"],
            business.display_phone_number.as_str()
        );
        assert!(!value.contains_key("contacts"));
        assert!(!value.contains_key("messages"));
        assert!(!value.contains_key("errors"));

        let status = &value["statuses"][0];
        assert_eq!(status["id"], message_id.as_str());
        assert_eq!(status["recipient_id"], "15550102030");
        assert_eq!(status["pricing"]["pricing_model"], "CBP");
        assert_eq!(status["pricing"]["billable"], true);
        assert!(status["conversation"]["id"].is_string());
        seen.push(status["status"].as_str().unwrap().to_string());
        stamps.push(status["timestamp"].as_i64().unwrap());
    }

    assert_eq!(seen, ["sent", "delivered", "read"]);
    assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]), "{stamps:?}");
}

#[tokio::test]
async fn test_unknown_phone_number_id_sends_nothing() {
    let mut receiver = start_webhook_receiver().await;
    let mut config = test_config();
    config.webhook.url = Some(receiver.url.clone());
    config.business.phone_number_id = "111".to_string();
    let server = spawn_server(config).await;

    let res = reqwest::Client::new()
        .post(server.url("/v1/999/messages"))
        .bearer_auth(API_KEY)
        .json(&json!({ "to": "15550102030", "type": "text", "text": { "body": "hi" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errors"][0]["code"], 1006);

    assert!(receiver.next(Duration::from_millis(300)).await.is_none());
    assert_eq!(receiver.hits(), 0);
}

#[tokio::test]
async fn test_failed_delivery_is_retried() {
    // The very first request fails, everything after it succeeds.
    let mut receiver = start_programmable_receiver(|n| if n == 1 { 503 } else { 200 }).await;
    let mut config = test_config();
    config.webhook.url = Some(receiver.url.clone());
    config.simulation.read_receipts = false;
    let server = spawn_server(config).await;
    let client = reqwest::Client::new();

    send_text(
        &client,
        &server.url(&format!("/v1/{PHONE_NUMBER_ID}/messages")),
    )
    .await;

    let first = receiver.next(WAIT).await.expect("sent not delivered");
    let second = receiver.next(WAIT).await.expect("delivered not delivered");
    let status = |payload: &Value| {
        payload["entry"][0]["changes"][0]["value"]["statuses"][0]["status"]
            .as_str()
            .unwrap()
            .to_string()
    };
    assert_eq!(status(&first.body), "sent");
    assert_eq!(status(&second.body), "delivered");
    assert_eq!(receiver.hits(), 3);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut receiver = start_programmable_receiver(|_| 400).await;
    let mut config = test_config();
    config.webhook.url = Some(receiver.url.clone());
    config.simulation.read_receipts = false;
    let server = spawn_server(config).await;
    let client = reqwest::Client::new();

    send_text(
        &client,
        &server.url(&format!("/v1/{PHONE_NUMBER_ID}/messages")),
    )
    .await;

    assert!(receiver.next(Duration::from_millis(500)).await.is_none());
    assert_eq!(receiver.hits(), 2);
}

#[tokio::test]
async fn test_webhook_url_set_at_runtime() {
    let mut receiver = start_webhook_receiver().await;
    let server = spawn_server(test_config()).await;
    let client = reqwest::Client::new();
    let messages_url = server.url(&format!("/v1/{PHONE_NUMBER_ID}/messages"));

    // Nothing configured yet: the message is accepted, no webhook goes out.
    send_text(&client, &messages_url).await;
    assert!(receiver.next(Duration::from_millis(200)).await.is_none());

    let res = client
        .patch(server.url("/v1/settings/application"))
        .header("Authorization", format!("Apikey {ADMIN_KEY}"))
        .json(&json!({ "webhooks": { "url": receiver.url } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["settings"]["application"]["webhooks"]["url"],
        receiver.url.as_str()
    );

    let message_id = send_text(&client, &messages_url).await;
    let delivery = receiver.next(WAIT).await.expect("webhook not delivered");
    assert_eq!(
        delivery.body["entry"][0]["changes"][0]["value"]["statuses"][0]["id"],
        message_id.as_str()
    );
}
