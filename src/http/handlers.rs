//! Business API handlers.
//!
//! Handlers only ever run after the pipeline admitted the request, so they
//! deal with payload validation and simulated side effects, nothing else.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::Uri;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use opentelemetry::KeyValue;
use serde::{Deserialize, Serialize};

use crate::config::validation::parse_http_url;
use crate::http::error::{ApiError, ApiResult};
use crate::http::pipeline::RouteGroups;
use crate::model::{Message, MessageType};
use crate::observability::ActiveSpan;
use crate::simulation::{ContactStore, EventEmitter, MessageIdGenerator};
use crate::webhook::payload::MESSAGING_PRODUCT;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// The only phone number id this deployment sends from.
    pub phone_number_id: Arc<str>,
    pub contacts: Arc<ContactStore>,
    pub ids: MessageIdGenerator,
    pub emitter: EventEmitter,
}

impl AppState {
    pub fn new(phone_number_id: &str, emitter: EventEmitter) -> Self {
        Self {
            phone_number_id: Arc::from(phone_number_id),
            contacts: Arc::new(ContactStore::new()),
            ids: MessageIdGenerator,
            emitter,
        }
    }
}

/// All business routes, grouped by the credential they require.
pub fn routes(state: AppState) -> RouteGroups {
    RouteGroups {
        public: Router::new()
            .route("/health", get(health))
            .fallback(not_found),
        caller: Router::new()
            .route("/v1/{phone_number_id}/messages", post(send_message))
            .route("/v1/contacts", post(check_contacts))
            .with_state(state.clone()),
        admin: Router::new()
            .route(
                "/v1/settings/application",
                get(get_settings).patch(update_settings),
            )
            .with_state(state),
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::InvalidParameter(rejection.body_text()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactResult {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wa_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub messaging_product: String,
    pub contacts: Vec<ContactResult>,
    pub messages: Vec<MessageRef>,
}

/// Check the parts of `message` that depend on its type.
fn validate_message(message: &Message) -> ApiResult<&str> {
    if let Some(product) = message.messaging_product.as_deref() {
        if product != MESSAGING_PRODUCT {
            return Err(ApiError::InvalidParameter(format!(
                "messaging_product must be \"{MESSAGING_PRODUCT}\""
            )));
        }
    }

    let to = message
        .to
        .as_deref()
        .map(str::trim)
        .filter(|to| !to.is_empty())
        .ok_or_else(|| ApiError::InvalidParameter("to is required".into()))?;

    match message.kind {
        MessageType::Text => {
            let has_body = message
                .text
                .as_ref()
                .is_some_and(|text| !text.body.trim().is_empty());
            if !has_body {
                return Err(ApiError::InvalidParameter("text.body is required".into()));
            }
        }
        MessageType::Image => {
            let has_media = message
                .image
                .as_ref()
                .is_some_and(|image| image.id.is_some() || image.link.is_some());
            if !has_media {
                return Err(ApiError::InvalidParameter(
                    "image.id or image.link is required".into(),
                ));
            }
        }
        MessageType::Unknown => {
            return Err(ApiError::InvalidParameter("unsupported message type".into()));
        }
    }

    Ok(to)
}

async fn send_message(
    State(state): State<AppState>,
    Path(phone_number_id): Path<String>,
    span: Option<Extension<ActiveSpan>>,
    payload: Result<Json<Message>, JsonRejection>,
) -> ApiResult<Json<SendMessageResponse>> {
    if phone_number_id != *state.phone_number_id {
        return Err(ApiError::NotFound(format!(
            "unknown phone number id {phone_number_id}"
        )));
    }
    let message = body(payload)?;
    let to = validate_message(&message)?;

    let contact = state
        .contacts
        .resolve(to)
        .ok_or_else(|| ApiError::InvalidParameter(format!("{to} is not a phone number")))?;
    let message_id = state.ids.next_id();

    if let Some(Extension(span)) = span {
        span.set_attribute(KeyValue::new("messaging.message_id", message_id.clone()));
    }
    tracing::info!(
        message_id = %message_id,
        wa_id = %contact.wa_id,
        phone_number_id = %phone_number_id,
        "Message accepted"
    );

    state
        .emitter
        .schedule_statuses(phone_number_id, message_id.clone(), contact.clone());

    Ok(Json(SendMessageResponse {
        messaging_product: MESSAGING_PRODUCT.to_string(),
        contacts: vec![ContactResult {
            input: to.to_string(),
            status: None,
            wa_id: Some(contact.wa_id),
        }],
        messages: vec![MessageRef { id: message_id }],
    }))
}

#[derive(Debug, Deserialize)]
pub struct ContactsRequest {
    #[serde(default)]
    pub contacts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactsResponse {
    pub contacts: Vec<ContactResult>,
}

async fn check_contacts(
    State(state): State<AppState>,
    payload: Result<Json<ContactsRequest>, JsonRejection>,
) -> ApiResult<Json<ContactsResponse>> {
    let request = body(payload)?;
    if request.contacts.is_empty() {
        return Err(ApiError::InvalidParameter("contacts is required".into()));
    }

    let contacts = request
        .contacts
        .into_iter()
        .map(|input| {
            let wa_id = state.contacts.resolve(&input).map(|contact| contact.wa_id);
            let status = if wa_id.is_some() { "valid" } else { "invalid" };
            ContactResult {
                input,
                status: Some(status.to_string()),
                wa_id,
            }
        })
        .collect();

    Ok(Json(ContactsResponse { contacts }))
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WebhookSettings {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ApplicationSettings {
    #[serde(default)]
    pub webhooks: Option<WebhookSettings>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub settings: SettingsBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingsBody {
    pub application: ApplicationSettings,
}

fn current_settings(state: &AppState) -> SettingsResponse {
    let url = state.emitter.client().endpoint().map(|url| url.to_string());
    SettingsResponse {
        settings: SettingsBody {
            application: ApplicationSettings {
                webhooks: Some(WebhookSettings { url }),
            },
        },
    }
}

async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(current_settings(&state))
}

/// Replace the webhook URL. An empty string stops deliveries.
async fn update_settings(
    State(state): State<AppState>,
    payload: Result<Json<ApplicationSettings>, JsonRejection>,
) -> ApiResult<Json<SettingsResponse>> {
    let settings = body(payload)?;
    let Some(webhooks) = settings.webhooks else {
        return Ok(Json(current_settings(&state)));
    };

    let url = match webhooks.url.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_http_url(raw).map_err(ApiError::InvalidParameter)?),
    };
    state.emitter.client().set_endpoint(url);

    Ok(Json(current_settings(&state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BusinessConfig, WebhookConfig};
    use crate::simulation::StatusTimeline;
    use crate::webhook::WebhookClient;
    use axum::body::Body;
    use axum::http::{header, Method, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    fn state() -> AppState {
        let client = Arc::new(WebhookClient::new(&WebhookConfig::default()).unwrap());
        let emitter = EventEmitter::new(
            client,
            BusinessConfig::default(),
            StatusTimeline::new(Duration::ZERO, false),
        );
        AppState::new("106540352242922", emitter)
    }

    fn app(state: AppState) -> Router {
        let groups = routes(state);
        groups.public.merge(groups.caller).merge(groups.admin)
    }

    async fn call(
        app: Router,
        method: Method,
        uri: &str,
        json: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        let body = match json {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = call(app(state()), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_path_uses_error_envelope() {
        let (status, json) = call(app(state()), Method::POST, "/v1/messages", Some("{}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["errors"][0]["code"], 1006);
    }

    #[tokio::test]
    async fn test_send_text_message() {
        let state = state();
        let (status, json) = call(
            app(state.clone()),
            Method::POST,
            "/v1/106540352242922/messages",
            Some(r#"{"messaging_product":"whatsapp","to":"+1 (555) 010-2030","type":"text","text":{"body":"hi"}}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["messaging_product"], "whatsapp");
        assert_eq!(json["contacts"][0]["input"], "+1 (555) 010-2030");
        assert_eq!(json["contacts"][0]["wa_id"], "15550102030");
        assert!(json["contacts"][0].get("status").is_none());
        assert!(json["messages"][0]["id"]
            .as_str()
            .unwrap()
            .starts_with("wamid."));
        assert!(state.contacts.get("15550102030").is_some());
    }

    #[tokio::test]
    async fn test_send_from_unknown_phone_number_id() {
        let state = state();
        let (status, json) = call(
            app(state.clone()),
            Method::POST,
            "/v1/999/messages",
            Some(r#"{"to":"15550102030","type":"text","text":{"body":"hi"}}"#),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["errors"][0]["code"], 1006);
        assert!(state.contacts.get("15550102030").is_none());
    }

    #[tokio::test]
    async fn test_send_message_validation() {
        let cases = [
            r#"{"type":"text","text":{"body":"hi"}}"#,
            r#"{"to":"15550102030","type":"text"}"#,
            r#"{"to":"15550102030","type":"text","text":{"body":"  "}}"#,
            r#"{"to":"15550102030","type":"image","image":{"caption":"no media"}}"#,
            r#"{"to":"15550102030","type":"sticker"}"#,
            r#"{"to":"no digits","type":"text","text":{"body":"hi"}}"#,
            r#"{"messaging_product":"sms","to":"15550102030","type":"text","text":{"body":"hi"}}"#,
            r#"not json"#,
        ];

        for case in cases {
            let (status, json) = call(
                app(state()),
                Method::POST,
                "/v1/106540352242922/messages",
                Some(case),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "case {case}");
            assert_eq!(json["errors"][0]["code"], 1008, "case {case}");
        }
    }

    #[tokio::test]
    async fn test_send_image_message() {
        let (status, _) = call(
            app(state()),
            Method::POST,
            "/v1/106540352242922/messages",
            Some(r#"{"to":"15550102030","type":"image","image":{"link":"https://example.com/a.png"}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_check_contacts() {
        let (status, json) = call(
            app(state()),
            Method::POST,
            "/v1/contacts",
            Some(r#"{"blocking":"wait","contacts":["+15550102030","unknown"]}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["contacts"][0]["status"], "valid");
        assert_eq!(json["contacts"][0]["wa_id"], "15550102030");
        assert_eq!(json["contacts"][1]["status"], "invalid");
        assert!(json["contacts"][1].get("wa_id").is_none());
    }

    #[tokio::test]
    async fn test_settings_hot_swap() {
        let state = state();

        let (status, json) = call(
            app(state.clone()),
            Method::GET,
            "/v1/settings/application",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["settings"]["application"]["webhooks"]["url"].is_null());

        let (status, json) = call(
            app(state.clone()),
            Method::PATCH,
            "/v1/settings/application",
            Some(r#"{"webhooks":{"url":"http://127.0.0.1:9000/hook"}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["settings"]["application"]["webhooks"]["url"],
            "http://127.0.0.1:9000/hook"
        );
        assert_eq!(
            state.emitter.client().endpoint().unwrap().as_str(),
            "http://127.0.0.1:9000/hook"
        );

        let (status, _) = call(
            app(state.clone()),
            Method::PATCH,
            "/v1/settings/application",
            Some(r#"{"webhooks":{"url":"ftp://example.com"}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.emitter.client().endpoint().is_some());

        let (status, _) = call(
            app(state.clone()),
            Method::PATCH,
            "/v1/settings/application",
            Some(r#"{"webhooks":{"url":""}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.emitter.client().endpoint().is_none());
    }
}
