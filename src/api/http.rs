//! REST implementation of the collaborator traits.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AccountService, PasswordChange, RecordStore};
use crate::config::Config;
use crate::errors::ConsoleError;
use crate::models::{Entity, Record};

/// Header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Per-login state: the cookie jar lives inside the client.
struct Session {
    client: Client,
    csrf_token: Option<String>,
}

/// HTTP client for the records backend.
#[derive(Clone)]
pub struct HttpStore {
    base_url: String,
    timeout: Duration,
    session: Arc<RwLock<Session>>,
}

impl HttpStore {
    /// Build a client and resolve the CSRF token.
    ///
    /// A configured token wins; otherwise the token is scraped from the
    /// backend's page. A missing token is not an error here, the backend
    /// will reject mutations instead.
    pub async fn connect(config: &Config) -> Result<Self, ConsoleError> {
        let client = build_client(config.request_timeout)?;

        let csrf_token = match &config.csrf_token {
            Some(token) => Some(token.clone()),
            None => fetch_csrf_token(&client, &config.url("/")).await,
        };

        if csrf_token.is_none() {
            tracing::warn!("No CSRF token available; mutating requests will likely be rejected");
        }

        Ok(Self {
            base_url: config.base_url.clone(),
            timeout: config.request_timeout,
            session: Arc::new(RwLock::new(Session { client, csrf_token })),
        })
    }

    pub fn has_csrf_token(&self) -> bool {
        self.session
            .read()
            .map(|s| s.csrf_token.is_some())
            .unwrap_or(false)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn current(&self) -> Result<(Client, Option<String>), ConsoleError> {
        let session = self
            .session
            .read()
            .map_err(|_| ConsoleError::InvalidState("Session lock poisoned".to_string()))?;
        Ok((session.client.clone(), session.csrf_token.clone()))
    }

    /// Send a request and return the body of a 2xx response.
    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<String, ConsoleError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let (client, csrf_token) = self.current()?;
        let mutating = method != Method::GET;

        let mut request = client.request(method.clone(), self.url(path));
        if mutating {
            match csrf_token {
                Some(token) => request = request.header(CSRF_HEADER, token),
                None => tracing::warn!("Sending {} {} without a CSRF token", method, path),
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!("{} {}", method, path);
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(text)
        } else {
            tracing::warn!("{} {} failed with status {}", method, path, status);
            Err(ConsoleError::from_response(status.as_u16(), &text))
        }
    }
}

impl RecordStore for HttpStore {
    async fn list(&self, entity: Entity) -> Result<Vec<Record>, ConsoleError> {
        let text = self
            .send::<()>(Method::GET, entity.collection_path(), None)
            .await?;

        let payload = match serde_json::from_str::<Value>(&text) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("{} payload is not JSON ({}), treating as empty", entity, e);
                Value::Null
            }
        };
        Ok(Record::collection_from_json(payload))
    }

    async fn create(&self, entity: Entity, record: &Record) -> Result<Option<Record>, ConsoleError> {
        let body = record.without_id();
        let text = self
            .send(Method::POST, entity.collection_path(), Some(&body))
            .await?;
        accepted(&text)?;
        Ok(created_record(&text))
    }

    async fn update(&self, entity: Entity, id: i64, record: &Record) -> Result<(), ConsoleError> {
        let text = self
            .send(Method::PUT, &entity.item_path(id), Some(record))
            .await?;
        accepted(&text)
    }
}

#[derive(Debug, Deserialize)]
struct SuccessFlag {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

impl AccountService for HttpStore {
    async fn change_password(&self, request: &PasswordChange) -> Result<(), ConsoleError> {
        let text = self
            .send(Method::POST, "/change-password", Some(request))
            .await?;

        let flag: SuccessFlag = serde_json::from_str(&text)?;
        if flag.success {
            tracing::info!("Password changed");
            return Ok(());
        }

        accepted(&text)?;
        Err(ConsoleError::Rejected {
            status: 200,
            message: flag
                .message
                .unwrap_or_else(|| "Password change was not accepted".to_string()),
        })
    }

    async fn logout(&self) {
        if let Err(e) = self.send::<()>(Method::POST, "/logout", None).await {
            tracing::debug!("Logout request failed, ignoring: {}", e);
        }

        match (build_client(self.timeout), self.session.write()) {
            (Ok(client), Ok(mut session)) => {
                session.client = client;
                session.csrf_token = None;
            }
            (_, Ok(mut session)) => session.csrf_token = None,
            (_, Err(_)) => tracing::error!("Session lock poisoned during logout"),
        }
        tracing::info!("Local session cleared");
    }
}

fn build_client(timeout: Duration) -> Result<Client, ConsoleError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .cookie_store(true)
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(ConsoleError::from)
}

async fn fetch_csrf_token(client: &Client, page_url: &str) -> Option<String> {
    let response = match client
        .get(page_url)
        .header(ACCEPT, "text/html")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Could not load {} for CSRF token: {}", page_url, e);
            return None;
        }
    };

    match response.text().await {
        Ok(html) => csrf_from_html(&html),
        Err(e) => {
            tracing::warn!("Could not read {} for CSRF token: {}", page_url, e);
            None
        }
    }
}

/// Extract `content` of `<meta name="csrf-token" content="...">`.
pub fn csrf_from_html(html: &str) -> Option<String> {
    html.split("<meta")
        .skip(1)
        .filter_map(|rest| rest.split('>').next())
        .find(|tag| attribute(tag, "name").as_deref() == Some("csrf-token"))
        .and_then(|tag| attribute(tag, "content"))
        .filter(|token| !token.is_empty())
}

fn attribute(tag: &str, name: &str) -> Option<String> {
    let needle = format!("{}=", name);
    let mut search = tag;
    while let Some(pos) = search.find(&needle) {
        let preceded_ok = pos == 0
            || search[..pos]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace());
        let after = &search[pos + needle.len()..];
        if preceded_ok {
            let quote = after.chars().next()?;
            if quote == '"' || quote == '\'' {
                let value = &after[1..];
                return value.find(quote).map(|end| value[..end].to_string());
            }
        }
        search = after;
    }
    None
}

/// A success status whose body still carries field `errors` is a validation
/// failure.
fn accepted(text: &str) -> Result<(), ConsoleError> {
    match ConsoleError::from_response(200, text) {
        validation @ ConsoleError::Validation { .. } => {
            tracing::warn!("Backend reported validation errors with a success status");
            Err(validation)
        }
        _ => Ok(()),
    }
}

/// The backend may answer a create with the record itself or wrapped in `data`.
fn created_record(text: &str) -> Option<Record> {
    let value: Value = serde_json::from_str(text).ok()?;
    let candidate = match value.get("data").filter(|data| data.is_object()).cloned() {
        Some(data) => data,
        None => value,
    };
    serde_json::from_value::<Record>(candidate)
        .ok()
        .filter(|record| record.id.is_some())
}
