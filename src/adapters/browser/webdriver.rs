//! WebDriver adapter. Implements PageDriver over the W3C wire protocol.
//!
//! Plain JSON over HTTP with reqwest — no client crate, the handful of
//! endpoints the core needs is small. Attaches to an already-authenticated
//! Chrome through `goog:chromeOptions.debuggerAddress`, so the tool never
//! touches mail credentials itself.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::{DomainError, ElementHandle};
use crate::ports::PageDriver;

/// W3C element identifier key inside element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Live-page gateway over a WebDriver session.
pub struct WebDriverPage {
    client: reqwest::Client,
    server_url: String,
    session_id: String,
}

impl WebDriverPage {
    /// Open a session against `server_url` (e.g. a local chromedriver).
    ///
    /// With `debugger_address` set, the session attaches to that running
    /// Chrome instead of launching a fresh (signed-out) profile.
    pub async fn connect(
        server_url: &str,
        debugger_address: Option<&str>,
    ) -> Result<Self, DomainError> {
        let server_url = server_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::new();

        let mut chrome_options = serde_json::Map::new();
        if let Some(address) = debugger_address {
            chrome_options.insert("debuggerAddress".into(), Value::String(address.to_string()));
        }
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": Value::Object(chrome_options),
                }
            }
        });

        let response = client
            .post(format!("{}/session", server_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::PageGateway(format!("session request failed: {}", e)))?;
        let value = unwrap_response(response).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::PageGateway("no sessionId in session response".into()))?
            .to_string();

        debug!(session_id = %session_id, "WebDriver session ready");
        Ok(Self {
            client,
            server_url,
            session_id,
        })
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.server_url, self.session_id, path)
    }

    /// POST a session command; returns the `value` of the response.
    async fn command(&self, path: &str, body: Value) -> Result<Value, DomainError> {
        let response = self
            .client
            .post(self.session_url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::PageGateway(format!("{} failed: {}", path, e)))?;
        unwrap_response(response).await
    }

    /// GET a session resource; returns the `value` of the response.
    async fn query(&self, path: &str) -> Result<Value, DomainError> {
        let response = self
            .client
            .get(self.session_url(path))
            .send()
            .await
            .map_err(|e| DomainError::PageGateway(format!("{} failed: {}", path, e)))?;
        unwrap_response(response).await
    }
}

/// Unwrap the W3C `{"value": ...}` envelope. Protocol errors carry a
/// non-success status plus `error`/`message` fields inside `value`.
async fn unwrap_response(response: reqwest::Response) -> Result<Value, DomainError> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| DomainError::PageGateway(format!("invalid WebDriver response: {}", e)))?;
    let value = body.get("value").cloned().unwrap_or(Value::Null);
    if !status.is_success() {
        let kind = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let message = value.get("message").and_then(Value::as_str).unwrap_or("");
        return Err(DomainError::PageGateway(format!(
            "{} ({}): {}",
            kind, status, message
        )));
    }
    Ok(value)
}

#[async_trait]
impl PageDriver for WebDriverPage {
    async fn current_url(&self) -> Result<String, DomainError> {
        let value = self.query("/url").await?;
        value
            .as_str()
            .map(String::from)
            .ok_or_else(|| DomainError::PageGateway("non-string url in response".into()))
    }

    async fn assign_location(&self, url: &str) -> Result<(), DomainError> {
        // Assignment from inside the page: the host SPA treats a hash change
        // as in-page navigation, where the driver-level navigate endpoint
        // would force a full load.
        self.command(
            "/execute/sync",
            json!({
                "script": "window.location.href = arguments[0];",
                "args": [url],
            }),
        )
        .await?;
        Ok(())
    }

    async fn find_all(&self, css: &str) -> Result<Vec<ElementHandle>, DomainError> {
        let value = self
            .command(
                "/elements",
                json!({ "using": "css selector", "value": css }),
            )
            .await?;
        let references = value.as_array().cloned().unwrap_or_default();
        Ok(references
            .iter()
            .filter_map(|reference| reference.get(ELEMENT_KEY).and_then(Value::as_str))
            .map(ElementHandle::new)
            .collect())
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, DomainError> {
        let value = self
            .query(&format!("/element/{}/text", element.opaque_ref))
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DomainError> {
        self.command(&format!("/element/{}/click", element.opaque_ref), json!({}))
            .await?;
        Ok(())
    }

    async fn press_key(&self, key: char) -> Result<(), DomainError> {
        let key = key.to_string();
        self.command(
            "/actions",
            json!({
                "actions": [{
                    "type": "key",
                    "id": "keyboard",
                    "actions": [
                        { "type": "keyDown", "value": key },
                        { "type": "keyUp", "value": key },
                    ],
                }]
            }),
        )
        .await?;
        Ok(())
    }

    async fn history_back(&self) -> Result<(), DomainError> {
        self.command("/back", json!({})).await?;
        Ok(())
    }
}
