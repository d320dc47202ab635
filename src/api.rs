// HTTP client for the worker's local API.

use reqwest::{header, Client, Method};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{HostError, Result};

/// Connection details reported by the worker's status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectInfo {
    pub host: String,
    pub pid: u32,
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    data: ConnectInfo,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the worker's local HTTP API.
///
/// No request timeout is applied on purpose: the worker is local, and a hung
/// request blocks only its own future, never the controller's task.
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    /// Issue a request against the worker API and parse the JSON response.
    /// A non-success status surfaces as `HostError::Status`; the body is
    /// serialized JSON when a payload is given, with a JSON content type
    /// either way.
    pub async fn invoke(
        &self,
        endpoint: &str,
        method: Method,
        payload: Option<Value>,
    ) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut request = self
            .client
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(payload) = payload {
            request = request.json(&payload);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(HostError::Status(response.status()));
        }
        Ok(response.json::<Value>().await?)
    }

    /// Handshake with the worker's status endpoint. Returns the connection
    /// details plus the server's message, if it sent one.
    pub async fn connect(&self) -> Result<(ConnectInfo, Option<String>)> {
        let value = self.invoke("v1/connect", Method::GET, None).await?;
        let parsed: ConnectResponse = serde_json::from_value(value)?;
        Ok((parsed.data, parsed.message))
    }

    /// Kick off a task on the worker. Returns the server's message, if any.
    pub async fn start_task(&self, message: &str) -> Result<Option<String>> {
        let value = self
            .invoke(
                "start_task",
                Method::POST,
                Some(serde_json::json!({ "message": message })),
            )
            .await?;
        Ok(value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[cfg(test)]
pub(crate) async fn spawn_single_response_server(
    expected_path: &'static str,
    response_status: &'static str,
    response_body: &'static str,
) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut buf = [0u8; 4096];
        let n = socket.read(&mut buf).await.expect("read");
        let req = String::from_utf8_lossy(&buf[..n]);
        let first_line = req.lines().next().unwrap_or("");
        assert!(
            first_line.contains(expected_path),
            "expected path {}, got request line {}",
            expected_path,
            first_line
        );
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            response_status,
            response_body.len(),
            response_body
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write_all");
    });
    format!("http://{}", addr)
}
