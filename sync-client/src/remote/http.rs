//! HTTP implementation of the reservations backend.

use super::{RemoteError, ReservationRemote};
use crate::config::SyncConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use terrace_sync_types::{BulkSyncRequest, BulkSyncResponse, Reservation};

/// Longest error body kept in [`RemoteError::Http`].
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for the reservations backend.
///
/// - `POST {base}/reservations/sync` for bulk creates
/// - `GET {base}/reservations/user/{owner}` for the server view
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

/// The list endpoint answers either a bare array or a wrapped one.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Bare(Vec<Reservation>),
    Wrapped {
        #[serde(alias = "data")]
        reservations: Vec<Reservation>,
    },
}

impl HttpRemote {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let base_url =
            Url::parse(base_url).map_err(|e| RemoteError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Create a client from engine configuration.
    pub fn from_config(config: &SyncConfig) -> Result<Self, RemoteError> {
        let remote = Self::new(&config.base_url, config.request_timeout)?;
        Ok(match &config.token {
            Some(token) => remote.with_token(token.clone()),
            None => remote,
        })
    }

    /// Set the bearer token sent with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else if e.is_decode() {
        RemoteError::Decode(e.to_string())
    } else {
        RemoteError::Network(e.to_string())
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[async_trait]
impl ReservationRemote for HttpRemote {
    async fn bulk_sync(&self, request: &BulkSyncRequest) -> Result<BulkSyncResponse, RemoteError> {
        let url = self.endpoint(&["reservations", "sync"])?;
        tracing::debug!(
            "POST {} ({} reservations)",
            url,
            request.reservations.len()
        );

        let response = self
            .authorize(self.client.post(url).json(request))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()));
        }

        // Rejections usually come back as 4xx with a JSON body.
        match serde_json::from_str::<BulkSyncResponse>(&text) {
            Ok(body) if !body.success => Ok(body),
            _ => Err(RemoteError::Http {
                status: status.as_u16(),
                body: truncate(text),
            }),
        }
    }

    async fn list_reservations(&self, owner_id: &str) -> Result<Vec<Reservation>, RemoteError> {
        let url = self.endpoint(&["reservations", "user", owner_id])?;
        tracing::debug!("GET {}", url);

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RemoteError::Http {
                status: status.as_u16(),
                body: truncate(text),
            });
        }

        let text = response.text().await.map_err(map_reqwest_error)?;
        let body: ListBody =
            serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))?;

        let mut reservations = match body {
            ListBody::Bare(list) => list,
            ListBody::Wrapped { reservations } => reservations,
        };
        // Whatever the server lists is confirmed.
        for r in &mut reservations {
            r.pending = false;
        }
        Ok(reservations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
        });

        (format!("http://{}", addr), rx)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn empty_request() -> BulkSyncRequest {
        BulkSyncRequest {
            reservations: Vec::new(),
        }
    }

    #[tokio::test]
    async fn bulk_sync_posts_to_sync_endpoint_and_decodes_mapping() {
        let (base, request) = serve_once(
            "200 OK",
            r#"{"success":true,"mapping":[{"clienteId":"local_123","serverId":"srv_999"}],"syncedCount":1}"#,
        )
        .await;
        let remote = HttpRemote::new(&base, Duration::from_secs(5)).unwrap();

        let response = remote.bulk_sync(&empty_request()).await.unwrap();

        assert!(response.success);
        assert_eq!(response.mapping[0].server_id.as_str(), "srv_999");
        assert_eq!(response.synced_count, Some(1));

        let raw = request.await.unwrap();
        assert!(raw.starts_with("POST /reservations/sync HTTP/1.1"));
        assert!(raw.contains(r#"{"reservations":[]}"#));
    }

    #[tokio::test]
    async fn rejection_body_on_error_status_is_returned_as_response() {
        let (base, _request) =
            serve_once("400 Bad Request", r#"{"success":false,"error":"invalid date"}"#).await;
        let remote = HttpRemote::new(&base, Duration::from_secs(5)).unwrap();

        let response = remote.bulk_sync(&empty_request()).await.unwrap();

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("invalid date"));
    }

    #[tokio::test]
    async fn null_mapping_rejection_is_returned_as_response() {
        let (base, _request) = serve_once(
            "422 Unprocessable Entity",
            r#"{"success":false,"mapping":null,"message":"terrace closed"}"#,
        )
        .await;
        let remote = HttpRemote::new(&base, Duration::from_secs(5)).unwrap();

        let response = remote.bulk_sync(&empty_request()).await.unwrap();

        assert!(!response.success);
        assert!(response.mapping.is_empty());
        assert_eq!(response.message.as_deref(), Some("terrace closed"));
    }

    #[tokio::test]
    async fn non_json_error_status_is_http_error() {
        let (base, _request) = serve_once("502 Bad Gateway", "upstream down").await;
        let remote = HttpRemote::new(&base, Duration::from_secs(5)).unwrap();

        let result = remote.bulk_sync(&empty_request()).await;

        assert_eq!(
            result,
            Err(RemoteError::Http {
                status: 502,
                body: "upstream down".into()
            })
        );
    }

    #[tokio::test]
    async fn list_reservations_accepts_wrapped_body_and_clears_pending() {
        let (base, request) = serve_once(
            "200 OK",
            r#"{"reservations":[{"id":"srv_1","ownerId":"owner 7","date":"2026-06-12","startTime":"18:00:00","status":"confirmed","pending":true}]}"#,
        )
        .await;
        let remote = HttpRemote::new(&format!("{}/api/", base), Duration::from_secs(5)).unwrap();

        let listed = remote.list_reservations("owner 7").await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id.as_str(), "srv_1");
        assert!(!listed[0].pending);

        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /api/reservations/user/owner%207 HTTP/1.1"));
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let remote = HttpRemote::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();

        let result = remote.bulk_sync(&empty_request()).await;

        assert!(matches!(result, Err(RemoteError::Network(_))));
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            HttpRemote::new("not a url", Duration::from_secs(1)),
            Err(RemoteError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpRemote::new("mailto:ops@example.com", Duration::from_secs(1)),
            Err(RemoteError::InvalidUrl(_))
        ));
    }
}
