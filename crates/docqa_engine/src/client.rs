use std::time::Duration;

use docqa_logging::{docqa_debug, docqa_info};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Answer, ApiError, Document, FailureKind, PageValue, UploadReceipt};

pub const DEFAULT_ORIGIN: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Scheme, host and port of the backend, e.g. `http://localhost:8000`.
    pub origin: String,
    /// `None` leaves the transport default in place.
    pub connect_timeout: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            connect_timeout: None,
            request_timeout: None,
        }
    }
}

#[async_trait::async_trait]
pub trait RagBackend: Send + Sync {
    /// `POST /upload` with the document as multipart field `file`.
    async fn upload(&self, document: &Document) -> Result<UploadReceipt, ApiError>;

    /// `POST /query` with `{"query": ...}`.
    async fn query(&self, query: &str) -> Result<Answer, ApiError>;

    /// `POST /delete_document/` with `{"filename": ...}`, returning the backend's message.
    async fn delete_document(&self, filename: &str) -> Result<String, ApiError>;

    /// `GET /`, returning the backend's status line.
    async fn health(&self) -> Result<String, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
    origin: String,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let origin = normalize_origin(&settings.origin)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self { client, origin })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    answer: String,
    #[serde(default)]
    sources: Option<Vec<String>>,
    #[serde(default)]
    pages: Option<Vec<PageValue>>,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    filename: &'a str,
}

#[derive(Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

#[async_trait::async_trait]
impl RagBackend for ReqwestBackend {
    async fn upload(&self, document: &Document) -> Result<UploadReceipt, ApiError> {
        let mut part = Part::bytes(document.bytes.to_vec()).file_name(document.filename.clone());
        if let Some(mime) = document.mime_type.as_deref() {
            part = part
                .mime_str(mime)
                .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        }
        let form = Form::new().part("file", part);

        docqa_info!(
            "POST /upload filename={} bytes={}",
            document.filename,
            document.bytes.len()
        );
        let response = self
            .client
            .post(self.endpoint("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body = read_success_body(response).await?;
        parse_body(&body)
    }

    async fn query(&self, query: &str) -> Result<Answer, ApiError> {
        docqa_info!("POST /query query_len={}", query.len());
        let response = self
            .client
            .post(self.endpoint("/query"))
            .json(&QueryRequest { query })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body = read_success_body(response).await?;
        let parsed: QueryResponse = parse_body(&body)?;
        Ok(Answer {
            answer: parsed.answer,
            sources: parsed.sources.unwrap_or_default(),
            pages: parsed.pages.unwrap_or_default(),
        })
    }

    async fn delete_document(&self, filename: &str) -> Result<String, ApiError> {
        docqa_info!("POST /delete_document/ filename={}", filename);
        let response = self
            .client
            .post(self.endpoint("/delete_document/"))
            .json(&DeleteRequest { filename })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body = read_success_body(response).await?;
        let parsed: DeleteResponse = parse_body(&body)?;
        Ok(parsed.message)
    }

    async fn health(&self) -> Result<String, ApiError> {
        let response = self
            .client
            .get(self.endpoint("/"))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body = read_success_body(response).await?;
        let parsed: HealthResponse = parse_body(&body)?;
        Ok(parsed.status)
    }
}

/// Validates an http(s) origin and strips any trailing slash.
fn normalize_origin(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = url::Url::parse(trimmed).map_err(|err| {
        ApiError::new(FailureKind::InvalidOrigin, format!("{trimmed:?}: {err}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ApiError::new(
            FailureKind::InvalidOrigin,
            format!("{trimmed:?}: expected an http or https origin"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Returns the body of a 2xx response; anything else becomes an `HttpStatus` error.
async fn read_success_body(response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    if status.is_success() {
        return Ok(body.to_vec());
    }

    docqa_debug!("Backend answered {} with {} bytes", status, body.len());
    let message = extract_detail(&body)
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
    Err(ApiError::new(FailureKind::HttpStatus(status.as_u16()), message))
}

/// Pulls a non-empty string `detail` out of a JSON error body.
fn extract_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("detail")?
        .as_str()
        .filter(|detail| !detail.is_empty())
        .map(str::to_string)
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| {
        ApiError::new(
            FailureKind::MalformedResponse,
            format!("malformed response: {err}"),
        )
    })
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{extract_detail, normalize_origin};
    use crate::FailureKind;

    #[test]
    fn origin_trailing_slash_is_stripped() {
        assert_eq!(
            normalize_origin("http://localhost:8000/").unwrap(),
            "http://localhost:8000"
        );
    }

    #[test]
    fn origin_must_be_http() {
        let err = normalize_origin("ftp://example.com").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidOrigin);
        let err = normalize_origin("localhost:8000").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidOrigin);
    }

    #[test]
    fn detail_must_be_a_non_empty_string() {
        assert_eq!(
            extract_detail(br#"{"detail":"file too large"}"#).as_deref(),
            Some("file too large")
        );
        assert_eq!(extract_detail(br#"{"detail":""}"#), None);
        assert_eq!(extract_detail(br#"{"detail":[{"msg":"field required"}]}"#), None);
        assert_eq!(extract_detail(b"Internal Server Error"), None);
    }
}
