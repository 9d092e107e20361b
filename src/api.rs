// API client module: a small blocking HTTP client that talks to the files
// service. Everything the commands need from the network goes through the
// `Transport` trait so the command layer can run against a fake in tests.

use crate::config::Config;
use crate::error::{CliError, Result};
use reqwest::blocking::{Body, Client, Response};
use reqwest::header::CONTENT_LENGTH;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::Duration;

/// Generic verbs against the files API plus the two raw byte transfers.
/// `path` arguments are API paths such as `/v1/files/abc`, `upload_url` is
/// a pre-signed absolute URL handed out by the service.
pub trait Transport {
    /// GET an API path and return the decoded JSON body.
    fn get(&self, path: &str) -> Result<Value>;
    /// POST `body` as JSON to an API path.
    fn post(&self, path: &str, body: &Value) -> Result<Value>;
    /// DELETE an API path.
    fn delete(&self, path: &str) -> Result<Value>;
    /// PUT the `size` bytes of `file` to a pre-signed upload URL.
    fn upload(&self, upload_url: &str, file: &Path, size: u64) -> Result<()>;
    /// Resolve the download URL behind `path` and write the bytes to `dest`.
    fn download(&self, path: &str, dest: &Path) -> Result<()>;
}

/// Blocking reqwest client bound to one API base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Error body returned by the service on non-2xx responses.
#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: Option<String>,
}

/// Response of `GET /v1/files/{id}?include=downloadUrl`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DownloadTarget {
    download_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(ApiClient {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into a `CliError`, surfacing the `error`
    /// field of the body when the service sent one.
    fn check(res: Response) -> Result<Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let txt = res.text().unwrap_or_default();
        Err(CliError::remote(status.as_u16(), error_message(status, txt)))
    }

    /// Parse a JSON body, treating an empty body as `null`.
    fn json(res: Response) -> Result<Value> {
        let txt = res.text()?;
        if txt.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&txt)?)
    }
}

/// Message of a failed response: the body's `error` field, else the raw
/// body, else the status line.
fn error_message(status: StatusCode, txt: String) -> String {
    if let Some(error) = serde_json::from_str::<ErrorBody>(&txt).ok().and_then(|body| body.error) {
        return error;
    }
    if txt.trim().is_empty() {
        status.to_string()
    } else {
        txt
    }
}

impl Transport for ApiClient {
    fn get(&self, path: &str) -> Result<Value> {
        tracing::debug!(path, "GET");
        let res = self.client.get(self.url(path)).send()?;
        Self::json(Self::check(res)?)
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value> {
        tracing::debug!(path, "POST");
        let res = self.client.post(self.url(path)).json(body).send()?;
        Self::json(Self::check(res)?)
    }

    fn delete(&self, path: &str) -> Result<Value> {
        tracing::debug!(path, "DELETE");
        let res = self.client.delete(self.url(path)).send()?;
        Self::json(Self::check(res)?)
    }

    fn upload(&self, upload_url: &str, file: &Path, size: u64) -> Result<()> {
        tracing::debug!(file = %file.display(), size, "PUT to upload url");
        let reader = File::open(file)?;
        let res = self
            .client
            .put(upload_url)
            .header(CONTENT_LENGTH, size)
            .body(Body::sized(reader, size))
            .send()?;
        Self::check(res)?;
        Ok(())
    }

    fn download(&self, path: &str, dest: &Path) -> Result<()> {
        let res = self.client.get(self.url(path)).send()?;
        let target: DownloadTarget = serde_json::from_value(Self::json(Self::check(res)?)?)?;

        tracing::debug!(dest = %dest.display(), "downloading");
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut res = Self::check(self.client.get(&target.download_url).send()?)?;
        let mut out = File::create(dest)?;
        io::copy(&mut res, &mut out)?;
        Ok(())
    }
}
