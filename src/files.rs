// File commands: list, get, delete, download and the upload pipeline.
//
// Uploads run strictly one file at a time. Each file is registered, its
// bytes are sent to the returned upload URL and, when requested, the
// listing is polled until the file is visible before the local copy is
// removed. The first fatal error stops the batch; earlier files are left
// as they are.

use crate::api::Transport;
use crate::collect::collect;
use crate::error::{CliError, Result};
use crate::print::Reporter;
use crate::verify::{verify, RetryPolicy, Sleeper};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const FILES_PATH: &str = "/v1/files";
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// A remote file record. Fields the client does not use are kept in
/// `extra` so printing a record loses nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One page of `GET /v1/files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub items: Vec<FileRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Body of `POST /v1/files`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub dataset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

/// Upload target handed out when a file is registered.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadGrant {
    pub upload_url: String,
}

/// One file of an upload batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTask {
    pub local_path: PathBuf,
    pub dataset_id: String,
    pub client_id: Option<String>,
    pub overwrite: Option<bool>,
}

impl FileTask {
    fn create_request(&self) -> CreateFileRequest {
        CreateFileRequest {
            id: self.client_id.clone(),
            name: self.local_path.to_string_lossy().into_owned(),
            dataset_id: self.dataset_id.clone(),
            overwrite: self.overwrite,
        }
    }
}

/// Filters and paging for `list`. Unset fields fall back to the API
/// defaults (25 per page, first page).
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub dataset_id: String,
    pub page_size: Option<u32>,
    pub next_page_token: Option<String>,
    pub prefix: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery<'a> {
    dataset_id: &'a str,
    page_size: u32,
    next_page_token: &'a str,
    order_by: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl ListOptions {
    /// Listing path with the query string, ordered by name.
    pub fn path(&self) -> Result<String> {
        let query = serde_urlencoded::to_string(ListQuery {
            dataset_id: &self.dataset_id,
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            next_page_token: self.next_page_token.as_deref().unwrap_or(""),
            order_by: "name",
            name: self.prefix.as_deref(),
        })?;
        Ok(format!("{FILES_PATH}?{query}"))
    }
}

/// What to upload and how: a file or directory, the target dataset and
/// whether verified uploads remove the local copy.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub file: PathBuf,
    pub dataset_id: String,
    pub recursive: bool,
    /// Client supplied id, only honoured for single-file uploads.
    pub id: Option<String>,
    pub overwrite: Option<bool>,
    pub delete_after_upload: bool,
}

/// Counters for a finished upload batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub skipped: usize,
    pub deleted: usize,
}

fn file_path(id: &str) -> String {
    format!("{FILES_PATH}/{id}")
}

/// Destination for a downloaded file. Remote names are usually the absolute
/// path the file was uploaded from, so the leading root is dropped and the
/// rest is kept below `dest_dir`.
pub fn download_destination(dest_dir: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name.trim_start_matches('/'));
    let safe = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !safe || relative.as_os_str().is_empty() {
        return Err(CliError::InvalidName(name.to_string()));
    }
    Ok(dest_dir.join(relative))
}

/// The file commands, bound to a transport, a sleeper for verification
/// backoff and a reporter for results.
pub struct FileCommands<'a, T: ?Sized, S: ?Sized, R: ?Sized> {
    transport: &'a T,
    sleeper: &'a S,
    reporter: &'a R,
    policy: RetryPolicy,
}

impl<'a, T, S, R> FileCommands<'a, T, S, R>
where
    T: Transport + ?Sized,
    S: Sleeper + ?Sized,
    R: Reporter + ?Sized,
{
    pub fn new(transport: &'a T, sleeper: &'a S, reporter: &'a R, policy: RetryPolicy) -> Self {
        FileCommands {
            transport,
            sleeper,
            reporter,
            policy,
        }
    }

    /// Print one page of files in a dataset.
    pub fn list(&self, options: &ListOptions) -> Result<()> {
        let data = self.transport.get(&options.path()?)?;
        let items = data.get("items").cloned().unwrap_or_else(|| Value::Array(Vec::new()));
        self.reporter.print(&items)
    }

    /// Print a single file record.
    pub fn get(&self, id: &str) -> Result<()> {
        let data = self.transport.get(&file_path(id))?;
        self.reporter.print(&data)
    }

    /// Delete a remote file and print the service's response.
    pub fn delete(&self, id: &str) -> Result<()> {
        let data = self.transport.delete(&file_path(id))?;
        tracing::info!(id, "deleted remote file");
        self.reporter.print(&data)
    }

    /// Download a file into `dest_dir`, returning where it was written.
    pub fn download(&self, id: &str, dest_dir: &Path) -> Result<PathBuf> {
        let Named { name } = serde_json::from_value(self.transport.get(&file_path(id))?)?;
        let dest = download_destination(dest_dir, &name)?;
        let url = format!("{}?include=downloadUrl", file_path(id));
        self.transport.download(&url, &dest)?;
        tracing::info!(id, dest = %dest.display(), "downloaded");
        Ok(dest)
    }

    /// Upload a file or directory, one file at a time.
    pub fn upload(&self, options: &UploadOptions) -> Result<UploadSummary> {
        let paths = collect(&options.file, options.recursive)?;
        let single = paths.len() == 1 && !options.file.is_dir();
        if options.id.is_some() && !single {
            tracing::warn!("--id is only used for single file uploads, ignoring it");
        }

        let mut summary = UploadSummary::default();
        for local_path in paths {
            let task = FileTask {
                local_path,
                dataset_id: options.dataset_id.clone(),
                client_id: if single { options.id.clone() } else { None },
                overwrite: options.overwrite,
            };
            self.upload_one(&task, options.delete_after_upload, &mut summary)?;
        }
        Ok(summary)
    }

    fn upload_one(&self, task: &FileTask, delete_after_upload: bool, summary: &mut UploadSummary) -> Result<()> {
        let file = &task.local_path;
        let body = serde_json::to_value(task.create_request())?;
        let grant: UploadGrant = match self.transport.post(FILES_PATH, &body) {
            Ok(data) => serde_json::from_value(data)?,
            Err(CliError::AlreadyExists(message)) => {
                tracing::info!(file = %file.display(), %message, "skipping");
                summary.skipped += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let size = fs::metadata(file)?.len();
        self.transport.upload(&grant.upload_url, file, size)?;
        summary.uploaded += 1;
        tracing::info!(file = %file.display(), size, "uploaded");

        if delete_after_upload {
            verify(self.transport, self.sleeper, &self.policy, &task.dataset_id, file, size)?;
            fs::remove_file(file)?;
            summary.deleted += 1;
            tracing::info!(file = %file.display(), "deleted local copy");
        }
        Ok(())
    }
}
