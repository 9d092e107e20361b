// Post-upload verification. The files service may accept an upload before
// its listing index reflects it, so before a local file is deleted we poll
// the listing until the file shows up with the size we sent.

use crate::api::Transport;
use crate::error::{CliError, Result};
use crate::files::{FileList, FILES_PATH};
use serde::Serialize;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Suspends the caller between verification attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Bounded, linearly increasing backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const MAX_ATTEMPTS: u32 = 5;
    pub const BASE_DELAY_MS: u64 = 500;

    /// Delay slept before the 1-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    pub fn attempts(&self) -> impl Iterator<Item = VerificationAttempt> {
        let policy = *self;
        (1..=policy.max_attempts).map(move |attempt| VerificationAttempt {
            attempt,
            delay: policy.delay_for(attempt),
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: Self::MAX_ATTEMPTS,
            base_delay: Duration::from_millis(Self::BASE_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationAttempt {
    pub attempt: u32,
    pub delay: Duration,
}

/// Outcome of a single listing poll.
#[derive(Debug, PartialEq, Eq)]
enum Poll {
    Verified,
    Pending,
    SizeMismatch(Option<u64>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyQuery<'a> {
    dataset_id: &'a str,
    name: &'a str,
    page_size: u32,
}

/// Listing path that matches exactly one file by name within a dataset.
pub fn verify_path(dataset_id: &str, name: &str) -> Result<String> {
    let query = serde_urlencoded::to_string(VerifyQuery {
        dataset_id,
        name,
        page_size: 1,
    })?;
    Ok(format!("{FILES_PATH}?{query}"))
}

/// Poll until `file` is listed in `dataset_id` with `expected_size` bytes.
///
/// A listed file with a different size fails at once with `SizeMismatch`;
/// running out of attempts fails with `VerificationTimeout`.
pub fn verify<T, S>(
    transport: &T,
    sleeper: &S,
    policy: &RetryPolicy,
    dataset_id: &str,
    file: &Path,
    expected_size: u64,
) -> Result<()>
where
    T: Transport + ?Sized,
    S: Sleeper + ?Sized,
{
    let name = file.to_string_lossy();
    let path = verify_path(dataset_id, &name)?;

    for VerificationAttempt { attempt, delay } in policy.attempts() {
        sleeper.sleep(delay);
        match poll(transport, &path, expected_size)? {
            Poll::Verified => {
                tracing::info!(file = %file.display(), attempt, "upload verified");
                return Ok(());
            }
            Poll::SizeMismatch(actual) => {
                return Err(CliError::SizeMismatch {
                    path: file.to_path_buf(),
                    expected: expected_size,
                    actual,
                });
            }
            Poll::Pending => {
                tracing::debug!(file = %file.display(), attempt, "not listed yet");
            }
        }
    }

    Err(CliError::VerificationTimeout(file.to_path_buf()))
}

fn poll<T: Transport + ?Sized>(transport: &T, path: &str, expected_size: u64) -> Result<Poll> {
    let list: FileList = serde_json::from_value(transport.get(path)?)?;
    Ok(match list.items.first() {
        None => Poll::Pending,
        Some(item) if item.size == Some(expected_size) => Poll::Verified,
        Some(item) => Poll::SizeMismatch(item.size),
    })
}
