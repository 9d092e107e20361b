// Command line surface and dispatch. `main` parses a `Cli`, builds the
// real collaborators and hands them to `run`.

use crate::api::Transport;
use crate::files::{FileCommands, ListOptions, UploadOptions};
use crate::print::{OutputFormat, Reporter};
use crate::ui::{confirm_delete, is_interactive, with_spinner};
use crate::verify::Sleeper;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "datafiles")]
#[command(about = "Upload, list and fetch files of a remote dataset", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Base URL of the files API (overrides config and environment)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format for command results
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty, global = true)]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List files in a dataset
    List {
        dataset_id: String,

        /// Number of files per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Token of the page to fetch
        #[arg(long)]
        next_page_token: Option<String>,

        /// Only list files whose name starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Show a single file
    Get { id: String },

    /// Delete a remote file
    Delete {
        id: String,

        /// Do not ask for confirmation (never asked without a terminal)
        #[arg(short, long)]
        yes: bool,
    },

    /// Download a file into a directory
    Download { id: String, dest_dir: PathBuf },

    /// Upload a file or a directory of files
    Upload {
        file: PathBuf,
        dataset_id: String,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Client supplied file id (single file uploads only)
        #[arg(long)]
        id: Option<String>,

        /// Replace an existing file with the same name
        #[arg(long)]
        overwrite: bool,

        /// Verify each upload, then delete the local file
        #[arg(long)]
        delete_after_upload: bool,
    },
}

impl Cli {
    /// Default tracing filter for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

pub fn run<T, S, R>(command: Commands, files: &FileCommands<'_, T, S, R>, reporter: &R) -> Result<()>
where
    T: Transport + ?Sized,
    S: Sleeper + ?Sized,
    R: Reporter + ?Sized,
{
    match command {
        Commands::List {
            dataset_id,
            page_size,
            next_page_token,
            prefix,
        } => {
            let options = ListOptions {
                dataset_id,
                page_size,
                next_page_token,
                prefix,
            };
            files.list(&options).context("Failed to list files")?;
        }
        Commands::Get { id } => {
            files.get(&id).with_context(|| format!("Failed to get file {id}"))?;
        }
        Commands::Delete { id, yes } => {
            if !confirm_delete(&id, yes, is_interactive())? {
                tracing::info!(id, "delete cancelled");
                return Ok(());
            }
            files.delete(&id).with_context(|| format!("Failed to delete file {id}"))?;
        }
        Commands::Download { id, dest_dir } => {
            let dest = with_spinner("Downloading...", || files.download(&id, &dest_dir))
                .with_context(|| format!("Failed to download file {id}"))?;
            reporter.print(&json!({ "path": dest }))?;
        }
        Commands::Upload {
            file,
            dataset_id,
            recursive,
            id,
            overwrite,
            delete_after_upload,
        } => {
            let options = UploadOptions {
                file,
                dataset_id,
                recursive,
                id,
                overwrite: overwrite.then_some(true),
                delete_after_upload,
            };
            let summary = with_spinner("Uploading...", || files.upload(&options))?;
            tracing::info!(
                uploaded = summary.uploaded,
                skipped = summary.skipped,
                deleted = summary.deleted,
                "upload finished"
            );
        }
    }
    Ok(())
}
