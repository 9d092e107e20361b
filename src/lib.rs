// Library root
// -----------
// The binary (`main.rs`) parses arguments and wires these modules together.
//
// Module responsibilities:
// - `api`: blocking HTTP transport for the files service.
// - `collect`: expands an upload path into the files to send.
// - `files`: the list/get/delete/download commands and the upload pipeline.
// - `verify`: post-upload verification with bounded backoff.
// - `print`: renders command results on stdout.
// - `cli` and `ui`: argument parsing, dispatch and terminal helpers.
// - `config` and `error`: configuration loading and the shared error type.
pub mod api;
pub mod cli;
pub mod collect;
pub mod config;
pub mod error;
pub mod files;
pub mod print;
pub mod ui;
pub mod verify;

pub use error::{CliError, Result};
