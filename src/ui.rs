// Terminal helpers: a spinner shown while bytes are moving and the prompt
// guarding remote deletes. Both draw on stderr.

use anyhow::Result;
use console::Term;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Run `f` with a spinner showing `message`. The spinner is cleared when
/// `f` returns, whether it succeeded or not.
pub fn with_spinner<T, F>(message: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    out
}

/// Whether prompts can be shown, i.e. stderr is attached to a terminal.
pub fn is_interactive() -> bool {
    Term::stderr().is_term()
}

/// Ask before deleting a remote file. `assume_yes` skips the prompt, and
/// without a terminal the delete goes ahead unprompted so scripts keep
/// working.
pub fn confirm_delete(id: &str, assume_yes: bool, interactive: bool) -> Result<bool> {
    if assume_yes || !interactive {
        return Ok(true);
    }
    let confirmed = Confirm::new()
        .with_prompt(format!("Delete remote file {id}?"))
        .default(false)
        .interact()?;
    Ok(confirmed)
}
