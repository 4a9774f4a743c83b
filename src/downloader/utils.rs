// Helper functions shared by the pipeline and the yt-dlp source

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command as TokioCommand;
use tracing::debug;

use super::errors::SourceError;
use super::models::NetworkConfig;

/// Characters that are not allowed in file names on at least one platform
const INVALID_FILE_NAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Longest base name we produce, in characters
const MAX_FILE_NAME_CHARS: usize = 100;

/// Turn an item title into a file base name.
///
/// Invalid characters become `_`, the result is cut to 100 characters
/// (chars, not bytes, so a multi-byte character is never split) and then
/// trimmed. Running it twice gives the same result as running it once.
pub fn sanitize_file_name(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if INVALID_FILE_NAME_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_FILE_NAME_CHARS)
        .collect();

    replaced.trim().to_string()
}

/// Format a duration rounded to whole seconds, e.g. "45s", "2m5s", "1h0m3s"
pub fn format_elapsed(elapsed: Duration) -> String {
    let mut secs = elapsed.as_secs();
    if elapsed.subsec_millis() >= 500 {
        secs += 1;
    }

    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Run a command to completion and capture its output.
///
/// No deadline is applied; the child is killed only if the future is dropped.
pub async fn run_output(program: &str, args: &[String]) -> Result<std::process::Output, SourceError> {
    debug!(program, args = %args.join(" "), "spawning");

    TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::ToolNotFound(program.to_string()),
            _ => SourceError::Execution(format!("Failed to start {}: {}", program, e)),
        })
}

/// Build proxy arguments for yt-dlp
pub fn get_proxy_args(config: &NetworkConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(proxy) = &config.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    args
}

/// Build timeout arguments for yt-dlp
pub fn get_timeout_args(config: &NetworkConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(timeout) = config.socket_timeout {
        args.push("--socket-timeout".to_string());
        args.push(timeout.to_string());
    }

    args
}
