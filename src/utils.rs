//! Text helpers and file system checks used across the application.
//!
//! - Article summary generation
//! - Title casing for keyword tags
//! - Brazilian number formatting for report strings
//! - Log-friendly string truncation
//! - Output directory validation

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Body texts shorter than this get no summary.
pub const SUMMARY_MIN_SOURCE_CHARS: usize = 200;
/// A first paragraph shorter than this is extended with the second one.
pub const SUMMARY_SHORT_PARAGRAPH_CHARS: usize = 150;
/// Longest summary returned, ellipsis included.
pub const SUMMARY_MAX_CHARS: usize = 300;

const ELLIPSIS: &str = "...";

/// Build a short preview from an article body.
///
/// Takes the first paragraph (paragraphs are separated by a blank line),
/// appends the second one when the first is shorter than
/// [`SUMMARY_SHORT_PARAGRAPH_CHARS`], and caps the result at
/// [`SUMMARY_MAX_CHARS`] by cutting to 297 characters plus `...`.
///
/// Returns an empty string for bodies under [`SUMMARY_MIN_SOURCE_CHARS`].
/// All lengths are counted in characters.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(generate_summary("curto"), "");
/// assert_eq!(generate_summary(&"a".repeat(400)).chars().count(), 300);
/// ```
pub fn generate_summary(content: &str) -> String {
    if content.chars().count() < SUMMARY_MIN_SOURCE_CHARS {
        return String::new();
    }

    let mut paragraphs = content.split("\n\n");
    let mut summary = paragraphs.next().unwrap_or_default().to_string();

    if summary.chars().count() < SUMMARY_SHORT_PARAGRAPH_CHARS {
        if let Some(second) = paragraphs.next() {
            summary.push(' ');
            summary.push_str(second);
        }
    }

    if summary.chars().count() > SUMMARY_MAX_CHARS {
        let keep = SUMMARY_MAX_CHARS - ELLIPSIS.len();
        summary = summary.chars().take(keep).collect::<String>() + ELLIPSIS;
    }

    summary.trim().to_string()
}

/// Capitalize the first letter of every word and lowercase the rest.
///
/// A word starts after any non-alphabetic character, so
/// `"pequena empresa"` becomes `"Pequena Empresa"` and `"inovação"`
/// becomes `"Inovação"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Format an integer with `.` as the thousands separator (`53000` → `"53.000"`).
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Truncate a string for logging purposes.
///
/// Strings longer than `max` characters are cut and suffixed with
/// `"…(+N chars)"`.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", head, total - max)
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
