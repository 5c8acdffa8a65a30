//! Record id minting.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use uuid::Uuid;

/// Characters that may not appear in a record id.
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[/\\.*\[\]#?@:<>|\s]").unwrap());

fn short_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Turn an arbitrary tracking id into a safe key fragment.
///
/// Disallowed characters become underscores and leading/trailing underscores
/// are stripped. Never returns an empty string.
pub fn sanitize_key(raw: &str) -> String {
    let replaced = DISALLOWED.replace_all(raw, "_");
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        format!("tracker_{}", short_suffix())
    } else {
        trimmed.to_string()
    }
}

/// Mint a fresh record id for `tracking_id`.
///
/// The id is `<sanitized>_<unix millis>_<8 hex chars>`, so two uploads of the
/// same tracking id never produce the same id.
pub fn mint_record_id(tracking_id: &str) -> String {
    format!(
        "{}_{}_{}",
        sanitize_key(tracking_id),
        Utc::now().timestamp_millis(),
        short_suffix()
    )
}
