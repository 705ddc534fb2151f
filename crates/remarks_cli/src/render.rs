//! Human-readable output for remarks.

use chrono::{DateTime, Utc};
use remarks_core::Remark;
use std::fmt::Write;

const PREVIEW_CHARS: usize = 50;

pub fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Coarse relative age: `just now`, `5m ago`, `3h ago`, `2d ago`.
pub fn format_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}

/// `[id] kind · age · context` header followed by the indented body.
pub fn remark_block(remark: &Remark, context: &str, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "[{}] {} · {} · {}\n",
        remark.id,
        remark.kind,
        format_age(remark.created_at, now),
        context
    );
    for line in remark.body.trim().lines() {
        let _ = writeln!(out, "  {line}");
    }
    out
}

/// Single-line body preview used in recovery prompts.
pub fn body_preview(body: &str) -> String {
    let flat = body.replace('\n', " ");
    let mut preview: String = flat.chars().take(PREVIEW_CHARS).collect();
    if flat.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}
