//! Editor round-trip document for composing remark bodies.
//!
//! # Responsibility
//! - Render the template shown in `$EDITOR` for new and edited remarks.
//! - Parse the saved document back into an optional kind and a body.
//! - Launch the configured editor on a temporary file.
//!
//! # Invariants
//! - Before the `---` separator, `#` lines are ignored and a `type:` line
//!   only takes effect when it names a valid kind.
//! - Everything after the first separator is body text, comments included.

use crate::model::remark::{Remark, RemarkKind};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::process::Command;

static TYPE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*type:\s*(\S*)\s*$").expect("valid type line regex"));

const SEPARATOR: &str = "---";

/// Parsed editor document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorDocument {
    /// Kind from a valid `type:` line, if any.
    pub kind: Option<RemarkKind>,
    /// Body after the separator, trimmed.
    pub body: String,
}

#[derive(Debug)]
pub enum EditorError {
    Io(std::io::Error),
    /// Editor command is empty or exited unsuccessfully.
    EditorFailed(String),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "editor I/O failed: {err}"),
            Self::EditorFailed(message) => write!(f, "editor failed: {message}"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::EditorFailed(_) => None,
        }
    }
}

impl From<std::io::Error> for EditorError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Template for a new remark on `short_id` scoped to `branch`.
pub fn render_new_template(
    short_id: &str,
    branch: &str,
    kind: RemarkKind,
    body: &str,
) -> String {
    render(&format!("New remark on {short_id} ({branch})"), kind, body)
}

/// Template pre-filled with an existing remark.
pub fn render_edit_template(short_id: &str, remark: &Remark) -> String {
    render(
        &format!(
            "Editing remark [{}] on {short_id} ({})",
            remark.id, remark.branch
        ),
        remark.kind,
        &remark.body,
    )
}

fn render(header: &str, kind: RemarkKind, body: &str) -> String {
    format!("# {header}\n# Lines starting with # are ignored\n\ntype: {kind}\n\n{SEPARATOR}\n\n{body}")
}

/// Parses a saved editor document.
pub fn parse_document(content: &str) -> EditorDocument {
    let mut kind = None;
    let mut body_lines = Vec::new();
    let mut in_body = false;

    for line in content.lines() {
        if in_body {
            body_lines.push(line);
            continue;
        }
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            continue;
        }
        if trimmed == SEPARATOR {
            in_body = true;
            continue;
        }
        if let Some(caps) = TYPE_LINE_RE.captures(line) {
            if let Some(parsed) = caps.get(1).and_then(|m| m.as_str().parse::<RemarkKind>().ok()) {
                kind = Some(parsed);
            }
        }
    }

    EditorDocument {
        kind,
        body: body_lines.join("\n").trim().to_string(),
    }
}

/// Opens `template` in `editor` and returns the saved document.
///
/// `editor` may carry arguments (`code --wait`); the file path is appended.
pub fn edit_in_editor(editor: &str, template: &str) -> Result<String, EditorError> {
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| EditorError::EditorFailed("no editor configured".to_string()))?;

    let mut file = tempfile::Builder::new()
        .prefix("git-remark-")
        .suffix(".yaml")
        .tempfile()?;
    file.write_all(template.as_bytes())?;
    file.flush()?;

    info!("event=editor_open module=editor status=start program={program}");
    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()?;
    if !status.success() {
        error!(
            "event=editor_open module=editor status=error exit={}",
            status.code().unwrap_or(-1)
        );
        return Err(EditorError::EditorFailed(format!(
            "`{editor}` exited with {status}"
        )));
    }

    Ok(std::fs::read_to_string(file.path())?)
}

#[cfg(test)]
mod tests {
    use super::{parse_document, render_new_template};
    use crate::model::remark::RemarkKind;

    #[test]
    fn rendered_template_parses_back() {
        let template = render_new_template("abc1234", "main", RemarkKind::Doubt, "is this safe?");
        let parsed = parse_document(&template);
        assert_eq!(parsed.kind, Some(RemarkKind::Doubt));
        assert_eq!(parsed.body, "is this safe?");
    }

    #[test]
    fn invalid_type_line_is_ignored() {
        let parsed = parse_document("type: nonsense\n---\nbody");
        assert_eq!(parsed.kind, None);
        assert_eq!(parsed.body, "body");
    }
}
