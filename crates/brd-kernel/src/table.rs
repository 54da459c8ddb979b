//! Decision matrix rendering

use brd_policy::{policy_table, PolicyRow};

/// Matrix as aligned text, one row per (role, state)
#[must_use]
pub fn render_text(rows: &[PolicyRow]) -> String {
    let mut out = format!(
        "{:<14} {:<20} {:<24} {:<24} {}\n",
        "ROLE", "STATE", "TRANSITION", "ACCESS", "COMMENT"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<14} {:<20} {:<24} {:<24} {}\n",
            row.role.label(),
            row.state.label(),
            row.transition.to_string(),
            row.access.to_string(),
            row.comment
        ));
    }
    out
}

/// Matrix as pretty JSON
///
/// # Errors
/// Serialization failure.
pub fn render_json(rows: &[PolicyRow]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rows)
}

/// Render the current policy
///
/// # Errors
/// Serialization failure when `json` is set.
pub fn render(json: bool) -> serde_json::Result<String> {
    let rows = policy_table();
    if json {
        render_json(&rows)
    } else {
        Ok(render_text(&rows))
    }
}
