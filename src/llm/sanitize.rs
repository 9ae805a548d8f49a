//! Model-output sanitation
//!
//! Models routinely wrap SQL in Markdown code fences even when told not to.
//! This strips a leading fence (with or without a language tag) and a
//! trailing fence, then trims surrounding whitespace. Nothing is validated;
//! the result is whatever text was inside.

/// Strip Markdown code fences and surrounding whitespace from model output.
///
/// Idempotent: sanitizing already-clean SQL is a no-op.
pub fn clean_sql_response(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the language tag, which runs to the end of the fence line.
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }

    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim().to_string()
}
