//! String literal escaping.

use crate::evaluation_error::EvaluationError;

fn invalid(literal: &str, reason: &str) -> EvaluationError {
    EvaluationError::InvalidLiteral(format!("{}: {}", literal, reason))
}

/// Parses a single-quoted FHIRPath string literal, resolving its escapes.
pub fn parse_literal(literal: &str) -> Result<String, EvaluationError> {
    let body = literal
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or_else(|| invalid(literal, "string literals are single-quoted"))?;

    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('\'') => '\'',
            Some('"') => '"',
            Some('`') => '`',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('f') => '\u{000C}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return Err(invalid(literal, "truncated \\u escape"));
                }
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid(literal, "invalid \\u escape"))?
            }
            Some(other) => return Err(invalid(literal, &format!("unknown escape \\{}", other))),
            None => return Err(invalid(literal, "dangling backslash")),
        };
        result.push(escaped);
    }
    Ok(result)
}

/// Renders a string as a single-quoted literal that [`parse_literal`] reads
/// back unchanged.
pub fn render_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
