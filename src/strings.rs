//! Quote-aware string utilities shared by the parser, the restriction
//! evaluator, and the on-disk cell codec.
//!
//! Cells and schema tokens are stored double-quoted with `\"` and `\\`
//! escapes; query text mixes `'…'` and `"…"` regions. Everything here is
//! careful to treat a backslash as toggling an escape for the next character
//! and to pair an opening quote only with the next unescaped occurrence of
//! the same character.

use crate::error::{Error, Result};

/// Splits `s` on `delim`. With `ignore_quotes`, a delimiter inside a quoted
/// region is not a split point. The trailing segment is always emitted, even
/// when empty.
pub fn split(s: &str, delim: char, ignore_quotes: bool) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    let mut quoted = false;
    let mut quote_char = '\0';
    for c in s.chars() {
        if ignore_quotes {
            if c == '\\' {
                escaped = !escaped;
            } else {
                if (c == '"' || c == '\'') && !escaped && (c == quote_char || quote_char == '\0') {
                    quoted = !quoted;
                    quote_char = if quoted { c } else { '\0' };
                }
                escaped = false;
            }
        }
        if c == delim && (!quoted || (!escaped && (c == '\'' || c == '"'))) {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// If `s` is wrapped in a matching pair of `'` or `"` with no unescaped
/// occurrence of that quote inside, returns the inside; otherwise returns `s`
/// unchanged.
pub fn extract_quoted(s: &str) -> &str {
    let quote = match s.chars().next() {
        Some(c @ ('"' | '\'')) => c,
        _ => return s,
    };
    if s.len() < 2 || !s.ends_with(quote) {
        return s;
    }
    let inner = &s[1..s.len() - 1];
    let mut escaped = false;
    for c in inner.chars() {
        if c == '\\' {
            escaped = !escaped;
        } else {
            if c == quote && !escaped {
                return s;
            }
            escaped = false;
        }
    }
    inner
}

/// Resolves backslash escapes in `s`. Only `\'`, `\"`, and `\\` are legal.
pub fn unescape(s: &str) -> Result<String> {
    let mut out = String::new();
    let mut escaped = false;
    for c in s.chars() {
        if c == '\\' && !escaped {
            escaped = true;
        } else {
            if escaped && !matches!(c, '\'' | '"' | '\\') {
                return Err(Error::invalid(format!("Cannot escape character {}", c)));
            }
            out.push(c);
            escaped = false;
        }
    }
    Ok(out)
}

/// Wraps `s` in double quotes, escaping `"` and `\` — the cell form used on
/// every data line and for string tokens in the schema header.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Scans whitespace-separated tokens from a table line. A token beginning
/// with `"` extends to the next unescaped `"` (escapes resolved); any other
/// token extends to the next whitespace.
pub fn scan_quoted_tokens(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.peek() {
            None => break,
            Some('"') => {
                chars.next();
                let mut token = String::new();
                let mut escaped = false;
                for c in chars.by_ref() {
                    if escaped {
                        token.push(c);
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '"' {
                        break;
                    } else {
                        token.push(c);
                    }
                }
                tokens.push(token);
            }
            Some(_) => {
                let mut token = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    token.push(c);
                    chars.next();
                }
                tokens.push(token);
            }
        }
    }
    tokens
}

/// Whether a token reads as a numeric literal: an optional sign followed by
/// a digit, or a decimal point and a digit. Trailing garbage is tolerated
/// (`2019-12-31` and `12:00:00` are numeric-leading), which is what keeps
/// date and time literals from being mistaken for column names.
pub fn looks_numeric(s: &str) -> bool {
    let rest = s.strip_prefix(['-', '+']).unwrap_or(s);
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Prefixes `\` before every regex metacharacter in `s`.
pub fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '[' | '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '{' | '}'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Translates a SQL LIKE pattern into an anchored regex: metacharacters are
/// escaped first, then `%` becomes `.*` and `_` becomes `.`.
pub fn like_to_regex(pattern: &str) -> String {
    let escaped = escape_regex(pattern).replace('%', ".*").replace('_', ".");
    format!("^{}$", escaped)
}
