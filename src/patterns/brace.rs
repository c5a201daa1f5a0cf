// patterns/brace.rs
use crate::error::GlobError;

/// Maximum number of expansions to prevent DoS attacks
const MAX_EXPANSIONS: usize = 1000;
/// Maximum nesting depth to prevent stack overflow
const MAX_DEPTH: usize = 10;

/// Finds the first brace group that actually expands
///
/// A group expands when it holds a top-level comma or a range.
/// Escaped braces and groups like `{name}` are left alone.
fn find_group(s: &str) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => {
                if let Some(end) = matching_close(bytes, i) {
                    let inner = &s[i + 1..end];
                    if split_alternatives(inner).len() > 1 || parse_range(inner).is_some() {
                        return Some((i, end));
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Splits group contents on top-level commas
fn split_alternatives(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut escaped = false;

    for (i, ch) in inner.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&inner[start..]);
    items
}

/// Expands brace patterns in a string
///
/// Supports comma lists, nested groups, numeric ranges (`{1..3}`, `{3..1}`)
/// and letter ranges (`{a..c}`), bounded by a nesting depth and a total
/// number of expansions.
/// A string without expandable groups is returned as its only expansion.
///
/// # Errors
///
/// Returns `GlobError::BraceExpansionDepth` if maximum depth exceeded
/// Returns `GlobError::BraceExpansionCount` if maximum expansions exceeded
pub fn expand(input: &str) -> Result<Vec<String>, GlobError> {
    let mut out = Vec::new();
    expand_into(input, 0, &mut out)?;
    Ok(out)
}

fn expand_into(input: &str, depth: usize, out: &mut Vec<String>) -> Result<(), GlobError> {
    if depth > MAX_DEPTH {
        return Err(GlobError::BraceExpansionDepth);
    }

    let Some((start, end)) = find_group(input) else {
        if out.len() >= MAX_EXPANSIONS {
            return Err(GlobError::BraceExpansionCount);
        }
        out.push(input.to_string());
        return Ok(());
    };

    let before = &input[..start];
    let inner = &input[start + 1..end];
    let after = &input[end + 1..];

    let items: Vec<String> = match parse_range(inner) {
        Some(range) => range.items()?,
        None => split_alternatives(inner)
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    // Alternatives may hold nested groups and the suffix may hold further
    // groups, both are handled by recursing on the recombined string.
    for item in items {
        expand_into(&format!("{before}{item}{after}"), depth + 1, out)?;
    }

    Ok(())
}

/// Bounds of a `{x..y}` sequence, inclusive and possibly descending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Range {
    Numeric(i64, i64),
    Alpha(char, char),
}

impl Range {
    fn items(self) -> Result<Vec<String>, GlobError> {
        match self {
            Range::Numeric(a, b) => {
                if a.abs_diff(b) >= MAX_EXPANSIONS as u64 {
                    return Err(GlobError::BraceExpansionCount);
                }
                Ok(if a <= b {
                    (a..=b).map(|v| v.to_string()).collect()
                } else {
                    (b..=a).rev().map(|v| v.to_string()).collect()
                })
            }
            Range::Alpha(a, b) => Ok(if a <= b {
                (a..=b).map(String::from).collect()
            } else {
                (b..=a).rev().map(String::from).collect()
            }),
        }
    }
}

/// Parses a numeric (`1..3`) or single-letter (`a..c`) range
fn parse_range(s: &str) -> Option<Range> {
    let (a, b) = s.split_once("..")?;
    if let (Ok(a), Ok(b)) = (a.parse::<i64>(), b.parse::<i64>()) {
        return Some(Range::Numeric(a, b));
    }
    match (single_letter(a), single_letter(b)) {
        (Some(a), Some(b)) => Some(Range::Alpha(a, b)),
        _ => None,
    }
}

fn single_letter(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
        _ => None,
    }
}
