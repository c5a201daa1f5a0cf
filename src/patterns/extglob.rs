// patterns/extglob.rs
//! Translation of extglob patterns into regular expressions.
//!
//! `globset` has no extglob support, so patterns holding `@(..)`, `!(..)`,
//! `+(..)`, `*(..)`, `?(..)` or bare `(a|b)` groups are translated here.
//! Brace groups are expected to be expanded before translation and are
//! matched literally.
use crate::error::GlobError;

const SEGMENT_WILDCARD: &str = "[^/]*";
const SEGMENT_CHAR: &str = "[^/]";

/// Regex sources produced for one pattern
///
/// A path matches when `main` matches and none of `reject` does. `main` sees
/// every `!(..)` group as a plain wildcard. Each `reject` source spells out
/// the alternatives of one negated group and keeps the others as wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub main: String,
    pub reject: Vec<String>,
}

#[derive(Debug)]
enum Piece {
    Text(String),
    Negated(String),
}

/// Returns `true` when the pattern holds an extglob group
pub fn has_extglob(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '@' | '!' | '+' | '*' | '?' if chars.get(i + 1) == Some(&'(') => {
                if matching_paren(&chars, i + 1).is_some() {
                    return true;
                }
            }
            '(' => {
                if let Some(end) = matching_paren(&chars, i) {
                    if split_top_level(&chars[i + 1..end]).len() > 1 {
                        return true;
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    false
}

/// Translates a pattern into anchored regex sources
pub fn to_regex(pattern: &str) -> Result<Translation, GlobError> {
    let chars: Vec<char> = pattern.chars().collect();
    let pieces = translate(&chars)?;

    let negated: Vec<usize> = pieces
        .iter()
        .enumerate()
        .filter(|(_, p)| matches!(p, Piece::Negated(_)))
        .map(|(i, _)| i)
        .collect();

    Ok(Translation {
        main: render(&pieces, None),
        reject: negated.into_iter().map(|i| render(&pieces, Some(i))).collect(),
    })
}

/// Anchored source with only the negated group at `spelled` kept as its
/// alternatives
fn render(pieces: &[Piece], spelled: Option<usize>) -> String {
    let mut out = String::from("^");
    for (i, piece) in pieces.iter().enumerate() {
        match piece {
            Piece::Text(t) => out.push_str(t),
            Piece::Negated(group) if spelled == Some(i) => {
                out.push_str(&format!("(?:{group})"));
            }
            Piece::Negated(_) => out.push_str(SEGMENT_WILDCARD),
        }
    }
    out.push('$');
    out
}

fn matching_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '(' => depth += 1,
            ')' => {
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

fn split_top_level(chars: &[char]) -> Vec<&[char]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                parts.push(&chars[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&chars[start..]);
    parts
}

fn push_text(out: &mut Vec<Piece>, text: &str) {
    if let Some(Piece::Text(last)) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(Piece::Text(text.to_string()));
    }
}

/// Drops a trailing `/` so a final globstar can also match the directory itself
fn pop_slash(out: &mut [Piece]) -> bool {
    match out.last_mut() {
        Some(Piece::Text(last)) if last.ends_with('/') => {
            last.pop();
            true
        }
        _ => false,
    }
}

/// Flattens nested pieces, negated groups inside groups degrade to wildcards
fn flatten(pieces: Vec<Piece>) -> String {
    pieces
        .into_iter()
        .map(|p| match p {
            Piece::Text(t) => t,
            Piece::Negated(_) => SEGMENT_WILDCARD.to_string(),
        })
        .collect()
}

fn escape(c: char) -> String {
    regex::escape(c.encode_utf8(&mut [0; 4]))
}

fn translate(chars: &[char]) -> Result<Vec<Piece>, GlobError> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let segment_start = i == 0 || chars[i - 1] == '/';

        match c {
            '\\' => {
                match chars.get(i + 1) {
                    Some(&next) => push_text(&mut out, &escape(next)),
                    None => push_text(&mut out, "\\\\"),
                }
                i += 2;
                continue;
            }
            '@' | '!' | '+' | '*' | '?' if chars.get(i + 1) == Some(&'(') => {
                if let Some(end) = matching_paren(chars, i + 1) {
                    let alternatives = split_top_level(&chars[i + 2..end])
                        .into_iter()
                        .map(|alt| translate(alt).map(flatten))
                        .collect::<Result<Vec<_>, _>>()?;
                    let group = alternatives.join("|");

                    match c {
                        '@' => push_text(&mut out, &format!("(?:{group})")),
                        '?' => push_text(&mut out, &format!("(?:{group})?")),
                        '*' => push_text(&mut out, &format!("(?:{group})*")),
                        '+' => push_text(&mut out, &format!("(?:{group})+")),
                        _ => out.push(Piece::Negated(group)),
                    }
                    i = end + 1;
                    continue;
                }
                match c {
                    '*' => push_text(&mut out, SEGMENT_WILDCARD),
                    '?' => push_text(&mut out, SEGMENT_CHAR),
                    other => push_text(&mut out, &escape(other)),
                }
            }
            '*' if segment_start
                && chars.get(i + 1) == Some(&'*')
                && matches!(chars.get(i + 2), None | Some('/')) =>
            {
                if chars.get(i + 2).is_some() {
                    push_text(&mut out, "(?:[^/]*/)*");
                    i += 3;
                } else {
                    if pop_slash(&mut out) {
                        push_text(&mut out, "(?:/.*)?");
                    } else {
                        push_text(&mut out, ".*");
                    }
                    i += 2;
                }
                continue;
            }
            '*' => {
                push_text(&mut out, SEGMENT_WILDCARD);
                while chars.get(i + 1) == Some(&'*') {
                    i += 1;
                }
            }
            '?' => push_text(&mut out, SEGMENT_CHAR),
            '[' => match character_class(chars, i) {
                Some((class, end)) => {
                    push_text(&mut out, &class);
                    i = end + 1;
                    continue;
                }
                None => push_text(&mut out, "\\["),
            },
            '(' => match matching_paren(chars, i) {
                Some(end) if split_top_level(&chars[i + 1..end]).len() > 1 => {
                    let alternatives = split_top_level(&chars[i + 1..end])
                        .into_iter()
                        .map(|alt| translate(alt).map(flatten))
                        .collect::<Result<Vec<_>, _>>()?;
                    push_text(&mut out, &format!("(?:{})", alternatives.join("|")));
                    i = end + 1;
                    continue;
                }
                _ => push_text(&mut out, "\\("),
            },
            other => push_text(&mut out, &escape(other)),
        }
        i += 1;
    }

    Ok(out)
}

/// Translates a bracket expression starting at `open`
///
/// Returns the regex class and the index of the closing bracket, or `None`
/// when the bracket is never closed.
fn character_class(chars: &[char], open: usize) -> Option<(String, usize)> {
    let mut i = open + 1;
    let mut class = String::from("[");

    if matches!(chars.get(i), Some('!') | Some('^')) {
        class.push('^');
        i += 1;
    }
    // A leading `]` is a literal member
    if chars.get(i) == Some(&']') {
        class.push_str("\\]");
        i += 1;
    }

    while i < chars.len() {
        match chars[i] {
            ']' => {
                class.push(']');
                return Some((class, i));
            }
            '[' if chars.get(i + 1) == Some(&':') => {
                let rest: String = chars[i..].iter().collect();
                let end = rest.find(":]")?;
                class.push_str(&rest[..end + 2]);
                i += rest[..end + 2].chars().count();
                continue;
            }
            '\\' => {
                let next = chars.get(i + 1)?;
                class.push_str(&escape(*next));
                i += 2;
                continue;
            }
            c @ ('[' | '&' | '~' | '^') => {
                class.push('\\');
                class.push(c);
            }
            c => class.push(c),
        }
        i += 1;
    }
    None
}
