// patterns/analysis.rs
//! Pure classification and transformation of single pattern strings.

const GLOBSTAR: &str = "**";

/// Finds the index of the closing delimiter matching the opener at `start`
///
/// Nested openers are balanced and escaped characters are skipped.
fn find_closing(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b if b == open => depth += 1,
            b if b == close => {
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

/// Position of the first unescaped dynamic token in the pattern
///
/// Extglob groups report the position of their operator character so that
/// the operator is never counted as part of a static prefix.
fn first_dynamic_index(pattern: &str) -> Option<usize> {
    let bytes = pattern.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'*' | b'?' => return Some(i),
            b'[' => {
                if bytes[i + 1..].contains(&b']') {
                    return Some(i);
                }
            }
            b'{' => {
                if let Some(end) = find_closing(bytes, i, b'{', b'}') {
                    let inner = &bytes[i + 1..end];
                    if inner.contains(&b',') || inner.windows(2).any(|w| w == b"..") {
                        return Some(i);
                    }
                }
            }
            b'(' => {
                if let Some(end) = find_closing(bytes, i, b'(', b')') {
                    if i > 0 && matches!(bytes[i - 1], b'@' | b'!' | b'+') {
                        return Some(i - 1);
                    }
                    if bytes[i + 1..end].contains(&b'|') {
                        return Some(i);
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Returns `true` for a pattern without any wildcard, brace or extglob token
pub fn is_static_pattern(pattern: &str) -> bool {
    !is_dynamic_pattern(pattern)
}

/// Returns `true` for a pattern that needs a directory walk to resolve
pub fn is_dynamic_pattern(pattern: &str) -> bool {
    first_dynamic_index(pattern).is_some()
}

/// Converts backslashes to forward slashes
pub fn unixify_pattern(pattern: &str) -> String {
    pattern.replace('\\', "/")
}

/// Returns `true` for `!pattern`, but not for the `!(...)` extglob group
pub fn is_negative_pattern(pattern: &str) -> bool {
    pattern.starts_with('!') && pattern.as_bytes().get(1) != Some(&b'(')
}

pub fn is_positive_pattern(pattern: &str) -> bool {
    !is_negative_pattern(pattern)
}

pub fn convert_to_negative_pattern(pattern: &str) -> String {
    format!("!{pattern}")
}

pub fn convert_to_positive_pattern(pattern: &str) -> String {
    if is_negative_pattern(pattern) {
        pattern[1..].to_string()
    } else {
        pattern.to_string()
    }
}

pub fn get_positive_patterns<S: AsRef<str>>(patterns: &[S]) -> Vec<String> {
    patterns
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| is_positive_pattern(p))
        .map(str::to_string)
        .collect()
}

pub fn get_negative_patterns<S: AsRef<str>>(patterns: &[S]) -> Vec<String> {
    patterns
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| is_negative_pattern(p))
        .map(str::to_string)
        .collect()
}

/// Negative patterns of the main list as positive strings, followed by `ignore`
pub fn get_negative_patterns_as_positive<S: AsRef<str>, T: AsRef<str>>(
    patterns: &[S],
    ignore: &[T],
) -> Vec<String> {
    get_negative_patterns(patterns)
        .iter()
        .map(|p| convert_to_positive_pattern(p))
        .chain(ignore.iter().map(|p| p.as_ref().to_string()))
        .collect()
}

/// Static directory part of the pattern
///
/// For a dynamic pattern this is everything before the segment holding the
/// first dynamic token; for a static pattern it is the parent directory of
/// the named path. Returns `.` when there is no such part.
pub fn get_base_directory(pattern: &str) -> String {
    let head = match first_dynamic_index(pattern) {
        Some(i) => &pattern[..i],
        None => pattern,
    };

    let dir = match head.rfind('/') {
        Some(i) => head[..i].trim_end_matches('/'),
        None => "",
    };

    if !dir.is_empty() {
        dir.to_string()
    } else if head.starts_with('/') {
        "/".to_string()
    } else {
        ".".to_string()
    }
}

/// Returns `true` when some segment is exactly `**`
pub fn has_glob_star(pattern: &str) -> bool {
    pattern.split('/').any(|segment| segment == GLOBSTAR)
}

pub fn ends_with_slash_glob_star(pattern: &str) -> bool {
    pattern.ends_with("/**")
}

/// Returns `true` when a negative pattern can prune directories
///
/// A trailing `/**` excludes a whole subtree and a static last segment names
/// an exact directory; in both cases a matching directory has nothing left
/// to contribute.
pub fn is_affect_depth_of_reading_pattern(pattern: &str) -> bool {
    let last = pattern.rsplit('/').next().unwrap_or(pattern);
    ends_with_slash_glob_star(pattern) || is_static_pattern(last)
}

/// Levels below the base directory at which the pattern can match
///
/// Globstar semantics are ignored. A pattern without a base directory
/// counts its own first segment too.
pub fn get_naive_depth(pattern: &str) -> usize {
    let base = get_base_directory(pattern);
    let pattern_depth = pattern.split('/').count();
    let base_depth = base.split('/').count();

    if base == "." {
        pattern_depth.saturating_sub(base_depth)
    } else {
        pattern_depth.saturating_sub(base_depth + 1)
    }
}

pub fn get_max_naive_patterns_depth<S: AsRef<str>>(patterns: &[S]) -> usize {
    patterns
        .iter()
        .map(|p| get_naive_depth(p.as_ref()))
        .max()
        .unwrap_or(0)
}
