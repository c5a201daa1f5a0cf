// patterns/matcher.rs
use super::{brace, extglob};
use crate::error::GlobError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::{Regex, RegexBuilder};
use std::{fmt, sync::Arc};

/// Upper bound for generated regex sources
const MAX_REGEX_LEN: usize = 4096;

/// Options that fully determine how a pattern is compiled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatcherOptions {
    pub case_sensitive: bool,
    /// Let wildcards match names starting with a period
    pub dot: bool,
    /// Match slash-free patterns against the basename
    pub match_base: bool,
    pub no_brace: bool,
    pub no_extglob: bool,
    pub no_globstar: bool,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            dot: false,
            match_base: false,
            no_brace: false,
            no_extglob: false,
            no_globstar: false,
        }
    }
}

enum Engine {
    Glob(GlobSet),
    /// Main expression and its reject expressions, one pair per brace
    /// alternative
    Regex(Vec<(Regex, Vec<Regex>)>),
}

struct Inner {
    pattern: String,
    engine: Engine,
    base_name: bool,
    hidden_allowed: bool,
}

/// Compiled, reusable path predicate
///
/// Cloning is cheap, the compiled state is shared.
#[derive(Clone)]
pub struct Matcher {
    inner: Arc<Inner>,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = match self.inner.engine {
            Engine::Glob(_) => "glob",
            Engine::Regex(_) => "regex",
        };
        f.debug_struct("Matcher")
            .field("pattern", &self.inner.pattern)
            .field("engine", &engine)
            .finish()
    }
}

impl Matcher {
    /// Compiles a pattern
    ///
    /// Extglob patterns go through [`extglob::to_regex`], everything else is
    /// brace-expanded and compiled into a `GlobSet`.
    ///
    /// # Errors
    ///
    /// Returns `GlobError::InvalidPattern` when globset rejects the pattern,
    /// brace expansion errors, and `GlobError::RegexTooComplex` for oversized
    /// extglob translations.
    pub fn compile(pattern: &str, options: &MatcherOptions) -> Result<Self, GlobError> {
        // paths are tested without a leading `./`, so patterns drop it too
        let source = pattern.strip_prefix("./").unwrap_or(pattern);
        let source = if options.no_globstar {
            collapse_globstar(source)
        } else {
            source.to_string()
        };

        let alternatives = if options.no_brace {
            vec![source]
        } else {
            brace::expand(&source)?
        };

        let engine = if !options.no_extglob && alternatives.iter().any(|a| extglob::has_extglob(a))
        {
            let compiled = alternatives
                .iter()
                .map(|alt| compile_regex_pair(alt, options))
                .collect::<Result<Vec<_>, _>>()?;
            Engine::Regex(compiled)
        } else {
            let mut builder = GlobSetBuilder::new();
            for alt in &alternatives {
                let alt = sanitize(alt);
                builder.add(build_glob(&alt, options)?);
                // `dir/**` also names `dir` itself
                if let Some(dir) = alt.strip_suffix("/**") {
                    if !dir.is_empty() {
                        builder.add(build_glob(dir, options)?);
                    }
                }
            }
            Engine::Glob(
                builder
                    .build()
                    .map_err(|e| GlobError::InvalidPattern(e.to_string()))?,
            )
        };

        Ok(Self {
            inner: Arc::new(Inner {
                pattern: pattern.to_string(),
                engine,
                base_name: options.match_base && !pattern.contains('/'),
                hidden_allowed: options.dot || names_hidden_segment(pattern),
            }),
        })
    }

    /// Pattern the matcher was compiled from
    pub fn pattern(&self) -> &str {
        &self.inner.pattern
    }

    /// Tests a `/`-separated path
    pub fn test(&self, path: &str) -> bool {
        let candidate = if self.inner.base_name {
            path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
        } else {
            path
        };

        if !self.inner.hidden_allowed && has_hidden_segment(candidate) {
            return false;
        }

        match &self.inner.engine {
            Engine::Glob(set) => set.is_match(candidate),
            Engine::Regex(pairs) => pairs.iter().any(|(main, reject)| {
                main.is_match(candidate) && !reject.iter().any(|r| r.is_match(candidate))
            }),
        }
    }
}

fn build_glob(pattern: &str, options: &MatcherOptions) -> Result<globset::Glob, GlobError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .case_insensitive(!options.case_sensitive)
        .build()
        .map_err(|e| GlobError::InvalidPattern(e.to_string()))
}

fn compile_regex_pair(
    pattern: &str,
    options: &MatcherOptions,
) -> Result<(Regex, Vec<Regex>), GlobError> {
    let translation = extglob::to_regex(pattern)?;
    let main = compile_regex(&translation.main, options)?;
    let reject = translation
        .reject
        .iter()
        .map(|r| compile_regex(r, options))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((main, reject))
}

fn compile_regex(source: &str, options: &MatcherOptions) -> Result<Regex, GlobError> {
    if source.len() > MAX_REGEX_LEN {
        return Err(GlobError::RegexTooComplex);
    }
    RegexBuilder::new(source)
        .case_insensitive(!options.case_sensitive)
        .build()
        .map_err(GlobError::Regex)
}

fn collapse_globstar(pattern: &str) -> String {
    let mut out = pattern.to_string();
    while out.contains("**") {
        out = out.replace("**", "*");
    }
    out
}

/// Makes a brace-expanded alternative safe for globset
///
/// Leftover braces are literal, an unclosed `[` is literal and a `**` that
/// is not a whole segment behaves like `*`.
fn sanitize(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                out.push('\\');
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                }
                i += 2;
                continue;
            }
            '{' | '}' => {
                out.push('\\');
                out.push(chars[i]);
            }
            '[' if !chars[i + 1..].contains(&']') => out.push_str("\\["),
            c => out.push(c),
        }
        i += 1;
    }

    out.split('/')
        .map(|segment| {
            if segment == "**" {
                segment.to_string()
            } else {
                collapse_globstar(segment)
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden_segment(segment: &str) -> bool {
    segment.starts_with('.') && segment != "." && segment != ".."
}

fn has_hidden_segment(path: &str) -> bool {
    path.split('/').any(is_hidden_segment)
}

fn names_hidden_segment(pattern: &str) -> bool {
    pattern.split('/').any(is_hidden_segment)
}
