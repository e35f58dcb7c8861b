//! Input screens behind the `SECURITY` capability.
//!
//! The injection screens are heuristics over fixed, case-insensitive
//! pattern sets: they flag input for rejection, they do not sanitize it.
//! The catastrophic-pattern check is a structural scan of regex source for
//! shapes that backtracking engines explode on. The `regex` crate itself
//! runs in linear time, but patterns are also handed to script code that
//! may forward them elsewhere, so the shapes are rejected regardless.

use regex::{RegexSet, RegexSetBuilder};
use std::sync::OnceLock;

const SQL_INJECTION_PATTERNS: &[&str] = &[
    // ' OR '1'='1, " or 1=1
    r#"['"]\s*(or|and)\s+['"0-9a-z]+\s*=\s*['"0-9a-z]"#,
    r"\bor\s+\d+\s*=\s*\d+",
    r"\bunion\s+(all\s+)?select\b",
    r";\s*(drop|delete|insert|update|alter|create|truncate|exec|execute)\b",
    r#"['"]\s*(--|#|/\*)"#,
    r";\s*--",
    r"\b(exec|execute)\s+(xp|sp)_\w+",
    r"\b(sleep|benchmark)\s*\(",
    r"\bwaitfor\s+delay\b",
    r"\bdrop\s+(table|database)\b",
];

const XSS_PATTERNS: &[&str] = &[
    r"<\s*script\b",
    r"<\s*/\s*script\s*>",
    r"javascript\s*:",
    r"vbscript\s*:",
    r"<[^>]*\bon[a-z]+\s*=",
    r"<\s*(iframe|object|embed|applet|meta|base)\b",
    r"expression\s*\(",
    r"data\s*:\s*text/html",
];

static SQL_SET: OnceLock<RegexSet> = OnceLock::new();
static XSS_SET: OnceLock<RegexSet> = OnceLock::new();

/// Compile one of the constant pattern sets.
///
/// # Panics
///
/// Panics if a pattern above is not valid regex syntax (covered by tests).
#[allow(clippy::expect_used)]
fn screen(cell: &'static OnceLock<RegexSet>, patterns: &[&str]) -> &'static RegexSet {
    cell.get_or_init(|| {
        RegexSetBuilder::new(patterns)
            .case_insensitive(true)
            .build()
            .expect("security screen patterns are valid")
    })
}

/// Whether `input` looks like an SQL injection attempt.
pub fn contains_sql_injection_patterns(input: &str) -> bool {
    screen(&SQL_SET, SQL_INJECTION_PATTERNS).is_match(input)
}

/// Whether `input` carries script-injection markup.
pub fn contains_xss_patterns(input: &str) -> bool {
    screen(&XSS_SET, XSS_PATTERNS).is_match(input)
}

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

// Catastrophic backtracking

/// An open group while scanning regex source.
struct Group {
    /// Char index where the current alternative starts.
    alt_start: usize,
    alternatives: Vec<(usize, usize)>,
    /// Some atom inside (at any depth) carries a repeating quantifier.
    repeats_inside: bool,
}

impl Group {
    fn new(content_start: usize) -> Self {
        Group {
            alt_start: content_start,
            alternatives: Vec::new(),
            repeats_inside: false,
        }
    }

    fn split(&mut self, bar: usize) {
        self.alternatives.push((self.alt_start, bar));
        self.alt_start = bar + 1;
    }

    fn close(mut self, chars: &[char], end: usize) -> (bool, Vec<String>) {
        self.alternatives.push((self.alt_start, end));
        let alternatives = self
            .alternatives
            .iter()
            .map(|&(start, end)| chars[start.min(end)..end].iter().collect())
            .collect();
        (self.repeats_inside, alternatives)
    }
}

/// Whether `pattern` contains a repeated group that can match the same
/// input in exponentially many ways.
///
/// Two shapes are flagged:
/// - nested quantifiers: `(a+)+`, `(\w*)*`, `(.*a){2,}`
/// - repeated alternations whose branches overlap: `(a|a)*`, `(a|ab)+`
///
/// Escapes and character classes are skipped as single atoms; `?` is not a
/// repeating quantifier.
pub fn is_catastrophic_pattern(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut stack: Vec<Group> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let atom_end = match chars[i] {
            '\\' => i + 2,
            '[' => class_end(&chars, i),
            '(' => {
                let start = group_content_start(&chars, i);
                stack.push(Group::new(start));
                i = start;
                continue;
            }
            '|' => {
                if let Some(group) = stack.last_mut() {
                    group.split(i);
                }
                i += 1;
                continue;
            }
            ')' => {
                let Some(group) = stack.pop() else {
                    i += 1;
                    continue;
                };
                let (repeats_inside, alternatives) = group.close(&chars, i);
                let (len, repeated) = quantifier_at(&chars, i + 1).unwrap_or((0, false));
                if repeated && (repeats_inside || overlapping(&alternatives)) {
                    return true;
                }
                if repeated || repeats_inside {
                    if let Some(parent) = stack.last_mut() {
                        parent.repeats_inside = true;
                    }
                }
                i += 1 + len;
                continue;
            }
            _ => i + 1,
        };
        match quantifier_at(&chars, atom_end) {
            Some((len, repeated)) => {
                if repeated {
                    if let Some(group) = stack.last_mut() {
                        group.repeats_inside = true;
                    }
                }
                i = atom_end + len;
            }
            None => i = atom_end,
        }
    }
    false
}

/// Index just past the character class opening at `open`.
fn class_end(chars: &[char], open: usize) -> usize {
    let mut j = open + 1;
    if chars.get(j) == Some(&'^') {
        j += 1;
    }
    // A leading `]` is literal.
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            ']' => return j + 1,
            _ => j += 1,
        }
    }
    chars.len()
}

/// Skip `(?:`, `(?i:`, `(?P<name>` and `(?<name>` prefixes.
fn group_content_start(chars: &[char], open: usize) -> usize {
    if chars.get(open + 1) != Some(&'?') {
        return open + 1;
    }
    let mut j = open + 2;
    let named = match chars.get(j) {
        Some('P') => {
            j += 1;
            true
        }
        Some('<') => true,
        _ => false,
    };
    let terminator = if named { '>' } else { ':' };
    while j < chars.len() {
        match chars[j] {
            c if c == terminator => return j + 1,
            // Bare flag group like `(?i)`: no content.
            ')' => return j,
            _ => j += 1,
        }
    }
    chars.len()
}

/// Quantifier starting at `at`: its length (including a lazy `?`) and
/// whether it can repeat the atom more than once.
fn quantifier_at(chars: &[char], at: usize) -> Option<(usize, bool)> {
    let (len, repeated) = match chars.get(at)? {
        '*' | '+' => (1, true),
        '?' => (1, false),
        '{' => brace_quantifier(chars, at)?,
        _ => return None,
    };
    let lazy = usize::from(chars.get(at + len) == Some(&'?'));
    Some((len + lazy, repeated))
}

/// `{n}`, `{n,}` or `{n,m}` at `open`.
fn brace_quantifier(chars: &[char], open: usize) -> Option<(usize, bool)> {
    let close = open + chars[open..].iter().position(|&c| c == '}')?;
    let body: String = chars[open + 1..close].iter().collect();
    let (min, max) = match body.split_once(',') {
        Some((min, max)) => (min.trim(), Some(max.trim())),
        None => (body.trim(), None),
    };
    let min: u32 = min.parse().ok()?;
    let repeated = match max {
        None => min > 1,
        Some("") => true,
        Some(max) => max.parse::<u32>().ok()? > 1,
    };
    Some((close - open + 1, repeated))
}

/// Whether two alternatives are equal or one is a prefix of the other.
fn overlapping(alternatives: &[String]) -> bool {
    alternatives.iter().enumerate().any(|(i, a)| {
        alternatives[i + 1..]
            .iter()
            .any(|b| a.starts_with(b.as_str()) || b.starts_with(a.as_str()))
    })
}

#[cfg(test)]
mod tests;
