//! Wildcard and regular-expression matching for $-commands and locks
//!
//! Wildcards: `*` matches any run (shortest first), `?` any single
//! character, `\` makes the next character literal. Matching is anchored at
//! both ends and case-insensitive unless asked otherwise.

use regex::{Regex, RegexBuilder};

/// Most captures a pattern hands back (`%0`-`%9`)
pub const MAX_CAPTURES: usize = 10;

fn compile_wild(pattern: &str, case_sensitive: bool) -> Option<Regex> {
    let mut source = String::with_capacity(pattern.len() * 2 + 8);
    source.push('^');
    let mut groups = 0;
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' | '?' => {
                let body = if c == '*' { ".*?" } else { "." };
                if groups < MAX_CAPTURES {
                    groups += 1;
                    source.push('(');
                    source.push_str(body);
                    source.push(')');
                } else {
                    source.push_str("(?:");
                    source.push_str(body);
                    source.push(')');
                }
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    source.push_str(&regex::escape(&next.to_string()));
                }
            }
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }
    source.push('$');
    RegexBuilder::new(&source)
        .case_insensitive(!case_sensitive)
        .dot_matches_new_line(true)
        .build()
        .ok()
}

fn captures_of(re: &Regex, text: &str) -> Option<Vec<String>> {
    let caps = re.captures(text)?;
    Some(
        caps.iter()
            .skip(1)
            .take(MAX_CAPTURES)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect(),
    )
}

/// Case-insensitive wildcard test
pub fn wild_match(pattern: &str, text: &str) -> bool {
    compile_wild(pattern, false).is_some_and(|re| re.is_match(text))
}

/// Wildcard match returning the text matched by each `*` and `?`
pub fn wild_captures(pattern: &str, text: &str, case_sensitive: bool) -> Option<Vec<String>> {
    let re = compile_wild(pattern, case_sensitive)?;
    captures_of(&re, text)
}

/// Regular-expression match returning the capture groups. An invalid
/// expression never matches.
pub fn regex_captures(pattern: &str, text: &str, case_sensitive: bool) -> Option<Vec<String>> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .ok()?;
    captures_of(&re, text)
}
