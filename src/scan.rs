//! Delimiter scanner
//!
//! Splits text at a delimiter while respecting `()`/`[]` nesting, opaque
//! `{}` groups and escapes. [`Scanner::parse_to`] produces a cleaned copy
//! (optional space compression and brace stripping) and advances a cursor;
//! [`Scanner::parse_to_lite`] only locates the delimiter and leaves escape
//! processing to the evaluator.
//!
//! Nesting of `(` and `[` is tracked on a stack of expected closers whose
//! depth is bounded by [`Scanner::nest_limit`]. Deeper nesting is no longer
//! tracked; the first overflow in a scan is logged.

use tracing::warn;

use crate::eval::EvalFlags;

/// Client escape byte; like `\`, it protects the following character
pub const ESC: u8 = 0x1b;

#[derive(Debug, Clone, Copy)]
pub struct Scanner {
    pub nest_limit: usize,
    pub space_compress: bool,
}

impl Default for Scanner {
    fn default() -> Self {
        Self { nest_limit: 32, space_compress: true }
    }
}

struct CloserStack {
    items: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl CloserStack {
    fn new(limit: usize) -> Self {
        Self { items: Vec::new(), limit, overflowed: false }
    }

    fn push_for(&mut self, opener: u8) {
        let closer = if opener == b'(' { b')' } else { b']' };
        if self.items.len() < self.limit {
            self.items.push(closer);
        } else if !self.overflowed {
            self.overflowed = true;
            warn!(limit = self.limit, "delimiter nesting too deep; deeper levels are not tracked");
        }
    }

    /// Pop through the innermost matching closer. False if none is pending.
    fn unwind_to(&mut self, closer: u8) -> bool {
        match self.items.iter().rposition(|&c| c == closer) {
            Some(pos) => {
                self.items.truncate(pos);
                true
            }
            None => false,
        }
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn utf8_len(lead: u8) -> usize {
    match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    }
}

/// Copy the character starting at `i`, returning the index after it
fn copy_char(bytes: &[u8], i: usize, out: &mut Vec<u8>) -> usize {
    if i >= bytes.len() {
        return i;
    }
    let end = (i + utf8_len(bytes[i])).min(bytes.len());
    out.extend_from_slice(&bytes[i..end]);
    end
}

fn into_string(out: Vec<u8>) -> String {
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Characters whose meaning a requested delimiter cannot override
fn is_fixed_class(c: u8) -> bool {
    matches!(c, b')' | b']' | b'{' | b'\\' | b'%' | ESC)
}

/// Index just past the `}` matching the `{` at `open`, if any
pub fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' | b'%' | ESC => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Remove one enclosing brace pair when it wraps the whole text
pub fn strip_around(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.first() == Some(&b'{') && matching_brace(bytes, 0) == Some(bytes.len()) {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

impl Scanner {
    /// Take the text up to the first unnested `delim`.
    ///
    /// Returns `None` when the cursor is already exhausted. On return the
    /// cursor points one past the delimiter, or is `None` when the end of the
    /// text was reached without finding it.
    pub fn parse_to<'a>(&self, cursor: &mut Option<&'a str>, delim: u8, flags: EvalFlags) -> Option<String> {
        let src = cursor.take()?;
        let bytes = src.as_bytes();
        let compress = !flags.contains(EvalFlags::NO_COMPRESS);
        let strip_leading = compress && (self.space_compress || flags.contains(EvalFlags::STRIP_LS));
        let strip_trailing = compress && (self.space_compress || flags.contains(EvalFlags::STRIP_TS));
        let squeeze = compress && self.space_compress && delim != b' ';
        let strip_braces = flags.contains(EvalFlags::STRIP_CURLY);
        let strip_esc = flags.contains(EvalFlags::STRIP_ESC);

        let mut i = 0;
        if strip_leading {
            while i < bytes.len() && bytes[i] == b' ' {
                i += 1;
            }
        }

        let mut out = Vec::with_capacity(bytes.len() - i);
        let mut stack = CloserStack::new(self.nest_limit);
        let mut rest = None;

        while i < bytes.len() {
            let c = bytes[i];
            if c == delim && !is_fixed_class(c) && stack.is_empty() {
                rest = Some(&src[i + 1..]);
                break;
            }
            match c {
                b'\\' | b'%' | ESC => {
                    if !(c == b'\\' && strip_esc) {
                        out.push(c);
                    }
                    i = copy_char(bytes, i + 1, &mut out);
                }
                b')' | b']' => {
                    if stack.unwind_to(c) {
                        out.push(c);
                    } else if c == delim {
                        rest = Some(&src[i + 1..]);
                        break;
                    } else {
                        out.push(c);
                    }
                    i += 1;
                }
                b'(' | b'[' if c != delim => {
                    stack.push_for(c);
                    out.push(c);
                    i += 1;
                }
                b'{' => {
                    i = copy_braces(bytes, i, &mut out, strip_braces, strip_esc);
                }
                b' ' if squeeze => {
                    if out.last() != Some(&b' ') {
                        out.push(b' ');
                    }
                    i += 1;
                }
                _ => i = copy_char(bytes, i, &mut out),
            }
        }

        if strip_trailing {
            while out.last() == Some(&b' ') {
                out.pop();
            }
        }
        *cursor = rest;

        let text = into_string(out);
        if flags.contains(EvalFlags::STRIP_AROUND) {
            let inner = strip_around(&text);
            if inner.len() != text.len() {
                return Some(inner.to_string());
            }
        }
        Some(text)
    }

    /// Locate the first unnested byte from `delims` without copying.
    ///
    /// Returns the text before it plus the matched delimiter and the text
    /// after it, or the whole input and `None` if no delimiter was found.
    pub fn parse_to_lite<'a>(&self, src: &'a str, delims: &[u8]) -> (&'a str, Option<(u8, &'a str)>) {
        let bytes = src.as_bytes();
        let mut stack = CloserStack::new(self.nest_limit);
        let mut i = 0;

        while i < bytes.len() {
            let c = bytes[i];
            let is_delim = delims.contains(&c);
            match c {
                b'\\' | b'%' | ESC => {
                    i += 2;
                    continue;
                }
                b')' | b']' => {
                    if !stack.unwind_to(c) && is_delim {
                        return (&src[..i], Some((c, &src[i + 1..])));
                    }
                    i += 1;
                    continue;
                }
                b'{' => {
                    match matching_brace(bytes, i) {
                        Some(end) => i = end,
                        None => return (src, None),
                    }
                    continue;
                }
                _ => {}
            }
            if is_delim && stack.is_empty() {
                return (&src[..i], Some((c, &src[i + 1..])));
            }
            if (c == b'(' || c == b'[') && !is_delim {
                stack.push_for(c);
            }
            i += 1;
        }
        (src, None)
    }

    /// Split a `;`-separated action list at top level
    pub fn split_actions(&self, text: &str) -> Vec<String> {
        let mut cursor = Some(text);
        let mut actions = Vec::new();
        while let Some(action) = self.parse_to(&mut cursor, b';', EvalFlags::NONE) {
            if !action.is_empty() {
                actions.push(action);
            }
        }
        actions
    }
}

/// Copy a `{...}` group starting at `open`, honoring escapes and nested braces
fn copy_braces(bytes: &[u8], open: usize, out: &mut Vec<u8>, strip: bool, strip_esc: bool) -> usize {
    let mut depth = 1usize;
    if !strip {
        out.push(b'{');
    }
    let mut i = open + 1;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'\\' | b'%' | ESC if i + 1 < bytes.len() => {
                if !(c == b'\\' && strip_esc) {
                    out.push(c);
                }
                i = copy_char(bytes, i + 1, out);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    if !strip {
                        out.push(b'}');
                    }
                    return i + 1;
                }
            }
            _ => {}
        }
        i = copy_char(bytes, i, out);
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str, delim: u8, flags: EvalFlags) -> (Option<String>, Option<&str>) {
        let mut cursor = Some(text);
        let piece = Scanner::default().parse_to(&mut cursor, delim, flags);
        (piece, cursor)
    }

    #[test]
    fn splits_at_top_level_delimiter() {
        let (piece, rest) = scan("add(1,2),b", b',', EvalFlags::NONE);
        assert_eq!(piece.as_deref(), Some("add(1,2)"));
        assert_eq!(rest, Some("b"));
    }

    #[test]
    fn unterminated_paren_gives_null_cursor() {
        let (piece, rest) = scan("foo(bar", b'=', EvalFlags::NONE);
        assert_eq!(piece.as_deref(), Some("foo(bar"));
        assert_eq!(rest, None);
    }

    #[test]
    fn exhausted_cursor() {
        let mut cursor: Option<&str> = None;
        assert_eq!(Scanner::default().parse_to(&mut cursor, b',', EvalFlags::NONE), None);
    }

    #[test]
    fn braces_are_opaque() {
        let (piece, rest) = scan("{a=b}=c", b'=', EvalFlags::NONE);
        assert_eq!(piece.as_deref(), Some("{a=b}"));
        assert_eq!(rest, Some("c"));

        let (piece, _) = scan("{a=b}=c", b'=', EvalFlags::STRIP_CURLY);
        assert_eq!(piece.as_deref(), Some("a=b"));
    }

    #[test]
    fn escapes_protect_delimiter() {
        let (piece, rest) = scan(r"a\=b=c", b'=', EvalFlags::NONE);
        assert_eq!(piece.as_deref(), Some(r"a\=b"));
        assert_eq!(rest, Some("c"));

        let (piece, _) = scan(r"a\=b=c", b'=', EvalFlags::STRIP_ESC);
        assert_eq!(piece.as_deref(), Some("a=b"));
    }

    #[test]
    fn close_paren_unwinds_whole_stack() {
        // `)` matches the outer `(` even though `[` is on top
        let (piece, rest) = scan("f([x),y", b',', EvalFlags::NONE);
        assert_eq!(piece.as_deref(), Some("f([x)"));
        assert_eq!(rest, Some("y"));
    }

    #[test]
    fn unmatched_closer_as_delimiter() {
        let (piece, rest) = scan("a,b)c", b')', EvalFlags::NONE);
        assert_eq!(piece.as_deref(), Some("a,b"));
        assert_eq!(rest, Some("c"));
    }

    #[test]
    fn space_compression() {
        let (piece, _) = scan("  a   b  ", b'=', EvalFlags::NONE);
        assert_eq!(piece.as_deref(), Some("a b"));

        let (piece, _) = scan("  a   b  ", b'=', EvalFlags::NO_COMPRESS);
        assert_eq!(piece.as_deref(), Some("  a   b  "));
    }

    #[test]
    fn strip_around_only_whole_group() {
        let (piece, _) = scan("{a,b}", b'=', EvalFlags::STRIP_AROUND);
        assert_eq!(piece.as_deref(), Some("a,b"));
        let (piece, _) = scan("{a},{b}", b'=', EvalFlags::STRIP_AROUND);
        assert_eq!(piece.as_deref(), Some("{a},{b}"));
    }

    #[test]
    fn nesting_bound_is_respected() {
        let scanner = Scanner { nest_limit: 1, space_compress: true };
        let mut cursor = Some("((x),y),z");
        // the inner `(` is not tracked, so its `)` closes the outer one
        let piece = scanner.parse_to(&mut cursor, b',', EvalFlags::NONE);
        assert_eq!(piece.as_deref(), Some("((x)"));
        assert_eq!(cursor, Some("y),z"));
    }

    #[test]
    fn lite_reports_which_delimiter() {
        let s = Scanner::default();
        assert_eq!(s.parse_to_lite("a(b,c),d)", b",)"), ("a(b,c)", Some((b',', "d)"))));
        assert_eq!(s.parse_to_lite("d)rest", b",)"), ("d", Some((b')', "rest"))));
        assert_eq!(s.parse_to_lite(r"x\)y", b")"), (r"x\)y", None));
        assert_eq!(s.parse_to_lite("{a)b})c", b")"), ("{a)b}", Some((b')', "c"))));
        assert_eq!(s.parse_to_lite("{open", b")"), ("{open", None));
    }

    #[test]
    fn action_lists() {
        let s = Scanner::default();
        assert_eq!(s.split_actions("say a; pose b;{x;y}"), vec!["say a", "pose b", "{x;y}"]);
    }
}
