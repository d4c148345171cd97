//! String and word-list functions
//!
//! Positions and lengths count characters, not bytes.

use crate::eval::Engine;
use crate::wild::wild_match;
use crate::world::World;

use super::logic::split_list;
use super::{bool_str, parse_int, FunCall, FunDef, VARIADIC};

fn char_slice(text: &str, start: usize, len: usize) -> String {
    text.chars().skip(start).take(len).collect()
}

/// The list delimiter argument at `index`, defaulting to a space
fn delimiter<'a>(call: &FunCall<'a>, index: usize) -> &'a str {
    match call.arg(index) {
        "" => " ",
        d => d,
    }
}

fn pad(text: &str, width: i64, fill: &str, left: bool) -> String {
    let fill = fill.chars().next().unwrap_or(' ');
    let len = text.chars().count();
    let width = usize::try_from(width).unwrap_or(0);
    if len >= width {
        return text.to_string();
    }
    let padding: String = std::iter::repeat(fill).take(width - len).collect();
    if left {
        format!("{}{}", text, padding)
    } else {
        format!("{}{}", padding, text)
    }
}

impl<W: World> Engine<W> {
    pub(super) fn string_functions() -> Vec<FunDef<W>> {
        vec![
            FunDef::new("STRLEN", 1, 1, Self::fun_strlen),
            FunDef::new("CAT", 1, VARIADIC, Self::fun_cat),
            FunDef::new("STRCAT", 1, VARIADIC, Self::fun_strcat),
            FunDef::new("LCSTR", 1, 1, Self::fun_lcstr),
            FunDef::new("UCSTR", 1, 1, Self::fun_ucstr),
            FunDef::new("CAPSTR", 1, 1, Self::fun_capstr),
            FunDef::new("MID", 3, 3, Self::fun_mid),
            FunDef::new("LEFT", 2, 2, Self::fun_left),
            FunDef::new("RIGHT", 2, 2, Self::fun_right),
            FunDef::new("REPEAT", 2, 2, Self::fun_repeat),
            FunDef::new("SPACE", 0, 1, Self::fun_space),
            FunDef::new("TRIM", 1, 3, Self::fun_trim),
            FunDef::new("EDIT", 3, 3, Self::fun_edit),
            FunDef::new("SQUISH", 1, 1, Self::fun_squish),
            FunDef::new("COMP", 2, 2, Self::fun_comp),
            FunDef::new("LJUST", 2, 3, Self::fun_ljust),
            FunDef::new("RJUST", 2, 3, Self::fun_rjust),
            FunDef::new("STRMATCH", 2, 2, Self::fun_strmatch),
            FunDef::new("POS", 2, 2, Self::fun_pos),
            FunDef::new("ESCAPE", 1, 1, Self::fun_escape),
            FunDef::new("SECURE", 1, 1, Self::fun_secure),
            FunDef::new("LIT", 1, 1, Self::fun_lit).no_eval(),
            FunDef::new("WORDS", 1, 2, Self::fun_words),
            FunDef::new("FIRST", 1, 2, Self::fun_first),
            FunDef::new("REST", 1, 2, Self::fun_rest),
            FunDef::new("LAST", 1, 2, Self::fun_last),
            FunDef::new("EXTRACT", 3, 4, Self::fun_extract),
            FunDef::new("MEMBER", 2, 3, Self::fun_member),
        ]
    }

    fn fun_strlen(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&call.arg(0).chars().count().to_string());
    }

    fn fun_cat(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&call.args.join(" "));
    }

    fn fun_strcat(&mut self, out: &mut String, call: &FunCall<'_>) {
        call.args.iter().for_each(|a| out.push_str(a));
    }

    fn fun_lcstr(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&call.arg(0).to_lowercase());
    }

    fn fun_ucstr(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&call.arg(0).to_uppercase());
    }

    fn fun_capstr(&mut self, out: &mut String, call: &FunCall<'_>) {
        let mut chars = call.arg(0).chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    fn fun_mid(&mut self, out: &mut String, call: &FunCall<'_>) {
        let (start, len) = (parse_int(call.arg(1)), parse_int(call.arg(2)));
        match (usize::try_from(start), usize::try_from(len)) {
            (Ok(start), Ok(len)) => out.push_str(&char_slice(call.arg(0), start, len)),
            _ => out.push_str("#-1 OUT OF RANGE"),
        }
    }

    fn fun_left(&mut self, out: &mut String, call: &FunCall<'_>) {
        match usize::try_from(parse_int(call.arg(1))) {
            Ok(len) => out.push_str(&char_slice(call.arg(0), 0, len)),
            Err(_) => out.push_str("#-1 OUT OF RANGE"),
        }
    }

    fn fun_right(&mut self, out: &mut String, call: &FunCall<'_>) {
        let Ok(len) = usize::try_from(parse_int(call.arg(1))) else {
            out.push_str("#-1 OUT OF RANGE");
            return;
        };
        let total = call.arg(0).chars().count();
        out.push_str(&char_slice(call.arg(0), total.saturating_sub(len), len));
    }

    /// Output is cut off at the configured output limit
    fn fun_repeat(&mut self, out: &mut String, call: &FunCall<'_>) {
        let text = call.arg(0);
        let count = usize::try_from(parse_int(call.arg(1))).unwrap_or(0);
        if text.is_empty() || count == 0 {
            return;
        }
        let limit = self.config.limits.output_limit;
        let fits = (limit / text.len()).min(count);
        out.push_str(&text.repeat(fits));
    }

    fn fun_space(&mut self, out: &mut String, call: &FunCall<'_>) {
        let count = if call.arg(0).trim().is_empty() { 1 } else { parse_int(call.arg(0)) };
        let count = usize::try_from(count).unwrap_or(0).min(self.config.limits.output_limit);
        out.push_str(&" ".repeat(count));
    }

    /// `trim(text[, b|l|r[, char]])`
    fn fun_trim(&mut self, out: &mut String, call: &FunCall<'_>) {
        let side = call.arg(1).chars().next().map(|c| c.to_ascii_lowercase()).unwrap_or('b');
        let ch = call.arg(2).chars().next().unwrap_or(' ');
        let text = call.arg(0);
        let trimmed = match side {
            'l' => text.trim_start_matches(ch),
            'r' => text.trim_end_matches(ch),
            _ => text.trim_matches(ch),
        };
        out.push_str(trimmed);
    }

    /// `edit(text, from, to)`; `^` prepends and `$` appends
    fn fun_edit(&mut self, out: &mut String, call: &FunCall<'_>) {
        let (text, from, to) = (call.arg(0), call.arg(1), call.arg(2));
        match from {
            "^" => {
                out.push_str(to);
                out.push_str(text);
            }
            "$" => {
                out.push_str(text);
                out.push_str(to);
            }
            "" => out.push_str(text),
            _ => out.push_str(&text.replace(from, to)),
        }
    }

    fn fun_squish(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&call.arg(0).split_whitespace().collect::<Vec<_>>().join(" "));
    }

    fn fun_comp(&mut self, out: &mut String, call: &FunCall<'_>) {
        let result = match call.arg(0).cmp(call.arg(1)) {
            std::cmp::Ordering::Less => "-1",
            std::cmp::Ordering::Equal => "0",
            std::cmp::Ordering::Greater => "1",
        };
        out.push_str(result);
    }

    fn fun_ljust(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&pad(call.arg(0), parse_int(call.arg(1)), call.arg(2), true));
    }

    fn fun_rjust(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&pad(call.arg(0), parse_int(call.arg(1)), call.arg(2), false));
    }

    fn fun_strmatch(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(bool_str(wild_match(call.arg(1), call.arg(0))));
    }

    /// 1-based character position of the first argument in the second
    fn fun_pos(&mut self, out: &mut String, call: &FunCall<'_>) {
        let (needle, hay) = (call.arg(0), call.arg(1));
        match hay.find(needle) {
            Some(byte) => out.push_str(&(hay[..byte].chars().count() + 1).to_string()),
            None => out.push_str("#-1"),
        }
    }

    fn fun_escape(&mut self, out: &mut String, call: &FunCall<'_>) {
        let text = call.arg(0);
        if text.is_empty() {
            return;
        }
        out.push('\\');
        for c in text.chars() {
            if matches!(c, '%' | '\\' | '[' | ']' | '{' | '}' | ';' | ',' | '(' | ')') {
                out.push('\\');
            }
            out.push(c);
        }
    }

    fn fun_secure(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.extend(call.arg(0).chars().map(|c| {
            if matches!(c, '%' | '$' | '\\' | '[' | ']' | '(' | ')' | '{' | '}' | ',' | ';') {
                ' '
            } else {
                c
            }
        }));
    }

    fn fun_lit(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(call.arg(0));
    }

    fn fun_words(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&split_list(call.arg(0), delimiter(call, 1)).len().to_string());
    }

    fn fun_first(&mut self, out: &mut String, call: &FunCall<'_>) {
        if let Some(word) = split_list(call.arg(0), delimiter(call, 1)).first() {
            out.push_str(word);
        }
    }

    fn fun_rest(&mut self, out: &mut String, call: &FunCall<'_>) {
        let delim = delimiter(call, 1);
        let words = split_list(call.arg(0), delim);
        if words.len() > 1 {
            out.push_str(&words[1..].join(delim));
        }
    }

    fn fun_last(&mut self, out: &mut String, call: &FunCall<'_>) {
        if let Some(word) = split_list(call.arg(0), delimiter(call, 1)).last() {
            out.push_str(word);
        }
    }

    /// `extract(list, first, count[, delim])`, 1-based
    fn fun_extract(&mut self, out: &mut String, call: &FunCall<'_>) {
        let delim = delimiter(call, 3);
        let words = split_list(call.arg(0), delim);
        let (first, count) = (parse_int(call.arg(1)), parse_int(call.arg(2)));
        if first < 1 || count < 1 {
            return;
        }
        let picked: Vec<&str> = words
            .into_iter()
            .skip(usize::try_from(first - 1).unwrap_or(usize::MAX))
            .take(usize::try_from(count).unwrap_or(0))
            .collect();
        out.push_str(&picked.join(delim));
    }

    fn fun_member(&mut self, out: &mut String, call: &FunCall<'_>) {
        let position = split_list(call.arg(0), delimiter(call, 2))
            .iter()
            .position(|w| *w == call.arg(1).trim())
            .map_or(0, |p| p + 1);
        out.push_str(&position.to_string());
    }
}
