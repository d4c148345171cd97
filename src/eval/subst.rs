//! `%` substitutions

use crate::dbref::Dbref;
use crate::world::{attrs, World};

use super::exec::char_end;
use super::{Engine, Frame, Registers};

/// Grammatical gender of the enactor, looked up at most once per evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Pronouns {
    Unknown,
    /// No SEX attribute: use the name
    Name,
    Neuter,
    Female,
    Male,
    Plural,
}

impl Pronouns {
    fn from_sex(sex: &str) -> Pronouns {
        match sex.trim_start().chars().next().map(|c| c.to_ascii_lowercase()) {
            None => Pronouns::Name,
            Some('m') => Pronouns::Male,
            Some('f' | 'w') => Pronouns::Female,
            Some('p') => Pronouns::Plural,
            Some(_) => Pronouns::Neuter,
        }
    }

    /// Subjective, objective, possessive and absolute possessive forms
    fn forms(self) -> Option<[&'static str; 4]> {
        match self {
            Pronouns::Neuter => Some(["it", "it", "its", "its"]),
            Pronouns::Female => Some(["she", "her", "her", "hers"]),
            Pronouns::Male => Some(["he", "him", "his", "his"]),
            Pronouns::Plural => Some(["they", "them", "their", "theirs"]),
            Pronouns::Unknown | Pronouns::Name => None,
        }
    }
}

/// ANSI sequence for a `%c`/`%x` color letter
fn ansi_code(letter: char) -> Option<&'static str> {
    Some(match letter {
        'n' => "\x1b[0m",
        'h' => "\x1b[1m",
        'u' => "\x1b[4m",
        'f' => "\x1b[5m",
        'i' => "\x1b[7m",
        'x' => "\x1b[30m",
        'r' => "\x1b[31m",
        'g' => "\x1b[32m",
        'y' => "\x1b[33m",
        'b' => "\x1b[34m",
        'm' => "\x1b[35m",
        'c' => "\x1b[36m",
        'w' => "\x1b[37m",
        'X' => "\x1b[40m",
        'R' => "\x1b[41m",
        'G' => "\x1b[42m",
        'Y' => "\x1b[43m",
        'B' => "\x1b[44m",
        'M' => "\x1b[45m",
        'C' => "\x1b[46m",
        'W' => "\x1b[47m",
        _ => return None,
    })
}

/// Upper-case the first character written since `mark`
fn capitalize_from(out: &mut String, mark: usize) {
    if let Some(first) = out[mark..].chars().next() {
        if first.is_lowercase() {
            let upper: String = first.to_uppercase().collect();
            out.replace_range(mark..mark + first.len_utf8(), &upper);
        }
    }
}

impl<W: World> Engine<W> {
    /// Expand the code starting at `input[i]` (just past `%`) into `out`.
    /// Returns the index after the code.
    pub(super) fn substitute(
        &mut self,
        out: &mut String,
        input: &str,
        i: usize,
        frame: &Frame<'_>,
        pronouns: &mut Pronouns,
    ) -> usize {
        let code = input.as_bytes()[i];
        let mut next = i + 1;
        let mark = out.len();

        match code {
            b'0'..=b'9' => {
                if let Some(arg) = frame.args.get(usize::from(code - b'0')) {
                    out.push_str(arg);
                }
            }
            b'q' | b'Q' => {
                if next < input.len() {
                    let end = char_end(input, next);
                    if let Some(slot) = input[next..end].chars().next().and_then(Registers::index_of) {
                        out.push_str(self.state.registers.get(slot));
                    }
                    next = end;
                }
            }
            b'v' | b'V' => {
                if next < input.len() {
                    let end = char_end(input, next);
                    if let Some(attr) = input[next..end].chars().next().and_then(attrs::va) {
                        let limit = self.config.limits.parent_nesting;
                        if let Some((found, _)) = self.world.atr_pget(frame.executor, attr, limit) {
                            out.push_str(&found.text);
                        }
                    }
                    next = end;
                }
            }
            b'#' => out.push_str(&frame.enactor.to_string()),
            b'!' => out.push_str(&frame.executor.to_string()),
            b'@' => out.push_str(&frame.caller.to_string()),
            b'n' | b'N' => out.push_str(&self.world.name(frame.enactor)),
            b's' | b'S' | b'o' | b'O' | b'p' | b'P' | b'a' | b'A' => {
                self.push_pronoun(out, code.to_ascii_lowercase(), frame.enactor, pronouns);
            }
            b'l' | b'L' => {
                let loc = if self.world.locatable(frame.executor, frame.enactor) {
                    self.world.location(frame.enactor)
                } else {
                    Dbref::NOTHING
                };
                out.push_str(&loc.to_string());
            }
            b'r' | b'R' => out.push_str("\r\n"),
            b't' | b'T' => out.push('\t'),
            b'b' | b'B' => out.push(' '),
            b'%' => out.push('%'),
            b'c' | b'C' | b'x' | b'X' => {
                if next < input.len() {
                    let end = char_end(input, next);
                    if let Some(seq) = input[next..end].chars().next().and_then(ansi_code) {
                        out.push_str(seq);
                    }
                    next = end;
                }
            }
            b'm' | b'M' => out.push_str(&self.state.curr_cmd),
            b'|' => out.push_str(&self.state.pipe_output),
            _ => {
                next = char_end(input, i);
                out.push_str(&input[i..next]);
            }
        }

        if code.is_ascii_uppercase() {
            capitalize_from(out, mark);
        }
        next
    }

    fn push_pronoun(&self, out: &mut String, code: u8, enactor: Dbref, pronouns: &mut Pronouns) {
        if *pronouns == Pronouns::Unknown {
            *pronouns = Pronouns::from_sex(&self.world.atr_text(enactor, attrs::SEX));
        }
        let slot = match code {
            b's' => 0,
            b'o' => 1,
            b'p' => 2,
            _ => 3,
        };
        match pronouns.forms() {
            Some(forms) => out.push_str(forms[slot]),
            None => {
                out.push_str(&self.world.name(enactor));
                if slot >= 2 {
                    out.push_str("'s");
                }
            }
        }
    }
}
