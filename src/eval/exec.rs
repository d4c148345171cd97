//! The evaluation loop

use crate::scan::{matching_brace, ESC};
use crate::world::{ObjectFlags, World};

use super::subst::Pronouns;
use super::{Engine, EvalError, EvalFlags, Frame};

/// Index just past the character starting at `i`
pub(super) fn char_end(text: &str, i: usize) -> usize {
    text[i..].chars().next().map_or(text.len(), |c| i + c.len_utf8())
}

fn is_special(c: u8, flags: EvalFlags, compress: bool) -> bool {
    match c {
        b' ' => compress,
        b'\\' | b'%' | b'{' | ESC => true,
        b'[' => flags.contains(EvalFlags::EVAL) && !flags.contains(EvalFlags::NOFCHECK),
        b'(' => flags.contains(EvalFlags::FCHECK),
        _ => false,
    }
}

/// The text before `(` that names a function
fn candidate_name(pending: &str, compress: bool) -> String {
    let name = if compress { pending.trim_end_matches(' ') } else { pending };
    name.to_ascii_lowercase()
}

impl<W: World> Engine<W> {
    /// Evaluate `input` and append the result to `out`
    pub fn exec(&mut self, out: &mut String, input: &str, frame: &Frame<'_>, flags: EvalFlags) {
        if input.is_empty() || self.alarm.is_raised() {
            return;
        }
        if self.state.stack_nest >= self.config.limits.stack_nesting {
            self.state.stack_limit_reached = true;
            return;
        }

        let traced =
            !flags.contains(EvalFlags::NOTRACE) && self.world.has_flag(frame.executor, ObjectFlags::TRACE);
        let outermost = traced && self.trace.enter(frame.executor);
        let start = out.len();

        self.exec_body(out, input, frame, flags, start);

        if traced {
            let limit = self.config.limits.trace_lines;
            self.trace.record(frame.executor, input, &out[start..], limit);
            if outermost {
                self.flush_trace();
            }
        }
    }

    fn exec_body(&mut self, out: &mut String, input: &str, frame: &Frame<'_>, mut flags: EvalFlags, start: usize) {
        let bytes = input.as_bytes();
        let compress = self.config.parser.space_compress && !flags.contains(EvalFlags::NO_COMPRESS);
        let mut at_space = true;
        let mut pronouns = Pronouns::Unknown;
        let mut i = 0;

        while i < bytes.len() {
            let run = bytes[i..]
                .iter()
                .position(|&c| is_special(c, flags, compress))
                .map_or(bytes.len(), |n| i + n);
            if run > i {
                out.push_str(&input[i..run]);
                at_space = false;
                i = run;
                continue;
            }

            match bytes[i] {
                b' ' => {
                    if !at_space {
                        out.push(' ');
                    }
                    at_space = true;
                    i += 1;
                }
                b'\\' => {
                    at_space = false;
                    if !flags.contains(EvalFlags::EVAL) {
                        out.push('\\');
                    }
                    i += 1;
                    if i < bytes.len() {
                        let end = char_end(input, i);
                        out.push_str(&input[i..end]);
                        i = end;
                    }
                }
                ESC => {
                    at_space = false;
                    let end = if i + 1 < bytes.len() { char_end(input, i + 1) } else { i + 1 };
                    out.push_str(&input[i..end]);
                    i = end;
                }
                b'%' => {
                    at_space = false;
                    i += 1;
                    if i >= bytes.len() {
                        break;
                    }
                    if flags.contains(EvalFlags::EVAL) {
                        i = self.substitute(out, input, i, frame, &mut pronouns);
                    } else {
                        let end = char_end(input, i);
                        out.push('%');
                        out.push_str(&input[i..end]);
                        i = end;
                    }
                }
                b'[' => {
                    at_space = false;
                    let (inner, found) = self.scanner().parse_to_lite(&input[i + 1..], b"]");
                    match found {
                        Some((_, after)) => {
                            self.state.stack_nest += 1;
                            let inner_flags = (flags | EvalFlags::FCHECK | EvalFlags::FMAND).without(EvalFlags::TOP);
                            self.exec(out, inner, frame, inner_flags);
                            self.state.stack_nest -= 1;
                            i = bytes.len() - after.len();
                        }
                        None => {
                            out.push('[');
                            i += 1;
                        }
                    }
                }
                b'{' => {
                    at_space = false;
                    let Some(end) = matching_brace(bytes, i) else {
                        out.push('{');
                        i += 1;
                        continue;
                    };
                    let mut inner = &input[i + 1..end - 1];
                    let keep = !flags.contains(EvalFlags::STRIP_CURLY);
                    if keep {
                        out.push('{');
                    }
                    if flags.contains(EvalFlags::EVAL) && inner.starts_with(' ') {
                        out.push(' ');
                        inner = &inner[1..];
                    }
                    let inner_flags = flags.without(
                        EvalFlags::STRIP_CURLY | EvalFlags::EVAL | EvalFlags::FCHECK | EvalFlags::FMAND | EvalFlags::TOP,
                    );
                    self.state.stack_nest += 1;
                    self.exec(out, inner, frame, inner_flags);
                    self.state.stack_nest -= 1;
                    if keep {
                        out.push('}');
                    }
                    i = end;
                }
                b'(' => {
                    at_space = false;
                    let name = candidate_name(&out[start..], compress);
                    let Some(callable) = self.functions.lookup(&name) else {
                        if flags.contains(EvalFlags::FMAND) {
                            out.truncate(start);
                            out.push_str(&EvalError::NotFound(name).to_string());
                            return;
                        }
                        out.push('(');
                        i += 1;
                        flags.remove(EvalFlags::FCHECK);
                        continue;
                    };
                    let arg_flags = callable.arg_flags(flags);
                    match self.parse_call_args(&input[i + 1..], frame, arg_flags, callable.max_args()) {
                        Some((args, after)) => {
                            out.truncate(start);
                            self.invoke(out, &callable, &args, frame, flags);
                            i = bytes.len() - after.len();
                            flags.remove(EvalFlags::FCHECK);
                        }
                        None => {
                            out.push('(');
                            i += 1;
                        }
                    }
                }
                _ => {
                    let end = char_end(input, i);
                    out.push_str(&input[i..end]);
                    i = end;
                }
            }
        }

        if compress && at_space && out.len() > start && out.ends_with(' ') {
            out.pop();
        }
    }
}
