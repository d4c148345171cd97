//! Function calls and argument lists

use tracing::debug;

use crate::functions::{Callable, FunCall, FunDef, UserFunction};
use crate::perms::check_access;
use crate::world::{ObjectFlags, World};

use super::{ArgCount, Engine, EvalError, EvalFlags, Frame, MAX_ARGS};

impl<W: World> Engine<W> {
    /// Split the arguments of a call, starting just past `(`. The last slot
    /// takes everything up to the closing `)`. `f()` has no arguments.
    ///
    /// Returns `None` when the list is unterminated; nothing is evaluated
    /// in that case.
    pub(super) fn parse_call_args<'a>(
        &mut self,
        src: &'a str,
        frame: &Frame<'_>,
        arg_flags: EvalFlags,
        max: usize,
    ) -> Option<(Vec<String>, &'a str)> {
        let scanner = self.scanner();
        let mut pieces = Vec::new();
        let mut rest = src;
        let after = loop {
            let delims: &[u8] = if pieces.len() + 1 < max { b",)" } else { b")" };
            let (piece, found) = scanner.parse_to_lite(rest, delims);
            let (which, after) = found?;
            if which == b')' && pieces.is_empty() && piece.trim().is_empty() {
                break after;
            }
            pieces.push(piece);
            rest = after;
            if which == b')' {
                break after;
            }
        };

        let args = pieces
            .into_iter()
            .map(|piece| {
                if arg_flags.contains(EvalFlags::EVAL) {
                    self.eval(piece, frame, arg_flags)
                } else {
                    piece.to_string()
                }
            })
            .collect();
        Some((args, after))
    }

    /// Run a resolved function after the recursion, invocation, executor,
    /// permission and CPU checks
    pub(super) fn invoke(
        &mut self,
        out: &mut String,
        callable: &Callable<W>,
        args: &[String],
        frame: &Frame<'_>,
        flags: EvalFlags,
    ) {
        self.state.func_nest_lev += 1;
        self.state.func_invk_ctr += 1;

        let limits = &self.config.limits;
        let verdict = if self.state.func_nest_lev >= limits.function_nesting {
            Err(EvalError::RecursionLimit)
        } else if self.state.func_invk_ctr >= limits.function_invocations {
            Err(EvalError::InvocationLimit)
        } else if self.world.has_flag(frame.executor, ObjectFlags::GOING) {
            Err(EvalError::BadExecutor)
        } else if !check_access(&self.world, frame.executor, callable.perms()) {
            Err(EvalError::PermissionDenied)
        } else if self.alarm.is_raised() {
            Err(EvalError::CpuLimited)
        } else {
            Ok(())
        };

        match verdict {
            Ok(()) => match callable {
                Callable::Builtin(def) => self.call_builtin(out, def, args, frame, flags),
                Callable::User(ufun) => self.call_user_function(out, ufun, args, frame, flags),
            },
            Err(e) => {
                debug!(executor = %frame.executor, error = %e, "function call refused");
                out.push_str(&e.to_string());
            }
        }
        self.state.func_nest_lev -= 1;
    }

    fn call_builtin(&mut self, out: &mut String, def: &FunDef<W>, args: &[String], frame: &Frame<'_>, flags: EvalFlags) {
        if args.len() < def.min || args.len() > def.max {
            let expected = ArgCount { min: def.min, max: def.max };
            out.push_str(&EvalError::ArgCount { name: def.name.to_string(), expected }.to_string());
            return;
        }
        let call = FunCall {
            name: def.name,
            args,
            frame: *frame,
            flags: flags.without(EvalFlags::TOP) | EvalFlags::EVAL | EvalFlags::FCHECK,
        };
        (def.handler)(self, out, &call);
    }

    fn call_user_function(
        &mut self,
        out: &mut String,
        ufun: &UserFunction,
        args: &[String],
        frame: &Frame<'_>,
        flags: EvalFlags,
    ) {
        let limit = self.config.limits.parent_nesting;
        let Some((body, _)) = self.world.atr_pget(ufun.object, ufun.attr, limit) else {
            return;
        };
        let executor = if ufun.privileged { ufun.object } else { frame.executor };
        let inner = Frame::new(executor, frame.executor, frame.enactor, args);
        let body_flags = EvalFlags::EVAL | EvalFlags::FCHECK | (flags & EvalFlags::NO_COMPRESS);
        if ufun.preserve {
            self.preserving_registers(|engine| engine.exec(out, &body.text, &inner, body_flags));
        } else {
            self.exec(out, &body.text, &inner, body_flags);
        }
    }

    /// Split `text` at the first unnested `delim` (byte 0 means the whole
    /// text) and then into comma-separated slots, at most `max`, the last
    /// slot taking the rest. Slots are evaluated when `flags` has EVAL.
    /// Empty text yields no slots.
    ///
    /// Returns the slots and the text after `delim`, if it was found.
    pub fn parse_arglist<'a>(
        &mut self,
        text: &'a str,
        delim: u8,
        flags: EvalFlags,
        max: usize,
        frame: &Frame<'_>,
    ) -> (Vec<String>, Option<&'a str>) {
        let scanner = self.scanner();
        let mut cursor = Some(text);
        let whole = scanner.parse_to(&mut cursor, delim, EvalFlags::NONE).unwrap_or_default();
        if whole.is_empty() {
            return (Vec::new(), cursor);
        }

        let max = max.clamp(1, MAX_ARGS);
        let split_flags = flags.without(EvalFlags::EVAL);
        let mut slots = Vec::new();
        let mut rest = Some(whole.as_str());
        while rest.is_some() && slots.len() < max {
            let sep = if slots.len() + 1 < max { b',' } else { 0 };
            let Some(piece) = scanner.parse_to(&mut rest, sep, split_flags) else {
                break;
            };
            let slot = if flags.contains(EvalFlags::EVAL) {
                self.eval(&piece, frame, flags | EvalFlags::FCHECK)
            } else {
                piece
            };
            slots.push(slot);
        }
        (slots, cursor)
    }
}
