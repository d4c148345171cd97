//! Expression evaluator
//!
//! The evaluator rewrites softcode text left to right into an output buffer:
//! - `name(args)` calls a built-in or user-defined function
//! - `[...]` forces function evaluation of its contents
//! - `{...}` protects its contents (the braces may be stripped)
//! - `%x` substitutes arguments, registers, names and pronouns
//! - `\x` emits `x` literally
//!
//! All state that survives between nested calls (recursion counters, global
//! registers, the trace cache, the CPU alarm) lives on [`Engine`], which also
//! owns the world, the configuration and the command/function tables. The
//! `impl Engine` blocks are spread over this directory, the function library
//! and the command layer.

mod call;
mod exec;
mod registers;
mod subst;
mod trace;

pub use registers::{Registers, REGISTER_COUNT};

use std::fmt;
use thiserror::Error;

use crate::alarm::Alarm;
use crate::command::CommandTable;
use crate::config::Config;
use crate::dbref::Dbref;
use crate::functions::FunctionTable;
use crate::scan::Scanner;
use crate::world::{bitset, World};

use trace::TraceCache;

bitset! {
    /// How a piece of text is evaluated
    EvalFlags {
        /// Substitute `%` codes and evaluate `[...]`
        EVAL = 1 << 0;
        /// Treat `name(` as a function call
        FCHECK = 1 << 1;
        /// An unknown function name is an error
        FMAND = 1 << 2;
        /// Never treat `[` specially
        NOFCHECK = 1 << 3;
        /// Strip one level of braces
        STRIP_CURLY = 1 << 4;
        /// Strip braces only when they enclose the whole text
        STRIP_AROUND = 1 << 5;
        STRIP_LS = 1 << 6;
        STRIP_TS = 1 << 7;
        /// Drop the `\` of escapes while scanning
        STRIP_ESC = 1 << 8;
        NO_COMPRESS = 1 << 9;
        /// Outermost evaluation of a command or hook
        TOP = 1 << 10;
        NOTRACE = 1 << 11;
    }
}

impl EvalFlags {
    /// The usual flags for evaluating softcode from the top
    pub const STANDARD: EvalFlags = EvalFlags::EVAL.with(EvalFlags::FCHECK).with(EvalFlags::TOP);
}

/// Largest number of arguments a function call can receive
pub const MAX_ARGS: usize = 100;

/// Argument-count requirement of a built-in function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgCount {
    pub min: usize,
    pub max: usize,
}

impl fmt::Display for ArgCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: usize| if n == 1 { "ARGUMENT" } else { "ARGUMENTS" };
        if self.max >= MAX_ARGS {
            write!(f, "AT LEAST {} {}", self.min, plural(self.min))
        } else if self.min == self.max {
            write!(f, "{} {}", self.min, plural(self.min))
        } else if self.max == self.min + 1 {
            write!(f, "{} OR {} ARGUMENTS", self.min, self.max)
        } else {
            write!(f, "BETWEEN {} AND {} ARGUMENTS", self.min, self.max)
        }
    }
}

/// Failures surfaced inline in evaluated output
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("#-1 FUNCTION ({0}) NOT FOUND")]
    NotFound(String),
    #[error("#-1 FUNCTION ({name}) EXPECTS {expected}")]
    ArgCount { name: String, expected: ArgCount },
    #[error("#-1 FUNCTION RECURSION LIMIT EXCEEDED")]
    RecursionLimit,
    #[error("#-1 FUNCTION INVOCATION LIMIT EXCEEDED")]
    InvocationLimit,
    #[error("#-1 BAD EXECUTOR")]
    BadExecutor,
    #[error("#-1 CPU LIMITED")]
    CpuLimited,
    #[error("#-1 PERMISSION DENIED")]
    PermissionDenied,
}

/// Who is acting, plus the command arguments `%0`-`%9`
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub executor: Dbref,
    pub caller: Dbref,
    pub enactor: Dbref,
    pub args: &'a [String],
}

impl<'a> Frame<'a> {
    pub fn new(executor: Dbref, caller: Dbref, enactor: Dbref, args: &'a [String]) -> Self {
        Self { executor, caller, enactor, args }
    }

    /// Executor, caller and enactor are all `player`
    pub fn solo(player: Dbref) -> Frame<'static> {
        Frame { executor: player, caller: player, enactor: player, args: &[] }
    }
}

/// Counters and scratch state shared by every nested evaluation
#[derive(Debug, Default)]
pub(crate) struct EvalState {
    pub(crate) func_nest_lev: usize,
    pub(crate) func_invk_ctr: usize,
    pub(crate) stack_nest: usize,
    pub(crate) stack_limit_reached: bool,
    pub(crate) lock_nest_lev: usize,
    pub(crate) registers: Registers,
    /// Text of the command being run, for `%m`
    pub(crate) curr_cmd: String,
    /// Output piped from the previous command, for `%|`
    pub(crate) pipe_output: String,
}

/// The evaluation and dispatch engine
pub struct Engine<W: World> {
    pub(crate) world: W,
    pub(crate) config: Config,
    pub(crate) commands: CommandTable<W>,
    pub(crate) functions: FunctionTable<W>,
    pub(crate) state: EvalState,
    pub(crate) trace: TraceCache,
    pub(crate) alarm: Alarm,
}

impl<W: World> Engine<W> {
    /// Build an engine with the built-in commands and functions, then replay
    /// the aliases, access overrides and user functions from `config`
    pub fn new(world: W, config: Config) -> Self {
        let mut engine = Self {
            world,
            config,
            commands: CommandTable::with_builtins(),
            functions: FunctionTable::with_builtins(),
            state: EvalState::default(),
            trace: TraceCache::default(),
            alarm: Alarm::new(),
        };
        engine.apply_command_directives();
        engine.apply_function_directives();
        engine
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn into_world(self) -> W {
        self.world
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn alarm(&self) -> &Alarm {
        &self.alarm
    }

    pub fn registers(&self) -> &Registers {
        &self.state.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.state.registers
    }

    pub fn set_pipe_output(&mut self, text: &str) {
        self.state.pipe_output = text.to_string();
    }

    pub(crate) fn scanner(&self) -> Scanner {
        Scanner {
            nest_limit: self.config.limits.parse_nesting,
            space_compress: self.config.parser.space_compress,
        }
    }

    /// Reset the per-command recursion and invocation budgets
    pub(crate) fn reset_counters(&mut self) {
        self.state.func_nest_lev = 0;
        self.state.func_invk_ctr = 0;
        self.state.lock_nest_lev = 0;
        self.state.stack_limit_reached = false;
    }

    /// Evaluate `text` into a new string
    pub fn eval(&mut self, text: &str, frame: &Frame<'_>, flags: EvalFlags) -> String {
        let mut out = String::new();
        self.exec(&mut out, text, frame, flags);
        out
    }

    /// Evaluate `text` as `player` from the top, with fresh budgets
    pub fn evaluate(&mut self, player: Dbref, text: &str) -> String {
        self.reset_counters();
        self.eval(text, &Frame::solo(player), EvalFlags::STANDARD)
    }
}
