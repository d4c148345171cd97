//! Softcode function library
//!
//! Built-in functions are plain `fn` pointers over the engine, grouped by
//! topic in the submodules. User functions (`@function`) name an attribute
//! whose text is evaluated as the function body.

mod encoding;
mod logic;
mod math;
mod object;
mod string;

use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::dbref::Dbref;
use crate::eval::{Engine, EvalFlags, Frame, MAX_ARGS};
use crate::perms::{self, Perms};
use crate::world::{AttrNum, World};

/// Upper bound for functions taking any number of arguments
pub const VARIADIC: usize = MAX_ARGS;

pub type FunHandler<W> = fn(&mut Engine<W>, &mut String, &FunCall<'_>);

/// One call of a built-in function
#[derive(Debug, Clone, Copy)]
pub struct FunCall<'a> {
    pub name: &'static str,
    pub args: &'a [String],
    pub frame: Frame<'a>,
    /// Flags for evaluating arguments of functions that defer evaluation
    pub flags: EvalFlags,
}

impl<'a> FunCall<'a> {
    pub fn arg(&self, index: usize) -> &'a str {
        self.args.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn executor(&self) -> Dbref {
        self.frame.executor
    }
}

pub struct FunDef<W: World> {
    /// Upper-case name, as shown in error messages
    pub name: &'static str,
    pub min: usize,
    pub max: usize,
    /// Arguments are passed unevaluated
    pub no_eval: bool,
    pub perms: Perms,
    pub handler: FunHandler<W>,
}

impl<W: World> Clone for FunDef<W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: World> Copy for FunDef<W> {}

impl<W: World> FunDef<W> {
    pub fn new(name: &'static str, min: usize, max: usize, handler: FunHandler<W>) -> Self {
        Self { name, min, max, no_eval: false, perms: Perms::PUBLIC, handler }
    }

    pub fn no_eval(mut self) -> Self {
        self.no_eval = true;
        self
    }
}

/// A function defined with `@function`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFunction {
    pub name: String,
    pub object: Dbref,
    pub attr: AttrNum,
    /// Runs as the defining object instead of the caller
    pub privileged: bool,
    /// Global registers are restored after the call
    pub preserve: bool,
    pub perms: Perms,
}

/// What a name in front of `(` resolved to
pub enum Callable<W: World> {
    Builtin(FunDef<W>),
    User(UserFunction),
}

impl<W: World> Callable<W> {
    pub fn perms(&self) -> Perms {
        match self {
            Callable::Builtin(def) => def.perms,
            Callable::User(ufun) => ufun.perms,
        }
    }

    pub(crate) fn max_args(&self) -> usize {
        match self {
            Callable::Builtin(def) => def.max.max(1),
            Callable::User(_) => MAX_ARGS,
        }
    }

    /// Flags for evaluating this function's arguments
    pub(crate) fn arg_flags(&self, flags: EvalFlags) -> EvalFlags {
        match self {
            Callable::Builtin(def) if def.no_eval => {
                flags.without(EvalFlags::EVAL | EvalFlags::FCHECK | EvalFlags::TOP)
            }
            _ => flags.without(EvalFlags::TOP) | EvalFlags::FCHECK,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FunctionError {
    #[error("Function already defined in builtin function list.")]
    Builtin,
    #[error("Function not found.")]
    NotFound,
    #[error("Bad permission name: {0}")]
    BadPermission(String),
}

pub struct FunctionTable<W: World> {
    builtins: HashMap<String, FunDef<W>>,
    user: HashMap<String, UserFunction>,
}

impl<W: World> FunctionTable<W> {
    pub fn new() -> Self {
        Self { builtins: HashMap::new(), user: HashMap::new() }
    }

    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        let groups = [
            Engine::<W>::math_functions(),
            Engine::<W>::logic_functions(),
            Engine::<W>::string_functions(),
            Engine::<W>::object_functions(),
            Engine::<W>::encoding_functions(),
        ];
        for def in groups.into_iter().flatten() {
            table.register(def);
        }
        table
    }

    pub fn register(&mut self, def: FunDef<W>) {
        let key = def.name.to_ascii_lowercase();
        if self.builtins.contains_key(&key) {
            warn!(function = def.name, "duplicate built-in function ignored");
            return;
        }
        self.builtins.insert(key, def);
    }

    /// Built-ins shadow user functions of the same name
    pub fn lookup(&self, name: &str) -> Option<Callable<W>> {
        if let Some(def) = self.builtins.get(name) {
            return Some(Callable::Builtin(*def));
        }
        self.user.get(name).cloned().map(Callable::User)
    }

    pub fn builtin(&self, name: &str) -> Option<&FunDef<W>> {
        self.builtins.get(&name.to_ascii_lowercase())
    }

    /// Apply a permission-name list to a built-in or user function
    pub fn set_access(&mut self, name: &str, spec: &str) -> Result<(), FunctionError> {
        let key = name.to_ascii_lowercase();
        let current = match (self.builtins.get_mut(&key), self.user.get_mut(&key)) {
            (Some(def), _) => &mut def.perms,
            (None, Some(ufun)) => &mut ufun.perms,
            (None, None) => return Err(FunctionError::NotFound),
        };
        *current = perms::apply_names(*current, spec).map_err(FunctionError::BadPermission)?;
        Ok(())
    }

    /// Add or replace a user function. Returns true when it replaced one.
    pub fn define(&mut self, mut ufun: UserFunction) -> Result<bool, FunctionError> {
        ufun.name = ufun.name.to_ascii_lowercase();
        if self.builtins.contains_key(&ufun.name) {
            return Err(FunctionError::Builtin);
        }
        Ok(self.user.insert(ufun.name.clone(), ufun).is_some())
    }

    pub fn undefine(&mut self, name: &str) -> Result<UserFunction, FunctionError> {
        self.user.remove(&name.to_ascii_lowercase()).ok_or(FunctionError::NotFound)
    }

    /// User functions sorted by name
    pub fn user_functions(&self) -> Vec<&UserFunction> {
        let mut list: Vec<_> = self.user.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }
}

impl<W: World> Default for FunctionTable<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: World> Engine<W> {
    /// Evaluate an argument of a function that defers evaluation
    pub(crate) fn eval_arg(&mut self, call: &FunCall<'_>, index: usize) -> String {
        self.eval(call.arg(index), &call.frame, call.flags)
    }

    pub(crate) fn apply_function_directives(&mut self) {
        for (name, spec) in self.config.function_access.clone() {
            if let Err(e) = self.functions.set_access(&name, &spec) {
                warn!(function = %name, "function_access: {}", e);
            }
        }
        for directive in self.config.functions.clone() {
            let attr = self.world.attr_define(&directive.attribute);
            let ufun = UserFunction {
                name: directive.name.clone(),
                object: directive.object,
                attr,
                privileged: directive.privileged,
                preserve: directive.preserve,
                perms: Perms::PUBLIC,
            };
            if let Err(e) = self.functions.define(ufun) {
                warn!(function = %directive.name, "function directive: {}", e);
            }
        }
    }
}

/// Leading number of `text` in the manner of `atof`; junk reads as zero
pub fn parse_number(text: &str) -> f64 {
    let t = text.trim();
    let mut end = 0;
    let bytes = t.as_bytes();
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    t[..end].parse().unwrap_or(0.0)
}

/// Leading integer of `text`; junk reads as zero
pub fn parse_int(text: &str) -> i64 {
    let t = text.trim();
    let bytes = t.as_bytes();
    let mut end = usize::from(bytes.first().is_some_and(|&b| b == b'-' || b == b'+'));
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    t[..end].parse().unwrap_or(0)
}

/// Integers print without a fraction; other values with trailing zeros trimmed
pub fn fmt_number(value: f64) -> String {
    if !value.is_finite() {
        return "#-1 ILLEGAL NUMBER".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let text = format!("{:.6}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Softcode truth: empty, zero and negative dbrefs are false
pub fn truthy(text: &str) -> bool {
    let t = text.trim();
    if t.is_empty() {
        return false;
    }
    if let Some(rest) = t.strip_prefix('#') {
        return !rest.starts_with('-');
    }
    let looks_numeric = t
        .trim_start_matches(['-', '+'])
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.');
    if looks_numeric {
        return parse_number(t) != 0.0;
    }
    true
}

pub(crate) fn bool_str(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(parse_number("3.5abc"), 3.5);
        assert_eq!(parse_number("junk"), 0.0);
        assert_eq!(parse_number(" -2 "), -2.0);
        assert_eq!(parse_int("42x"), 42);
        assert_eq!(fmt_number(3.0), "3");
        assert_eq!(fmt_number(0.25), "0.25");
        assert_eq!(fmt_number(-1.5), "-1.5");
    }

    #[test]
    fn truth() {
        assert!(!truthy(""));
        assert!(!truthy("0"));
        assert!(!truthy("#-1 NO MATCH"));
        assert!(truthy("#0"));
        assert!(truthy("1"));
        assert!(truthy("hello"));
        assert!(!truthy("0.0"));
    }
}
