//! Object, attribute and register functions

use crate::dbref::Dbref;
use crate::eval::{EvalFlags, Frame, Registers};
use crate::matcher::Match;
use crate::world::{attrs, AttrNum, ObjectFlags, World};
use crate::eval::Engine;

use super::{bool_str, FunCall, FunDef, VARIADIC};

const NO_MATCH: &str = "#-1 NO MATCH";
const AMBIGUOUS: &str = "#-2 AMBIGUOUS MATCH";
const NO_PERM_ATTR: &str = "#-1 NO PERMISSION TO GET ATTRIBUTE";
const BAD_REGISTER: &str = "#-1 INVALID GLOBAL REGISTER";

impl<W: World> Engine<W> {
    pub(super) fn object_functions() -> Vec<FunDef<W>> {
        vec![
            FunDef::new("NAME", 1, 1, Self::fun_name),
            FunDef::new("NUM", 1, 1, Self::fun_num),
            FunDef::new("LOC", 1, 1, Self::fun_loc),
            FunDef::new("OWNER", 1, 1, Self::fun_owner),
            FunDef::new("CON", 1, 1, Self::fun_con),
            FunDef::new("EXIT", 1, 1, Self::fun_exit),
            FunDef::new("HASFLAG", 2, 2, Self::fun_hasflag),
            FunDef::new("GET", 1, 1, Self::fun_get),
            FunDef::new("V", 1, 1, Self::fun_v),
            FunDef::new("U", 1, VARIADIC, Self::fun_u),
            FunDef::new("ULOCAL", 1, VARIADIC, Self::fun_u),
            FunDef::new("S", 1, 1, Self::fun_s),
            FunDef::new("EVAL", 1, 2, Self::fun_eval),
            FunDef::new("SETQ", 2, 2, Self::fun_setq),
            FunDef::new("SETR", 2, 2, Self::fun_setq),
            FunDef::new("R", 1, 1, Self::fun_r),
            FunDef::new("ELOCK", 2, 2, Self::fun_elock),
        ]
    }

    /// Resolve an object argument, writing the failure token on a miss
    fn fun_target(&self, out: &mut String, executor: Dbref, name: &str) -> Option<Dbref> {
        match self.match_thing(executor, name) {
            Match::Found(d) => Some(d),
            Match::NotFound => {
                out.push_str(NO_MATCH);
                None
            }
            Match::Ambiguous => {
                out.push_str(AMBIGUOUS);
                None
            }
        }
    }

    /// Split `obj/attr` (or a bare attribute on the executor) and resolve both
    fn attr_target(&self, out: &mut String, executor: Dbref, spec: &str) -> Option<(Dbref, AttrNum)> {
        let (obj, attr_name) = match spec.split_once('/') {
            Some((obj, attr)) => (self.fun_target(out, executor, obj)?, attr),
            None => (executor, spec),
        };
        match self.world.attr_number(attr_name.trim()) {
            Some(attr) => Some((obj, attr)),
            None => None,
        }
    }

    fn fun_name(&mut self, out: &mut String, call: &FunCall<'_>) {
        if let Some(obj) = self.fun_target(out, call.executor(), call.arg(0)) {
            out.push_str(&self.world.name(obj));
        }
    }

    fn fun_num(&mut self, out: &mut String, call: &FunCall<'_>) {
        if let Some(obj) = self.fun_target(out, call.executor(), call.arg(0)) {
            out.push_str(&obj.to_string());
        }
    }

    /// Location of something the executor controls or stands near
    fn fun_loc(&mut self, out: &mut String, call: &FunCall<'_>) {
        let executor = call.executor();
        if let Some(obj) = self.fun_target(out, executor, call.arg(0)) {
            if self.world.controls(executor, obj) || self.world.nearby(executor, obj) {
                out.push_str(&self.world.location(obj).to_string());
            } else {
                out.push_str("#-1");
            }
        }
    }

    fn fun_owner(&mut self, out: &mut String, call: &FunCall<'_>) {
        if let Some(obj) = self.fun_target(out, call.executor(), call.arg(0)) {
            out.push_str(&self.world.owner(obj).to_string());
        }
    }

    fn fun_con(&mut self, out: &mut String, call: &FunCall<'_>) {
        if let Some(obj) = self.fun_target(out, call.executor(), call.arg(0)) {
            let first = self.world.contents(obj).first().copied().unwrap_or(Dbref::NOTHING);
            out.push_str(&first.to_string());
        }
    }

    fn fun_exit(&mut self, out: &mut String, call: &FunCall<'_>) {
        if let Some(obj) = self.fun_target(out, call.executor(), call.arg(0)) {
            let first = self.world.exits(obj).first().copied().unwrap_or(Dbref::NOTHING);
            out.push_str(&first.to_string());
        }
    }

    fn fun_hasflag(&mut self, out: &mut String, call: &FunCall<'_>) {
        let Some(obj) = self.fun_target(out, call.executor(), call.arg(0)) else {
            return;
        };
        let flag = call.arg(1).trim();
        if flag.eq_ignore_ascii_case("connected") {
            out.push_str(bool_str(self.world.is_connected(obj)));
            return;
        }
        match ObjectFlags::from_name(flag) {
            Some(f) => out.push_str(bool_str(self.world.has_flag(obj, f))),
            None => out.push_str("#-1 INVALID FLAG"),
        }
    }

    fn fun_get(&mut self, out: &mut String, call: &FunCall<'_>) {
        let executor = call.executor();
        let Some((obj, attr)) = self.attr_target(out, executor, call.arg(0)) else {
            return;
        };
        if !self.world.can_read_attr(executor, obj, attr) {
            out.push_str(NO_PERM_ATTR);
            return;
        }
        let limit = self.config.limits.parent_nesting;
        if let Some((found, _)) = self.world.atr_pget(obj, attr, limit) {
            out.push_str(&found.text);
        }
    }

    /// A digit reads a command argument, anything else an attribute on the executor
    fn fun_v(&mut self, out: &mut String, call: &FunCall<'_>) {
        let name = call.arg(0).trim();
        let mut chars = name.chars();
        if let (Some(c @ '0'..='9'), None) = (chars.next(), chars.next()) {
            if let Some(arg) = call.frame.args.get(usize::from(c as u8 - b'0')) {
                out.push_str(arg);
            }
            return;
        }
        let Some(attr) = self.world.attr_number(name) else {
            return;
        };
        let limit = self.config.limits.parent_nesting;
        if let Some((found, _)) = self.world.atr_pget(call.executor(), attr, limit) {
            out.push_str(&found.text);
        }
    }

    /// `u(obj/attr, args...)` runs the attribute as the object holding it;
    /// `ulocal()` also restores the global registers afterwards
    fn fun_u(&mut self, out: &mut String, call: &FunCall<'_>) {
        let executor = call.executor();
        let mut scratch = String::new();
        let Some((obj, attr)) = self.attr_target(&mut scratch, executor, call.arg(0)) else {
            return;
        };
        if !self.world.can_read_attr(executor, obj, attr) {
            return;
        }
        let limit = self.config.limits.parent_nesting;
        let Some((body, _)) = self.world.atr_pget(obj, attr, limit) else {
            return;
        };
        let args = &call.args[1..];
        let frame = Frame::new(obj, executor, call.frame.enactor, args);
        let flags = EvalFlags::EVAL | EvalFlags::FCHECK;
        let result = if call.name == "ULOCAL" {
            self.preserving_registers(|engine| engine.eval(&body.text, &frame, flags))
        } else {
            self.eval(&body.text, &frame, flags)
        };
        out.push_str(&result);
    }

    /// Evaluate an already evaluated argument once more
    fn fun_s(&mut self, out: &mut String, call: &FunCall<'_>) {
        let result = self.eval(call.arg(0), &call.frame, EvalFlags::EVAL | EvalFlags::FCHECK);
        out.push_str(&result);
    }

    /// `eval(text)` or `eval(obj, attr)`
    fn fun_eval(&mut self, out: &mut String, call: &FunCall<'_>) {
        if call.args.len() == 1 {
            self.fun_s(out, call);
            return;
        }
        let executor = call.executor();
        let Some(obj) = self.fun_target(out, executor, call.arg(0)) else {
            return;
        };
        let Some(attr) = self.world.attr_number(call.arg(1).trim()) else {
            return;
        };
        if !self.world.can_read_attr(executor, obj, attr) {
            out.push_str(NO_PERM_ATTR);
            return;
        }
        let limit = self.config.limits.parent_nesting;
        if let Some((body, _)) = self.world.atr_pget(obj, attr, limit) {
            let frame = Frame::new(obj, executor, call.frame.enactor, &[]);
            let result = self.eval(&body.text, &frame, EvalFlags::EVAL | EvalFlags::FCHECK);
            out.push_str(&result);
        }
    }

    /// `setq()` is silent, `setr()` also returns the value
    fn fun_setq(&mut self, out: &mut String, call: &FunCall<'_>) {
        match Registers::index_of_str(call.arg(0)) {
            Some(slot) => {
                self.state.registers.set(slot, call.arg(1));
                if call.name == "SETR" {
                    out.push_str(call.arg(1));
                }
            }
            None => out.push_str(BAD_REGISTER),
        }
    }

    fn fun_r(&mut self, out: &mut String, call: &FunCall<'_>) {
        match Registers::index_of_str(call.arg(0)) {
            Some(slot) => out.push_str(self.state.registers.get(slot)),
            None => out.push_str(BAD_REGISTER),
        }
    }

    /// `elock(obj[/locktype], victim)`: would `victim` pass the lock?
    fn fun_elock(&mut self, out: &mut String, call: &FunCall<'_>) {
        let executor = call.executor();
        let (obj_name, lock_name) = call.arg(0).split_once('/').unwrap_or((call.arg(0), ""));
        let lock_attr = match lock_name.trim().to_ascii_lowercase().as_str() {
            "" | "default" => attrs::LOCK,
            "enter" => attrs::LENTER,
            "use" => attrs::LUSE,
            _ => {
                out.push_str("#-1 INVALID LOCK TYPE");
                return;
            }
        };
        let Some(obj) = self.fun_target(out, executor, obj_name) else {
            return;
        };
        let Some(victim) = self.fun_target(out, executor, call.arg(1)) else {
            return;
        };
        if !self.world.controls(executor, obj) && !self.world.nearby(executor, obj) {
            out.push_str("#-1 TOO FAR AWAY");
            return;
        }
        let passed = self.could_doit(victim, obj, lock_attr);
        out.push_str(bool_str(passed));
    }
}
