//! Boolean and control-flow functions
//!
//! `if`, `switch`, `case` and `iter` receive their arguments unevaluated so
//! only the chosen branch runs.

use crate::eval::Engine;
use crate::wild::wild_match;
use crate::world::World;

use super::{bool_str, truthy, FunCall, FunDef, VARIADIC};

/// Split a list on `delim`; a space delimiter also collapses runs of spaces
pub(crate) fn split_list<'a>(list: &'a str, delim: &str) -> Vec<&'a str> {
    if delim.is_empty() || delim == " " {
        list.split_whitespace().collect()
    } else if list.is_empty() {
        Vec::new()
    } else {
        list.split(delim).collect()
    }
}

impl<W: World> Engine<W> {
    pub(super) fn logic_functions() -> Vec<FunDef<W>> {
        vec![
            FunDef::new("IF", 2, 3, Self::fun_if).no_eval(),
            FunDef::new("IFELSE", 3, 3, Self::fun_if).no_eval(),
            FunDef::new("SWITCH", 2, VARIADIC, Self::fun_switch).no_eval(),
            FunDef::new("CASE", 2, VARIADIC, Self::fun_switch).no_eval(),
            FunDef::new("AND", 1, VARIADIC, Self::fun_and),
            FunDef::new("OR", 1, VARIADIC, Self::fun_or),
            FunDef::new("NOT", 1, 1, Self::fun_not),
            FunDef::new("T", 1, 1, Self::fun_t),
            FunDef::new("ITER", 2, 4, Self::fun_iter).no_eval(),
            FunDef::new("NULL", 0, VARIADIC, Self::fun_null),
        ]
    }

    fn fun_if(&mut self, out: &mut String, call: &FunCall<'_>) {
        let test = self.eval_arg(call, 0);
        if truthy(&test) {
            let branch = self.eval_arg(call, 1);
            out.push_str(&branch);
        } else if call.args.len() > 2 {
            let branch = self.eval_arg(call, 2);
            out.push_str(&branch);
        }
    }

    /// `switch()` matches wildcards, `case()` compares exactly. `#$` in the
    /// chosen result stands for the tested value.
    fn fun_switch(&mut self, out: &mut String, call: &FunCall<'_>) {
        let exact = call.name == "CASE";
        let value = self.eval_arg(call, 0);
        let mut i = 1;
        while i + 1 < call.args.len() {
            let pattern = self.eval_arg(call, i);
            let hit = if exact { pattern == value } else { wild_match(&pattern, &value) };
            if hit {
                let body = call.arg(i + 1).replace("#$", &value);
                let result = self.eval(&body, &call.frame, call.flags);
                out.push_str(&result);
                return;
            }
            i += 2;
        }
        if i < call.args.len() {
            let body = call.arg(i).replace("#$", &value);
            let result = self.eval(&body, &call.frame, call.flags);
            out.push_str(&result);
        }
    }

    fn fun_and(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(bool_str(call.args.iter().all(|a| truthy(a))));
    }

    fn fun_or(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(bool_str(call.args.iter().any(|a| truthy(a))));
    }

    fn fun_not(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(bool_str(!truthy(call.arg(0))));
    }

    fn fun_t(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(bool_str(truthy(call.arg(0))));
    }

    /// `iter(list, pattern[, delim[, osep]])`: `##` is the item, `#@` its position
    fn fun_iter(&mut self, out: &mut String, call: &FunCall<'_>) {
        let list = self.eval_arg(call, 0);
        let delim = if call.args.len() > 2 { self.eval_arg(call, 2) } else { String::new() };
        let osep = if call.args.len() > 3 { self.eval_arg(call, 3) } else { " ".to_string() };

        for (n, item) in split_list(&list, &delim).into_iter().enumerate() {
            if self.alarm.is_raised() {
                break;
            }
            if n > 0 {
                out.push_str(&osep);
            }
            let body = call.arg(1).replace("##", item).replace("#@", &(n + 1).to_string());
            let result = self.eval(&body, &call.frame, call.flags);
            out.push_str(&result);
        }
    }

    fn fun_null(&mut self, _out: &mut String, _call: &FunCall<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_splitting() {
        assert_eq!(split_list("  a  b c ", " "), vec!["a", "b", "c"]);
        assert_eq!(split_list("a|b||c", "|"), vec!["a", "b", "", "c"]);
        assert!(split_list("", "|").is_empty());
    }
}
