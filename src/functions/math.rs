//! Arithmetic and comparison functions

use crate::eval::Engine;
use crate::world::World;

use super::{bool_str, fmt_number, parse_int, parse_number, FunCall, FunDef, VARIADIC};

fn numbers<'a>(call: &FunCall<'a>) -> impl Iterator<Item = f64> + 'a {
    call.args.iter().map(|a| parse_number(a))
}

fn compare(call: &FunCall<'_>) -> std::cmp::Ordering {
    let (a, b) = (parse_number(call.arg(0)), parse_number(call.arg(1)));
    a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
}

impl<W: World> Engine<W> {
    pub(super) fn math_functions() -> Vec<FunDef<W>> {
        vec![
            FunDef::new("ADD", 1, VARIADIC, Self::fun_add),
            FunDef::new("SUB", 2, 2, Self::fun_sub),
            FunDef::new("MUL", 1, VARIADIC, Self::fun_mul),
            FunDef::new("DIV", 2, 2, Self::fun_div),
            FunDef::new("MOD", 2, 2, Self::fun_mod),
            FunDef::new("ABS", 1, 1, Self::fun_abs),
            FunDef::new("MAX", 1, VARIADIC, Self::fun_max),
            FunDef::new("MIN", 1, VARIADIC, Self::fun_min),
            FunDef::new("GT", 2, 2, Self::fun_gt),
            FunDef::new("GTE", 2, 2, Self::fun_gte),
            FunDef::new("LT", 2, 2, Self::fun_lt),
            FunDef::new("LTE", 2, 2, Self::fun_lte),
            FunDef::new("EQ", 2, 2, Self::fun_eq),
            FunDef::new("NEQ", 2, 2, Self::fun_neq),
            FunDef::new("INC", 1, 1, Self::fun_inc),
            FunDef::new("DEC", 1, 1, Self::fun_dec),
        ]
    }

    fn fun_add(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&fmt_number(numbers(call).sum()));
    }

    fn fun_sub(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&fmt_number(parse_number(call.arg(0)) - parse_number(call.arg(1))));
    }

    fn fun_mul(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&fmt_number(numbers(call).product()));
    }

    /// Integer division, truncating toward zero
    fn fun_div(&mut self, out: &mut String, call: &FunCall<'_>) {
        let (a, b) = (parse_int(call.arg(0)), parse_int(call.arg(1)));
        match a.checked_div(b) {
            Some(q) => out.push_str(&q.to_string()),
            None => out.push_str("#-1 DIVIDE BY ZERO"),
        }
    }

    fn fun_mod(&mut self, out: &mut String, call: &FunCall<'_>) {
        let (a, b) = (parse_int(call.arg(0)), parse_int(call.arg(1)));
        match a.checked_rem(b) {
            Some(r) => out.push_str(&r.to_string()),
            None => out.push_str("#-1 DIVIDE BY ZERO"),
        }
    }

    fn fun_abs(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&fmt_number(parse_number(call.arg(0)).abs()));
    }

    fn fun_max(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&fmt_number(numbers(call).fold(f64::NEG_INFINITY, f64::max)));
    }

    fn fun_min(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&fmt_number(numbers(call).fold(f64::INFINITY, f64::min)));
    }

    fn fun_gt(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(bool_str(compare(call).is_gt()));
    }

    fn fun_gte(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(bool_str(compare(call).is_ge()));
    }

    fn fun_lt(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(bool_str(compare(call).is_lt()));
    }

    fn fun_lte(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(bool_str(compare(call).is_le()));
    }

    fn fun_eq(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(bool_str(compare(call).is_eq()));
    }

    fn fun_neq(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(bool_str(compare(call).is_ne()));
    }

    fn fun_inc(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&parse_int(call.arg(0)).saturating_add(1).to_string());
    }

    fn fun_dec(&mut self, out: &mut String, call: &FunCall<'_>) {
        out.push_str(&parse_int(call.arg(0)).saturating_sub(1).to_string());
    }
}
