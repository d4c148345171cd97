//! Tests for softcode evaluation and the function library

mod common;

use common::*;
use softcode::{EvalFlags, Frame};

fn eval(text: &str) -> String {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    fx.eval(alice, text)
}

// ============================================
// Evaluator
// ============================================

#[test]
fn nested_calls_and_brackets() {
    assert_eq!(eval("add(mul(2,3),sub(10,4))"), "12");
    assert_eq!(eval("Total: [add(1,2)] items"), "Total: 3 items");
    assert_eq!(eval("[ucstr(a)][lcstr(B)]"), "Ab");
}

#[test]
fn commas_inside_nested_calls_stay_put() {
    assert_eq!(eval("strlen(add(1,2))"), "1");
    assert_eq!(eval("words(cat(a,b c))"), "3");
}

#[test]
fn escapes_protect_specials() {
    assert_eq!(eval(r"\%0"), "%0");
    assert_eq!(eval(r"a\,b"), "a,b");
    assert_eq!(eval("lit([add(1,2)])"), "[add(1,2)]");
}

#[test]
fn percent_substitutions() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    fx.set(alice, "SEX", "female");
    assert_eq!(fx.eval(alice, "%n is %# in %l"), "Alice is #2 in #0");
    assert_eq!(fx.eval(alice, "%s %o %p %a"), "she her her hers");
    assert_eq!(fx.eval(alice, "%va"), "");
    fx.set(alice, "VA", "stored");
    assert_eq!(fx.eval(alice, "%va"), "stored");
}

#[test]
fn location_hidden_by_unfindable_room() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let vault = fx.room("Vault");
    fx.world().teleport(GOD, vault);
    fx.world().set_flag(vault, ObjectFlags::UNFINDABLE, true);

    let frame = Frame::new(alice, GOD, GOD, &[]);
    assert_eq!(fx.engine.eval("%l", &frame, EvalFlags::STANDARD), "#-1");

    fx.world().set_flag(vault, ObjectFlags::UNFINDABLE, false);
    assert_eq!(fx.engine.eval("%l", &frame, EvalFlags::STANDARD), vault.to_string());

    fx.world().set_flag(GOD, ObjectFlags::UNFINDABLE, true);
    assert_eq!(fx.engine.eval("%l", &frame, EvalFlags::STANDARD), "#-1");
    assert_eq!(fx.eval(GOD, "%l"), vault.to_string());
}

#[test]
fn command_arguments_in_frames() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let args = vec!["one".to_string(), "two".to_string()];
    let frame = Frame::new(alice, GOD, GOD, &args);
    let out = fx.engine.eval("%1 %0 [v(0)] %#", &frame, EvalFlags::STANDARD);
    assert_eq!(out, "two one one #1");
}

#[test]
fn unevaluated_function_arguments() {
    assert_eq!(eval("[setq(0,start)][if(1,ok,[setq(0,bad)])]%q0"), "okstart");
    assert_eq!(eval("[setq(0,start)][if(0,[setq(0,bad)])]%q0"), "start");
}

// ============================================
// Logic
// ============================================

#[test]
fn conditionals() {
    assert_eq!(eval("if(1,yes,no)"), "yes");
    assert_eq!(eval("if(0,yes,[add(1,1)])"), "2");
    assert_eq!(eval("ifelse(#-1,yes,no)"), "no");
    assert_eq!(eval("switch(apple,b*,berry,a*,fruit,other)"), "fruit");
    assert_eq!(eval("switch(kiwi,b*,berry,other #$)"), "other kiwi");
    assert_eq!(eval("case(a*,apple,no,a*,exact)"), "exact");
}

#[test]
fn boolean_functions() {
    assert_eq!(eval("and(1,0)"), "0");
    assert_eq!(eval("or(0,#3)"), "1");
    assert_eq!(eval("not(0)"), "1");
    assert_eq!(eval("t(#-1)"), "0");
    assert_eq!(eval("t(word)"), "1");
}

#[test]
fn iteration() {
    assert_eq!(eval("iter(a b c,[ucstr(##)])"), "A B C");
    assert_eq!(eval("iter(a|b,#@:##,|,-)"), "1:a-2:b");
    assert_eq!(eval("null(add(1,2))x"), "x");
}

// ============================================
// Math and strings
// ============================================

#[test]
fn arithmetic() {
    assert_eq!(eval("div(7,2)"), "3");
    assert_eq!(eval("mod(7,3)"), "1");
    assert_eq!(eval("div(1,0)"), "#-1 DIVIDE BY ZERO");
    assert_eq!(eval("add(0.5,0.25)"), "0.75");
    assert_eq!(eval("max(3,9,4)"), "9");
    assert_eq!(eval("gt(3,2)"), "1");
    assert_eq!(eval("eq(2,3)"), "0");
}

#[test]
fn string_functions() {
    assert_eq!(eval("strlen(hello)"), "5");
    assert_eq!(eval("mid(abcdef,2,3)"), "cde");
    assert_eq!(eval("left(abcdef,2)"), "ab");
    assert_eq!(eval("right(abcdef,2)"), "ef");
    assert_eq!(eval("capstr(word)"), "Word");
    assert_eq!(eval("edit(a-b-c,-,+)"), "a+b+c");
    assert_eq!(eval("strmatch(Foobar,foo*)"), "1");
    assert_eq!(eval("pos(b,abc)"), "2");
}

#[test]
fn list_functions() {
    assert_eq!(eval("first(a b c)"), "a");
    assert_eq!(eval("rest(a b c)"), "b c");
    assert_eq!(eval("last(a b c)"), "c");
    assert_eq!(eval("extract(a b c d,2,2)"), "b c");
    assert_eq!(eval("member(a b c,c)"), "3");
    assert_eq!(eval("words(a b c)"), "3");
}

#[test]
fn repeat_is_bounded() {
    let mut config = Config::default();
    config.limits.output_limit = 10;
    let mut fx = Fixture::with_config(config);
    let alice = fx.alice;
    assert_eq!(fx.eval(alice, "strlen(repeat(ab,100))"), "10");
}

// ============================================
// Encoding
// ============================================

#[test]
fn base64_and_digests() {
    assert_eq!(eval("encode64(hello)"), "aGVsbG8=");
    assert_eq!(eval("decode64(aGVsbG8=)"), "hello");
    assert_eq!(eval("decode64(!!)"), "#-1 INVALID BASE64 STRING");
    assert_eq!(
        eval("digest(sha256,abc)"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(eval("digest(md4,abc)"), "#-1 UNSUPPORTED DIGEST TYPE");
}

#[test]
fn clock() {
    let secs: i64 = eval("secs()").parse().unwrap();
    assert!(secs > 1_600_000_000);
    assert_eq!(eval("time()").split_whitespace().count(), 5);
}

// ============================================
// Objects and attributes
// ============================================

#[test]
fn object_queries() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let hall = fx.room("Hall");
    let exit = fx.world().create_exit("North;n", LIMBO, hall, GOD);
    let hat = fx.thing("Hat", alice, alice);

    assert_eq!(fx.eval(alice, "name(me)"), "Alice");
    assert_eq!(fx.eval(alice, "num(hat)"), hat.to_string());
    assert_eq!(fx.eval(alice, "loc(me)"), "#0");
    assert_eq!(fx.eval(alice, "owner(hat)"), alice.to_string());
    assert_eq!(fx.eval(alice, "con(me)"), hat.to_string());
    assert_eq!(fx.eval(alice, "exit(here)"), exit.to_string());
    assert_eq!(fx.eval(alice, "hasflag(me,connected)"), "1");
    assert_eq!(fx.eval(alice, "hasflag(#1,wizard)"), "1");
    assert_eq!(fx.eval(alice, "hasflag(me,bogus)"), "#-1 INVALID FLAG");
    assert_eq!(fx.eval(alice, "name(nothing)"), "#-1 NO MATCH");
}

#[test]
fn attribute_functions() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    fx.set(alice, "GREETING", "Hello, %0!");
    fx.set(alice, "FORMULA", "add(%0,%1)");

    assert_eq!(fx.eval(alice, "get(me/GREETING)"), "Hello, %0!");
    assert_eq!(fx.eval(alice, "v(GREETING)"), "Hello, %0!");
    assert_eq!(fx.eval(alice, "u(me/GREETING,world)"), "Hello, world!");
    assert_eq!(fx.eval(alice, "u(FORMULA,2,3)"), "5");
    assert_eq!(fx.eval(alice, "s(get(me/FORMULA))"), "0");
    assert_eq!(fx.eval(alice, "eval(me,FORMULA)"), "0");
}

#[test]
fn ulocal_restores_registers() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    fx.set(alice, "CLOBBER", "[setq(0,inner)]%q0");
    assert_eq!(fx.eval(alice, "[setq(0,outer)][u(CLOBBER)]-%q0"), "inner-inner");
    assert_eq!(fx.eval(alice, "[setq(0,outer)][ulocal(CLOBBER)]-%q0"), "inner-outer");
}

#[test]
fn parent_attributes_are_inherited() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let proto = fx.thing("Proto", alice, alice);
    let child = fx.thing("Child", alice, alice);
    fx.world().set_parent(child, proto);
    fx.set(proto, "COLOR", "blue");
    assert_eq!(fx.eval(alice, "get(child/COLOR)"), "blue");
}

#[test]
fn configured_user_functions() {
    let config = Config::from_toml(
        "[[function]]\nname = \"triple\"\nobject = 1\nattribute = \"FN_TRIPLE\"\n",
    )
    .unwrap();
    let mut world = MemoryWorld::new();
    world.create_player("Alice", LIMBO);
    world.set_attr(GOD, "FN_TRIPLE", "mul(%0,3)");
    let mut engine = Engine::new(world, config);
    assert_eq!(engine.evaluate(Dbref(2), "triple(5)"), "15");
}

#[test]
fn configured_function_access() {
    let config = Config::from_toml("[function_access]\nencode64 = \"wizard\"\n").unwrap();
    let mut fx = Fixture::with_config(config);
    let alice = fx.alice;
    assert_eq!(fx.eval(alice, "encode64(hi)"), "#-1 PERMISSION DENIED");
    assert_eq!(fx.eval(GOD, "encode64(hi)"), "aGk=");
}
