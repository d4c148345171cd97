//! Tests for queued commands, soft commands, hooks and command restrictions

mod common;

use common::*;

const HUH: &str = "Huh?  (Type \"help\" for help.)";

// ============================================
// $-commands
// ============================================

#[test]
fn dollar_commands_capture_wildcards() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let widget = fx.thing("Widget", alice, LIMBO);
    fx.set(widget, "CMD", "$give * to *:@pemit %#=You give %0 to %1.");

    assert_eq!(fx.run(alice, "give apple to Bob"), lines(&["You give apple to Bob."]));
}

#[test]
fn dollar_commands_are_inherited_from_parents() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let proto = fx.thing("Prototype", alice, alice);
    let widget = fx.thing("Widget", alice, LIMBO);
    fx.world().set_parent(widget, proto);
    fx.set(proto, "PING", "$ping:@pemit %#=pong from %!");

    // The prototype in Alice's inventory answers too
    assert_eq!(
        fx.run(alice, "ping"),
        lines(&[&format!("pong from {}", widget), &format!("pong from {}", proto)])
    );
}

#[test]
fn use_locks_refuse_dollar_commands() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let widget = fx.thing("Widget", GOD, LIMBO);
    fx.set(widget, "CMD", "$press:@pemit %#=Click.");
    fx.run(GOD, "@lock/use widget=#1");

    assert_eq!(fx.dispatch(alice, "press"), Dispatch::Dollar);
    assert_eq!(fx.heard(alice), lines(&["You can't use that."]));

    fx.run(GOD, "@unlock/use widget");
    assert_eq!(fx.run(alice, "press"), lines(&["Click."]));
}

#[test]
fn no_command_objects_are_skipped() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let widget = fx.thing("Widget", alice, LIMBO);
    fx.set(widget, "CMD", "$press:@pemit %#=Click.");
    fx.world().set_flag(widget, ObjectFlags::NO_COMMAND, true);
    assert_eq!(fx.run(alice, "press"), lines(&[HUH]));
}

#[test]
fn actions_split_on_semicolons() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let widget = fx.thing("Widget", alice, LIMBO);
    fx.set(widget, "CMD", "$twice *:@pemit %#=one %0;@pemit %#=two %0");
    assert_eq!(fx.run(alice, "twice go"), lines(&["one go", "two go"]));
}

// ============================================
// Queueing verbs
// ============================================

#[test]
fn trigger_passes_arguments() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    assert_eq!(fx.run(alice, "&DO me=think %0-%1"), lines(&["Set."]));
    assert_eq!(fx.world().attr(alice, "DO").as_deref(), Some("think %0-%1"));
    assert_eq!(fx.run(alice, "@trigger me/DO=x,y"), lines(&["Triggered.", "x-y"]));
    assert_eq!(fx.run(alice, "@trigger/quiet me/DO=a,b"), lines(&["a-b"]));
}

#[test]
fn trigger_needs_control() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    fx.set(GOD, "SECRET", "think gotcha");
    assert_eq!(fx.run(alice, "@trigger #1/SECRET"), lines(&["Permission denied."]));
    assert!(fx.heard(GOD).is_empty());
}

#[test]
fn switch_runs_matching_actions() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    assert_eq!(fx.run(alice, "@switch 5=5,think five,*,think any"), lines(&["five", "any"]));
    assert_eq!(fx.run(alice, "@switch/first 5=5,think five,*,think any"), lines(&["five"]));
    assert_eq!(fx.run(alice, "@switch 7=5,think five,think none"), lines(&["none"]));
    assert_eq!(fx.run(alice, "@switch abc=a*,think got #$"), lines(&["got abc"]));
}

#[test]
fn dolist_runs_once_per_item() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    assert_eq!(fx.run(alice, "@dolist red green=think #@ ##"), lines(&["1 red", "2 green"]));
}

#[test]
fn force_runs_as_the_victim() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let widget = fx.thing("Widget", alice, LIMBO);
    fx.run(alice, "@force widget=think hi");
    assert_eq!(fx.heard(widget), lines(&["hi"]));

    fx.run(alice, &format!("{} think hey", widget));
    assert_eq!(fx.heard(widget), lines(&["hey"]));

    assert_eq!(fx.run(alice, "@force #1=think hi"), lines(&["Permission denied."]));
}

// ============================================
// Soft commands
// ============================================

#[test]
fn addcommand_binds_a_verb() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let gadget = fx.thing("Gadget", GOD, LIMBO);
    fx.set(gadget, "STAT", "$+stat *:@pemit %#=Status of %0: fine");

    assert_eq!(fx.run(GOD, "@addcommand +stat=gadget/STAT"), lines(&["Command +stat added."]));
    assert_eq!(fx.dispatch(alice, "+stat engine"), Dispatch::Builtin);
    assert_eq!(fx.heard(alice), lines(&["Status of engine: fine"]));
    assert_eq!(fx.run(alice, "+stat"), lines(&[HUH]));

    assert_eq!(fx.run(GOD, "@addcommand +stat=gadget/STAT"), lines(&["Command +stat already added."]));
}

#[test]
fn addcommand_checks_its_arguments() {
    let mut fx = Fixture::new();
    let gadget = fx.thing("Gadget", GOD, LIMBO);
    fx.set(gadget, "PLAIN", "just text");

    assert_eq!(fx.run(GOD, "@addcommand +x=gadget/PLAIN"), lines(&["Attribute must be a $-command."]));
    assert_eq!(fx.run(GOD, "@addcommand +x=gadget"), lines(&["No match."]));
    assert_eq!(fx.run(GOD, "@addcommand +x=gadget/NOPE"), lines(&["No such attribute."]));
    assert_eq!(fx.run(GOD, "@addcommand __x=gadget/PLAIN"), lines(&["That is not a valid command name."]));
    assert_eq!(fx.run(GOD, "@delcommand +x"), lines(&["Command not found in command table."]));
}

#[test]
fn addcommand_shadows_and_restores_built_ins() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let gadget = fx.thing("Gadget", GOD, LIMBO);
    fx.set(gadget, "SAY", "$say *:@pemit %#=Shh: %0");

    fx.run(GOD, "@addcommand say=gadget/SAY");
    assert_eq!(fx.run(alice, "say hello"), lines(&["Shh: hello"]));
    assert_eq!(fx.run(alice, "__say hello"), lines(&["You say \"hello\""]));
    fx.heard(GOD);

    assert_eq!(fx.run(GOD, "@delcommand say"), lines(&["Command say deleted."]));
    assert!(fx.engine.commands().lookup("__say").is_none());
    assert_eq!(fx.run(alice, "say hello"), lines(&["You say \"hello\""]));
}

#[test]
fn delcommand_removes_one_binding() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    let first = fx.thing("First", GOD, LIMBO);
    let second = fx.thing("Second", GOD, LIMBO);
    fx.set(first, "GO", "$+go:@pemit %#=first");
    fx.set(second, "GO", "$+go:@pemit %#=second");

    fx.run(GOD, "@addcommand +go=first/GO");
    fx.run(GOD, "@addcommand +go=second/GO");
    assert_eq!(fx.run(alice, "+go"), lines(&["first", "second"]));

    assert_eq!(fx.run(GOD, "@delcommand +go=first/GO"), lines(&["Command +go binding deleted."]));
    assert_eq!(fx.run(alice, "+go"), lines(&["second"]));
    assert_eq!(fx.run(GOD, "@delcommand +go=first/GO"), lines(&["Command binding not found."]));
    assert_eq!(fx.run(GOD, "@delcommand +go=second/GO"), lines(&["Command +go deleted."]));
    assert!(fx.engine.commands().lookup("+go").is_none());
}

#[test]
fn user_functions_through_the_command() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    fx.set(GOD, "FN_DOUBLE", "mul(%0,2)");

    assert_eq!(fx.run(GOD, "@function double=me/FN_DOUBLE"), lines(&["Function DOUBLE defined."]));
    assert_eq!(fx.run(alice, "think double(21)"), lines(&["42"]));
    assert_eq!(fx.run(GOD, "@function/preserve double=me/FN_DOUBLE"), lines(&["Function DOUBLE updated."]));
    assert_eq!(fx.run(GOD, "@function/list"), lines(&[&format!("{:<16} #1/FN_DOUBLE preserve", "DOUBLE")]));
    assert_eq!(
        fx.run(GOD, "@function add=me/FN_DOUBLE"),
        lines(&["Function already defined in builtin function list."])
    );
    assert_eq!(fx.run(GOD, "@function/delete double"), lines(&["Function deleted."]));
    assert_eq!(fx.run(GOD, "@function/delete double"), lines(&["Function not found."]));
}

// ============================================
// Hooks
// ============================================

fn hooked() -> Fixture {
    let mut config = Config::default();
    config.dispatch.hook_object = Dbref(3);
    Fixture::build(config, |world| {
        world.create_thing("Hooks", GOD, LIMBO);
    })
}

#[test]
fn permit_hook_denies() {
    let mut fx = hooked();
    let alice = fx.alice;
    let hooks = Dbref(3);
    fx.set(hooks, "P_SAY", "[strmatch(%#,#1)]");

    assert_eq!(fx.run(GOD, "@hook/permit say"), lines(&["Hooks for say: permit"]));
    assert_eq!(fx.run(alice, "say hi"), lines(&["Permission denied."]));
    assert_eq!(fx.run(GOD, "say hi"), lines(&["You say \"hi\""]));
}

#[test]
fn fail_hook_replaces_the_denial() {
    let mut fx = hooked();
    let alice = fx.alice;
    let hooks = Dbref(3);
    fx.set(hooks, "P_SAY", "0");
    fx.set(hooks, "AF_SAY", "Hush, %n.");

    fx.run(GOD, "@hook/permit/fail say");
    assert_eq!(fx.run(alice, "say hi"), lines(&["Hush, Alice."]));
}

#[test]
fn ignore_hook_falls_through() {
    let mut fx = hooked();
    let alice = fx.alice;
    let hooks = Dbref(3);
    fx.set(hooks, "I_THINK", "0");

    fx.run(GOD, "@hook/ignore think");
    assert_eq!(fx.dispatch(alice, "think hi"), Dispatch::Huh);
    assert_eq!(fx.heard(alice), lines(&[HUH]));
}

#[test]
fn goto_hooks_gate_exit_matching() {
    let mut fx = hooked();
    let alice = fx.alice;
    let hooks = Dbref(3);
    let hall = fx.room("Hall");
    fx.world().create_exit("North;n", LIMBO, hall, GOD);
    fx.set(hooks, "P_GOTO", "[strmatch(%#,#1)]");
    fx.run(GOD, "@hook/permit goto");

    assert_eq!(fx.run(alice, "n"), lines(&["Permission denied."]));
    assert_eq!(fx.world().location(alice), LIMBO);
    assert_eq!(fx.run(alice, "think still here"), lines(&["still here"]));

    fx.set(hooks, "I_GOTO", "0");
    fx.run(GOD, "@hook/clear goto");
    fx.run(GOD, "@hook/ignore goto");
    assert_eq!(fx.dispatch(alice, "n"), Dispatch::Huh);
    assert_eq!(fx.world().location(alice), LIMBO);
}

#[test]
fn before_and_after_hooks_run_around_the_verb() {
    let mut fx = hooked();
    let alice = fx.alice;
    let hooks = Dbref(3);
    fx.set(hooks, "B_THINK", "[setq(0,ignored)]");
    fx.set(hooks, "A_THINK", "[setq(0,ignored)]");

    assert_eq!(fx.run(GOD, "@hook/before/after think"), lines(&["Hooks for think: before after"]));
    assert_eq!(fx.run(alice, "think [setq(0,mine)]%q0"), lines(&["mine"]));
    assert_eq!(fx.run(GOD, "@hook/clear/before think"), lines(&["Hooks for think: after"]));
    assert_eq!(fx.run(GOD, "@hook/clear think"), lines(&["Hooks for think: none"]));
    assert_eq!(fx.run(GOD, "@hook/before nosuchverb"), lines(&["Command not found."]));
}

#[test]
fn igswitch_hook_lets_bad_switches_fall_through() {
    let mut fx = hooked();
    let alice = fx.alice;
    let widget = fx.thing("Widget", alice, LIMBO);
    fx.set(widget, "CMD", "$@pemit/shout *:@pemit %#=SHOUTED %0");

    assert_eq!(
        fx.run(alice, "@pemit/shout hi"),
        lines(&["Unrecognized switch 'shout' for command '@pemit'."])
    );
    fx.run(GOD, "@hook/igswitch @pemit");
    assert_eq!(fx.run(alice, "@pemit/shout hi"), lines(&["SHOUTED hi"]));
}

// ============================================
// Command restrictions
// ============================================

#[test]
fn icmd_disables_and_ignores() {
    let mut fx = Fixture::new();
    let alice = fx.alice;

    assert_eq!(fx.run(GOD, "@icmd/disable alice=say"), lines(&["Command say disabled for Alice."]));
    assert_eq!(fx.run(alice, "say hi"), lines(&["Permission denied."]));

    assert_eq!(fx.run(GOD, "@icmd/ignore alice=think"), lines(&["Command think ignored for Alice."]));
    assert_eq!(fx.run(alice, "think hi"), lines(&[HUH]));

    assert_eq!(fx.run(GOD, "@icmd/check alice"), lines(&["Alice: 1:say 2:think"]));
    assert_eq!(fx.run(GOD, "@icmd/clear alice"), lines(&["Command restrictions cleared for Alice."]));
    assert_eq!(fx.run(GOD, "@icmd alice"), lines(&["No commands restricted for Alice."]));
    assert_eq!(fx.run(alice, "think hi"), lines(&["hi"]));
}

#[test]
fn icmd_on_a_room_covers_its_occupants() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    fx.run(GOD, "@icmd/disable here=home");
    let hall = fx.room("Hall");
    fx.world().set_home(alice, hall);

    assert_eq!(fx.dispatch(alice, "home"), Dispatch::Home);
    assert_eq!(fx.heard(alice), lines(&["Permission denied."]));
    assert_eq!(fx.world().location(alice), LIMBO);
}

#[test]
fn icmd_needs_a_wizard() {
    let mut fx = Fixture::new();
    let alice = fx.alice;
    assert_eq!(fx.run(alice, "@icmd/disable me=say"), lines(&["Permission denied."]));
}
