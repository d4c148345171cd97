//! Tests for configuration files and how the engine applies them

mod common;

use common::*;
use softcode::ConfigError;
use std::fs;
use tempfile::tempdir;

#[test]
fn full_document() {
    let config = Config::from_toml(
        r#"
        [limits]
        function_nesting = 10
        cpu_time_ms = 500

        [parser]
        space_compress = false

        [dispatch]
        master_room = 5
        hook_object = 6
        queueing_allowed = false
        restrict_home = "wizard"

        [[alias]]
        name = "l"
        command = "goto"

        [access]
        "@emit" = "builder"

        [function_access]
        digest = "wizard"
        "#,
    )
    .unwrap();

    assert_eq!(config.limits.function_nesting, 10);
    assert_eq!(config.limits.cpu_time_ms, 500);
    assert!(!config.parser.space_compress);
    assert_eq!(config.dispatch.master_room, Dbref(5));
    assert_eq!(config.dispatch.hook_object, Dbref(6));
    assert!(!config.dispatch.queueing_allowed);
    assert_eq!(config.dispatch.restrict_home, "wizard");
    assert_eq!(config.aliases[0].name, "l");
    assert_eq!(config.access["@emit"], "builder");
    assert_eq!(config.function_access["digest"], "wizard");
}

#[test]
fn unknown_types_are_rejected() {
    let err = Config::from_toml("[limits]\nfunction_nesting = \"deep\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn load_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("softcode.toml");
    fs::write(&path, "[dispatch]\npemit_any = true\n").unwrap();
    let config = Config::load(&path).unwrap();
    assert!(config.dispatch.pemit_any);

    let missing = Config::load(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(missing, ConfigError::Io(_)));
}

#[test]
fn aliases_and_access_reach_the_command_table() {
    let config = Config::from_toml(
        "[[alias]]\nname = \"tk\"\ncommand = \"think\"\n\n[access]\n\"@emit\" = \"wizard\"\n",
    )
    .unwrap();
    let mut fx = Fixture::with_config(config);
    let alice = fx.alice;

    assert_eq!(fx.run(alice, "tk hi"), lines(&["hi"]));
    assert_eq!(fx.run(alice, "@emit hi"), lines(&["Permission denied."]));
}

#[test]
fn bad_directives_are_skipped() {
    let config = Config::from_toml(
        "[[alias]]\nname = \"zz\"\ncommand = \"@nosuchverb\"\n\n[access]\nthink = \"nosuchperm\"\n",
    )
    .unwrap();
    let mut fx = Fixture::with_config(config);
    let alice = fx.alice;

    assert!(fx.engine.commands().lookup("zz").is_none());
    assert_eq!(fx.run(alice, "think still works"), lines(&["still works"]));
}

#[test]
fn restricted_home() {
    let config = Config::from_toml("[dispatch]\nrestrict_home = \"wizard\"\n").unwrap();
    let mut fx = Fixture::with_config(config);
    let alice = fx.alice;
    let hall = fx.room("Hall");
    fx.world().teleport(alice, hall);
    fx.world().teleport(GOD, hall);
    fx.world().clear_notifications();

    assert_eq!(fx.run(alice, "home"), lines(&["Permission denied."]));
    assert_eq!(fx.world().location(alice), hall);
    fx.run(GOD, "home");
    assert_eq!(fx.world().location(GOD), LIMBO);
}

#[test]
fn space_compression_can_be_turned_off() {
    let config = Config::from_toml("[parser]\nspace_compress = false\n").unwrap();
    let mut fx = Fixture::with_config(config);
    let alice = fx.alice;
    assert_eq!(fx.eval(alice, "a   b"), "a   b");
}

#[test]
fn dolist_respects_queueing_switch() {
    let config = Config::from_toml("[dispatch]\nqueueing_allowed = false\n").unwrap();
    let mut fx = Fixture::with_config(config);
    let alice = fx.alice;
    assert_eq!(
        fx.run(alice, "@dolist a b=think ##"),
        lines(&["Sorry, queueing and triggering are not allowed now."])
    );
    assert_eq!(fx.run(GOD, "@dolist a b=think ##"), lines(&["a", "b"]));
}
