//! Tests for the softcode command-line front end

mod common;

use assert_cmd::Command;
use common::*;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn softcode() -> Command {
    let mut cmd = Command::cargo_bin("softcode").unwrap();
    cmd.env_remove("SOFTCODE_CONFIG").env("RUST_LOG", "warn");
    cmd
}

#[test]
fn runs_one_command() {
    softcode()
        .args(["-c", "think add(1,2)"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn version_and_help() {
    softcode()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("softcode "));
    softcode()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("USAGE:"));
}

#[test]
fn bad_arguments() {
    softcode()
        .arg("--bogus")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown argument: --bogus"));
    softcode()
        .arg("-c")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("-c needs a value"));
}

#[test]
fn loads_a_world_and_acts_as_a_player() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("world.json");
    let mut world = MemoryWorld::new();
    let alice = world.create_player("Alice", LIMBO);
    world.set_attr(alice, "MOTTO", "carpe diem");
    fs::write(&path, world.to_json().unwrap()).unwrap();

    softcode()
        .arg("--world")
        .arg(&path)
        .args(["--player", "#2", "-c", "think [name(me)]: [get(me/MOTTO)]"])
        .assert()
        .success()
        .stdout("Alice: carpe diem\n");
}

#[test]
fn unknown_player_fails() {
    softcode()
        .args(["--player", "#99", "-c", "think hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such object: #99"));
}

#[test]
fn saves_the_world() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("saved.json");
    softcode()
        .args(["-c", "&NOTE me=remember this"])
        .arg("--save")
        .arg(&path)
        .assert()
        .success()
        .stdout("Set.\n");

    let world = MemoryWorld::load(&path).unwrap();
    assert_eq!(world.attr(GOD, "NOTE").as_deref(), Some("remember this"));
}

#[test]
fn reads_configuration() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("softcode.toml");
    fs::write(&path, "[[alias]]\nname = \"tk\"\ncommand = \"think\"\n").unwrap();

    softcode()
        .arg("--config")
        .arg(&path)
        .args(["-c", "tk mul(6,7)"])
        .assert()
        .success()
        .stdout("42\n");

    softcode()
        .env("SOFTCODE_CONFIG", &path)
        .args(["-c", "tk ok"])
        .assert()
        .success()
        .stdout("ok\n");
}

#[test]
fn bad_configuration_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[limits\n").unwrap();

    softcode()
        .arg("--config")
        .arg(&path)
        .args(["-c", "think hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TOML parse error"));
}
