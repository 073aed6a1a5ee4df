//! Integration tests for the `fabel` CLI commands.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fabel(data: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fabel").unwrap();
    cmd.arg("--data-dir").arg(data.path());
    cmd
}

fn execute(words: &[&str]) -> String {
    let quoted: Vec<String> = words.iter().map(|w| format!("\"{w}\"")).collect();
    format!("{{\"type\":\"execute\",\"command\":[{}]}}\n", quoted.join(","))
}

fn script(commands: &[&[&str]]) -> String {
    commands.iter().map(|words| execute(words)).collect()
}

// ---------------------------------------------------------------------------
// json mode
// ---------------------------------------------------------------------------

#[test]
fn json_start_describes_the_first_room() {
    let data = TempDir::new().unwrap();
    fabel(&data)
        .arg("--json")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"type":"status","title":"Cave""#))
        .stdout(predicate::str::contains(r#""kind":"applySettings""#));
}

#[test]
fn json_commands_reach_the_engine() {
    let data = TempDir::new().unwrap();
    fabel(&data)
        .arg("--json")
        .write_stdin(script(&[&["north"], &["take", "rope"]]))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title":"Tunnel""#))
        .stdout(predicate::str::contains("Taken"));
}

#[test]
fn json_word_requests_include_features() {
    let data = TempDir::new().unwrap();
    fabel(&data)
        .arg("--json")
        .write_stdin("{\"type\":\"getWords\",\"command\":[]}\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""bookmarks""#))
        .stdout(predicate::str::contains(r#""restart""#));
}

#[test]
fn json_protocol_error_exits_nonzero() {
    let data = TempDir::new().unwrap();
    fabel(&data)
        .arg("--json")
        .write_stdin("{\"type\":\"dance\"}\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: protocol error"));
}

#[test]
fn pause_is_released_at_end_of_input() {
    let data = TempDir::new().unwrap();
    fabel(&data)
        .arg("--json")
        .write_stdin(execute(&["wait"]))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind":"pause""#))
        .stdout(predicate::str::contains("Time passes."));
}

// ---------------------------------------------------------------------------
// persistence
// ---------------------------------------------------------------------------

#[test]
fn progress_resumes_from_autosave() {
    let data = TempDir::new().unwrap();
    fabel(&data)
        .arg("--json")
        .write_stdin(execute(&["north"]))
        .assert()
        .success();

    fabel(&data)
        .arg("--json")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title":"Tunnel""#));
}

#[test]
fn no_autosave_starts_over() {
    let data = TempDir::new().unwrap();
    fabel(&data)
        .args(["--json", "--no-autosave"])
        .write_stdin(execute(&["north"]))
        .assert()
        .success();

    let store = data.path().join("store.json");
    assert!(!store.exists() || !fs::read_to_string(&store).unwrap().contains("autosave"));

    fabel(&data)
        .args(["--json", "--no-autosave"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title":"Cave""#));
}

#[test]
fn bookmarks_survive_between_runs() {
    let data = TempDir::new().unwrap();
    fabel(&data)
        .arg("--json")
        .write_stdin(script(&[&["bookmarks"], &["new"]]))
        .assert()
        .success()
        .stdout(predicate::str::contains("Bookmark saved: Cave - "));

    fabel(&data)
        .arg("--json")
        .write_stdin(execute(&["bookmarks"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Cave - "));
}

#[test]
fn exported_bookmark_can_be_imported_elsewhere() {
    let first = TempDir::new().unwrap();
    fabel(&first)
        .arg("--json")
        .write_stdin(script(&[
            &["north"],
            &["bookmarks"],
            &["new"],
            &["bookmarks"],
            &["select", "1"],
            &["export"],
        ]))
        .assert()
        .success()
        .stdout(predicate::str::contains("Bookmark exported"));

    let exported: Vec<_> = fs::read_dir(first.path().join("exports"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(exported.len(), 1);

    let second = TempDir::new().unwrap();
    fs::create_dir_all(second.path().join("imports")).unwrap();
    fs::copy(&exported[0], second.path().join("imports/tunnel.json")).unwrap();

    fabel(&second)
        .arg("--json")
        .write_stdin(script(&[&["bookmarks"], &["import"]]))
        .assert()
        .success()
        .stdout(predicate::str::contains("Bookmark imported: Tunnel - "));
}

#[test]
fn bookmarks_are_kept_per_game() {
    let data = TempDir::new().unwrap();
    fabel(&data)
        .args(["--json", "--game-id", "one"])
        .write_stdin(script(&[&["bookmarks"], &["new"]]))
        .assert()
        .success();

    fabel(&data)
        .args(["--json", "--game-id", "two"])
        .write_stdin(execute(&["bookmarks"]))
        .assert()
        .success()
        .stdout(predicate::str::contains("You have no bookmarks."));
}

// ---------------------------------------------------------------------------
// text mode
// ---------------------------------------------------------------------------

#[test]
fn text_mode_plays_until_quit() {
    let data = TempDir::new().unwrap();
    fabel(&data)
        .env("NO_COLOR", "1")
        .write_stdin("look\nquit\ntake lamp\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Playing The Cave"))
        .stdout(predicate::str::contains("A damp cave."))
        .stdout(predicate::str::contains("Taken").not());
}

#[test]
fn text_mode_suggests_words() {
    let data = TempDir::new().unwrap();
    fabel(&data)
        .env("NO_COLOR", "1")
        .write_stdin("restart?\n?\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("bookmarks"));
}

#[test]
fn custom_world_file() {
    let data = TempDir::new().unwrap();
    let world = data.path().join("world.json");
    fs::write(
        &world,
        r#"{
  "title": "Tiny",
  "start": "hall",
  "rooms": {
    "hall": { "name": "Hall", "description": "A bare hall." }
  }
}"#,
    )
    .unwrap();

    fabel(&data)
        .arg("--json")
        .arg("--world")
        .arg(&world)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title":"Hall""#));
}

#[test]
fn broken_world_file_is_an_error() {
    let data = TempDir::new().unwrap();
    let world = data.path().join("world.json");
    fs::write(&world, r#"{"title": "Broken", "start": "nowhere", "rooms": {}}"#).unwrap();

    fabel(&data)
        .arg("--world")
        .arg(&world)
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: invalid world"));
}
