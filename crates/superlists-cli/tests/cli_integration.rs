use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn superlists() -> Command {
    Command::cargo_bin("superlists").unwrap()
}

fn parse_json_output(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("Failed to parse JSON output")
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

/// A page with one plain list, one limited list and three Delta sub-lists,
/// plus an empty settings file so user config never leaks in.
fn delta_page(dir: &TempDir) -> (PathBuf, PathBuf) {
    let page = write_json(
        dir.path(),
        "page.json",
        &json!({
            "boardId": "b1",
            "name": "Team board",
            "lists": [
                { "name": "Alpha", "cards": [{ "title": "Write docs" }] },
                { "name": "Delta.Sub1 [4]", "cards": [{ "title": "One" }, { "title": "Two" }] },
                { "name": "Delta.Sub2", "cards": [{ "title": "Three" }] },
                { "name": "Delta.Sub3", "cards": [{ "title": "Four" }, { "title": "Five" }] }
            ]
        }),
    );
    let settings = dir.path().join("settings.toml");
    fs::write(&settings, "").unwrap();
    (page, settings)
}

fn simulate(page: &Path, settings: &Path, extra: &[&str]) -> Value {
    let output = superlists()
        .arg("simulate")
        .arg("--page")
        .arg(page)
        .arg("--settings")
        .arg(settings)
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    parse_json_output(&output)
}

mod simulate_tests {
    use super::*;

    #[test]
    fn test_simulate_reports_groups_and_badges() {
        let dir = tempdir().unwrap();
        let (page, settings) = delta_page(&dir);

        let json = simulate(&page, &settings, &[]);
        assert!(json["success"].as_bool().unwrap());
        let snapshot = &json["data"]["snapshot"];
        assert_eq!(snapshot["boardId"], "b1");

        let groups = snapshot["groups"].as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["prefix"], "Delta");
        assert_eq!(groups[0]["badge"], "5 / 4");
        assert_eq!(groups[0]["status"], "exceeded");
        assert_eq!(json["data"]["replies"], json!([]));
    }

    #[test]
    fn test_simulate_script_edits_and_commands() {
        let dir = tempdir().unwrap();
        let (page, settings) = delta_page(&dir);
        let script = write_json(
            dir.path(),
            "script.json",
            &json!([
                { "edit": { "op": "rename_list", "name": "Delta.Sub2", "to": "Zulu" } },
                { "command": "id" },
                { "command": "bogus" }
            ]),
        );

        let json = simulate(&page, &settings, &["--script", script.to_str().unwrap()]);
        let data = &json["data"];
        assert_eq!(data["snapshot"]["groups"], json!([]));
        assert_eq!(data["replies"][0], json!({ "reply": "id", "boardId": "b1" }));
        assert_eq!(data["replies"][1]["reply"], "ignored");
        assert!(data["events"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_simulate_rejects_missing_page() {
        let dir = tempdir().unwrap();
        superlists()
            .args(["simulate", "--page"])
            .arg(dir.path().join("nope.json"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read file"));
    }

    #[test]
    fn test_simulate_rejects_unknown_click_target() {
        let dir = tempdir().unwrap();
        let (page, settings) = delta_page(&dir);
        let script = write_json(
            dir.path(),
            "script.json",
            &json!([{ "click": { "target": "group_header", "prefix": "Omega" } }]),
        );

        superlists()
            .arg("simulate")
            .arg("--page")
            .arg(&page)
            .arg("--settings")
            .arg(&settings)
            .arg("--script")
            .arg(&script)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Nothing to click"));
    }
}

mod store_tests {
    use super::*;

    #[test]
    fn test_collapse_is_stored_then_cleared() {
        let dir = tempdir().unwrap();
        let (page, settings) = delta_page(&dir);
        let store = dir.path().join("store.json");
        let script = write_json(
            dir.path(),
            "script.json",
            &json!([{ "click": { "target": "list_toggle", "list": "Alpha" } }]),
        );

        let json = simulate(
            &page,
            &settings,
            &[
                "--script",
                script.to_str().unwrap(),
                "--store",
                store.to_str().unwrap(),
            ],
        );
        let alpha = json["data"]["snapshot"]["lists"]
            .as_array()
            .unwrap()
            .iter()
            .find(|list| list["name"] == "Alpha")
            .unwrap()
            .clone();
        assert_eq!(alpha["collapsed"], true);

        let output = superlists()
            .args(["view-state", "--board", "b1", "--store"])
            .arg(&store)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let json = parse_json_output(&output);
        assert_eq!(json["data"]["viewState"]["Alpha"], json!({ "collapsed": true }));

        let output = superlists()
            .args(["clear", "--board", "b1", "--store"])
            .arg(&store)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_eq!(parse_json_output(&output)["data"]["removed"], true);

        let output = superlists()
            .args(["view-state", "--board", "b1", "--store"])
            .arg(&store)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert!(parse_json_output(&output)["data"]["viewState"].is_null());
    }

    #[test]
    fn test_clear_unknown_board() {
        let dir = tempdir().unwrap();
        let output = superlists()
            .args(["clear", "--board", "b9", "--store"])
            .arg(dir.path().join("store.json"))
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_eq!(parse_json_output(&output)["data"]["removed"], false);
    }
}

#[test]
fn test_completions() {
    superlists()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("superlists"));
}
