//! E2E Scenario: Sync Workflow
//!
//! Two workspaces exchange skills through a bare git repository on disk:
//! - push from one side, pull on the other
//! - update with backup of the replaced copy
//! - no-change push, dry runs and unmatched filters
//!
//! The relay is a local bare repository, so no network is involved.

use std::fs;

use tempfile::TempDir;
use zo_substrate::test_utils::seed_bare_relay;

use super::fixture::E2EFixture;

struct Pair {
    _relay_dir: TempDir,
    alice: E2EFixture,
    bob: E2EFixture,
}

fn pair(scenario: &str) -> Pair {
    let relay_dir = TempDir::new().expect("relay dir");
    let relay = relay_dir.path().join("relay.git");
    seed_bare_relay(&relay, &[("README.md", "# relay\n"), ("Skills/.gitkeep", "")]);
    Pair {
        alice: E2EFixture::new(&format!("{scenario}_alice"), "alice", &relay),
        bob: E2EFixture::new(&format!("{scenario}_bob"), "bob", &relay),
        _relay_dir: relay_dir,
    }
}

#[test]
fn test_push_then_pull_roundtrip() {
    let Pair { _relay_dir: _relay, mut alice, mut bob } = pair("roundtrip");

    alice.log_step("Create skills");
    alice.create_skill("daily-brief", "---\nname: daily-brief\n---\n# Brief\n");
    alice.write_file("Skills/daily-brief/scripts/run.py", "print('brief')\n");
    alice.write_file("Skills/daily-brief/__pycache__/run.cpython-312.pyc", "junk");
    alice.create_skill("inbox-zero", "---\nname: inbox-zero\n---\n");

    alice.log_step("Push");
    let (ok, push) = alice.run_json(&["push"]);
    assert!(ok, "push failed: {push}");
    assert_eq!(push["success"], true);
    assert_eq!(push["copied"], serde_json::json!(["daily-brief", "inbox-zero"]));
    assert!(push["commit"].is_string());

    let last_push: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(alice.state_dir().join("last_push.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(last_push["pushed_skills"][0], "daily-brief");
    assert!(alice.state_dir().join("substrate.log").exists());

    bob.log_step("Dry-run pull");
    let (ok, preview) = bob.run_json(&["pull", "--dry-run"]);
    assert!(ok);
    assert_eq!(preview["planned"][0]["action"], "new");
    assert!(!bob.root.join("Skills/daily-brief").exists());

    bob.log_step("Pull");
    let (ok, pull) = bob.run_json(&["pull"]);
    assert!(ok, "pull failed: {pull}");
    assert_eq!(pull["installed"], serde_json::json!(["daily-brief", "inbox-zero"]));
    assert_eq!(pull["manifest"]["source"], "alice");
    assert_eq!(bob.read_file("Skills/daily-brief/scripts/run.py"), "print('brief')\n");
    assert!(!bob.root.join("Skills/daily-brief/__pycache__").exists());

    let last_pull: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(bob.state_dir().join("last_pull.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(last_pull["source"], "alice");

    bob.log_step("Status reflects the pull");
    let (ok, status) = bob.run_json(&["status"]);
    assert!(ok);
    assert_eq!(status["last_pull"]["pulled_skills"][1], "inbox-zero");
}

#[test]
fn test_update_backs_up_local_copy() {
    let Pair { _relay_dir: _relay, alice, bob } = pair("update_backup");

    alice.create_skill("daily-brief", "v1");
    assert!(alice.run(&["-q", "push"]).status.success());
    assert!(bob.run(&["-q", "pull"]).status.success());

    bob.write_file("Skills/daily-brief/SKILL.md", "bob's edit");
    alice.write_file("Skills/daily-brief/SKILL.md", "v2");
    assert!(alice.run(&["-q", "push"]).status.success());

    let (ok, preview) = bob.run_json(&["pull", "--dry-run"]);
    assert!(ok);
    assert_eq!(preview["planned"][0]["action"], "update");

    let (ok, pull) = bob.run_json(&["pull"]);
    assert!(ok, "pull failed: {pull}");
    assert_eq!(bob.read_file("Skills/daily-brief/SKILL.md"), "v2");

    let backup = pull["backups"][0]["path"].as_str().unwrap();
    assert!(backup.contains(".backups"));
    assert_eq!(
        fs::read_to_string(std::path::Path::new(backup).join("SKILL.md")).unwrap(),
        "bob's edit"
    );
}

#[test]
fn test_second_push_without_changes_makes_no_commit() {
    let Pair { _relay_dir: _relay, alice, .. } = pair("no_change");

    alice.create_skill("daily-brief", "v1");
    let (ok, first) = alice.run_json(&["push"]);
    assert!(ok);
    assert!(first["commit"].is_string());

    let (ok, second) = alice.run_json(&["push"]);
    assert!(ok, "second push failed: {second}");
    assert_eq!(second["success"], true);
    assert_eq!(second["copied"], serde_json::json!([]));
    assert_eq!(second["unchanged"], serde_json::json!(["daily-brief"]));
    assert!(second.get("commit").is_none());
}

#[test]
fn test_push_dry_run_lists_without_cloning() {
    let Pair { _relay_dir: _relay, alice, .. } = pair("push_dry_run");

    alice.create_skill("daily-brief", "v1");
    let output = alice.run(&["push", "--dry-run"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[DRY RUN] Would push:"));
    assert!(stdout.contains("daily-brief"));
    assert!(!alice.state_dir().join("last_push.json").exists());
}

#[test]
fn test_unmatched_filter_fails_with_available_list() {
    let Pair { _relay_dir: _relay, alice, bob } = pair("no_match");

    alice.create_skill("daily-brief", "v1");
    let (ok, push) = alice.run_json(&["push", "--skills", "ghost"]);
    assert!(!ok);
    assert_eq!(push["error"], "no_match");
    assert_eq!(push["available"], serde_json::json!(["daily-brief"]));

    assert!(alice.run(&["-q", "push"]).status.success());
    let (ok, pull) = bob.run_json(&["pull", "--skills", "ghost,phantom"]);
    assert!(!ok);
    assert_eq!(pull["error"], "no_match");
    assert_eq!(pull["available"], serde_json::json!(["daily-brief"]));
}

#[test]
fn test_unreachable_relay_reports_clone_failure() {
    let alice = E2EFixture::new(
        "clone_failed",
        "alice",
        &std::env::temp_dir().join("zo-substrate-missing-relay.git"),
    );
    alice.create_skill("daily-brief", "v1");

    let (ok, push) = alice.run_json(&["push"]);
    assert!(!ok);
    assert_eq!(push["error"], "clone_failed");
    assert!(!alice.state_dir().join("last_push.json").exists());
}
