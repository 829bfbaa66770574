//! E2E Scenario: Bundle then install into another workspace
//!
//! - create a bundle in one workspace
//! - survey and plan the install elsewhere
//! - approval gate for an existing skill
//! - execute with backup and config templates

use tempfile::TempDir;

use super::fixture::E2EFixture;

fn make_bundle(source: &E2EFixture) -> String {
    source.create_skill("meeting-notes", "---\nname: meeting-notes\n---\n# Notes\n");
    source.write_file("Skills/meeting-notes/config/settings.yaml.example", "folder: Records\n");
    let out = source.temp_dir.path().join("bundles");
    let (ok, created) = source.run_json(&[
        "bundle",
        "create",
        "meeting-notes",
        "--version",
        "2.0.0",
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(ok, "bundle create failed: {created}");
    created["path"].as_str().unwrap().to_string()
}

#[test]
fn test_bundle_install_into_fresh_workspace() {
    let relay = TempDir::new().unwrap();
    let source = E2EFixture::new("install_source", "alice", relay.path());
    let mut target = E2EFixture::new("install_target", "bob", relay.path());
    let bundle = make_bundle(&source);

    target.log_step("Survey");
    let (ok, survey) = target.run_json(&["install", &bundle, "--survey"]);
    assert!(ok);
    assert_eq!(survey["conflicts"], serde_json::json!([]));

    target.log_step("Plan");
    let (ok, plan) = target.run_json(&["install", &bundle, "--plan"]);
    assert!(ok);
    assert_eq!(plan["plan"]["steps"][0]["action"], "install");
    assert_eq!(plan["plan"]["steps"][1]["action"], "create_config");

    target.log_step("Execute");
    let (ok, installed) = target.run_json(&["install", &bundle]);
    assert!(ok, "install failed: {installed}");
    assert_eq!(
        target.read_file("Skills/meeting-notes/config/settings.yaml"),
        "folder: Records\n"
    );
    assert!(target.root.join("Skills/meeting-notes/.installation_record.json").exists());
    assert!(!target.root.join("Skills/meeting-notes/metadata.json").exists());
}

#[test]
fn test_existing_skill_requires_approval() {
    let relay = TempDir::new().unwrap();
    let source = E2EFixture::new("approval_source", "alice", relay.path());
    let target = E2EFixture::new("approval_target", "bob", relay.path());
    let bundle = make_bundle(&source);
    target.create_skill("meeting-notes", "local copy");

    let (ok, refused) = target.run_json(&["install", &bundle]);
    assert!(!ok);
    assert_eq!(refused["error"], true);
    assert_eq!(refused["code"], "APPROVAL_REQUIRED");
    assert_eq!(target.read_file("Skills/meeting-notes/SKILL.md"), "local copy");

    let (ok, preview) = target.run_json(&["install", &bundle, "--dry-run"]);
    assert!(ok);
    assert_eq!(preview["result"]["dry_run"], true);
    assert_eq!(target.read_file("Skills/meeting-notes/SKILL.md"), "local copy");

    let (ok, installed) = target.run_json(&["install", &bundle, "--yes"]);
    assert!(ok, "approved install failed: {installed}");
    assert_eq!(installed["plan"]["steps"][0]["action"], "backup");
    let backup = installed["plan"]["steps"][0]["dest"].as_str().unwrap();
    assert_eq!(
        std::fs::read_to_string(std::path::Path::new(backup).join("SKILL.md")).unwrap(),
        "local copy"
    );
    assert!(target.read_file("Skills/meeting-notes/SKILL.md").contains("# Notes"));
}

#[test]
fn test_tampered_bundle_is_rejected() {
    let relay = TempDir::new().unwrap();
    let target = E2EFixture::new("tampered", "bob", relay.path());
    let bogus = target.temp_dir.path().join("meeting-notes.tar.gz");
    std::fs::write(&bogus, b"not a gzip stream").unwrap();

    let output = target.run(&["install", bogus.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(!target.root.join("Skills/meeting-notes").exists());
}
