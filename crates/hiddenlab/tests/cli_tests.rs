//! CLI integration via the JSON interface.

use test_helpers::{hlab_bin, hlab_fails, hlab_json, hlab_stdout, seed};

use std::path::Path;

fn decisions(dir: &Path, instance: &str) -> serde_json::Value {
    let path = dir.join("dataset").join(instance).join("decision.txt");
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let d = dir.path();
    seed(
        d,
        "shop/home/tap/0",
        &[
            (
                "decision.txt",
                r#"[{"type":"isCorrect","decision":"o"},{"type":"elementType","decision":{"selectedOptions":["border"]}}]"#,
            ),
            ("path.txt", "home > cart"),
            ("before.png", "png"),
        ],
    );
    seed(
        d,
        "shop/home/long_press/0",
        &[
            ("decision.txt", r#"[{"type":"isCorrect","decision":"o"}]"#),
            ("path.txt", "home > cart"),
            ("after.png", "png"),
            ("during.png", "png"),
            ("before_annotated.png", "png"),
            ("before_annotated_with_children.png", "png"),
            ("before.png", "png"),
        ],
    );
    seed(
        d,
        "news/feed/swipe_left/0",
        &[("decision.txt", r#"[{"type":"isCorrect","decision":"o"},{"type":"isHidden","decision":"x"}]"#)],
    );
    dir
}

// ── Browsing ────────────────────────────────────────────────────

#[test]
fn apps_lists_top_level_folders() {
    let dir = fixture();
    let v = hlab_json(dir.path(), &["apps", "--json"], 0);
    assert_eq!(v["folders"], serde_json::json!(["news", "shop"]));
}

#[test]
fn folders_lists_screens_of_an_app() {
    let dir = fixture();
    let v = hlab_json(dir.path(), &["folders", "shop/home", "--json"], 0);
    assert_eq!(v["folders"], serde_json::json!(["long_press", "tap"]));
}

#[test]
fn images_follow_review_order() {
    let dir = fixture();
    let v = hlab_json(dir.path(), &["images", "shop/home/long_press/0", "--json"], 0);
    let names: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "before.png",
            "before_annotated_with_children.png",
            "during.png",
            "after.png"
        ]
    );
}

#[test]
fn paths_are_grouped_by_content_and_screen() {
    let dir = fixture();
    let v = hlab_json(dir.path(), &["paths", "shop", "--json"], 0);
    let groups = v.as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["screen"], "home");
    assert_eq!(groups[0]["filePaths"].as_array().unwrap().len(), 2);
}

#[test]
fn decisions_dumps_raw_files() {
    let dir = fixture();
    let v = hlab_json(dir.path(), &["decisions", "news"], 0);
    let files = v["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["filePath"], "news/feed/swipe_left/0/decision.txt");
}

#[test]
fn show_reports_verdict() {
    let dir = fixture();
    let v = hlab_json(dir.path(), &["show", "shop/home/long_press/0", "--json"], 0);
    assert_eq!(v["gesture"], "long_press");
    assert_eq!(v["validated_hidden"], true);

    let v = hlab_json(dir.path(), &["show", "shop/home/tap/0", "--json"], 0);
    assert_eq!(v["validated_hidden"], false);
}

#[test]
fn show_text_mode() {
    let dir = fixture();
    let out = hlab_stdout(dir.path(), &["show", "news/feed/swipe_left/0"]);
    assert!(out.contains("isHidden:   x"));
    assert!(out.contains("Validated hidden: no"));
}

#[test]
fn unknown_instance_fails() {
    let dir = fixture();
    let err = hlab_fails(dir.path(), &["show", "shop/home/tap/9"]);
    assert!(err.contains("no such instance"));
}

#[test]
fn short_instance_path_fails() {
    let dir = fixture();
    hlab_fails(dir.path(), &["show", "shop/home"]);
}

#[test]
fn unknown_gesture_directory_classifies_as_tap() {
    let dir = fixture();
    let d = dir.path();
    seed(
        d,
        "news/feed/swipe_up/0",
        &[(
            "decision.txt",
            r#"[{"type":"isCorrect","decision":"o"},{"type":"isHidden","decision":"o"}]"#,
        )],
    );
    let v = hlab_json(d, &["show", "news/feed/swipe_up/0", "--json"], 0);
    assert_eq!(v["gesture"], "tap");
    assert_eq!(v["validated_hidden"], false);

    // The tap rule applies: one signal-free element makes it qualify.
    hlab_stdout(d, &["tag", "news/feed/swipe_up/0", "--option", "emptySpace"]);
    let v = hlab_json(d, &["show", "news/feed/swipe_up/0", "--json"], 0);
    assert_eq!(v["validated_hidden"], true);
    let v = hlab_json(d, &["count", "news/feed/swipe_up", "--json"], 0);
    assert_eq!(v["count"], 1);
}

// ── Editing ─────────────────────────────────────────────────────

#[test]
fn mark_toggles_and_clears() {
    let dir = fixture();
    let d = dir.path();
    hlab_stdout(d, &["mark", "news/feed/swipe_left/0", "--kind", "hidden", "--value", "o"]);
    assert_eq!(
        decisions(d, "news/feed/swipe_left/0"),
        serde_json::json!([
            {"type": "isCorrect", "decision": "o"},
            {"type": "isHidden", "decision": "o"}
        ])
    );
    let v = hlab_json(d, &["count", "news", "--json"], 0);
    assert_eq!(v["count"], 1);

    // Pressing the same answer again clears it.
    hlab_stdout(d, &["mark", "news/feed/swipe_left/0", "--kind", "hidden", "--value", "o"]);
    let v = decisions(d, "news/feed/swipe_left/0");
    assert_eq!(v[1]["decision"], "none");
}

#[test]
fn mark_set_is_idempotent() {
    let dir = fixture();
    let d = dir.path();
    for _ in 0..2 {
        hlab_stdout(
            d,
            &["mark", "shop/home/tap/0", "--kind", "correct", "--value", "o", "--set"],
        );
    }
    assert_eq!(decisions(d, "shop/home/tap/0")[1]["decision"], "o");
}

#[test]
fn mark_rejects_unknown_values() {
    let dir = fixture();
    let d = dir.path();
    hlab_fails(d, &["mark", "shop/home/tap/0", "--kind", "elementType", "--value", "o"]);
    hlab_fails(d, &["mark", "shop/home/tap/0", "--kind", "correct", "--value", "yes"]);
}

#[test]
fn mark_creates_decision_file() {
    let dir = fixture();
    let d = dir.path();
    seed(d, "maps/main/scroll_up/0", &[("before.png", "png")]);
    hlab_stdout(d, &["mark", "maps/main/scroll_up/0", "--kind", "correct", "--value", "x"]);
    assert_eq!(
        decisions(d, "maps/main/scroll_up/0"),
        serde_json::json!([{"type": "isCorrect", "decision": "x"}])
    );
}

#[test]
fn tag_switches_tap_to_validated() {
    let dir = fixture();
    let d = dir.path();
    hlab_stdout(
        d,
        &["tag", "shop/home/tap/0", "--option", "border", "--option", "emptySpace"],
    );
    let v = decisions(d, "shop/home/tap/0");
    assert_eq!(v[1]["decision"]["selectedOptions"], serde_json::json!(["emptySpace"]));

    let v = hlab_json(d, &["show", "shop/home/tap/0", "--json"], 0);
    assert_eq!(v["validated_hidden"], true);
}

#[test]
fn tag_removes_empty_selection() {
    let dir = fixture();
    let d = dir.path();
    hlab_stdout(d, &["tag", "shop/home/tap/0", "--option", "border"]);
    assert_eq!(
        decisions(d, "shop/home/tap/0"),
        serde_json::json!([{"type": "isCorrect", "decision": "o"}])
    );
}

#[test]
fn tag_requires_an_edit() {
    let dir = fixture();
    hlab_fails(dir.path(), &["tag", "shop/home/tap/0"]);
}

#[test]
fn frame_toggles_on_long_press() {
    let dir = fixture();
    let d = dir.path();
    hlab_stdout(d, &["frame", "shop/home/long_press/0", "during"]);
    hlab_stdout(d, &["frame", "shop/home/long_press/0", "after"]);
    hlab_stdout(d, &["frame", "shop/home/long_press/0", "during"]);
    let v = decisions(d, "shop/home/long_press/0");
    assert_eq!(v[1], serde_json::json!({"type": "D/A", "decision": ["after"]}));

    // Frames never affect the verdict.
    let v = hlab_json(d, &["show", "shop/home/long_press/0", "--json"], 0);
    assert_eq!(v["validated_hidden"], true);
}

#[test]
fn frame_rejected_for_other_gestures() {
    let dir = fixture();
    let d = dir.path();
    hlab_fails(d, &["frame", "shop/home/tap/0", "during"]);
    hlab_fails(d, &["frame", "shop/home/long_press/0", "before"]);
}

// ── Results ─────────────────────────────────────────────────────

#[test]
fn count_over_whole_dataset() {
    let dir = fixture();
    let v = hlab_json(dir.path(), &["count", "--json"], 0);
    assert_eq!(v["count"], 1);
    assert_eq!(v["rule"], "validated-hidden");
    assert_eq!(hlab_stdout(dir.path(), &["count"]).trim(), "1");
}

#[test]
fn count_with_strict_rule() {
    let dir = fixture();
    let v = hlab_json(dir.path(), &["count", "--rule", "all-marked-yes", "--json"], 0);
    assert_eq!(v["count"], 1);
    hlab_fails(dir.path(), &["count", "--rule", "nope"]);
}

#[test]
fn results_group_by_app() {
    let dir = fixture();
    let v = hlab_json(dir.path(), &["results", "--json"], 0);
    assert_eq!(v["total"], 1);
    assert_eq!(v["by_app"]["shop"], serde_json::json!(["shop/home/long_press/0"]));
    assert_eq!(v["by_app"]["news"], serde_json::json!([]));

    let v = hlab_json(dir.path(), &["results", "--app", "news", "--json"], 0);
    assert_eq!(v["total"], 0);
}

#[test]
fn results_rejects_path_with_app() {
    let dir = fixture();
    hlab_fails(dir.path(), &["results", "shop", "--app", "news"]);
    let v = hlab_json(dir.path(), &["results", "shop", "--json"], 0);
    assert_eq!(v["scope"], "shop");
    assert_eq!(v["total"], 1);
}

#[test]
fn export_writes_archive() {
    let dir = fixture();
    let d = dir.path();
    let v = hlab_json(d, &["export", "--out", "out/filtered.tar", "--json"], 0);
    assert_eq!(v["count"], 1);
    assert_eq!(v["instances"], serde_json::json!(["shop/home/long_press/0"]));

    let file = std::fs::File::open(d.join("out/filtered.tar")).unwrap();
    let mut archive = tar::Archive::new(file);
    let names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
        .collect();
    assert!(names.iter().any(|n| n == "manifest.json"));
    assert!(names.iter().any(|n| n == "shop/home/long_press/0/during.png"));
    assert!(!names.iter().any(|n| n.starts_with("news")));
}

// ── Config ──────────────────────────────────────────────────────

#[test]
fn root_flag_overrides_default() {
    let dir = fixture();
    let elsewhere = tempfile::tempdir().unwrap();
    let root = dir.path().join("dataset");
    let v = hlab_json(
        elsewhere.path(),
        &["apps", "--json", "--root", root.to_str().unwrap()],
        0,
    );
    assert_eq!(v["folders"], serde_json::json!(["news", "shop"]));
}

#[test]
fn env_root_is_used_without_flag() {
    let dir = fixture();
    let elsewhere = tempfile::tempdir().unwrap();
    let out = hlab_bin(elsewhere.path())
        .env("HIDDENLAB_DATASET_ROOT", dir.path().join("dataset"))
        .args(["count"])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "1");
}

#[test]
fn init_writes_config_once() {
    let dir = fixture();
    let d = dir.path();
    hlab_stdout(d, &["init"]);
    let config: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(d.join(".hiddenlab/config.json")).unwrap())
            .unwrap();
    assert_eq!(config["decision_file"], "decision.txt");
    assert_eq!(config["dataset_root"], "dataset");

    let err = hlab_fails(d, &["init"]);
    assert!(err.contains("already exists"));
}

#[test]
fn workspace_config_changes_decision_file() {
    let dir = fixture();
    let d = dir.path();
    std::fs::create_dir_all(d.join(".hiddenlab")).unwrap();
    std::fs::write(
        d.join(".hiddenlab/config.json"),
        r#"{"decision_file": "review.json"}"#,
    )
    .unwrap();
    // No instance has a review.json yet, so nothing qualifies.
    let v = hlab_json(d, &["count", "--json"], 0);
    assert_eq!(v["count"], 0);
}
