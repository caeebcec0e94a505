use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("quicktask-{nanos}-{file_name}"))
}

fn run(store_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_quicktask"))
        .args(args)
        .env("QUICKTASK_STORE_DIR", store_dir)
        .env("QUICKTASK_CONFIG_PATH", store_dir.join("config.json"))
        .env("QUICKTASK_DISABLE_NOTIFICATIONS", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run quicktask")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn add_persists_to_the_pending_list() {
    let dir = temp_path("cli-add");

    let output = run(&dir, &["add", "buy", "milk", "by", "31", "dec", "2099", "#home", "!"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "Added task: buy milk");

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("pending.json")).unwrap())
            .unwrap();
    let deadline_file_exists = dir.join("deadline.json").exists();
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(stored["schema_version"], 1);
    assert_eq!(stored["category"], "pending");
    let task = &stored["tasks"][0]["task"];
    assert_eq!(task["name"], "buy milk");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["tags"][0], "home");
    assert_eq!(task["schedule"]["kind"], "deadline");
    assert!(deadline_file_exists);
}

#[test]
fn expired_additions_are_flagged() {
    let dir = temp_path("cli-expired");

    let output = run(&dir, &["add", "relic", "on", "1", "jan", "2000"]);
    let listed = run(&dir, &["view", "expired"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    assert!(stdout(&output).contains("Added task: relic (already expired)"));
    assert!(stdout(&listed).contains("relic"));
    assert!(stdout(&listed).contains("(expired)"));
}

#[test]
fn tasks_survive_between_runs() {
    let dir = temp_path("cli-restart");

    run(&dir, &["add", "water", "plants", "#home"]);
    run(&dir, &["add", "pay", "rent", "!!"]);
    let done = run(&dir, &["done", "water", "plants"]);
    let pending = run(&dir, &["view", "all"]);
    let archive = run(&dir, &["view", "archive"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(stdout(&done).contains("Completed task: water plants"));
    assert!(stdout(&pending).starts_with("[pending]"));
    assert!(stdout(&pending).contains("pay rent"));
    assert!(!stdout(&pending).contains("water plants"));
    assert!(stdout(&archive).contains("water plants"));
}

#[test]
fn json_output_lists_the_view() {
    let dir = temp_path("cli-json");

    run(&dir, &["add", "one"]);
    run(&dir, &["add", "two", "#x"]);
    let output = run(&dir, &["--json", "view", "all"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(value["status"], "viewed");
    assert_eq!(value["view"], "pending");
    assert_eq!(value["tasks"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["tasks"][1]["name"], "two");
    assert_eq!(value["tasks"][1]["index"], 2);
    assert_eq!(value["tags"][0]["tag"], "x");
    assert_eq!(value["tags"][0]["count"], 1);
}

#[test]
fn errors_exit_with_failure() {
    let dir = temp_path("cli-errors");

    let unknown = run(&dir, &["fly", "away"]);
    run(&dir, &["add", "same"]);
    let duplicate = run(&dir, &["add", "same"]);
    let bad_index = run(&dir, &["del", "9"]);
    let bad_date = run(&dir, &["add", "party", "on", "the", "moon"]);
    std::fs::remove_dir_all(&dir).ok();

    assert!(!unknown.status.success());
    assert!(stderr(&unknown).contains("ERROR: no_such_command"));
    assert!(stderr(&duplicate).contains("ERROR: duplicate_name"));
    assert!(stderr(&bad_index).contains("ERROR: invalid_index"));
    assert!(stderr(&bad_date).contains("ERROR: bad_date_format"));
}

#[test]
fn delete_by_tag_and_search() {
    let dir = temp_path("cli-tags");

    run(&dir, &["add", "sweep", "#home"]);
    run(&dir, &["add", "mop", "#home"]);
    run(&dir, &["add", "of", "mice", "and", "men"]);
    let deleted = run(&dir, &["del", "#home"]);
    let found = run(&dir, &["search", "of"]);
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(stdout(&deleted).trim(), "Deleted 2 task(s)");
    assert!(stdout(&found).starts_with("[search: of]"));
    assert!(stdout(&found).contains("of mice and men"));
}
