use std::process::Command;

#[test]
fn cli_smoke_help() {
    let exe = env!("CARGO_BIN_EXE_quicktask");
    let output = Command::new(exe)
        .arg("--help")
        .output()
        .expect("failed to run quicktask --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
}

#[test]
fn cli_smoke_bad_override_is_an_error() {
    let exe = env!("CARGO_BIN_EXE_quicktask");
    let output = Command::new(exe)
        .args(["--config-override", "colour=blue", "view", "all"])
        .env("QUICKTASK_DISABLE_NOTIFICATIONS", "1")
        .output()
        .expect("failed to run quicktask");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}
