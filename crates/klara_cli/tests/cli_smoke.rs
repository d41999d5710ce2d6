use std::path::Path;
use std::process::{Command, Output};

fn klara(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_klara"))
        .args(args)
        .env("KLARA_DB_PATH", dir.join("klara.db"))
        .env("KLARA_CONFIG_PATH", dir.join("klara.toml"))
        .env("HOME", dir)
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("KLARA_BASE_URL")
        .env_remove("KLARA_PIPELINE_MODE")
        .env_remove("KLARA_LOG_DIR")
        .env_remove("KLARA_LOG_LEVEL")
        .output()
        .expect("failed to run klara")
}

fn write_config(dir: &Path) {
    std::fs::write(
        dir.join("klara.toml"),
        "[inference]\ntimeout_secs = 5\n\n[logging]\nlevel = \"error\"\n",
    )
    .unwrap();
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = klara(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["login", "dump", "list", "complete"] {
        assert!(stdout.contains(command), "help is missing `{command}`");
    }
}

#[test]
fn login_creates_user_once() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());

    let first = klara(dir.path(), &["login", "Parent@Example.com", "--json"]);
    assert!(first.status.success(), "{}", String::from_utf8_lossy(&first.stderr));
    let first: serde_json::Value = serde_json::from_slice(&first.stdout).unwrap();
    assert_eq!(first["email"], "parent@example.com");

    let second = klara(dir.path(), &["login", "parent@example.com", "--json"]);
    let second: serde_json::Value = serde_json::from_slice(&second.stdout).unwrap();
    assert_eq!(first["id"], second["id"]);
}

#[test]
fn dump_without_credentials_saves_fallback_task() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());
    assert!(klara(dir.path(), &["login", "parent@example.com"]).status.success());

    let output = klara(
        dir.path(),
        &[
            "dump",
            "Call the babysitter and buy milk",
            "--user",
            "parent@example.com",
            "--today",
            "2025-10-20",
            "--json",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["result"]["degraded"], "upstream_unavailable");
    assert_eq!(
        outcome["persisted"]["tasks"][0]["description"],
        "Call the babysitter and buy milk"
    );
    assert_eq!(outcome["persisted"]["tasks"][0]["estimated_minutes"], 15);

    let listed = klara(dir.path(), &["list", "--user", "parent@example.com", "--json"]);
    let listed: serde_json::Value = serde_json::from_slice(&listed.stdout).unwrap();
    assert_eq!(listed["tasks"].as_array().unwrap().len(), 1);

    let task_id = listed["tasks"][0]["id"].as_str().unwrap().to_string();
    let completed = klara(dir.path(), &["complete", "task", &task_id]);
    assert!(completed.status.success());

    let listed = klara(dir.path(), &["list", "--user", "parent@example.com", "--json"]);
    let listed: serde_json::Value = serde_json::from_slice(&listed.stdout).unwrap();
    assert_eq!(listed["tasks"][0]["completed"], true);
}

#[test]
fn dump_for_unknown_user_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());

    let output = klara(
        dir.path(),
        &["dump", "buy milk", "--user", "nobody@example.com"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("klara login"));
}
