use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn crosscheck_cmd(home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("crosscheck");
    cmd.env("HOME", home.path())
        .env_remove("GEMINI_API_KEY")
        .env_remove("GOOGLE_API_KEY")
        .env_remove("CROSSCHECK_SECRETS_DIR")
        .env_remove("CROSSCHECK_GEMINI_BASE_URL")
        .env_remove("CROSSCHECK_OPENAI_BASE_URL")
        .env_remove("CROSSCHECK_OPENAI_TOKEN_ENDPOINT")
        .env_remove("CROSSCHECK_OPENAI_CLIENT_ID")
        .args(["--color", "never"]);
    cmd
}

#[test]
fn lists_all_four_tools() {
    let home = TempDir::new().unwrap();
    crosscheck_cmd(&home)
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("gemini_critique"))
        .stdout(predicate::str::contains("gemini_review"))
        .stdout(predicate::str::contains("gpt_critique"))
        .stdout(predicate::str::contains("gpt_review"))
        .stdout(predicate::str::contains("plan (required)"));
}

#[test]
fn json_listing_carries_input_schemas() {
    let home = TempDir::new().unwrap();
    let output = crosscheck_cmd(&home)
        .args(["tools", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let results = value["results"].as_array().unwrap();
    assert_eq!(results.len(), 4);
    let review = results
        .iter()
        .find(|r| r["message"] == "gpt_review")
        .unwrap();
    assert_eq!(review["type"], "tool");
    assert_eq!(review["data"]["required"], serde_json::json!(["code"]));
}

#[test]
fn quiet_listing_prints_names_only() {
    let home = TempDir::new().unwrap();
    crosscheck_cmd(&home)
        .args(["tools", "--quiet"])
        .assert()
        .success()
        .stdout("gemini_critique\ngemini_review\ngpt_critique\ngpt_review\n");
}

#[test]
fn malformed_config_file_fails() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("bad.toml");
    std::fs::write(&config, "[gemini\nbase_url = ").unwrap();

    crosscheck_cmd(&home)
        .args(["tools", "--config", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn generates_completions() {
    let home = TempDir::new().unwrap();
    crosscheck_cmd(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("crosscheck"));
}
