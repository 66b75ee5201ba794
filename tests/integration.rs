use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn docchat_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("docchat");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let docs_dir = root.join("docs");
    fs::create_dir_all(&docs_dir).unwrap();
    fs::write(docs_dir.join("cats.txt"), "the cat sat on the mat").unwrap();
    fs::write(docs_dir.join("dogs.txt"), "the dog ran in the park").unwrap();
    fs::write(docs_dir.join("ships.txt"), "ships sail across the sea").unwrap();
    // Non-matching extension must be ignored.
    fs::write(docs_dir.join("notes.md"), "markdown notes about cats").unwrap();

    let config_content = format!(
        r#"[docs]
dir = "{}/docs"

[retrieval]
top_k = 2

[completion]
model = "gpt-3.5-turbo"
"#,
        root.display()
    );

    let config_path = root.join("docchat.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_docchat(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = docchat_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run docchat binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_docs_lists_loaded_documents() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_docchat(&config_path, &["docs"]);
    assert!(success, "docs failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("3 document(s)"), "got: {}", stdout);
    assert!(stdout.contains("the cat sat"), "got: {}", stdout);
    // The .md file must not be loaded.
    assert!(!stdout.contains("markdown"), "got: {}", stdout);
}

#[test]
fn test_docs_missing_directory() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("docchat.toml");
    fs::write(
        &config_path,
        format!("[docs]\ndir = \"{}/nope\"\n", tmp.path().display()),
    )
    .unwrap();

    let (stdout, _, success) = run_docchat(&config_path, &["docs"]);
    assert!(success, "missing docs dir should not be an error");
    assert!(stdout.contains("No documents"), "got: {}", stdout);
}

#[test]
fn test_retrieve_ranks_by_overlap() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_docchat(&config_path, &["retrieve", "cat dog"]);
    assert!(success);
    // Tie on score 1; store order (cats.txt before dogs.txt) breaks it.
    let cat_pos = stdout.find("the cat sat").expect("cat doc in output");
    let dog_pos = stdout.find("the dog ran").expect("dog doc in output");
    assert!(cat_pos < dog_pos, "tie should keep store order: {}", stdout);
    assert!(stdout.contains("[score 1]"), "got: {}", stdout);
}

#[test]
fn test_retrieve_no_overlap_reports_no_results() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_docchat(&config_path, &["retrieve", "xyznonexistent"]);
    assert!(success);
    assert!(stdout.contains("No results"), "got: {}", stdout);
}

#[test]
fn test_retrieve_empty_query_reports_no_results() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_docchat(&config_path, &["retrieve", ""]);
    assert!(success, "empty query should not panic");
    assert!(stdout.contains("No results"), "got: {}", stdout);
}

#[test]
fn test_retrieve_respects_k_flag() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_docchat(&config_path, &["retrieve", "the", "--k", "1"]);
    assert!(success);
    let hits = stdout.matches("[score").count();
    assert_eq!(hits, 1, "expected a single result, got: {}", stdout);
}

#[test]
fn test_retrieve_deterministic() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout1, _, _) = run_docchat(&config_path, &["retrieve", "the"]);
    let (stdout2, _, _) = run_docchat(&config_path, &["retrieve", "the"]);
    assert_eq!(
        stdout1, stdout2,
        "retrieval should be deterministic across runs"
    );
}

#[test]
fn test_ask_without_key_prints_notice() {
    let (_tmp, config_path) = setup_test_env();

    // No OPENAI_API_KEY and stdin is not a terminal: the turn is blocked
    // with an informational message, not an error.
    let (stdout, _, success) = run_docchat(&config_path, &["ask", "what is a cat?"]);
    assert!(success, "missing key must not be an error exit");
    assert!(stdout.contains("API key"), "got: {}", stdout);
}

#[test]
fn test_invalid_config_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("docchat.toml");
    fs::write(&config_path, "[completion]\nmodel = \"\"\n").unwrap();

    let (_, stderr, success) = run_docchat(&config_path, &["docs"]);
    assert!(!success, "empty model should fail validation");
    assert!(stderr.contains("completion.model"), "got: {}", stderr);
}
