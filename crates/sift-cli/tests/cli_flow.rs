use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const RIS: &str = "\
TY  - JOUR
TI  - Exercise and mood in older adults
AU  - Smith, John
PY  - 2020
DO  - 10.1000/mood.1
ER  -
TY  - JOUR
TI  - Diet and cognition
AU  - Doe, Alice
PY  - 2019
DO  - 10.1000/diet.2
ER  -
";

fn sift(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sift"))
        .arg("--project-dir")
        .arg(root)
        .args(["--format", "raw", "--quiet"])
        .args(args)
        .env_remove("SIFT_LOG")
        .output()
        .expect("sift binary should run")
}

fn json(root: &Path, args: &[&str]) -> Value {
    let out = sift(root, args);
    assert!(
        out.status.success(),
        "sift {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout should be json")
}

fn init(temp: &TempDir) {
    let out = Command::new(env!("CARGO_BIN_EXE_sift"))
        .args(["--format", "raw", "init"])
        .arg(temp.path())
        .output()
        .expect("sift binary should run");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn screening_round_trip_through_the_binary() {
    let temp = TempDir::new().expect("tempdir should create");
    init(&temp);
    let root = temp.path();

    let project = json(root, &["project", "create", "--name", "Exercise review"]);
    let pid = project["id"].as_i64().expect("project id").to_string();

    json(
        root,
        &[
            "-p", &pid, "criterion", "add", "--type", "inclusion", "--code", "I1",
            "--description", "Adults over 65",
        ],
    );

    let export = root.join("export.ris");
    std::fs::write(&export, RIS).expect("export should write");
    let export = export.display().to_string();
    let imported = json(root, &["-p", &pid, "import", "ris", &export]);
    assert_eq!(imported["created"], 2);
    assert_eq!(imported["skipped"], 0);

    let again = json(root, &["-p", &pid, "import", "ris", &export]);
    assert_eq!(again["created"], 0);
    assert_eq!(again["updated"], 2);

    let started = json(root, &["-p", &pid, "screen", "start"]);
    assert_eq!(started["started"], 2);

    let next = json(root, &["-p", &pid, "screen", "next"]);
    let article_id = next["article"]["id"].as_i64().expect("next article").to_string();

    let recorded = json(
        root,
        &[
            "-p", &pid, "screen", "decide", &article_id, "--stage", "title-abstract",
            "--decision", "exclude", "--reviewer", "1", "--exclusion-reason", "I1",
        ],
    );
    assert_eq!(recorded["applied"], true);
    assert_eq!(recorded["article"]["status"], "excluded");

    let stats = json(root, &["-p", &pid, "stats"]);
    assert_eq!(stats["total_articles"], 2);
    assert_eq!(stats["excluded"], 1);
    assert_eq!(stats["awaiting_screening"], 1);
}

#[test]
fn project_scoped_command_needs_a_project() {
    let temp = TempDir::new().expect("tempdir should create");
    init(&temp);

    let out = sift(temp.path(), &["stats"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no project selected"));
}

#[test]
fn uninitialized_directory_is_rejected() {
    let temp = TempDir::new().expect("tempdir should create");
    let out = Command::new(env!("CARGO_BIN_EXE_sift"))
        .arg("stats")
        .current_dir(temp.path())
        .output()
        .expect("sift binary should run");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("sift init"));
}

#[test]
fn unreadable_pdf_is_attached_without_text() {
    let temp = TempDir::new().expect("tempdir should create");
    init(&temp);
    let root = temp.path();

    let project = json(root, &["project", "create", "--name", "Full text review"]);
    let pid = project["id"].as_i64().expect("project id").to_string();
    let export = root.join("export.ris");
    std::fs::write(&export, RIS).expect("export should write");
    json(root, &["-p", &pid, "import", "ris", &export.display().to_string()]);
    let listed = json(root, &["-p", &pid, "article", "list"]);
    let article_id = listed["articles"][0]["id"].as_i64().expect("article id").to_string();

    let broken = root.join("broken.pdf");
    std::fs::write(&broken, "%PDF-1.4 truncated").expect("pdf should write");
    let broken = broken.display().to_string();
    let attached = json(root, &["-p", &pid, "article", "fulltext", &article_id, &broken]);
    assert_eq!(attached["full_text_path"], broken.as_str());
    assert_eq!(attached["has_full_text"], true);
}

#[test]
fn csv_export_imports_by_pmid() {
    let temp = TempDir::new().expect("tempdir should create");
    init(&temp);
    let root = temp.path();

    let project = json(root, &["project", "create", "--name", "CSV review"]);
    let pid = project["id"].as_i64().expect("project id").to_string();
    let export = root.join("csv-export.csv");
    std::fs::write(
        &export,
        "PMID,Title,Authors,Journal/Book,Publication Year,DOI\n\
         111,Walking and mood,Green P.,Mood J,2020,10.1000/walk.1\n\
         222,Cycling and mood,,Mood J,2021,\n",
    )
    .expect("export should write");
    let export = export.display().to_string();

    let imported = json(root, &["-p", &pid, "import", "csv", &export]);
    assert_eq!(imported["format"], "csv");
    assert_eq!(imported["created"], 2);
    assert!(imported.get("abstracts").is_none());

    let again = json(root, &["-p", &pid, "import", "csv", &export]);
    assert_eq!(again["updated"], 2);
}
