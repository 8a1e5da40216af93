use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn cli_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("wordbloom_cli"))
}

#[test]
fn build_reload_and_query() {
    let tmp = tempdir().expect("tempdir");
    let corpus = tmp.path().join("corpus.txt");
    fs::write(&corpus, b"cat\ndog\nbird").unwrap();
    let dir = tmp.path().to_str().unwrap();
    let corpus = corpus.to_str().unwrap();

    cli_cmd()
        .args(["build", "--corpus", corpus, "--bits", "100", "--hashes", "2", "--out-dir", dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("bitarray_2_100.bin built"))
        .stdout(predicate::str::contains("total values:"));
    assert_eq!(fs::metadata(tmp.path().join("bitarray_2_100.bin")).unwrap().len(), 13);
    assert!(tmp.path().join("bitarray_2_100.json").exists());

    cli_cmd()
        .args(["build", "--corpus", corpus, "--bits", "100", "--hashes", "2", "--out-dir", dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("loaded successfully"));

    cli_cmd()
        .args([
            "query", "--corpus", corpus, "--bits", "100", "--algorithms", "md5,sha3_224", "--out-dir", dir,
            "cat", "bird",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("cat\tmaybe present"))
        .stdout(predicate::str::contains("bird\tmaybe present"));

    // "cat" as hex
    cli_cmd()
        .args(["query", "--corpus", corpus, "--bits", "100", "--hashes", "2", "--out-dir", dir, "--hex", "636174"])
        .assert()
        .success()
        .stdout(predicate::str::contains("636174\tmaybe present"));
}

#[test]
fn evaluate_reports_json_counts() {
    let tmp = tempdir().expect("tempdir");
    let corpus = tmp.path().join("corpus.txt");
    let tests = tmp.path().join("dictionary.txt");
    fs::write(&corpus, b"alpha\nbeta\ngamma\ndelta").unwrap();
    fs::write(&tests, b"alpha\ngamma\nomega\nsigma").unwrap();

    cli_cmd()
        .args([
            "evaluate",
            "--corpus",
            corpus.to_str().unwrap(),
            "--test-words",
            tests.to_str().unwrap(),
            "--preset",
            "one",
            "--elements",
            "4",
            "--parallel",
            "--out-dir",
            tmp.path().to_str().unwrap(),
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"false_negatives\": 0"))
        .stdout(predicate::str::contains("\"true_positives\": 2"));
}

#[test]
fn run_covers_every_preset() {
    let tmp = tempdir().expect("tempdir");
    let corpus = tmp.path().join("corpus.txt");
    let tests = tmp.path().join("dictionary.txt");
    let words: Vec<String> = (0..200).map(|i| format!("pw{i}")).collect();
    fs::write(&corpus, words.join("\n")).unwrap();
    fs::write(&tests, b"pw1\npw2\nnotaword").unwrap();

    cli_cmd()
        .args([
            "run",
            "--corpus",
            corpus.to_str().unwrap(),
            "--test-words",
            tests.to_str().unwrap(),
            "--elements",
            "200",
            "--out-dir",
            tmp.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("fp_five_percent"))
        .stdout(predicate::str::contains("fp_tenth_percent"))
        .stdout(predicate::str::contains("false negatives: 0"));

    let files = fs::read_dir(tmp.path())
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().extension().is_some_and(|x| x == "bin"))
        .count();
    assert_eq!(files, 4);
}

#[test]
fn presets_table() {
    cli_cmd()
        .args(["presets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fp_one_percent"))
        .stdout(predicate::str::contains("89440449"))
        .stdout(predicate::str::contains("206237746"));

    cli_cmd()
        .args(["presets", "--elements", "14344392"])
        .assert()
        .success()
        .stdout(predicate::str::contains("89440501"));
}

#[test]
fn preset_build_uses_published_file_name() {
    let tmp = tempdir().expect("tempdir");
    let corpus = tmp.path().join("corpus.txt");
    fs::write(&corpus, b"cat\ndog").unwrap();

    cli_cmd()
        .args([
            "build",
            "--corpus",
            corpus.to_str().unwrap(),
            "--preset",
            "five",
            "--parallel",
            "--out-dir",
            tmp.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("bitarray_4_89440449.bin built"));
    assert_eq!(
        fs::metadata(tmp.path().join("bitarray_4_89440449.bin")).unwrap().len(),
        11_180_057
    );
}

#[test]
fn invalid_configuration_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    let corpus = tmp.path().join("corpus.txt");
    fs::write(&corpus, b"cat").unwrap();

    cli_cmd()
        .args(["build", "--corpus", corpus.to_str().unwrap(), "--bits", "0", "--hashes", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));

    cli_cmd()
        .args(["build", "--corpus", corpus.to_str().unwrap(), "--bits", "64", "--algorithms", "whirlpool"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown hash algorithm"));
}

#[test]
fn missing_corpus_fails() {
    let tmp = tempdir().expect("tempdir");
    cli_cmd()
        .args([
            "build",
            "--corpus",
            tmp.path().join("nope.txt").to_str().unwrap(),
            "--bits",
            "64",
            "--hashes",
            "1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Corpus unavailable"));
}

#[test]
fn inspect_rejects_truncated_file() {
    let tmp = tempdir().expect("tempdir");
    let file = tmp.path().join("bitarray_2_100.bin");
    fs::write(&file, [0u8; 5]).unwrap();

    cli_cmd()
        .args(["inspect", "--file", file.to_str().unwrap(), "--bits", "100", "--hashes", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected 13 bytes, found 5"));
}
