use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn feeledger_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("feeledger"))
}

fn init(config_path: &Path) {
    feeledger_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();
}

/// Run a command against an initialized config dir and expect success
fn run_ok(config_path: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    feeledger_cmd()
        .args(["-C", config_path.to_str().unwrap()])
        .args(args)
        .assert()
        .success()
}

/// Initialized ledger with one client and one fee due far in the future
fn seeded() -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ledger");
    init(&config_path);

    run_ok(&config_path, &["add-client", "--name", "Acme Corp", "--email", "ap@acme.test"])
        .stdout(predicate::str::contains("Added client 1"));
    run_ok(
        &config_path,
        &[
            "add-fee",
            "--client",
            "1",
            "--description",
            "Annual license",
            "--amount",
            "1,200.00",
            "--due",
            "2099-01-31",
            "--category",
            "License",
        ],
    )
    .stdout(predicate::str::contains("Added fee 1"));

    (temp_dir, config_path)
}

#[test]
fn test_help() {
    feeledger_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fee ledger"));
}

#[test]
fn test_version() {
    feeledger_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("feeledger"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ledger");

    feeledger_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized feeledger config"));

    let content = fs::read_to_string(config_path.join("config.toml")).unwrap();
    assert!(content.contains("backend = \"file\""));
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ledger");
    init(&config_path);

    feeledger_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_clients_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    feeledger_cmd()
        .args(["-C", config_path.to_str().unwrap(), "clients"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_empty_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ledger");
    init(&config_path);

    run_ok(&config_path, &["clients"]).stdout(predicate::str::contains("No clients found."));
    run_ok(&config_path, &["fees"]).stdout(predicate::str::contains("No fees found."));
}

#[test]
fn test_new_fee_is_pending_and_billed() {
    let (_temp_dir, config_path) = seeded();

    run_ok(&config_path, &["fees"])
        .stdout(predicate::str::contains("Annual license"))
        .stdout(predicate::str::contains("Acme Corp"))
        .stdout(predicate::str::contains("pending"))
        .stdout(predicate::str::contains("Total: 1 fees"));

    run_ok(&config_path, &["clients"])
        .stdout(predicate::str::contains("$1,200.00"))
        .stdout(predicate::str::contains("$0.00"));

    // Records land in the file store next to the config
    let records = fs::read_to_string(config_path.join("records.toml")).unwrap();
    assert!(records.contains("Annual license"));
}

#[test]
fn test_fee_for_unknown_client() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ledger");
    init(&config_path);

    feeledger_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-fee",
            "--client",
            "7",
            "--description",
            "Setup",
            "--amount",
            "50",
            "--due",
            "2099-01-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("The client with id 7 was not found"));
}

#[test]
fn test_invalid_amount() {
    let (_temp_dir, config_path) = seeded();

    feeledger_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-fee",
            "--client",
            "1",
            "--description",
            "Refund",
            "--amount",
            "0",
            "--due",
            "2099-01-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));
}

#[test]
fn test_invalid_due_date() {
    let (_temp_dir, config_path) = seeded();

    feeledger_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "add-fee",
            "--client",
            "1",
            "--description",
            "Training",
            "--amount",
            "5",
            "--due",
            "31/01/2099",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected YYYY-MM-DD"));
}

#[test]
fn test_pay_settles_fee() {
    let (_temp_dir, config_path) = seeded();

    run_ok(&config_path, &["pay", "1", "--date", "2026-03-01", "--method", "card"])
        .stdout(predicate::str::contains("Recorded payment 1 of $1,200.00 for fee 1"));

    run_ok(&config_path, &["fees", "--status", "paid"])
        .stdout(predicate::str::contains("Annual license"));

    run_ok(&config_path, &["payments"])
        .stdout(predicate::str::contains("Credit Card"))
        .stdout(predicate::str::contains("Total collected: $1,200.00"));

    run_ok(&config_path, &["summary"])
        .stdout(predicate::str::contains("Collected:        $1,200.00"))
        .stdout(predicate::str::contains("Pending:          $0.00 (0 fees)"));
}

#[test]
fn test_remove_payment_reopens_fee() {
    let (_temp_dir, config_path) = seeded();
    run_ok(&config_path, &["pay", "1", "--amount", "1200"]);

    run_ok(&config_path, &["remove-payment", "1"])
        .stdout(predicate::str::contains("Removed payment 1"));

    run_ok(&config_path, &["fees", "--status", "pending"])
        .stdout(predicate::str::contains("Annual license"));
    run_ok(&config_path, &["payments"]).stdout(predicate::str::contains("No payments recorded."));
}

#[test]
fn test_past_due_fee_reads_overdue() {
    let (_temp_dir, config_path) = seeded();
    run_ok(
        &config_path,
        &[
            "add-fee",
            "--client",
            "1",
            "--description",
            "Onboarding workshop",
            "--amount",
            "300",
            "--due",
            "2020-01-15",
            "--category",
            "Training",
        ],
    );

    run_ok(&config_path, &["fees", "--status", "overdue"])
        .stdout(predicate::str::contains("Onboarding workshop"))
        .stdout(predicate::str::contains("Annual license").not());

    run_ok(&config_path, &["summary"])
        .stdout(predicate::str::contains("Overdue:          $300.00 (1 fees)"))
        .stdout(predicate::str::contains("Oldest overdue:"));

    // Overdue is derived on read, never written back
    let records = fs::read_to_string(config_path.join("records.toml")).unwrap();
    assert!(!records.contains("overdue"));
}

#[test]
fn test_pay_missing_fee() {
    let (_temp_dir, config_path) = seeded();

    feeledger_cmd()
        .args(["-C", config_path.to_str().unwrap(), "pay", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("The fee with id 99 was not found"));
}

#[test]
fn test_reconcile_repairs_edited_totals() {
    let (_temp_dir, config_path) = seeded();

    // Corrupt the stored balance by hand
    let records_path = config_path.join("records.toml");
    let records = fs::read_to_string(&records_path).unwrap();
    assert!(records.contains("total_due = \"1200.00\""));
    fs::write(&records_path, records.replace("total_due = \"1200.00\"", "total_due = \"1.00\"")).unwrap();

    run_ok(&config_path, &["reconcile"])
        .stdout(predicate::str::contains("Client 1: due $1,200.00, paid $0.00"));

    run_ok(&config_path, &["reconcile", "--client", "1"])
        .stdout(predicate::str::contains("due $1,200.00"));
}

#[test]
fn test_remote_backend_requires_section() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("ledger");
    fs::create_dir_all(&config_path).unwrap();
    fs::write(
        config_path.join("config.toml"),
        "[store]\nbackend = \"remote\"\n",
    )
    .unwrap();

    feeledger_cmd()
        .args(["-C", config_path.to_str().unwrap(), "clients"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no [store.remote] section"));
}

#[test]
fn test_search_filters_listings() {
    let (_temp_dir, config_path) = seeded();
    run_ok(&config_path, &["add-client", "--name", "Globex", "--email", "ops@globex.test"]);

    run_ok(&config_path, &["clients", "--search", "ACME"])
        .stdout(predicate::str::contains("Acme Corp"))
        .stdout(predicate::str::contains("Globex").not());

    run_ok(&config_path, &["fees", "--search", "license"])
        .stdout(predicate::str::contains("Annual license"));
    run_ok(&config_path, &["fees", "--search", "workshop"])
        .stdout(predicate::str::contains("No fees found."));
}
