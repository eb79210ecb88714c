use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

struct Env {
    home: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("billmatch").unwrap();
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    fn data_dir(&self) -> PathBuf {
        self.home.path().join("books")
    }

    fn init(&self) {
        self.cmd()
            .args(["init", "--data-dir"])
            .arg(self.data_dir())
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized billmatch"));
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.home.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn upload(&self, path: &Path, kind: &str) {
        self.cmd()
            .arg("upload")
            .arg(path)
            .args(["--kind", kind])
            .assert()
            .success();
    }

    fn json(&self, args: &[&str]) -> Value {
        let out = self.cmd().args(args).output().unwrap();
        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
        serde_json::from_slice(&out.stdout).unwrap()
    }
}

#[test]
fn commands_fail_without_database() {
    let env = Env::new();
    env.cmd()
        .args(["report", "bills"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("billmatch init"));
}

#[test]
fn status_before_init_reports_missing_database() {
    let env = Env::new();
    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database not found"));
}

#[test]
fn upload_link_and_report_bill() {
    let env = Env::new();
    env.init();
    let bank = env.write(
        "bank.csv",
        "Transaction Number,Date,Amount,Description\nT1,2024-01-05,-150.00,Utility payment\n",
    );
    let bills = env.write("bills.csv", "Bill Number,Date,Amount\nB100,2024-01-05,150.00\n");
    env.upload(&bank, "bank");
    env.upload(&bills, "bill");

    env.cmd()
        .arg("link")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bills: 1 linked, 0 unmatched, 0 excluded"))
        .stdout(predicate::str::contains("B100"));

    let linked = env.json(&["report", "bills", "--json"]);
    let linked = linked.as_array().unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0]["number"], "B100");
    assert_eq!(linked[0]["linked_transaction"]["transaction_number"], "T1");
}

#[test]
fn duplicate_upload_is_reported() {
    let env = Env::new();
    env.init();
    let bills = env.write("bills.csv", "Bill Number,Date,Amount\nB1,2024-01-05,10.00\n");
    env.upload(&bills, "bill");
    env.cmd()
        .arg("upload")
        .arg(&bills)
        .args(["--kind", "bill"])
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate checksum"));

    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Bills:\s+1 \(0 linked\)").unwrap());
}

#[test]
fn tie_goes_to_first_transaction_in_store_order() {
    let env = Env::new();
    env.init();
    let bank = env.write(
        "bank.csv",
        "transaction_number,date,amount,description\n\
         T1,2024-02-01,75.00,First\n\
         T2,2024-02-01,75.00,Second\n",
    );
    let bills = env.write("bills.csv", "bill_number,date,amount\nB7,2024-02-01,75.00\n");
    env.upload(&bank, "bank");
    env.upload(&bills, "bill");

    let out = env.json(&["link", "--json"]);
    assert_eq!(out["summary"]["bills"]["linked"], 1);
    assert_eq!(out["bills"][0]["linked_transaction"]["transaction_number"], "T1");
}

#[test]
fn bill_without_number_is_excluded() {
    let env = Env::new();
    env.init();
    let bank = env.write(
        "bank.csv",
        "transaction_number,date,amount,description\nT1,2024-02-01,75.00,Rent\n",
    );
    let bills = env.write("bills.csv", "bill_number,date,amount\n,2024-02-01,75.00\n");
    env.upload(&bank, "bank");
    env.upload(&bills, "bill");

    env.cmd()
        .arg("link")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bills: 0 linked, 0 unmatched, 1 excluded"));
    let linked = env.json(&["report", "bills", "--json"]);
    assert!(linked.as_array().unwrap().is_empty());
}

#[test]
fn search_matches_description_substring() {
    let env = Env::new();
    env.init();
    let bank = env.write(
        "bank.csv",
        "transaction_number,date,amount,description\n\
         T1,2024-01-05,-150.00,Utility bill\n\
         T2,2024-01-06,2000.00,Client payment\n",
    );
    env.upload(&bank, "bank");

    let results = env.json(&["search", "utility", "--json"]);
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["kind"], "transaction");
    assert_eq!(results[0]["description"], "Utility bill");

    env.cmd()
        .args(["search", "nothing-like-this"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching records."));
}

#[test]
fn unlinked_transaction_has_empty_children() {
    let env = Env::new();
    env.init();
    let bank = env.write(
        "bank.csv",
        "transaction_number,date,amount,description\nT9,2024-03-01,42.00,Coffee\n",
    );
    env.upload(&bank, "bank");

    let view = env.json(&["report", "transactions", "--json"]);
    let view = view.as_array().unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0]["transaction_number"], "T9");
    assert!(view[0]["bills"].as_array().unwrap().is_empty());
    assert!(view[0]["invoices"].as_array().unwrap().is_empty());
}

#[test]
fn show_missing_record() {
    let env = Env::new();
    env.init();
    env.cmd()
        .args(["show", "bill", "99"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No bill with id 99."));
}

#[test]
fn load_switches_data_dir() {
    let env = Env::new();
    env.init();
    let other = env.home.path().join("other");
    env.cmd()
        .args(["init", "--data-dir"])
        .arg(&other)
        .assert()
        .success();

    env.cmd()
        .arg("load")
        .arg(env.data_dir())
        .assert()
        .success()
        .stdout(predicate::str::contains("Switched to"));
    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("books"));

    env.cmd()
        .arg("load")
        .arg(env.home.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No database found"));
}
