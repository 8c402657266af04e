#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::Site;
use predicates::prelude::*;
use std::fs;

#[test]
fn first_run_generates_then_waits_for_interval() -> Result<()> {
    let site = Site::new();

    site.cmd()
        .arg("cron")
        .assert()
        .success()
        .stdout(predicate::str::contains("(first run)"));
    assert!(site.sitemap().exists());
    assert!(site.path().join("state.json").exists());

    // Remove the sitemap so a skipped run is observable
    fs::remove_file(site.sitemap())?;

    site.cmd()
        .arg("cron")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not due yet"));
    assert!(!site.sitemap().exists());
    Ok(())
}

#[test]
fn matching_key_overrides_interval() {
    let site = Site::new();
    site.cmd().arg("cron").assert().success();

    site.cmd()
        .args(["cron", "--key", "s3cret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(override key)"));
}

#[test]
fn key_from_environment() {
    let site = Site::new();

    site.cmd()
        .env("SITEMAPPER_CRON_KEY", "s3cret")
        .arg("cron")
        .assert()
        .success()
        .stdout(predicate::str::contains("(override key)"));
}

#[test]
fn wrong_key_is_rejected() {
    let site = Site::new();

    site.cmd()
        .args(["cron", "--key", "guess"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("Access denied"));

    assert!(!site.sitemap().exists());
    assert!(!site.path().join("state.json").exists());
}

#[test]
fn skipped_run_as_json() -> Result<()> {
    let site = Site::new();
    site.cmd().arg("cron").assert().success();

    let output = site
        .cmd()
        .args(["cron", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(value["status"], "skipped");
    assert!(value["next_due"].is_string());
    Ok(())
}

#[test]
fn ran_as_json_carries_report() -> Result<()> {
    let site = Site::new();

    let output = site
        .cmd()
        .args(["cron", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(value["status"], "ran");
    assert_eq!(value["reason"], "first_run");
    assert_eq!(value["report"]["success"], true);
    assert_eq!(value["report"]["counts"]["includes"], 3);
    Ok(())
}
