//! End-to-end tests for `run_batch`
//!
//! Input file, database and report directory live in temp dirs; the profile
//! site is a wiremock server.

mod helpers;

use std::path::Path;

use clap::Parser;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::profile_html;
use profile_harvest::storage::{init_db_pool_with_path, query_dataset_items};
use profile_harvest::{query_run_history, run_batch, run_migrations, BatchError, Cli};

fn write_input(dir: &Path, input: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("input.json");
    std::fs::write(&path, serde_json::to_vec(&input).unwrap()).unwrap();
    path
}

fn cli(args: &[&str]) -> Cli {
    let mut full = vec!["profile_harvest"];
    full.extend_from_slice(args);
    Cli::parse_from(full)
}

#[tokio::test]
async fn test_run_batch_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/in/ada"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(profile_html("Ada Lovelace")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/in/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let input = write_input(
        tmp.path(),
        json!({
            "profileUrls": [
                format!("{}/in/ada", server.uri()),
                format!("{}/in/ghost", server.uri())
            ],
            "scrapingOptions": { "delayBetweenRequestsMs": 1500 },
            "outputOptions": { "reportFileName": "people.csv" }
        }),
    );
    let db_path = tmp.path().join("harvest.db");
    let report_dir = tmp.path().join("reports");

    let cli = cli(&[
        input.to_str().unwrap(),
        "--db-path",
        db_path.to_str().unwrap(),
        "--report-dir",
        report_dir.to_str().unwrap(),
        "--delay-ms",
        "0",
    ]);
    let report = run_batch(&cli).await.unwrap();

    assert_eq!(report.summary.total_targets, 2);
    assert_eq!(report.summary.successful, 1);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.success_rate_percent, 50.0);
    assert_eq!(report.summary.report_file_name.as_deref(), Some("people.csv"));
    assert!(report.run_id.starts_with("run_"));

    let csv = std::fs::read_to_string(report_dir.join("people.csv")).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("Ada Lovelace"));
    assert!(csv.contains("not_found"));

    let pool = init_db_pool_with_path(&db_path).await.unwrap();
    let rows = query_dataset_items(&pool, &report.run_id).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].record_type, "summary");

    let history = query_run_history(&pool, None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].run_id, report.run_id);
    assert_eq!(history[0].successful, 1);
    assert_eq!(history[0].failed, 1);
}

#[tokio::test]
async fn test_invalid_input_fails_before_touching_the_database() {
    let tmp = TempDir::new().unwrap();
    let input = write_input(tmp.path(), json!({ "profileUrls": [] }));
    let db_path = tmp.path().join("never.db");

    let cli = cli(&[
        input.to_str().unwrap(),
        "--db-path",
        db_path.to_str().unwrap(),
    ]);
    let err = run_batch(&cli).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<BatchError>(),
        Some(BatchError::InvalidInput(_))
    ));
    assert!(!db_path.exists());
}

#[tokio::test]
async fn test_missing_input_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.json");
    let cli = cli(&[missing.to_str().unwrap()]);

    let err = run_batch(&cli).await.unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read input file"));
}

#[tokio::test]
async fn test_failed_run_stats_update_does_not_fail_finished_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/in/ada"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(profile_html("Ada Lovelace")),
        )
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("harvest.db");
    {
        let pool = init_db_pool_with_path(&db_path).await.unwrap();
        run_migrations(&pool).await.unwrap();
        sqlx::query(
            "CREATE TRIGGER runs_read_only BEFORE UPDATE ON runs
             BEGIN SELECT RAISE(ABORT, 'runs is read-only'); END",
        )
        .execute(pool.as_ref())
        .await
        .unwrap();
        pool.close().await;
    }

    let input = write_input(
        tmp.path(),
        json!({
            "profileUrls": [format!("{}/in/ada", server.uri())],
            "outputOptions": { "generateReport": false }
        }),
    );
    let cli = cli(&[
        input.to_str().unwrap(),
        "--db-path",
        db_path.to_str().unwrap(),
    ]);
    let report = run_batch(&cli).await.unwrap();

    assert_eq!(report.summary.total_targets, 1);
    assert_eq!(report.summary.successful, 1);

    let pool = init_db_pool_with_path(&db_path).await.unwrap();
    let rows = query_dataset_items(&pool, &report.run_id).await.unwrap();
    let kinds: Vec<&str> = rows.iter().map(|row| row.record_type.as_str()).collect();
    assert_eq!(kinds, ["item", "summary"]);
    // The run row was never completed, so it stays out of the history.
    assert!(query_run_history(&pool, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_consecutive_runs_get_distinct_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/in/ada"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(profile_html("Ada Lovelace")),
        )
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("harvest.db");
    let input = write_input(
        tmp.path(),
        json!({
            "profileUrls": [format!("{}/in/ada", server.uri())],
            "outputOptions": { "generateReport": false }
        }),
    );
    let cli = cli(&[
        input.to_str().unwrap(),
        "--db-path",
        db_path.to_str().unwrap(),
    ]);

    let first = run_batch(&cli).await.unwrap();
    let second = run_batch(&cli).await.unwrap();
    assert_ne!(first.run_id, second.run_id);

    let pool = init_db_pool_with_path(&db_path).await.unwrap();
    assert_eq!(query_run_history(&pool, None).await.unwrap().len(), 2);
    assert_eq!(
        query_dataset_items(&pool, &second.run_id).await.unwrap().len(),
        2
    );
}
