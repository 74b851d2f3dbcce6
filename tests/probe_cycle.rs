//! End-to-end probe cycles against mock capabilities.
//!
//! Run with:
//!   cargo test --test probe_cycle

#![cfg(feature = "mock")]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wkldid::backends::mock::{Channel, MemoryReporter, MockDatabase, MockSecretSource};
use wkldid::config::Environment;
use wkldid::database::ProductRow;
use wkldid::tasks::{RecordQuerier, SecretFetcher};
use wkldid::{ProbeError, Supervisor};

const TICK: Duration = Duration::from_secs(15);

fn scenario_env() -> HashMap<String, String> {
    [
        ("KEYVAULT_URL", "https://kv.example"),
        ("KEYVAULT_SECRET_NAME", "mysecret"),
        ("SQL_SERVER_FQDN", "db.example"),
        ("SQL_DATABASE_NAME", "salesdb"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

struct Fixture {
    source: MockSecretSource,
    database: MockDatabase,
    reporter: Arc<MemoryReporter>,
}

impl Fixture {
    async fn new() -> Self {
        let source = MockSecretSource::new();
        source.set_secret("mysecret", "s3cr3t").await;

        let database = MockDatabase::new();
        database.set_row(ProductRow::new("Bikes", "Mountain-100")).await;

        Self {
            source,
            database,
            reporter: Arc::new(MemoryReporter::new()),
        }
    }

    fn supervisor(&self, env: HashMap<String, String>) -> Supervisor {
        let env: Arc<dyn Environment> = Arc::new(env);
        Supervisor::new(self.reporter.clone())
            .with_task(SecretFetcher::new(
                env.clone(),
                self.reporter.clone(),
                self.source.factory(),
            ))
            .with_task(RecordQuerier::new(
                env,
                self.reporter.clone(),
                self.database.factory(),
            ))
    }
}

#[tokio::test(start_paused = true)]
async fn test_scenario_lines_per_cycle() {
    let fixture = Fixture::new().await;

    // Three cycles: 0s, 15s, 30s.
    fixture
        .supervisor(scenario_env())
        .run_until(tokio::time::sleep(TICK * 3 - Duration::from_millis(1)))
        .await
        .unwrap();

    let out = fixture.reporter.out_lines();
    let per_cycle = [
        "Secret: s3cr3t",
        "Category Name: Bikes, Product Name: Mountain-100",
    ];
    let mut expected: Vec<&str> = per_cycle.iter().copied().cycle().take(6).collect();
    expected.push("Shutting down...");
    assert_eq!(out, expected);

    assert_eq!(fixture.source.fetch_count(), 3);
    assert_eq!(fixture.database.connect_count(), 3);
    assert_eq!(fixture.database.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_configuration_passed_to_capabilities() {
    let fixture = Fixture::new().await;

    fixture
        .supervisor(scenario_env())
        .run_until(tokio::time::sleep(Duration::from_secs(1)))
        .await
        .unwrap();

    let kv = fixture.source.configs();
    assert_eq!(kv.len(), 1);
    assert_eq!(kv[0].vault_url, "https://kv.example");
    assert_eq!(kv[0].secret_name, "mysecret");

    let sql = fixture.database.configs();
    assert_eq!(sql.len(), 1);
    assert_eq!(sql[0].server, "db.example");
    assert_eq!(sql[0].database, "salesdb");
    assert_eq!(sql[0].port, 1433);
}

#[tokio::test(start_paused = true)]
async fn test_secret_failure_does_not_stop_query() {
    let fixture = Fixture::new().await;
    fixture
        .source
        .fail_with(ProbeError::Unreachable("kv.example".to_string()))
        .await;

    fixture
        .supervisor(scenario_env())
        .run_until(tokio::time::sleep(TICK * 2 - Duration::from_millis(1)))
        .await
        .unwrap();

    let lines = fixture.reporter.lines();
    let cycle = &lines[..2];
    assert_eq!(cycle[0].0, Channel::Err);
    assert!(cycle[0].1.starts_with("Error fetching secret mysecret: "));
    assert_eq!(
        cycle[1],
        (
            Channel::Out,
            "Category Name: Bikes, Product Name: Mountain-100".to_string()
        )
    );

    assert_eq!(fixture.database.connect_count(), 2);
    assert_eq!(fixture.reporter.err_lines().iter().filter(|l| l.starts_with("Error fetching")).count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_empty_result_emits_nothing() {
    let fixture = Fixture::new().await;
    fixture.database.clear_row().await;

    fixture
        .supervisor(scenario_env())
        .run_until(tokio::time::sleep(Duration::from_secs(1)))
        .await
        .unwrap();

    assert_eq!(
        fixture.reporter.out_lines(),
        vec!["Secret: s3cr3t", "Shutting down..."]
    );
    assert!(!fixture
        .reporter
        .err_lines()
        .iter()
        .any(|l| l.starts_with("Error")));
}

#[tokio::test(start_paused = true)]
async fn test_recovery_on_next_cycle() {
    let fixture = Fixture::new().await;
    fixture
        .database
        .fail_connect_with(ProbeError::Connect("db.example:1433 timed out".to_string()))
        .await;

    let supervisor = fixture.supervisor(scenario_env());
    let handle = tokio::spawn(
        supervisor.run_until(tokio::time::sleep(TICK * 2 - Duration::from_millis(1))),
    );

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fixture.database.connect_count(), 1);
    assert!(fixture.reporter.err_lines()[0].contains("db.example:1433 timed out"));
    assert_eq!(fixture.reporter.out_lines(), vec!["Secret: s3cr3t"]);

    fixture.database.recover().await;
    handle.await.unwrap().unwrap();

    assert_eq!(fixture.database.connect_count(), 2);
    assert_eq!(
        fixture.reporter.out_lines(),
        vec![
            "Secret: s3cr3t",
            "Secret: s3cr3t",
            "Category Name: Bikes, Product Name: Mountain-100",
            "Shutting down...",
        ]
    );
}

#[tokio::test]
async fn test_missing_variables_prevent_any_cycle() {
    let keys = [
        "KEYVAULT_URL",
        "KEYVAULT_SECRET_NAME",
        "SQL_SERVER_FQDN",
        "SQL_DATABASE_NAME",
    ];

    for missing in keys {
        let fixture = Fixture::new().await;
        let mut env = scenario_env();
        env.remove(missing);

        let result = fixture
            .supervisor(env)
            .run_until(std::future::pending())
            .await;

        assert!(result.is_err(), "expected init failure without {}", missing);
        assert_eq!(fixture.source.fetch_count(), 0);
        assert_eq!(fixture.database.connect_count(), 0);
        assert!(fixture.reporter.out_lines().is_empty());

        let errors = fixture.reporter.err_lines();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains(missing));
    }
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_in_flight_cycle() {
    let fixture = Fixture::new().await;
    fixture.source.set_delay(Duration::from_secs(5)).await;

    // Stop is requested mid-fetch; the cycle still completes.
    fixture
        .supervisor(scenario_env())
        .run_until(tokio::time::sleep(Duration::from_secs(2)))
        .await
        .unwrap();

    assert_eq!(fixture.source.fetch_count(), 1);
    assert_eq!(fixture.database.connect_count(), 1);

    let out = fixture.reporter.out_lines();
    assert_eq!(
        out,
        vec![
            "Shutting down...",
            "Secret: s3cr3t",
            "Category Name: Bikes, Product Name: Mountain-100",
        ]
    );
    assert!(fixture.reporter.err_lines().is_empty());

    // No further cycles after the supervisor returned.
    tokio::time::sleep(TICK * 4).await;
    assert_eq!(fixture.source.fetch_count(), 1);
    assert_eq!(fixture.database.connect_count(), 1);
}
