//! Pipeline tests against the in-memory backend.

use super::*;
use crate::adapters::mock::MockBackend;
use crate::config::ConnectionSettings;
use crate::error::ErrorKind;
use proptest::prelude::*;

fn descriptor() -> ConnectionDescriptor {
    ConnectionDescriptor::new("root", "password", "127.0.0.1", 3306)
}

fn all_schemas() -> SchemaFilter {
    SchemaFilter::All {
        include_system: false,
    }
}

fn assert_parity(backend: &MockBackend) {
    assert_eq!(
        backend.opened(),
        backend.closed(),
        "every opened connection must be closed"
    );
}

#[tokio::test]
async fn test_single_table_scenario() {
    let inventory = Inventory::new(MockBackend::new().with_table("test", "users", 3));

    let result = inventory.run_with(&descriptor()).await.unwrap();

    assert_eq!(result, vec![TableInfo::new(TableName::new("test", "users"), 3)]);
    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"[{"schema":"test","name":"users","num":3}]"#
    );
    assert_parity(inventory.backend());
}

#[tokio::test]
async fn test_list_tables_uses_catalog_target_and_filter() {
    let backend = MockBackend::new()
        .with_table("test", "users", 1)
        .with_table("shop", "orders", 2)
        .with_table("test", "posts", 3);
    let inventory = Inventory::new(backend);

    let tables = inventory.list_tables(&descriptor()).await.unwrap();

    assert_eq!(
        tables,
        vec![TableName::new("test", "users"), TableName::new("test", "posts")]
    );
    let targets = inventory.backend().targets();
    assert_eq!(targets.len(), 1);
    assert!(targets[0].is_catalog());
    assert_parity(inventory.backend());
}

#[tokio::test]
async fn test_single_schema_keeps_rows_the_server_matched_case_insensitively() {
    let backend = MockBackend::new()
        .folding_schema_case()
        .with_table("test", "users", 3);
    let inventory = Inventory::new(backend).with_filter(SchemaFilter::Only("TEST".to_string()));

    let result = inventory.run_with(&descriptor()).await.unwrap();

    assert_eq!(result, vec![TableInfo::new(TableName::new("test", "users"), 3)]);
    // Counting addresses the schema under the catalog's spelling.
    let targets = inventory.backend().targets();
    assert_eq!(targets.last().unwrap().database(), "test");
    assert_parity(inventory.backend());
}

#[tokio::test]
async fn test_list_tables_all_schemas_skips_system_schemas() {
    let backend = MockBackend::new()
        .with_table("test", "users", 1)
        .with_table("mysql", "user", 4)
        .with_table("shop", "orders", 2);
    let inventory = Inventory::new(backend).with_filter(all_schemas());

    let tables = inventory.list_tables(&descriptor()).await.unwrap();
    assert_eq!(
        tables,
        vec![TableName::new("test", "users"), TableName::new("shop", "orders")]
    );

    let backend = MockBackend::new()
        .with_table("test", "users", 1)
        .with_table("mysql", "user", 4);
    let inventory = Inventory::new(backend).with_filter(SchemaFilter::All {
        include_system: true,
    });
    assert_eq!(inventory.list_tables(&descriptor()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_tables_drops_duplicates_in_order() {
    let backend = MockBackend::new()
        .with_table("test", "b", 1)
        .with_table("test", "a", 1)
        .with_table("test", "b", 1);
    let inventory = Inventory::new(backend);

    let tables = inventory.list_tables(&descriptor()).await.unwrap();

    assert_eq!(tables, vec![TableName::new("test", "b"), TableName::new("test", "a")]);
}

#[tokio::test]
async fn test_catalog_refused_is_connection_error_and_counts_nothing() {
    let backend = MockBackend::new()
        .with_table("test", "users", 3)
        .refusing("information_schema");
    let inventory = Inventory::new(backend);

    let error = inventory.run_with(&descriptor()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Connection);
    assert!(inventory.backend().counted().is_empty());
    assert_eq!(inventory.backend().opened(), 0);
    assert_parity(inventory.backend());
}

#[tokio::test]
async fn test_failed_ping_closes_catalog_connection() {
    let backend = MockBackend::new()
        .with_table("test", "users", 3)
        .failing_ping();
    let inventory = Inventory::new(backend);

    let error = inventory.list_tables(&descriptor()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Connection);
    assert_eq!(inventory.backend().opened(), 1);
    assert_parity(inventory.backend());
}

#[tokio::test]
async fn test_failed_catalog_query_closes_connection() {
    let backend = MockBackend::new()
        .with_table("test", "users", 3)
        .failing_catalog_query();
    let inventory = Inventory::new(backend);

    let error = inventory.list_tables(&descriptor()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Query);
    assert_parity(inventory.backend());
}

#[tokio::test]
async fn test_fail_fast_on_second_of_three_tables() {
    for strategy in [CountStrategy::PerSchema, CountStrategy::PerTable] {
        let backend = MockBackend::new()
            .with_table("test", "a", 1)
            .with_dropped_table("test", "b")
            .with_table("test", "c", 3);
        let inventory = Inventory::new(backend).with_strategy(strategy);

        let error = inventory.run_with(&descriptor()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Query, "{:?}", strategy);
        assert_eq!(
            inventory.backend().counted(),
            vec![TableName::new("test", "a"), TableName::new("test", "b")],
            "counting must stop at the first failure ({:?})",
            strategy
        );
        assert_parity(inventory.backend());
    }
}

#[tokio::test]
async fn test_negative_count_is_decode_error() {
    let inventory = Inventory::new(MockBackend::new().with_table("test", "broken", -1));

    let error = inventory.run_with(&descriptor()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Decode);
    assert_parity(inventory.backend());
}

#[tokio::test]
async fn test_refused_schema_connection_during_count() {
    let backend = MockBackend::new()
        .with_table("test", "users", 3)
        .with_table("shop", "orders", 5)
        .refusing("shop");
    let inventory = Inventory::new(backend).with_filter(all_schemas());

    let error = inventory.run_with(&descriptor()).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Connection);
    assert_parity(inventory.backend());
}

#[tokio::test]
async fn test_per_schema_reuses_one_connection_per_schema() {
    let backend = MockBackend::new()
        .with_table("test", "a", 1)
        .with_table("shop", "b", 2)
        .with_table("test", "c", 3)
        .with_table("shop", "d", 4);
    let inventory = Inventory::new(backend).with_filter(all_schemas());
    let tables = inventory.list_tables(&descriptor()).await.unwrap();

    let counted = inventory.count_rows(&descriptor(), &tables).await.unwrap();

    let names: Vec<&str> = counted.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c", "d"]);
    // One catalog connection plus one per distinct schema.
    assert_eq!(inventory.backend().opened(), 3);
    assert_parity(inventory.backend());
}

#[tokio::test]
async fn test_per_table_opens_one_connection_per_table() {
    let backend = MockBackend::new()
        .with_table("test", "a", 1)
        .with_table("test", "b", 2);
    let inventory = Inventory::new(backend).with_strategy(CountStrategy::PerTable);
    let tables = inventory.list_tables(&descriptor()).await.unwrap();

    inventory.count_rows(&descriptor(), &tables).await.unwrap();

    assert_eq!(inventory.backend().opened(), 3);
    let schema_targets: Vec<String> = inventory.backend().targets()[1..]
        .iter()
        .map(|t| t.database().to_string())
        .collect();
    assert_eq!(schema_targets, ["test", "test"]);
    assert_parity(inventory.backend());
}

#[tokio::test]
async fn test_empty_catalog_yields_empty_result() {
    let inventory = Inventory::new(MockBackend::new());

    let result = inventory.run_with(&descriptor()).await.unwrap();

    assert!(result.is_empty());
    assert_eq!(serde_json::to_string(&result).unwrap(), "[]");
    assert_parity(inventory.backend());
}

#[tokio::test]
async fn test_run_is_idempotent() {
    let backend = MockBackend::new()
        .with_table("test", "users", 3)
        .with_table("test", "posts", 10);
    let inventory = Inventory::new(backend);

    let first = inventory.run_with(&descriptor()).await.unwrap();
    let second = inventory.run_with(&descriptor()).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_port_override() {
    let config = Config {
        connection: ConnectionSettings {
            port: 3306,
            ..ConnectionSettings::default()
        },
        ..Config::default()
    };

    let inventory = Inventory::new(MockBackend::new().with_table("test", "users", 3));
    inventory.run(&config, 0).await.unwrap();
    assert!(inventory.backend().targets().iter().all(|t| t.port() == 3306));

    let inventory = Inventory::new(MockBackend::new().with_table("test", "users", 3));
    inventory.run(&config, 3307).await.unwrap();
    assert!(inventory.backend().targets().iter().all(|t| t.port() == 3307));
}

#[tokio::test]
async fn test_test_connection() {
    let inventory = Inventory::new(MockBackend::new());
    inventory.test_connection(&descriptor()).await.unwrap();
    assert_eq!(inventory.backend().opened(), 1);
    assert_parity(inventory.backend());

    let inventory = Inventory::new(MockBackend::new().refusing("information_schema"));
    let error = inventory.test_connection(&descriptor()).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Connection);
}

fn table_names() -> impl Strategy<Value = Vec<(String, String, u32)>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["test", "shop", "audit"]),
            "[a-z]{1,8}",
            0u32..10_000,
        )
            .prop_map(|(schema, name, rows)| (schema.to_string(), name, rows)),
        0..12,
    )
}

proptest! {
    #[test]
    fn count_rows_preserves_length_and_order(
        entries in table_names(),
        per_table in any::<bool>(),
    ) {
        let mut backend = MockBackend::new();
        for (schema, name, rows) in &entries {
            backend = backend.with_table(schema, name, i64::from(*rows));
        }
        let strategy = if per_table { CountStrategy::PerTable } else { CountStrategy::PerSchema };
        let inventory = Inventory::new(backend).with_strategy(strategy);

        // Counted directly, without enumeration, so duplicates survive.
        let tables: Vec<TableName> = entries
            .iter()
            .map(|(schema, name, _)| TableName::new(schema.clone(), name.clone()))
            .collect();

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let counted = runtime
            .block_on(inventory.count_rows(&descriptor(), &tables))
            .unwrap();

        prop_assert_eq!(counted.len(), tables.len());
        for (info, table) in counted.iter().zip(&tables) {
            prop_assert_eq!(&info.schema, &table.schema);
            prop_assert_eq!(&info.name, &table.name);
        }
        prop_assert_eq!(inventory.backend().opened(), inventory.backend().closed());
    }
}
