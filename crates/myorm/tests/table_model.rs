//! Table models loaded from TOML and run against a recording executor.

use myorm::{
    DatabaseOptions, DatabaseRegistry, FindAll, ModelsFile, OrderBy, OrmError, QueryOutput,
    SharedExecutor, SoftDeleteOptions, TableModel, Timestamp, Value, Where, executor_fn, row,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

const MODELS: &str = r#"
[[tables]]
table_name = "users"
primary_key = "id"
columns = ["id", "name", "email", "ctime", "utime", "deleted"]

[tables.central_fields]
is_deleted_field = "deleted"

[[tables]]
table_name = "orders"
primary_key = "order_id"
columns = ["order_id", "user_id", "total"]
"#;

type Calls = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

fn recording() -> (SharedExecutor, Calls) {
    let calls: Calls = Arc::default();
    let seen = calls.clone();
    let exec = executor_fn(move |sql, params| {
        seen.lock().unwrap().push((sql, params));
        async {
            Ok::<_, OrmError>(QueryOutput::Write {
                affected_rows: 1,
                insert_id: None,
            })
        }
    });
    (exec, calls)
}

fn users(exec: SharedExecutor) -> TableModel {
    let file = ModelsFile::from_toml_str(MODELS).unwrap();
    TableModel::new(file.table("users").unwrap().clone(), Some(exec)).unwrap()
}

#[tokio::test]
async fn find_one_and_find_all() {
    let (exec, calls) = recording();
    let model = users(exec);

    model
        .find_one(["id", "name"], json!({"email": "a@b.c"}), vec![])
        .unwrap()
        .execute_query()
        .await
        .unwrap();

    model
        .find_all(
            FindAll::new()
                .with_condition(Where::new().eq("deleted", 0))
                .with_order_by(vec![OrderBy::desc("ctime")])
                .with_limit(20)
                .with_offset(40),
        )
        .unwrap()
        .execute_query()
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].0, "SELECT ??, ?? FROM ?? WHERE email = ? LIMIT ?");
    assert_eq!(
        calls[1].0,
        "SELECT * FROM ?? WHERE deleted = ? ORDER BY ?? DESC LIMIT ? OFFSET ?"
    );
    assert_eq!(
        calls[1].1,
        vec![
            "users".into(),
            0.into(),
            "ctime".into(),
            Value::UInt(20),
            Value::UInt(40),
        ]
    );
}

#[tokio::test]
async fn insert_record_fills_timestamps_from_central_fields() {
    let (exec, calls) = recording();
    let model = users(exec);
    let options = model
        .insert_options()
        .with_ctime_value(Timestamp::fixed(1_700_000_000))
        .with_utime_value(Timestamp::fixed(1_700_000_000))
        .with_timestamps(true);

    model
        .insert_record(row([("name", Value::from("ada")), ("nickname", Value::from("countess"))]), &options)
        .unwrap()
        .execute_query()
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].0, "INSERT INTO ?? (??, ??, ??) VALUES (?, ?, ?)");
    assert_eq!(
        calls[0].1,
        vec![
            "users".into(),
            "name".into(),
            "ctime".into(),
            "utime".into(),
            "ada".into(),
            1_700_000_000.into(),
            1_700_000_000.into(),
        ]
    );
}

#[tokio::test]
async fn soft_delete_uses_configured_column() {
    let (exec, calls) = recording();
    let model = users(exec);

    let out = model
        .soft_delete_one(json!({"id": 3}), 1, &SoftDeleteOptions::new())
        .unwrap()
        .execute_query()
        .await
        .unwrap();
    assert_eq!(out.affected_rows(), 1);

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].0, "UPDATE ?? SET ?? = ? WHERE id = ? LIMIT ?");
    assert_eq!(calls[0].1[1], Value::from("deleted"));
}

#[tokio::test]
async fn guarded_operations_never_reach_the_executor() {
    let (exec, calls) = recording();
    let model = users(exec);

    assert!(model.remove(json!({})).unwrap_err().is_empty_payload());
    assert!(
        model
            .update_all(json!({"id": 1}), json!({"id": 1}), &model.update_options())
            .unwrap_err()
            .is_empty_payload()
    );
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn registry_hands_out_table_models() {
    let registry = DatabaseRegistry::new();
    let (exec, calls) = recording();
    let db = registry.register("shop", exec, &DatabaseOptions::new());

    let file = ModelsFile::from_toml_str(MODELS).unwrap();
    let orders = db.table_model(file.table("orders").unwrap().clone()).unwrap();
    assert_eq!(orders.primary_key(), "order_id");

    orders
        .update_one(
            json!({"order_id": 8, "total": {"increment": 5}}),
            json!({"order_id": 8}),
            &orders.update_options(),
        )
        .unwrap()
        .execute_query()
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(
        calls[0].0,
        "UPDATE ?? SET ?? = ?? + ? WHERE order_id = ? LIMIT ?"
    );
}
