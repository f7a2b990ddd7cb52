//! Statements running through an injected executor.

use myorm::{
    Database, DatabaseOptions, DatabaseRegistry, LoggingExecutor, OrmError, QueryExecutor,
    QueryOutput, SharedExecutor, SqlBuilder, Value, executor_fn, row,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

type Calls = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

/// An executor that records every call and answers with `output`.
fn recording(output: QueryOutput) -> (SharedExecutor, Calls) {
    let calls: Calls = Arc::default();
    let seen = calls.clone();
    let exec = executor_fn(move |sql, params| {
        seen.lock().unwrap().push((sql, params));
        let output = output.clone();
        async move { Ok::<_, OrmError>(output) }
    });
    (exec, calls)
}

#[tokio::test]
async fn select_hands_sql_and_params_to_executor() {
    let rows = vec![row([("id", Value::from(1)), ("name", Value::from("ada"))])];
    let (exec, calls) = recording(QueryOutput::Rows(rows.clone()));

    let out = SqlBuilder::with_executor(exec)
        .select(["id", "name"])
        .unwrap()
        .from("users")
        .unwrap()
        .where_(json!({"age": {">=": 18}}))
        .unwrap()
        .execute_query()
        .await
        .unwrap();

    assert_eq!(out.into_rows(), rows);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "SELECT ??, ?? FROM ?? WHERE age >= ?");
    assert_eq!(
        calls[0].1,
        vec!["id".into(), "name".into(), "users".into(), 18.into()]
    );
}

#[tokio::test]
async fn write_output_is_returned_unchanged() {
    let (exec, calls) = recording(QueryOutput::Write {
        affected_rows: 2,
        insert_id: Some(41),
    });

    let out = SqlBuilder::with_executor(exec)
        .insert(
            "users",
            json!([{"name": "a"}, {"name": "b"}]),
            &Default::default(),
        )
        .unwrap()
        .execute_query()
        .await
        .unwrap();

    assert_eq!(out.affected_rows(), 2);
    assert_eq!(out.insert_id(), Some(41));
    assert_eq!(
        calls.lock().unwrap()[0].0,
        "INSERT INTO ?? (??) VALUES (?), (?)"
    );
}

#[tokio::test]
async fn missing_executor_is_a_configuration_error() {
    let err = SqlBuilder::new()
        .delete_from("sessions")
        .unwrap()
        .where_(json!({"id": 1}))
        .unwrap()
        .execute_query()
        .await
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("No query executor configured"));
}

#[tokio::test]
async fn executor_errors_propagate() {
    let exec = executor_fn(|_, _| async { Err::<QueryOutput, _>(OrmError::execution("connection reset")) });
    let err = SqlBuilder::with_executor(exec)
        .select("*")
        .unwrap()
        .from("t")
        .unwrap()
        .execute_query()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Execution(_)));
}

#[tokio::test]
async fn per_query_executor_overrides_builder() {
    let (first, first_calls) = recording(QueryOutput::Rows(vec![]));
    let (second, second_calls) = recording(QueryOutput::Rows(vec![]));

    SqlBuilder::with_executor(first)
        .select("*")
        .unwrap()
        .from("t")
        .unwrap()
        .with_executor(second)
        .execute_query()
        .await
        .unwrap();

    assert!(first_calls.lock().unwrap().is_empty());
    assert_eq!(second_calls.lock().unwrap().len(), 1);
}

/// Shared buffer the fmt subscriber writes into.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

#[tokio::test]
async fn logging_executor_emits_truncated_statement() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (inner, calls) = recording(QueryOutput::Rows(vec![]));
    let logged = LoggingExecutor::new(inner)
        .connection("reporting")
        .level(tracing::Level::INFO)
        .max_sql_length(16);

    logged
        .execute("SELECT * FROM ?? WHERE id = ?", &["users".into(), 7.into()])
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].0, "SELECT * FROM ?? WHERE id = ?");
    assert_eq!(calls[0].1, vec!["users".into(), 7.into()]);

    let output = captured.contents();
    let line = output
        .lines()
        .find(|l| l.contains("myorm.sql"))
        .unwrap_or_else(|| panic!("no statement event in {output:?}"));
    assert!(line.contains("INFO"), "{line}");
    assert!(line.contains("connection=reporting"), "{line}");
    assert!(line.contains("param_count=2"), "{line}");
    assert!(line.contains("sql=SELECT * FROM `u..."), "{line}");
    assert!(!line.contains("WHERE"), "{line}");
}

#[tokio::test]
async fn registry_runs_statements_by_name() {
    let registry = DatabaseRegistry::new();
    let (exec, calls) = recording(QueryOutput::Write {
        affected_rows: 1,
        insert_id: None,
    });
    registry.register("main", exec, &DatabaseOptions::new().with_verbose(true));

    let db = registry.get("main").unwrap();
    let out = db
        .builder()
        .update("accounts")
        .unwrap()
        .set(json!({"balance": {"increment": 5}}))
        .unwrap()
        .where_(json!({"id": 9}))
        .unwrap()
        .execute_query()
        .await
        .unwrap();
    assert_eq!(out.affected_rows(), 1);

    db.execute("SELECT 1", &[]).await.unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].0, "UPDATE ?? SET ?? = ?? + ? WHERE id = ?");
    assert_eq!(calls[1].0, "SELECT 1");

    assert!(registry.get("missing").unwrap_err().is_configuration());
}

#[tokio::test]
async fn database_without_logging_uses_executor_directly() {
    let (exec, calls) = recording(QueryOutput::Rows(vec![]));
    let db = Database::new("plain", exec, &DatabaseOptions::new().with_verbose(false));
    assert_eq!(db.name(), "plain");
    db.execute("SELECT ?", &[1.into()]).await.unwrap();
    assert_eq!(calls.lock().unwrap().len(), 1);
}
