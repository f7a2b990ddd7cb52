//! Builder-level tests for the qb module.

use crate::condition::{Op, Where};
use crate::error::OrmError;
use crate::qb::{
    BuildOptions, BuiltQuery, Field, InsertOptions, JoinType, OrderBy, SqlBuilder, UpdateOptions,
    UpdateValues,
};
use crate::value::{Value, row};
use serde_json::json;

fn qb() -> SqlBuilder {
    SqlBuilder::new()
}

fn assert_parity(query: &BuiltQuery) {
    assert_eq!(
        query.placeholder_count(),
        query.params.len(),
        "placeholder/param mismatch in {}",
        query.sql
    );
}

#[test]
fn test_simple_select() {
    let q = qb()
        .select(json!(["name", {"email": "email_address"}]))
        .unwrap()
        .from_as("users", "u")
        .unwrap()
        .where_(json!({"active": 1}))
        .unwrap()
        .build_query();

    assert_eq!(q.sql, "SELECT ??, ?? AS ?? FROM ?? AS ?? WHERE active = ?");
    assert_eq!(
        q.params,
        vec![
            "name".into(),
            "email".into(),
            "email_address".into(),
            "users".into(),
            "u".into(),
            1.into(),
        ]
    );
    assert_parity(&q);
}

#[test]
fn test_select_star_default() {
    let q = qb().select(Vec::<Field>::new()).unwrap().from("users").unwrap().build_query();
    assert_eq!(q.sql, "SELECT * FROM ??");
    assert_eq!(q.params, vec!["users".into()]);
}

#[test]
fn test_table_alias_in_string() {
    let q = qb().select("*").unwrap().from("users u").unwrap().build_query();
    assert_eq!(q.sql, "SELECT * FROM ?? AS ??");
    assert_eq!(q.params, vec!["users".into(), "u".into()]);
}

#[test]
fn test_nested_where() {
    let q = qb()
        .select("*")
        .unwrap()
        .from("users")
        .unwrap()
        .where_(json!({
            "AND": [
                {"age": {">": 18}},
                {"OR": [{"status": "active"}, {"status": "pending"}]}
            ]
        }))
        .unwrap()
        .build_query();

    assert_eq!(
        q.sql,
        "SELECT * FROM ?? WHERE (age > ?) AND ((status = ?) OR (status = ?))"
    );
    assert_eq!(
        q.params,
        vec!["users".into(), 18.into(), "active".into(), "pending".into()]
    );
}

#[test]
fn test_field_dedup_is_idempotent() {
    let a = qb()
        .select(json!(["a", "a", {"a": "x"}]))
        .unwrap()
        .from("t")
        .unwrap()
        .build_query();
    let b = qb()
        .select(json!(["a", {"a": "x"}]))
        .unwrap()
        .from("t")
        .unwrap()
        .build_query();
    assert_eq!(a, b);
}

#[test]
fn test_full_select_clause_order() {
    let q = qb()
        .select(["u.*", "o.total"])
        .unwrap()
        .from("users u")
        .unwrap()
        .join(JoinType::Left, "orders o", "o.user_id = u.id")
        .unwrap()
        .join_as(JoinType::Inner, "teams", "t", "t.id = u.team_id")
        .unwrap()
        .where_(Where::new().op("u.age", Op::gte(18)))
        .unwrap()
        .group_by(["u.id"])
        .order_by([OrderBy::desc("u.ctime"), OrderBy::asc("u.id")])
        .limit(20)
        .offset(40)
        .build_query();

    assert_eq!(
        q.sql,
        "SELECT u.*, ?? FROM ?? AS ?? LEFT JOIN ?? AS ?? ON o.user_id = u.id \
         INNER JOIN ?? AS ?? ON t.id = u.team_id WHERE u.age >= ? GROUP BY ?? \
         ORDER BY ?? DESC, ?? ASC LIMIT ? OFFSET ?"
    );
    assert_eq!(
        q.params,
        vec![
            "o.total".into(),
            "users".into(),
            "u".into(),
            "orders".into(),
            "o".into(),
            "teams".into(),
            "t".into(),
            18.into(),
            "u.id".into(),
            "u.ctime".into(),
            "u.id".into(),
            Value::UInt(20),
            Value::UInt(40),
        ]
    );
    assert_parity(&q);
}

#[test]
fn test_optional_clauses_can_be_skipped() {
    let q = qb()
        .select("id")
        .unwrap()
        .from("users")
        .unwrap()
        .order_by(["id"])
        .limit(None::<u64>)
        .build_query();
    assert_eq!(q.sql, "SELECT ?? FROM ?? ORDER BY ?? ASC");
    assert_parity(&q);

    let q = qb()
        .select("id")
        .unwrap()
        .from("users")
        .unwrap()
        .order_by(Vec::<OrderBy>::new())
        .build_query();
    assert_eq!(q.sql, "SELECT ?? FROM ??");
}

#[test]
fn test_empty_where_on_select_adds_nothing() {
    let q = qb()
        .select("*")
        .unwrap()
        .from("users")
        .unwrap()
        .where_(json!({}))
        .unwrap()
        .build_query();
    assert_eq!(q.sql, "SELECT * FROM ??");
}

#[test]
fn test_aggregates() {
    let q = qb().count("*", None).from("users").unwrap().build_query();
    assert_eq!(q.sql, "SELECT COUNT(*) FROM ??");

    let q = qb()
        .count("id", Some("total"))
        .from("users")
        .unwrap()
        .where_(json!({"active": 1}))
        .unwrap()
        .build_query();
    assert_eq!(q.sql, "SELECT COUNT(??) AS ?? FROM ?? WHERE active = ?");
    assert_eq!(
        q.params,
        vec!["id".into(), "total".into(), "users".into(), 1.into()]
    );

    let q = qb().max("price", Some("top")).from("products").unwrap().build_query();
    assert_eq!(q.sql, "SELECT MAX(??) AS ?? FROM ??");

    for (q, func) in [
        (qb().min("price", None), "MIN"),
        (qb().avg("price", None), "AVG"),
        (qb().sum("price", None), "SUM"),
    ] {
        let built = q.from("products").unwrap().build_query();
        assert_eq!(built.sql, format!("SELECT {func}(??) FROM ??"));
        assert_eq!(built.params, vec!["price".into(), "products".into()]);
    }
}

#[test]
fn test_update_with_set_and_where() {
    let q = qb()
        .update("accounts")
        .unwrap()
        .set(json!({"name": "bob", "balance": {"increment": 5}}))
        .unwrap()
        .where_(json!({"id": 7}))
        .unwrap()
        .build_query();

    assert_eq!(
        q.sql,
        "UPDATE ?? SET ?? = ?, ?? = ?? + ? WHERE id = ?"
    );
    assert_eq!(
        q.params,
        vec![
            "accounts".into(),
            "name".into(),
            "bob".into(),
            "balance".into(),
            "balance".into(),
            5.into(),
            7.into(),
        ]
    );
    assert_parity(&q);
}

#[test]
fn test_update_with_options_and_limit() {
    let options = UpdateOptions::new()
        .with_timestamps(true)
        .with_utime_value(crate::qb::Timestamp::fixed(1_700_000_000))
        .with_primary_key("id");
    let q = qb()
        .update_with("users", UpdateValues::new().set("id", 3).set("name", "z"), &options)
        .unwrap()
        .where_(Where::new().eq("id", 3))
        .unwrap()
        .order_by(["id"])
        .limit(1)
        .build_query();

    assert_eq!(
        q.sql,
        "UPDATE ?? SET ?? = ?, ?? = ? WHERE id = ? ORDER BY ?? ASC LIMIT ?"
    );
    assert_eq!(
        q.params,
        vec![
            "users".into(),
            "name".into(),
            "z".into(),
            "utime".into(),
            1_700_000_000.into(),
            3.into(),
            "id".into(),
            Value::UInt(1),
        ]
    );
}

#[test]
fn test_increment_conflict() {
    let err = qb()
        .update("accounts")
        .unwrap()
        .set(json!({"balance": {"increment": 5, "decrement": 3}}))
        .unwrap_err();
    assert!(matches!(err, OrmError::ConflictingSentinel(_)));
}

#[test]
fn test_empty_set_is_rejected() {
    let err = qb().update("users").unwrap().set(json!({})).unwrap_err();
    assert!(err.is_empty_payload());
}

#[test]
fn test_delete_guard() {
    let err = qb().delete_from("users").unwrap().where_(json!({})).unwrap_err();
    assert!(err.is_empty_payload());

    let err = qb()
        .update("users")
        .unwrap()
        .set(json!({"a": 1}))
        .unwrap()
        .where_(Where::new())
        .unwrap_err();
    assert!(err.is_empty_payload());
}

#[test]
fn test_delete_with_order_and_limit() {
    let q = qb()
        .delete_from("logs")
        .unwrap()
        .where_(json!({"level": {"IN": ["debug", "trace"]}}))
        .unwrap()
        .order_by([OrderBy::asc("ctime")])
        .limit(100)
        .build_query();
    assert_eq!(
        q.sql,
        "DELETE FROM ?? WHERE level IN (?, ?) ORDER BY ?? ASC LIMIT ?"
    );
    assert_parity(&q);

    // Omitting where is the explicit full-table form.
    let q = qb().delete_from("logs").unwrap().build_query();
    assert_eq!(q.sql, "DELETE FROM ??");
}

#[test]
fn test_multi_row_insert() {
    let q = qb()
        .insert("users", json!([{"name": "a"}, {"name": "b"}]), &InsertOptions::new())
        .unwrap()
        .build_query();
    assert_eq!(q.sql, "INSERT INTO ?? (??) VALUES (?), (?)");
    assert_eq!(
        q.params,
        vec!["users".into(), "name".into(), "a".into(), "b".into()]
    );
    assert_parity(&q);
}

#[test]
fn test_insert_single_row_with_duplicate_update() {
    let options = InsertOptions::new()
        .with_on_duplicate_key_update(row([("visits", Value::from(1))]));
    let q = qb()
        .insert("stats", row([("page", "home".into()), ("visits", 1.into())]), &options)
        .unwrap()
        .build_query();
    assert_eq!(
        q.sql,
        "INSERT INTO ?? (??, ??) VALUES (?, ?) ON DUPLICATE KEY UPDATE ?? = ?"
    );
    assert_parity(&q);
}

#[test]
fn test_missing_table_name() {
    assert!(matches!(
        qb().select("*").unwrap().from("").unwrap_err(),
        OrmError::MissingTableName(_)
    ));
    assert!(matches!(qb().update(" ").unwrap_err(), OrmError::MissingTableName(_)));
    assert!(matches!(qb().delete_from("").unwrap_err(), OrmError::MissingTableName(_)));
    assert!(matches!(
        qb().insert("", json!({"a": 1}), &InsertOptions::new()).unwrap_err(),
        OrmError::MissingTableName(_)
    ));
}

#[test]
fn test_where_errors_are_raised_at_the_call() {
    let from = || qb().select("*").unwrap().from("users").unwrap();

    assert!(matches!(
        from().where_(json!({"age": {"BETWEEN": [18]}})).unwrap_err(),
        OrmError::InvalidArity(_)
    ));
    assert!(matches!(
        from().where_(json!({"id": {"IN": []}})).unwrap_err(),
        OrmError::EmptyArrayCondition(_)
    ));
    assert!(matches!(
        from().where_(json!({"id": {"LIKEWISE": 1}})).unwrap_err(),
        OrmError::UnsupportedOperator(_)
    ));
}

#[test]
fn test_format_option() {
    let q = qb()
        .select(json!(["name"]))
        .unwrap()
        .from("users")
        .unwrap()
        .where_(json!({"name": "O'Brien"}))
        .unwrap()
        .build_query_with(BuildOptions::new().with_format(true));
    assert_eq!(q.sql, "SELECT `name` FROM `users` WHERE name = 'O\\'Brien'");
    assert!(q.params.is_empty());
}

#[test]
fn test_built_query_destructures() {
    let (sql, params) = qb()
        .delete_from("users")
        .unwrap()
        .where_(json!({"id": 1}))
        .unwrap()
        .build_query()
        .into_parts();
    assert_eq!(sql, "DELETE FROM ?? WHERE id = ?");
    assert_eq!(params, vec!["users".into(), 1.into()]);
}
