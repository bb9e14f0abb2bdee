use super::*;
use crate::error::OrmError;
use crate::pagination::LinkStyle;
use crate::test_support::{MockConnection, User, db_with, int, row, text};
use crate::value::IntoValue;

fn db() -> (MockConnection, Db) {
    let conn = MockConnection::new();
    let db = db_with(&conn);
    (conn, db)
}

fn placeholder_count(sql: &str) -> usize {
    sql.matches('?').count()
}

#[test]
fn test_select_basic() {
    let (_, db) = db();
    assert_eq!(db.table("users").to_sql().unwrap(), "SELECT * FROM users");
}

#[test]
fn test_select_full_clause_order() {
    let (_, db) = db();
    let qb = db
        .table("users")
        .alias("u")
        .add_table("teams t")
        .select(&["u.id", "count(t.id) AS teams"])
        .left_join("profiles p", "p.user_id = u.id")
        .where_("u.status", "active")
        .group_by(&["u.id"])
        .having_op("count(t.id)", ">", 2)
        .order_by("u.id", Order::Desc)
        .limit(5, 10);

    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT u.id, count(t.id) AS teams FROM users AS u, teams t \
         LEFT JOIN profiles p ON p.user_id = u.id WHERE u.status = ? \
         GROUP BY u.id HAVING count(t.id) > ? ORDER BY u.id DESC LIMIT 5 OFFSET 10"
    );
    assert_eq!(qb.bind_values().unwrap(), vec![text("active"), int(2)]);
}

#[test]
fn test_where_variants() {
    let (_, db) = db();
    let qb = db
        .table("users")
        .where_("a", 1)
        .and_op("b", ">=", 2)
        .or("c", 3)
        .and_not("d", 4)
        .where_raw("e IS NOT NULL");

    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT * FROM users WHERE a = ? AND b >= ? OR c = ? AND NOT d = ? AND e IS NOT NULL"
    );
    assert_eq!(qb.bind_values().unwrap(), vec![int(1), int(2), int(3), int(4)]);
}

#[test]
fn test_leading_not() {
    let (_, db) = db();
    let qb = db.table("users").not("banned", true);
    assert_eq!(qb.to_sql().unwrap(), "SELECT * FROM users WHERE NOT banned = ?");
}

#[test]
fn test_in_and_not_in() {
    let (_, db) = db();
    let qb = db
        .table("users")
        .in_list("id", [1, 2, 3])
        .and_not_in("status", ["banned"])
        .or_in("role", vec!["admin".to_string()]);

    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT * FROM users WHERE id IN (?, ?, ?) AND status NOT IN (?) OR role IN (?)"
    );
    assert_eq!(
        qb.bind_values().unwrap(),
        vec![int(1), int(2), int(3), text("banned"), text("admin")]
    );
}

#[test]
fn test_empty_in_lists_render_constants() {
    let (_, db) = db();
    let empty: Vec<i64> = Vec::new();
    let qb = db
        .table("users")
        .in_list("id", empty.clone())
        .not_in("id", empty);
    assert_eq!(qb.to_sql().unwrap(), "SELECT * FROM users WHERE 1 = 0 AND 1 = 1");
    assert!(qb.bind_values().unwrap().is_empty());
}

#[test]
fn test_between_is_parameterized() {
    let (_, db) = db();
    let qb = db
        .table("orders")
        .between("total", 10, 20)
        .not_between("id", 100, 200);
    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT * FROM orders WHERE total BETWEEN ? AND ? AND id NOT BETWEEN ? AND ?"
    );
    assert_eq!(
        qb.bind_values().unwrap(),
        vec![int(10), int(20), int(100), int(200)]
    );
}

#[test]
fn test_placeholders_match_binds() {
    let (_, db) = db();
    let qb = db
        .table("users")
        .where_("a", 1)
        .or_op("b", "<", 2)
        .in_list("c", [3, 4, 5])
        .not_in("d", Vec::<i64>::new())
        .and_in("e", ["x", "y"])
        .between("f", 1, 9)
        .group_by(&["a"])
        .having("count(*)", 2)
        .or_having_op("sum(f)", ">", 100);

    let sql = qb.to_sql().unwrap();
    let binds = qb.bind_values().unwrap();
    assert_eq!(placeholder_count(&sql), binds.len());
    assert_eq!(
        binds,
        vec![
            int(1),
            int(2),
            int(3),
            int(4),
            int(5),
            text("x"),
            text("y"),
            int(1),
            int(9),
            int(2),
            int(100)
        ]
    );
}

#[test]
fn test_having_joins_with_or() {
    let (_, db) = db();
    let qb = db
        .table("orders")
        .select(&["user_id"])
        .group_by(&["user_id"])
        .having("count(*)", 1)
        .or_having_raw("sum(total) > 1000");
    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT user_id FROM orders GROUP BY user_id HAVING count(*) = ? OR sum(total) > 1000"
    );
}

#[test]
fn test_insert_update_delete_forms() {
    let (_, db) = db();

    let insert = db
        .table("users")
        .values([("name", "alice".into_value()), ("age", 30i64.into_value())]);
    assert_eq!(insert.to_sql().unwrap(), "INSERT INTO users (name, age) VALUES (?, ?)");
    assert_eq!(insert.statement_kind(), StatementKind::Insert);

    let update = db
        .table("users")
        .where_("id", 7)
        .set([("name", "bob".into_value())])
        .set_increment("visits", 1);
    assert_eq!(
        update.to_sql().unwrap(),
        "UPDATE users SET name = ?, visits = visits + ? WHERE id = ?"
    );
    // SET values come before WHERE values.
    assert_eq!(update.bind_values().unwrap(), vec![text("bob"), int(1), int(7)]);

    let delete = db.table("users").where_("id", 7).mark_delete();
    assert_eq!(delete.to_sql().unwrap(), "DELETE FROM users WHERE id = ?");
}

#[test]
fn test_conflicting_verbs_are_rejected() {
    let (conn, db) = db();
    let err = db
        .table("users")
        .set([("name", "x".into_value())])
        .insert([("name", "y".into_value())])
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(_)));
    assert!(conn.statements().is_empty());
}

#[test]
fn test_delete_rejects_grouping_and_limit() {
    let (conn, db) = db();
    let err = db
        .table("t")
        .group_by(&["grp"])
        .having_op("grp", "=", 3)
        .delete()
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(ref msg) if msg.contains("GROUP BY")));

    let err = db.table("t").having_op("grp", "=", 3).delete().unwrap_err();
    assert!(matches!(err, OrmError::Query(ref msg) if msg.contains("HAVING")));

    let err = db.table("t").where_op("id", ">", 0).limit(1, 0).delete().unwrap_err();
    assert!(matches!(err, OrmError::Query(ref msg) if msg.contains("LIMIT")));

    let err = db
        .table("t")
        .order_by("id", Order::Desc)
        .mark_delete()
        .to_sql()
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(ref msg) if msg.contains("ORDER BY")));

    assert!(conn.statements().is_empty());
}

#[test]
fn test_update_rejects_joins_and_extra_tables() {
    let (conn, db) = db();
    let err = db
        .table("t")
        .inner_join("other o", "o.id = t.other_id")
        .where_("o.grp", 3)
        .update([("grp", 4i64.into_value())])
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(ref msg) if msg.contains("JOIN")));

    let err = db
        .table("t")
        .add_table("other")
        .set([("grp", 4i64.into_value())])
        .to_sql()
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(ref msg) if msg.contains("FROM tables")));

    let err = db
        .table("t")
        .alias("x")
        .set([("grp", 4i64.into_value())])
        .to_sql()
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(ref msg) if msg.starts_with("UPDATE")));

    assert!(conn.statements().is_empty());
}

#[test]
fn test_insert_rejects_select_clauses() {
    let (conn, db) = db();
    let err = db
        .table("t")
        .group_by(&["grp"])
        .insert([("grp", 1i64.into_value())])
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(ref msg) if msg.starts_with("INSERT")));

    let err = db
        .table("t")
        .select(&["grp"])
        .distinct()
        .values([("grp", 1i64.into_value())])
        .to_sql()
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(_)));

    let err = db
        .table("t")
        .left_join("other o", "o.id = t.other_id")
        .insert([("grp", 1i64.into_value())])
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(_)));

    assert!(conn.statements().is_empty());
}

#[test]
fn test_scopes_refine_entity_queries() {
    let (_, db) = db();
    let qb = db
        .query::<User>()
        .scope("named")
        .where_op("id", ">", 3)
        .scope("newest");
    assert_eq!(
        qb.to_sql().unwrap(),
        "SELECT * FROM users WHERE name != ? AND id > ? ORDER BY id DESC"
    );
    assert_eq!(qb.bind_values().unwrap(), vec![text(""), int(3)]);
}

#[test]
fn test_unknown_scope_is_typed_error() {
    let (conn, db) = db();
    let err = db.query::<User>().scope("archived").get().unwrap_err();
    assert!(matches!(
        err,
        OrmError::ScopeNotFound { ref entity, ref scope } if entity == "users" && scope == "archived"
    ));
    assert!(conn.statements().is_empty());

    let bare = Db::new(conn.clone());
    let err = bare.query::<User>().scope("named").to_sql().unwrap_err();
    assert!(matches!(err, OrmError::ModelResolution(_)));
}

#[test]
fn test_missing_table_is_query_error() {
    let (_, db) = db();
    assert!(matches!(db.builder().to_sql(), Err(OrmError::Query(_))));
    assert!(matches!(db.builder().get(), Err(OrmError::Query(_))));
}

#[test]
fn test_negative_limit_is_invalid_parameter() {
    let (conn, db) = db();
    let err = db.table("users").limit(-1, 0).get().unwrap_err();
    assert!(matches!(err, OrmError::InvalidParameter(_)));
    assert!(conn.statements().is_empty());

    let err = db.table("users").limit(5, -3).to_sql().unwrap_err();
    assert!(matches!(err, OrmError::InvalidParameter(_)));
}

#[test]
fn test_unknown_operator_is_invalid_parameter() {
    let (_, db) = db();
    let err = db.table("users").where_op("id", "; DROP", 1).to_sql().unwrap_err();
    assert!(matches!(err, OrmError::InvalidParameter(_)));
    assert!(
        db.table("users")
            .where_op("name", "like", "a%")
            .to_sql()
            .unwrap()
            .ends_with("name LIKE ?")
    );
}

#[test]
fn test_mysql_limit_rendering() {
    let conn = MockConnection::mysql();
    let db = db_with(&conn);
    assert_eq!(
        db.table("users").limit(0, 20).to_sql().unwrap(),
        "SELECT * FROM users LIMIT 18446744073709551615 OFFSET 20"
    );
}

#[test]
fn test_get_executes_with_binds() {
    let (conn, db) = db();
    conn.push_rows(vec![row([("id", int(2))]), row([("id", int(3))])]);

    let rows = db
        .table("users")
        .where_op("id", ">", 1)
        .order_by("id", Order::Asc)
        .get()
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(
        conn.statements(),
        vec![(
            "SELECT * FROM users WHERE id > ? ORDER BY id ASC".to_string(),
            vec![int(1)]
        )]
    );
}

#[test]
fn test_insert_returns_last_id() {
    let (conn, db) = db();
    let id = db
        .table("users")
        .insert([("name", "alice".into_value())])
        .unwrap();
    assert_eq!(id, 42);
    assert_eq!(conn.sql_log(), vec!["INSERT INTO users (name) VALUES (?)"]);
}

#[test]
fn test_increment_and_decrement() {
    let (conn, db) = db();
    db.table("posts").where_("id", 1).increment("views", 5).unwrap();
    db.table("posts").where_("id", 1).decrement("stock", 2).unwrap();
    assert_eq!(
        conn.statements(),
        vec![
            (
                "UPDATE posts SET views = views + ? WHERE id = ?".to_string(),
                vec![int(5), int(1)]
            ),
            (
                "UPDATE posts SET stock = stock - ? WHERE id = ?".to_string(),
                vec![int(2), int(1)]
            ),
        ]
    );
}

#[test]
fn test_execute_requires_mutation() {
    let (_, db) = db();
    assert!(matches!(db.table("users").execute(), Err(OrmError::Query(_))));
    assert!(matches!(
        db.table("users").mark_delete().get(),
        Err(OrmError::Query(_))
    ));
}

#[test]
fn test_count_sql() {
    let (conn, db) = db();
    conn.push_rows(vec![row([("total", int(7))])]);
    let total = db
        .table("users")
        .where_("active", true)
        .order_by("id", Order::Asc)
        .limit(3, 0)
        .count()
        .unwrap();
    assert_eq!(total, 7);
    assert_eq!(
        conn.sql_log(),
        vec!["SELECT count(*) AS total FROM users WHERE active = ?"]
    );
}

#[test]
fn test_grouped_count_uses_derived_table() {
    let (conn, db) = db();
    conn.push_rows(vec![row([("total", int(2))])]);
    db.table("orders")
        .select(&["user_id"])
        .group_by(&["user_id"])
        .count()
        .unwrap();
    assert_eq!(
        conn.sql_log(),
        vec![
            "SELECT count(*) AS total FROM (SELECT user_id FROM orders GROUP BY user_id) AS counted"
        ]
    );
}

#[test]
fn test_first_and_last_order_by_key() {
    let (conn, db) = db();
    db.table("users").first(2).unwrap();
    db.query::<User>().last(1).unwrap();
    assert_eq!(
        conn.sql_log(),
        vec![
            "SELECT * FROM users ORDER BY id ASC LIMIT 2",
            "SELECT * FROM users ORDER BY id DESC LIMIT 1",
        ]
    );
}

#[test]
fn test_lists_pairs_key_and_value() {
    let (conn, db) = db();
    conn.push_rows(vec![
        row([("id", int(1)), ("name", text("a"))]),
        row([("id", int(2)), ("name", text("b"))]),
    ]);
    let pairs = db.table("users").lists_with_key("name", "id").unwrap();
    assert_eq!(pairs, vec![(int(1), text("a")), (int(2), text("b"))]);
    assert_eq!(conn.sql_log(), vec!["SELECT id, name FROM users"]);
}

#[test]
fn test_lists_defaults_key_to_key_column() {
    let (conn, db) = db();
    conn.push_rows(vec![row([("id", int(3)), ("name", text("c"))])]);
    conn.push_rows(vec![row([("email", text("d@x")), ("name", text("d"))])]);

    let pairs = db.query::<User>().lists("name").unwrap();
    assert_eq!(pairs, vec![(int(3), text("c"))]);

    let by_email = db.table("users").lists_with_key("name", "email").unwrap();
    assert_eq!(by_email, vec![(text("d@x"), text("d"))]);
    assert_eq!(
        conn.sql_log(),
        vec!["SELECT id, name FROM users", "SELECT email, name FROM users"]
    );
}

#[test]
fn test_paginate_rejects_non_positive() {
    let (conn, db) = db();
    let err = db.table("users").paginate(0, LinkStyle::All).unwrap_err();
    assert!(matches!(err, OrmError::InvalidParameter(_)));
    assert!(conn.statements().is_empty());
}

#[test]
fn test_driver_error_carries_sql_and_params() {
    let (conn, db) = db();
    conn.fail_next("no such table: users");
    let err = db.table("users").where_("id", 9).get().unwrap_err();
    match err {
        OrmError::Execution { sql, params, source } => {
            assert_eq!(sql, "SELECT * FROM users WHERE id = ?");
            assert_eq!(params, vec![int(9)]);
            assert_eq!(source.to_string(), "no such table: users");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_entity_builder_hydrates() {
    let (conn, db) = db();
    conn.push_rows(vec![row([("id", int(1)), ("name", text("alice"))])]);
    let users = db.query::<User>().get().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "alice");
}

#[test]
fn test_with_deduplicates_names() {
    let (_, db) = db();
    let qb = db.query::<User>().with(&["articles", "roles", "articles"]);
    assert_eq!(qb.with, vec!["articles".to_string(), "roles".to_string()]);
}

struct ReadOnly;

impl crate::monitor::QueryHook for ReadOnly {
    fn before_query(&self, ctx: &crate::monitor::QueryContext) -> crate::monitor::HookAction {
        match ctx.query_type {
            crate::monitor::QueryType::Select => crate::monitor::HookAction::Continue,
            _ => crate::monitor::HookAction::Abort("read-only session".to_string()),
        }
    }
}

#[test]
fn test_hook_abort_blocks_statement() {
    let conn = MockConnection::new();
    let mut db = crate::Db::new(conn.clone()).with_hook(ReadOnly);
    db.register::<User>();

    db.table("users").get().unwrap();
    let err = db.table("users").where_("id", 1).delete().unwrap_err();

    assert!(matches!(err, OrmError::Query(ref msg) if msg.contains("read-only session")));
    assert_eq!(conn.sql_log(), vec!["SELECT * FROM users"]);
}

#[test]
fn test_tagged_statements_reach_hooks() {
    use crate::monitor::{QueryContext, QueryHook, QueryResult};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Tags(Mutex<Vec<Option<String>>>);

    impl QueryHook for Tags {
        fn after_query(&self, ctx: &QueryContext, _: Duration, _: &QueryResult) {
            self.0.lock().unwrap().push(ctx.tag.clone());
        }
    }

    let conn = MockConnection::new();
    let tags = std::sync::Arc::new(Tags::default());
    let db = crate::Db::new(conn.clone()).with_hook_arc(tags.clone());

    db.table("users").tag("listing").get().unwrap();
    db.raw_query("SELECT 1", &[]).unwrap();

    assert_eq!(
        *tags.0.lock().unwrap(),
        vec![Some("listing".to_string()), Some("raw".to_string())]
    );
}
