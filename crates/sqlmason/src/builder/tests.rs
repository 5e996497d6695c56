use super::*;
use crate::cache::{CacheConfig, MemoryCache};
use crate::executor::{Executor, Row};
use crate::grammar::Grammar;
use crate::session::QuerySession;
use crate::value::{Arg, Value};
use crate::{raw, row};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn select(table: &str) -> SelectBuilder {
    SelectBuilder::new(table, Grammar::mysql())
}

#[test]
fn simple_select() {
    let built = select("users").build().unwrap();
    assert_eq!(built.sql, "SELECT * FROM `users`");
    assert!(built.bindings.is_empty());
}

#[test]
fn select_where_order_limit() {
    let built = select("users")
        .select(&["id", "name"])
        .where_("status = ?", ("active",))
        .order_by("id", "asc")
        .limit(5)
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "SELECT `id`, `name` FROM `users` WHERE status = ? ORDER BY `id` ASC LIMIT 5"
    );
    assert_eq!(built.bindings, vec![Value::from("active")]);
}

#[test]
fn select_distinct() {
    let built = select("users").select(&["email"]).distinct().build().unwrap();
    assert_eq!(built.sql, "SELECT DISTINCT `email` FROM `users`");
}

#[test]
fn empty_table_name_is_fatal() {
    let err = select("").build().unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn clauses_compile_in_priority_order_regardless_of_registration() {
    let built = select("users")
        .limit(10)
        .order_by("id", "desc")
        .where_("status = ?", ("active",))
        .join("roles", "users.role_id = roles.id", ())
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "SELECT * FROM `users` INNER JOIN `roles` ON `users`.`role_id` = `roles`.`id` \
         WHERE status = ? ORDER BY `id` DESC LIMIT 10"
    );
}

#[test]
fn build_is_deterministic_across_calls() {
    let builder = select("users")
        .where_("a = ?", (1,))
        .or_where("b = ?", (2,))
        .limit(3);
    assert_eq!(builder.build().unwrap(), builder.build().unwrap());
}

#[test]
fn where_glue_and_nesting() {
    let built = select("users")
        .where_("status = ?", ("active",))
        .or_where_group(|group| {
            group.and("role = ?", vec![Value::from("admin")]);
            group.or("role = ?", vec![Value::from("owner")]);
        })
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "SELECT * FROM `users` WHERE status = ? OR (role = ? OR role = ?)"
    );
    assert_eq!(built.bindings.len(), 3);
}

#[test]
fn empty_where_tree_suppresses_keyword() {
    let built = select("users").where_group(|_| {}).build().unwrap();
    assert_eq!(built.sql, "SELECT * FROM `users`");
}

#[test]
fn where_in_builds_placeholders() {
    let built = select("users")
        .where_in("role_id", vec![1, 2, 3])
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "SELECT * FROM `users` WHERE role_id IN (?, ?, ?)"
    );
    assert_eq!(
        built.bindings,
        vec![Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn where_in_empty_is_a_no_op() {
    let built = select("users")
        .where_in("role_id", Vec::<i32>::new())
        .build()
        .unwrap();
    assert_eq!(built.sql, "SELECT * FROM `users`");
}

#[test]
fn order_by_replaces_prior_ordering() {
    let built = select("users")
        .order_by("name", "asc")
        .order_by("id", "desc")
        .build()
        .unwrap();
    assert_eq!(built.sql, "SELECT * FROM `users` ORDER BY `id` DESC");
}

#[test]
fn add_order_by_appends_in_call_order() {
    let built = select("users")
        .order_by("name", "asc")
        .add_order_by("id", "desc")
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "SELECT * FROM `users` ORDER BY `name` ASC, `id` DESC"
    );
}

#[test]
fn invalid_direction_defaults_to_asc() {
    let built = select("users").order_by("id", "sideways").build().unwrap();
    assert_eq!(built.sql, "SELECT * FROM `users` ORDER BY `id` ASC");
}

#[test]
fn paginate_computes_offset() {
    let built = select("users").paginate(20, 2).build().unwrap();
    assert_eq!(built.sql, "SELECT * FROM `users` LIMIT 20 OFFSET 20");
}

#[test]
fn limit_replaces_prior_limit() {
    let built = select("users").limit(10).limit(5).build().unwrap();
    assert_eq!(built.sql, "SELECT * FROM `users` LIMIT 5");
}

#[test]
fn group_by_and_having() {
    let built = select("orders")
        .select(&["user_id", "{COUNT(*) AS order_count}"])
        .group_by(&["user_id"])
        .having("COUNT(*) > ?", (5,))
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "SELECT `user_id`, COUNT(*) AS order_count FROM `orders` \
         GROUP BY `user_id` HAVING COUNT(*) > ?"
    );
    assert_eq!(built.bindings, vec![Value::Int(5)]);
}

#[test]
fn having_in_over_grouped_result() {
    let built = select("orders")
        .group_by(&["user_id"])
        .having_in("user_id", vec![1, 2])
        .build()
        .unwrap();
    assert!(built.sql.contains("HAVING user_id IN (?, ?)"));
    assert_eq!(built.bindings.len(), 2);
}

#[test]
fn join_quotes_dotted_on_tokens() {
    let built = select("users")
        .left_join("orders o", "users.id = o.user_id", ())
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "SELECT * FROM `users` LEFT JOIN `orders` AS `o` ON `users`.`id` = `o`.`user_id`"
    );
}

#[test]
fn join_sub_wraps_and_orders_bindings() {
    let built = select("users")
        .join_sub(
            |sub| {
                sub.from("orders")
                    .select(&["user_id", "{COUNT(*) AS n}"])
                    .where_("status = ?", ("paid",))
                    .group_by(&["user_id"])
            },
            "o",
            "users.id = o.user_id AND o.n > ?",
            (3,),
        )
        .build()
        .unwrap();
    assert!(built.sql.starts_with(
        "SELECT * FROM `users` INNER JOIN (SELECT `user_id`, COUNT(*) AS n FROM `orders` \
         WHERE status = ? GROUP BY `user_id`) AS `o` ON"
    ));
    // Subquery bindings come before the outer join-condition bindings.
    assert_eq!(
        built.bindings,
        vec![Value::from("paid"), Value::Int(3)]
    );
}

#[test]
fn when_applies_only_on_true() {
    let on = select("users")
        .when(true, |b| b.where_("a = ?", (1,)))
        .build()
        .unwrap();
    assert!(on.sql.contains("WHERE a = ?"));

    let off = select("users")
        .when(false, |b| b.where_("a = ?", (1,)))
        .build()
        .unwrap();
    assert!(!off.sql.contains("WHERE"));
}

#[test]
fn when_else_applies_default_branch() {
    let built = select("users")
        .when_else(
            false,
            |b| b.where_("a = ?", (1,)),
            |b| b.where_("b = ?", (2,)),
        )
        .build()
        .unwrap();
    assert!(built.sql.contains("WHERE b = ?"));
    assert_eq!(built.bindings, vec![Value::Int(2)]);
}

#[test]
fn build_count_strips_ordering_and_limit() {
    let builder = select("users")
        .where_("status = ?", ("active",))
        .order_by("id", "desc")
        .limit(10);
    let built = builder.build_count(None, false).unwrap();
    assert_eq!(
        built.sql,
        "SELECT COUNT(*) AS total_count FROM `users` WHERE status = ?"
    );
    assert_eq!(built.bindings, vec![Value::from("active")]);
}

#[test]
fn build_count_distinct_column() {
    let built = select("users").build_count(Some("email"), true).unwrap();
    assert_eq!(
        built.sql,
        "SELECT COUNT(DISTINCT `email`) AS total_count FROM `users`"
    );
}

#[test]
fn dialect_switch_changes_quoting_only() {
    let mysql = select("users")
        .select(&["id"])
        .where_("status = ?", ("active",))
        .order_by("id", "asc")
        .build()
        .unwrap();
    let postgres = SelectBuilder::new("users", Grammar::postgres())
        .select(&["id"])
        .where_("status = ?", ("active",))
        .order_by("id", "asc")
        .build()
        .unwrap();

    assert_eq!(
        mysql.sql,
        "SELECT `id` FROM `users` WHERE status = ? ORDER BY `id` ASC"
    );
    assert_eq!(
        postgres.sql,
        "SELECT \"id\" FROM \"users\" WHERE status = ? ORDER BY \"id\" ASC"
    );
    assert_eq!(mysql.sql.replace('`', "\""), postgres.sql);
    assert_eq!(mysql.bindings, postgres.bindings);
}

#[test]
fn insert_two_rows_row_major_bindings() {
    let built = InsertBuilder::new("logs", Grammar::mysql())
        .values_many(vec![
            row! { "user_id" => 1, "action" => "login" },
            row! { "user_id" => 2, "action" => "logout" },
        ])
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "INSERT INTO `logs` (`user_id`, `action`) VALUES (?, ?), (?, ?)"
    );
    assert_eq!(
        built.bindings,
        vec![
            Value::Int(1),
            Value::from("login"),
            Value::Int(2),
            Value::from("logout")
        ]
    );
}

#[test]
fn insert_rejects_reordered_columns() {
    let err = InsertBuilder::new("logs", Grammar::mysql())
        .values(row! { "user_id" => 1, "action" => "login" })
        .unwrap()
        .values(row! { "action" => "logout", "user_id" => 2 })
        .unwrap_err();
    assert!(matches!(err, QueryError::ShapeMismatch(_)));
}

#[test]
fn insert_rejected_row_leaves_prior_rows_intact() {
    let builder = InsertBuilder::new("logs", Grammar::mysql())
        .values(row! { "user_id" => 1 })
        .unwrap();
    let kept = builder.clone();
    assert!(kept.values(row! { "other" => 2 }).is_err());

    // The original builder still compiles from its accumulated state.
    let built = builder.build().unwrap();
    assert_eq!(built.sql, "INSERT INTO `logs` (`user_id`) VALUES (?)");
}

#[test]
fn insert_without_rows_is_fatal() {
    let err = InsertBuilder::new("logs", Grammar::mysql()).build().unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn update_set_where_binding_order() {
    let built = UpdateBuilder::new("users", Grammar::mysql())
        .set("name", "alice")
        .set("age", 30)
        .where_("id = ?", (7,))
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "UPDATE `users` SET `name` = ?, `age` = ? WHERE id = ?"
    );
    assert_eq!(
        built.bindings,
        vec![Value::from("alice"), Value::Int(30), Value::Int(7)]
    );
}

#[test]
fn update_set_is_last_write_wins() {
    let built = UpdateBuilder::new("users", Grammar::mysql())
        .set("status", "active")
        .set("status", "banned")
        .build()
        .unwrap();
    assert_eq!(built.sql, "UPDATE `users` SET `status` = ?");
    assert_eq!(built.bindings, vec![Value::from("banned")]);
}

#[test]
fn update_set_raw_emits_no_binding() {
    let built = UpdateBuilder::new("users", Grammar::mysql())
        .set("updated_at", raw("NOW()"))
        .set("name", "alice")
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "UPDATE `users` SET `updated_at` = NOW(), `name` = ?"
    );
    assert_eq!(built.bindings, vec![Value::from("alice")]);
}

#[test]
fn update_set_braced_string_is_raw() {
    let built = UpdateBuilder::new("users", Grammar::mysql())
        .set("updated_at", "{NOW()}")
        .build()
        .unwrap();
    assert_eq!(built.sql, "UPDATE `users` SET `updated_at` = NOW()");
    assert!(built.bindings.is_empty());
}

#[test]
fn update_set_literal_bypasses_raw_detection() {
    let built = UpdateBuilder::new("users", Grammar::mysql())
        .set("note", Arg::literal("{keep me}"))
        .build()
        .unwrap();
    assert_eq!(built.sql, "UPDATE `users` SET `note` = ?");
    assert_eq!(built.bindings, vec![Value::from("{keep me}")]);
}

#[test]
fn update_without_set_is_fatal() {
    let err = UpdateBuilder::new("users", Grammar::mysql())
        .where_("id = ?", (1,))
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn update_with_join_puts_join_bindings_first() {
    let built = UpdateBuilder::new("users", Grammar::mysql())
        .join("orders", "users.id = orders.user_id AND orders.kind = ?", ("sale",))
        .set("flagged", true)
        .where_("orders.total > ?", (100,))
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "UPDATE `users` INNER JOIN `orders` ON `users`.`id` = `orders`.`user_id` \
         AND `orders`.`kind` = ? SET `flagged` = ? WHERE `orders`.`total` > ?"
    );
    assert_eq!(
        built.bindings,
        vec![Value::from("sale"), Value::Bool(true), Value::Int(100)]
    );
}

#[test]
fn delete_with_join_and_where() {
    let built = DeleteBuilder::new("users", Grammar::mysql())
        .left_join("orders", "users.id = orders.user_id", ())
        .where_("orders.id IS NULL", ())
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        "DELETE FROM `users` LEFT JOIN `orders` ON `users`.`id` = `orders`.`user_id` \
         WHERE `orders`.`id` IS NULL"
    );
}

#[test]
fn delete_without_where_compiles_bare() {
    let built = DeleteBuilder::new("audit", Grammar::mysql()).build().unwrap();
    assert_eq!(built.sql, "DELETE FROM `audit`");
}

// ==================== Execution-path tests ====================

/// Records executed statements and returns canned rows.
struct FakeExecutor {
    rows: Vec<Row>,
    calls: AtomicUsize,
}

impl FakeExecutor {
    fn returning(rows: Vec<Row>) -> Self {
        Self {
            rows,
            calls: AtomicUsize::new(0),
        }
    }

    fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn fetch_all(&self, _sql: &str, _bindings: &[Value]) -> QueryResult<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.clone())
    }

    async fn execute(&self, _sql: &str, _bindings: &[Value]) -> QueryResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    }

    async fn last_insert_id(&self) -> QueryResult<Option<i64>> {
        Ok(Some(42))
    }

    async fn begin_transaction(&self) -> QueryResult<()> {
        Ok(())
    }

    async fn commit(&self) -> QueryResult<()> {
        Ok(())
    }

    async fn roll_back(&self) -> QueryResult<()> {
        Ok(())
    }

    async fn in_transaction(&self) -> bool {
        false
    }
}

#[tokio::test]
async fn detached_builder_has_no_executor() {
    let err = select("users").fetch_all().await.unwrap_err();
    assert!(matches!(err, QueryError::MissingExecutor));
}

#[tokio::test]
async fn session_builders_execute() {
    let executor = Arc::new(FakeExecutor::returning(vec![FakeExecutor::row(&[
        ("id", serde_json::json!(1)),
        ("name", serde_json::json!("alice")),
    ])]));
    let session = QuerySession::for_dialect("mysql", executor.clone()).unwrap();

    let rows = session
        .from("users")
        .where_("status = ?", ("active",))
        .fetch_all()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], serde_json::json!("alice"));

    let value = session
        .from("users")
        .fetch_value("name")
        .await
        .unwrap();
    assert_eq!(value, Some(serde_json::json!("alice")));

    let id = session
        .insert("logs")
        .values(row! { "user_id" => 1 })
        .unwrap()
        .insert_get_id()
        .await
        .unwrap();
    assert_eq!(id, Some(42));
}

#[tokio::test]
async fn count_reads_total_count_column() {
    let executor = Arc::new(FakeExecutor::returning(vec![FakeExecutor::row(&[(
        "total_count",
        serde_json::json!(9),
    )])]));
    let session = QuerySession::for_dialect("mysql", executor).unwrap();

    let count = session.from("users").count(None, false).await.unwrap();
    assert_eq!(count, 9);
    assert!(session.from("users").exists().await.unwrap());
}

#[tokio::test]
async fn cache_short_circuits_identical_queries() {
    let executor = Arc::new(FakeExecutor::returning(vec![FakeExecutor::row(&[(
        "id",
        serde_json::json!(1),
    )])]));
    let session = QuerySession::for_dialect("mysql", executor.clone())
        .unwrap()
        .with_cache(Arc::new(MemoryCache::new()), CacheConfig::default());

    let first = session.from("users").fetch_all().await.unwrap();
    let second = session.from("users").fetch_all().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cache_misses_on_different_bindings() {
    let executor = Arc::new(FakeExecutor::returning(vec![]));
    let session = QuerySession::for_dialect("mysql", executor.clone())
        .unwrap()
        .with_cache(Arc::new(MemoryCache::new()), CacheConfig::default());

    session
        .from("users")
        .where_("id = ?", (1,))
        .fetch_all()
        .await
        .unwrap();
    session
        .from("users")
        .where_("id = ?", (2,))
        .fetch_all()
        .await
        .unwrap();
    assert_eq!(executor.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn session_rejects_unknown_dialect() {
    let executor = Arc::new(FakeExecutor::returning(vec![]));
    let err = QuerySession::for_dialect("oracle", executor).unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedDialect(_)));
}
