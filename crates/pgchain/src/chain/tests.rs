use std::collections::HashMap;

use super::{ExpressionChain, asc, desc};
use crate::conflict::Conflict;
use crate::error::ChainError;
use crate::value::Value;
use crate::values;

fn render(chain: &ExpressionChain) -> (String, Vec<Value>) {
    chain.render().unwrap()
}

// ==================== SELECT ====================

#[test]
fn select_with_filter_order_and_limit() {
    let chain = ExpressionChain::new()
        .select(&["id", "name"])
        .table("users")
        .and_where("age > ?", values![18])
        .order_by(&asc("name"))
        .limit(10);
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "SELECT id, name FROM users WHERE age > $1 ORDER BY name ASC LIMIT 10"
    );
    assert_eq!(args, vec![Value::I32(18)]);
}

#[test]
fn multiple_order_by_expressions_join_with_commas() {
    let chain = ExpressionChain::new()
        .select(&["id"])
        .table("posts")
        .order_by(&desc("created_at"))
        .order_by(&asc("id"));
    let (sql, _) = render(&chain);
    assert_eq!(
        sql,
        "SELECT id FROM posts ORDER BY created_at DESC, id ASC"
    );
}

#[test]
fn render_is_deterministic_and_repeatable() {
    let chain = ExpressionChain::new()
        .select(&["id"])
        .table("users")
        .and_where("age > ?", values![18]);
    let first = render(&chain);
    let second = render(&chain);
    assert_eq!(first, second);
}

#[test]
fn select_without_table_renders_bare() {
    let chain = ExpressionChain::new().select(&["1"]);
    let (sql, args) = render(&chain);
    assert_eq!(sql, "SELECT 1");
    assert!(args.is_empty());
}

#[test]
fn last_operation_wins() {
    let chain = ExpressionChain::new()
        .delete()
        .select(&["id"])
        .table("users");
    let (sql, _) = render(&chain);
    assert_eq!(sql, "SELECT id FROM users");
}

#[test]
fn limit_and_offset_last_write_wins() {
    let chain = ExpressionChain::new()
        .select(&["id"])
        .table("users")
        .limit(5)
        .limit(10)
        .offset(20);
    let (sql, _) = render(&chain);
    assert_eq!(sql, "SELECT id FROM users LIMIT 10 OFFSET 20");
}

#[test]
fn missing_operation_errors() {
    let err = ExpressionChain::new().table("users").render().unwrap_err();
    assert!(matches!(err, ChainError::MissingOperation));
}

// ==================== predicates ====================

#[test]
fn and_predicates_render_before_or_predicates() {
    let chain = ExpressionChain::new()
        .select(&["*"])
        .table("t")
        .and_where("a = ?", values![1])
        .or_where("b = ?", values![2])
        .and_where("c = ?", values![3]);
    let (sql, args) = render(&chain);
    assert_eq!(sql, "SELECT * FROM t WHERE a = $1 AND c = $2 OR b = $3");
    assert_eq!(args, vec![Value::I32(1), Value::I32(3), Value::I32(2)]);
}

#[test]
fn leading_or_keeps_no_separator() {
    let chain = ExpressionChain::new()
        .select(&["*"])
        .table("t")
        .or_where("a = ?", values![1]);
    let (sql, _) = render(&chain);
    assert_eq!(sql, "SELECT * FROM t WHERE a = $1");
}

#[test]
fn leading_not_keeps_its_negation() {
    let chain = ExpressionChain::new()
        .select(&["*"])
        .table("t")
        .not_where("deleted", values![]);
    let (sql, _) = render(&chain);
    assert_eq!(sql, "SELECT * FROM t WHERE NOT deleted");
}

#[test]
fn negated_combinators() {
    let chain = ExpressionChain::new()
        .select(&["*"])
        .table("t")
        .and_where("a = ?", values![1])
        .and_not_where("archived", values![])
        .or_not_where("visible", values![]);
    let (sql, _) = render(&chain);
    assert_eq!(
        sql,
        "SELECT * FROM t WHERE a = $1 AND NOT archived OR NOT visible"
    );
}

#[test]
fn having_renders_after_group_by() {
    let chain = ExpressionChain::new()
        .select(&["dept", "count(*) AS n"])
        .table("employees")
        .group_by("dept")
        .and_having("count(*) > ?", values![5]);
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "SELECT dept, count(*) AS n FROM employees GROUP BY dept HAVING count(*) > $1"
    );
    assert_eq!(args, vec![Value::I32(5)]);
}

#[test]
fn where_groups_nest_in_parentheses() {
    let group = ExpressionChain::new()
        .and_where("b = ?", values![2])
        .or_where("c = ?", values![3]);
    let chain = ExpressionChain::new()
        .select(&["*"])
        .table("t")
        .and_where("a = ?", values![1])
        .and_where_group(group);
    let (sql, args) = render(&chain);
    assert_eq!(sql, "SELECT * FROM t WHERE a = $1 AND (b = $2 OR c = $3)");
    assert_eq!(args.len(), 3);
}

#[test]
fn empty_where_group_is_skipped() {
    let chain = ExpressionChain::new()
        .select(&["*"])
        .table("t")
        .and_where("a = ?", values![1])
        .or_where_group(ExpressionChain::new());
    let (sql, _) = render(&chain);
    assert_eq!(sql, "SELECT * FROM t WHERE a = $1");
}

// ==================== argument expansion ====================

#[test]
fn slice_argument_expands_into_group() {
    let chain = ExpressionChain::new()
        .select(&["id"])
        .table("users")
        .and_where("id IN (?)", values![vec![1_i64, 2, 3]]);
    let (sql, args) = render(&chain);
    assert_eq!(sql, "SELECT id FROM users WHERE id IN ($1, $2, $3)");
    assert_eq!(args, vec![Value::I64(1), Value::I64(2), Value::I64(3)]);
}

#[test]
fn empty_slice_renders_null() {
    let chain = ExpressionChain::new()
        .select(&["id"])
        .table("users")
        .and_where("id IN (?)", vec![Value::Array(vec![])]);
    let (sql, args) = render(&chain);
    assert_eq!(sql, "SELECT id FROM users WHERE id IN (NULL)");
    assert!(args.is_empty());
}

#[test]
fn byte_slice_stays_a_single_parameter() {
    let chain = ExpressionChain::new()
        .select(&["id"])
        .table("blobs")
        .and_where("digest = ?", values![vec![0xAA_u8, 0xBB]]);
    let (sql, args) = render(&chain);
    assert_eq!(sql, "SELECT id FROM blobs WHERE digest = $1");
    assert_eq!(args, vec![Value::Bytes(vec![0xAA, 0xBB])]);
}

#[test]
fn null_argument_is_inlined() {
    let chain = ExpressionChain::new()
        .select(&["id"])
        .table("users")
        .and_where("email IS NOT DISTINCT FROM ?", values![None::<String>]);
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "SELECT id FROM users WHERE email IS NOT DISTINCT FROM NULL"
    );
    assert!(args.is_empty());
}

#[test]
fn escaped_marker_survives_to_the_output() {
    let chain = ExpressionChain::new()
        .select(&["id"])
        .table("docs")
        .and_where("data \\? ? ", values!["some_key"]);
    let (sql, args) = render(&chain);
    assert_eq!(sql, "SELECT id FROM docs WHERE data ? $1 ");
    assert_eq!(args, vec![Value::Text("some_key".to_string())]);
}

#[test]
fn marker_argument_imbalance_is_a_render_error() {
    let err = ExpressionChain::new()
        .select(&["id"])
        .table("t")
        .and_where("a = ? AND b = ?", values![1])
        .render()
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::PlaceholderMismatch { markers: 2, args: 1 }
    ));
}

#[test]
fn subquery_argument_splices_in_parenthesized() {
    let sub = ExpressionChain::new()
        .select(&["user_id"])
        .table("orders")
        .and_where("total > ?", values![100]);
    let chain = ExpressionChain::new()
        .select(&["name"])
        .table("users")
        .and_where("id IN ?", values![sub]);
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "SELECT name FROM users WHERE id IN (SELECT user_id FROM orders WHERE total > $1)"
    );
    assert_eq!(args, vec![Value::I32(100)]);
}

// ==================== joins ====================

#[test]
fn joins_keep_declaration_order() {
    let chain = ExpressionChain::new()
        .select(&["u.id"])
        .table("users u")
        .left_join("orders o ON o.user_id = u.id", values![])
        .inner_join("accounts a ON a.user_id = u.id", values![])
        .and_where("u.active = ?", values![true]);
    let (sql, _) = render(&chain);
    assert_eq!(
        sql,
        "SELECT u.id FROM users u LEFT JOIN orders o ON o.user_id = u.id \
         INNER JOIN accounts a ON a.user_id = u.id WHERE u.active = $1"
    );
}

#[test]
fn join_arguments_number_before_where_arguments() {
    let chain = ExpressionChain::new()
        .select(&["u.id"])
        .table("users u")
        .join(
            "orders o ON o.user_id = u.id AND o.status = ?",
            values!["open"],
        )
        .and_where("u.age > ?", values![21]);
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "SELECT u.id FROM users u JOIN orders o ON o.user_id = u.id AND o.status = $1 \
         WHERE u.age > $2"
    );
    assert_eq!(args, vec![Value::Text("open".to_string()), Value::I32(21)]);
}

// ==================== INSERT ====================

#[test]
fn insert_sorts_columns_and_inlines_null() {
    let mut row = HashMap::new();
    row.insert("name", Value::from("alice"));
    row.insert("data", Value::Null);
    let chain = ExpressionChain::new().table("users").insert(row);
    let (sql, args) = render(&chain);
    assert_eq!(sql, "INSERT INTO users (data, name) VALUES (NULL, $1)");
    assert_eq!(args, vec![Value::Text("alice".to_string())]);
}

#[test]
fn insert_empty_map_renders_default_values() {
    let chain = ExpressionChain::new().table("events").insert(HashMap::new());
    let (sql, args) = render(&chain);
    assert_eq!(sql, "INSERT INTO events DEFAULT VALUES");
    assert!(args.is_empty());
}

#[test]
fn insert_without_table_errors() {
    let mut row = HashMap::new();
    row.insert("a", Value::I32(1));
    let err = ExpressionChain::new().insert(row).render().unwrap_err();
    assert!(matches!(err, ChainError::MissingTable("INSERT")));
}

#[test]
fn insert_with_returning() {
    let mut row = HashMap::new();
    row.insert("name", Value::from("bob"));
    let chain = ExpressionChain::new()
        .table("users")
        .insert(row)
        .returning("id");
    let (sql, _) = render(&chain);
    assert_eq!(sql, "INSERT INTO users (name) VALUES ($1) RETURNING id");
}

#[test]
fn insert_multi_renders_one_group_per_row() {
    let mut a = HashMap::new();
    a.insert("x", Value::I32(1));
    a.insert("y", Value::I32(2));
    let mut b = HashMap::new();
    b.insert("x", Value::I32(3));
    b.insert("y", Value::Null);
    let chain = ExpressionChain::new().table("points").insert_multi(vec![a, b]);
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "INSERT INTO points (x, y) VALUES ($1, $2), ($3, NULL)"
    );
    assert_eq!(args, vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
}

#[test]
fn insert_multi_key_mismatch_is_deferred() {
    let mut a = HashMap::new();
    a.insert("x", Value::I32(1));
    let mut b = HashMap::new();
    b.insert("y", Value::I32(2));
    let chain = ExpressionChain::new().table("points").insert_multi(vec![a, b]);
    assert!(!chain.build_errors().is_empty());
    assert!(matches!(chain.render().unwrap_err(), ChainError::Build(_)));
}

#[test]
fn insert_multi_without_rows_is_deferred() {
    let chain = ExpressionChain::new().table("points").insert_multi(vec![]);
    assert!(matches!(chain.render().unwrap_err(), ChainError::Build(_)));
}

#[test]
fn insert_subquery_value_splices() {
    let sub = ExpressionChain::new().select(&["max(rank)"]).table("users");
    let mut row = HashMap::new();
    row.insert("rank", Value::from(sub));
    row.insert("name", Value::from("zed"));
    let chain = ExpressionChain::new().table("users").insert(row);
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "INSERT INTO users (name, rank) VALUES ($1, (SELECT max(rank) FROM users))"
    );
    assert_eq!(args, vec![Value::Text("zed".to_string())]);
}

// ==================== ON CONFLICT ====================

#[test]
fn insert_with_conflict_do_nothing() {
    let mut row = HashMap::new();
    row.insert("username", Value::from("alice"));
    let chain = ExpressionChain::new()
        .table("users")
        .insert(row)
        .on_conflict(Conflict::columns(&["username"]).do_nothing());
    let (sql, _) = render(&chain);
    assert_eq!(
        sql,
        "INSERT INTO users (username) VALUES ($1) ON CONFLICT (username) DO NOTHING"
    );
}

#[test]
fn insert_with_conflict_update_and_returning() {
    let mut row = HashMap::new();
    row.insert("username", Value::from("alice"));
    row.insert("email", Value::from("a@b.c"));
    let chain = ExpressionChain::new()
        .table("users")
        .insert(row)
        .on_conflict(
            Conflict::columns(&["username"])
                .do_update()
                .set_excluded("email")
                .set_now("updated_at")
                .build(),
        )
        .returning("id");
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "INSERT INTO users (email, username) VALUES ($1, $2) \
         ON CONFLICT (username) DO UPDATE SET email = EXCLUDED.email, updated_at = now() \
         RETURNING id"
    );
    assert_eq!(args.len(), 2);
}

#[test]
fn conflict_arguments_number_after_insert_arguments() {
    let mut row = HashMap::new();
    row.insert("k", Value::from("key"));
    let chain = ExpressionChain::new()
        .table("kv")
        .insert(row)
        .on_conflict(
            Conflict::columns(&["k"])
                .do_update()
                .set("v", "fresh")
                .build(),
        );
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "INSERT INTO kv (k) VALUES ($1) ON CONFLICT (k) DO UPDATE SET v = $2"
    );
    assert_eq!(args.len(), 2);
}

#[test]
fn duplicate_conflict_clause_is_deferred() {
    let mut row = HashMap::new();
    row.insert("k", Value::from("key"));
    let chain = ExpressionChain::new()
        .table("kv")
        .insert(row)
        .on_conflict(Conflict::columns(&["k"]).do_nothing())
        .on_conflict(Conflict::columns(&["k"]).do_nothing());
    assert!(matches!(chain.render().unwrap_err(), ChainError::Build(_)));
}

// ==================== UPDATE ====================

#[test]
fn update_with_raw_set_and_where() {
    let chain = ExpressionChain::new()
        .table("users")
        .update("visits = visits + ?, seen_at = now()", values![1])
        .and_where("id = ?", values![7_i64]);
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "UPDATE users SET visits = visits + $1, seen_at = now() WHERE id = $2"
    );
    assert_eq!(args, vec![Value::I32(1), Value::I64(7)]);
}

#[test]
fn update_map_sorts_columns() {
    let mut fields = HashMap::new();
    fields.insert("name", Value::from("carol"));
    fields.insert("email", Value::Null);
    let chain = ExpressionChain::new()
        .table("users")
        .update_map(fields)
        .and_where("id = ?", values![1_i64]);
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "UPDATE users SET email = NULL, name = $1 WHERE id = $2"
    );
    assert_eq!(args.len(), 2);
}

#[test]
fn update_with_from_list() {
    let chain = ExpressionChain::new()
        .table("orders o")
        .update("status = ?", values!["closed"])
        .from_update("users u")
        .and_where("u.id = o.user_id AND u.banned = ?", values![true]);
    let (sql, _) = render(&chain);
    assert_eq!(
        sql,
        "UPDATE orders o SET status = $1 FROM users u WHERE u.id = o.user_id AND u.banned = $2"
    );
}

#[test]
fn update_with_returning() {
    let chain = ExpressionChain::new()
        .table("users")
        .update("flags = flags | ?", values![4])
        .and_where("id = ?", values![1_i64])
        .returning("flags");
    let (sql, _) = render(&chain);
    assert_eq!(
        sql,
        "UPDATE users SET flags = flags | $1 WHERE id = $2 RETURNING flags"
    );
}

#[test]
fn update_without_table_errors() {
    let err = ExpressionChain::new()
        .update("a = ?", values![1])
        .render()
        .unwrap_err();
    assert!(matches!(err, ChainError::MissingTable("UPDATE")));
}

// ==================== DELETE ====================

#[test]
fn delete_with_where_and_returning() {
    let chain = ExpressionChain::new()
        .table("sessions")
        .delete()
        .and_where("user_id = ?", values![9_i64])
        .returning("id");
    let (sql, _) = render(&chain);
    assert_eq!(
        sql,
        "DELETE FROM sessions WHERE user_id = $1 RETURNING id"
    );
}

#[test]
fn delete_without_table_errors() {
    let err = ExpressionChain::new().delete().render().unwrap_err();
    assert!(matches!(err, ChainError::MissingTable("DELETE")));
}

// ==================== RETURNING on SELECT ====================

#[test]
fn returning_on_select_errors_at_render() {
    let err = ExpressionChain::new()
        .select(&["id"])
        .table("users")
        .returning("id")
        .render()
        .unwrap_err();
    assert!(matches!(err, ChainError::ReturningNotAllowed("SELECT")));
}

// ==================== CTEs ====================

#[test]
fn ctes_render_in_declaration_order() {
    let recent = ExpressionChain::new()
        .select(&["*"])
        .table("orders")
        .and_where("placed_at > ?", values!["2026-01-01"]);
    let big = ExpressionChain::new()
        .select(&["*"])
        .table("recent")
        .and_where("total > ?", values![100]);
    let chain = ExpressionChain::new()
        .with("recent", recent)
        .with("big", big)
        .select(&["count(*)"])
        .table("big");
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "WITH recent AS (SELECT * FROM orders WHERE placed_at > $1), \
         big AS (SELECT * FROM recent WHERE total > $2) SELECT count(*) FROM big"
    );
    assert_eq!(args.len(), 2);
}

#[test]
fn redeclaring_a_cte_replaces_in_place() {
    let chain = ExpressionChain::new()
        .with("a", ExpressionChain::new().select(&["1"]))
        .with("b", ExpressionChain::new().select(&["2"]))
        .with("a", ExpressionChain::new().select(&["3"]))
        .select(&["*"])
        .table("b");
    let (sql, _) = render(&chain);
    assert_eq!(sql, "WITH a AS (SELECT 3), b AS (SELECT 2) SELECT * FROM b");
}

#[test]
fn cte_with_union_is_rejected() {
    let unioned = ExpressionChain::new()
        .select(&["id"])
        .table("a")
        .union(ExpressionChain::new().select(&["id"]).table("b"));
    let err = ExpressionChain::new()
        .with("both", unioned)
        .select(&["*"])
        .table("both")
        .render()
        .unwrap_err();
    assert!(matches!(err, ChainError::CteUnion(name) if name == "both"));
}

// ==================== UNION / suffixes ====================

#[test]
fn union_and_union_all() {
    let chain = ExpressionChain::new()
        .select(&["id"])
        .table("a")
        .union(ExpressionChain::new().select(&["id"]).table("b"))
        .union_all(
            ExpressionChain::new()
                .select(&["id"])
                .table("c")
                .and_where("x = ?", values![1]),
        );
    let (sql, args) = render(&chain);
    assert_eq!(
        sql,
        "SELECT id FROM a UNION SELECT id FROM b UNION ALL SELECT id FROM c WHERE x = $1"
    );
    assert_eq!(args, vec![Value::I32(1)]);
}

#[test]
fn for_update_renders_last() {
    let chain = ExpressionChain::new()
        .select(&["*"])
        .table("jobs")
        .and_where("state = ?", values!["queued"])
        .limit(1)
        .for_update();
    let (sql, _) = render(&chain);
    assert_eq!(
        sql,
        "SELECT * FROM jobs WHERE state = $1 LIMIT 1 FOR UPDATE"
    );
}

// ==================== alias prefixes ====================

#[test]
fn table_alias_rewrites_later_fragments() {
    let chain = ExpressionChain::new()
        .table_alias("u", "users")
        .select(&["{.u}.id", "{.u}.name"])
        .table("users")
        .and_where("{.u}.age > ?", values![18]);
    let (sql, _) = render(&chain);
    assert_eq!(
        sql,
        "SELECT users.id, users.name FROM users WHERE users.age > $1"
    );
}

#[test]
fn table_alias_does_not_rewrite_earlier_fragments() {
    let chain = ExpressionChain::new()
        .select(&["{.u}.id"])
        .table_alias("u", "users")
        .table("users");
    let (sql, _) = render(&chain);
    assert_eq!(sql, "SELECT {.u}.id FROM users");
}

// ==================== projected fields ====================

#[test]
fn projected_fields_come_from_the_select_list() {
    let chain = ExpressionChain::new()
        .select(&["u.id", "name AS n", "count(*) AS total"])
        .table("users u");
    assert_eq!(chain.projected_fields(), vec!["id", "n", "total"]);
}

#[test]
fn projected_fields_empty_for_non_select() {
    let chain = ExpressionChain::new().table("users").delete();
    assert!(chain.projected_fields().is_empty());
}

// ==================== display ====================

#[test]
fn display_shows_positional_sql() {
    let chain = ExpressionChain::new()
        .select(&["id"])
        .table("users")
        .and_where("id = ?", values![5_i64]);
    assert_eq!(chain.to_string(), "SELECT id FROM users WHERE id = $1");
}

#[test]
fn display_of_invalid_chain_does_not_panic() {
    let chain = ExpressionChain::new();
    assert!(chain.to_string().starts_with("<invalid chain:"));
}

// ==================== clone independence ====================

#[test]
fn cloned_chains_diverge_independently() {
    let base = ExpressionChain::new().select(&["id"]).table("users");
    let young = base.clone().and_where("age < ?", values![30]);
    let old = base.and_where("age >= ?", values![30]);
    let (young_sql, _) = render(&young);
    let (old_sql, _) = render(&old);
    assert_eq!(young_sql, "SELECT id FROM users WHERE age < $1");
    assert_eq!(old_sql, "SELECT id FROM users WHERE age >= $1");
}
