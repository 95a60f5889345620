mod common;

use common::{users_table, TestContext};
use flatsql::Schema;

#[test]
fn test_create_writes_schema_header() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int, name varchar(10), PRIMARY KEY ( id ) ) ;");
    assert!(ctx.config.table_path("t").exists());

    let contents = ctx.table_file("t");
    let header = contents.lines().next().unwrap();
    let schema = Schema::from_header("t", header).unwrap();
    assert_eq!(schema.len(), 2);
    assert!(schema.columns()[0].primary_key);
    assert!(schema.columns()[0].not_null);
    assert_eq!(schema.columns()[1].name, "name");
}

#[test]
fn test_create_existing_table_fails() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int ) ;");
    let err = ctx.error("CREATE TABLE t ( id int ) ;");
    assert!(err.contains("already exists"));
}

#[test]
fn test_select_from_missing_table() {
    let ctx = TestContext::new();
    let err = ctx.error("SELECT * FROM nope ;");
    assert!(err.contains("does not exist"));
}

#[test]
fn test_insert_then_select() {
    let ctx = TestContext::new();
    users_table(&ctx);
    let rows = ctx.rows("SELECT * FROM users ;");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], vec!["1", "abc"]);
    assert_eq!(rows[2], vec!["3", "ghi"]);
}

#[test]
fn test_select_projection_reorders() {
    let ctx = TestContext::new();
    users_table(&ctx);
    let rows = ctx.rows("SELECT name , id FROM users WHERE id = 2 ;");
    assert_eq!(rows, vec![vec!["def".to_string(), "2".to_string()]]);
}

#[test]
fn test_select_where_matches_one_row() {
    let ctx = TestContext::new();
    users_table(&ctx);
    let rows = ctx.rows("SELECT name FROM users WHERE id = 1 ;");
    assert_eq!(rows, vec![vec!["abc".to_string()]]);
}

#[test]
fn test_drop_removes_file() {
    let ctx = TestContext::new();
    users_table(&ctx);
    ctx.run("DROP TABLE users ;");
    assert!(!ctx.config.table_path("users").exists());
    let err = ctx.error("DROP TABLE users ;");
    assert!(err.contains("does not exist"));
}

#[test]
fn test_row_round_trip_preserves_values() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int, note varchar(30) ) ;");
    ctx.run("INSERT INTO t ( id , note ) VALUES ( 1 , \"hello, world\" ) ;");
    let rows = ctx.rows("SELECT note FROM t ;");
    assert_eq!(rows, vec![vec!["hello, world".to_string()]]);
}

#[test]
fn test_malformed_statements_are_rejected() {
    let ctx = TestContext::new();
    assert!(ctx.exec("SELECT * FROM t").is_err());
    assert!(ctx.exec("FROB TABLE t ;").is_err());
    assert!(ctx.exec("CREATE TABLE t ( id int ;").is_err());
}
