mod common;

use common::TestContext;

#[test]
fn test_insert_reorders_named_columns() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int, name varchar(10) ) ;");
    ctx.run("INSERT INTO t ( name , id ) VALUES ( \"abc\" , 1 ) ;");
    let rows = ctx.rows("SELECT * FROM t ;");
    assert_eq!(rows, vec![vec!["1".to_string(), "abc".to_string()]]);
}

#[test]
fn test_insert_requires_every_column() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int, name varchar(10) ) ;");
    let err = ctx.error("INSERT INTO t ( id ) VALUES ( 1 ) ;");
    assert!(err.contains("Column not specified: name"));
}

#[test]
fn test_insert_unknown_column() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int ) ;");
    let err = ctx.error("INSERT INTO t ( bogus ) VALUES ( 1 ) ;");
    assert!(err.contains("Unknown column: bogus"));
}

#[test]
fn test_insert_count_mismatch() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int, name varchar(10) ) ;");
    let err = ctx.error("INSERT INTO t ( id , name ) VALUES ( 1 ) ;");
    assert!(err.contains("Number of columns and values must match"));
}

#[test]
fn test_insert_type_mismatch_cites_column() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int, name varchar(10) ) ;");
    let err = ctx.error("INSERT INTO t ( id , name ) VALUES ( xyz , \"a\" ) ;");
    assert!(err.contains("expected int for column id"));

    // Integer parsing must consume the entire token.
    let err = ctx.error("INSERT INTO t ( id , name ) VALUES ( 12.5 , \"a\" ) ;");
    assert!(err.contains("expected int for column id"));
}

#[test]
fn test_insert_unquoted_string_rejected() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int, name varchar(10) ) ;");
    let err = ctx.error("INSERT INTO t ( id , name ) VALUES ( 1 , abc ) ;");
    assert!(err.contains("expected varchar(10) for column name"));
}

#[test]
fn test_insert_into_missing_table() {
    let ctx = TestContext::new();
    let err = ctx.error("INSERT INTO nope ( id ) VALUES ( 1 ) ;");
    assert!(err.contains("does not exist"));
}

#[test]
fn test_failed_insert_leaves_no_row() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int, name varchar(10) ) ;");
    let _ = ctx.error("INSERT INTO t ( id , name ) VALUES ( xyz , \"a\" ) ;");
    assert!(ctx.rows("SELECT * FROM t ;").is_empty());
}
