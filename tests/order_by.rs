mod common;

use common::TestContext;

fn unsorted(ctx: &TestContext) {
    ctx.run("CREATE TABLE t ( id int, name varchar(10), PRIMARY KEY ( id ) ) ;");
    ctx.run("INSERT INTO t ( id , name ) VALUES ( 2 , \"b\" ) ;");
    ctx.run("INSERT INTO t ( id , name ) VALUES ( 1 , \"a\" ) ;");
    ctx.run("INSERT INTO t ( id , name ) VALUES ( 3 , \"c\" ) ;");
}

fn ids(rows: Vec<Vec<String>>) -> Vec<String> {
    rows.into_iter().map(|mut r| r.remove(0)).collect()
}

#[test]
fn test_order_by_ascending() {
    let ctx = TestContext::new();
    unsorted(&ctx);
    let rows = ctx.rows("SELECT id FROM t ORDER BY id ;");
    assert_eq!(ids(rows), vec!["1", "2", "3"]);
}

#[test]
fn test_order_by_descending() {
    let ctx = TestContext::new();
    unsorted(&ctx);
    let rows = ctx.rows("SELECT * FROM t ORDER BY id DESC ;");
    assert_eq!(
        rows,
        vec![
            vec!["3".to_string(), "c".to_string()],
            vec!["2".to_string(), "b".to_string()],
            vec!["1".to_string(), "a".to_string()],
        ]
    );
}

#[test]
fn test_order_by_is_numeric_not_lexicographic() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int ) ;");
    ctx.run("INSERT INTO t ( id ) VALUES ( 10 ) ;");
    ctx.run("INSERT INTO t ( id ) VALUES ( 9 ) ;");
    let rows = ctx.rows("SELECT id FROM t ORDER BY id ;");
    assert_eq!(ids(rows), vec!["9", "10"]);
}

#[test]
fn test_order_by_two_columns_is_stable() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE t ( id int, grp varchar(5), PRIMARY KEY ( id ) ) ;");
    ctx.run("INSERT INTO t ( id , grp ) VALUES ( 1 , \"b\" ) ;");
    ctx.run("INSERT INTO t ( id , grp ) VALUES ( 2 , \"a\" ) ;");
    ctx.run("INSERT INTO t ( id , grp ) VALUES ( 3 , \"a\" ) ;");
    let rows = ctx.rows("SELECT id FROM t ORDER BY grp ;");
    // Equal keys keep their incoming order.
    assert_eq!(ids(rows), vec!["2", "3", "1"]);

    let rows = ctx.rows("SELECT id FROM t ORDER BY grp , id DESC ;");
    assert_eq!(ids(rows), vec!["1", "3", "2"]);
}

#[test]
fn test_order_by_with_restriction() {
    let ctx = TestContext::new();
    unsorted(&ctx);
    let rows = ctx.rows("SELECT id FROM t WHERE id != 2 ORDER BY id DESC ;");
    assert_eq!(ids(rows), vec!["3", "1"]);
}

#[test]
fn test_order_by_unknown_column() {
    let ctx = TestContext::new();
    unsorted(&ctx);
    let err = ctx.error("SELECT id FROM t ORDER BY bogus ;");
    assert!(err.contains("Column bogus does not exist"));
}
