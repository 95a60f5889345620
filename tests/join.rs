mod common;

use common::TestContext;

fn dept_emp(ctx: &TestContext) {
    ctx.run("CREATE TABLE dept ( id int, dname varchar(10), PRIMARY KEY ( id ) ) ;");
    ctx.run("INSERT INTO dept ( id , dname ) VALUES ( 1 , \"eng\" ) ;");
    ctx.run("INSERT INTO dept ( id , dname ) VALUES ( 2 , \"ops\" ) ;");
    ctx.run(
        "CREATE TABLE emp ( eid int, dept_id int, ename varchar(10), PRIMARY KEY ( eid ) ) ;",
    );
    ctx.run("INSERT INTO emp ( eid , dept_id , ename ) VALUES ( 1 , 1 , \"ann\" ) ;");
    ctx.run("INSERT INTO emp ( eid , dept_id , ename ) VALUES ( 2 , 1 , \"bob\" ) ;");
    ctx.run("INSERT INTO emp ( eid , dept_id , ename ) VALUES ( 3 , 2 , \"cat\" ) ;");
}

#[test]
fn test_equi_join() {
    let ctx = TestContext::new();
    dept_emp(&ctx);
    let rows = ctx.rows("SELECT ename , dname FROM emp , dept WHERE dept_id = dept.id ;");
    assert_eq!(
        rows,
        vec![
            vec!["ann".to_string(), "eng".to_string()],
            vec!["bob".to_string(), "eng".to_string()],
            vec!["cat".to_string(), "ops".to_string()],
        ]
    );
}

#[test]
fn test_join_with_extra_restriction() {
    let ctx = TestContext::new();
    dept_emp(&ctx);
    let rows = ctx.rows(
        "SELECT ename FROM emp , dept WHERE dept_id = dept.id and dname = \"eng\" ;",
    );
    assert_eq!(
        rows,
        vec![vec!["ann".to_string()], vec!["bob".to_string()]]
    );
}

#[test]
fn test_join_filters_unmatched_probe_rows() {
    let ctx = TestContext::new();
    dept_emp(&ctx);
    // No department 9 exists; the padded row fails the join restriction.
    ctx.run("CREATE TABLE lone ( eid int, dept_id int ) ;");
    ctx.run("INSERT INTO lone ( eid , dept_id ) VALUES ( 7 , 9 ) ;");
    let rows = ctx.rows("SELECT eid FROM lone , dept WHERE dept_id = dept.id ;");
    assert!(rows.is_empty());
}

#[test]
fn test_join_without_condition_pairs_cyclically() {
    let ctx = TestContext::new();
    ctx.run("CREATE TABLE a ( x int ) ;");
    ctx.run("INSERT INTO a ( x ) VALUES ( 1 ) ;");
    ctx.run("INSERT INTO a ( x ) VALUES ( 2 ) ;");
    ctx.run("CREATE TABLE b ( y int ) ;");
    ctx.run("INSERT INTO b ( y ) VALUES ( 10 ) ;");
    ctx.run("INSERT INTO b ( y ) VALUES ( 20 ) ;");
    // Each probe row pairs with the next build row, rewinding at the end.
    let rows = ctx.rows("SELECT * FROM a , b ;");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), 2);
}

#[test]
fn test_join_ordering_and_projection() {
    let ctx = TestContext::new();
    dept_emp(&ctx);
    let rows = ctx.rows(
        "SELECT ename FROM emp , dept WHERE dept_id = dept.id ORDER BY ename DESC ;",
    );
    assert_eq!(
        rows,
        vec![
            vec!["cat".to_string()],
            vec!["bob".to_string()],
            vec!["ann".to_string()],
        ]
    );
}

#[test]
fn test_join_distinct() {
    let ctx = TestContext::new();
    dept_emp(&ctx);
    let rows =
        ctx.rows("SELECT DISTINCT dname FROM emp , dept WHERE dept_id = dept.id ;");
    assert_eq!(
        rows,
        vec![vec!["eng".to_string()], vec!["ops".to_string()]]
    );
}

#[test]
fn test_join_three_tables() {
    let ctx = TestContext::new();
    dept_emp(&ctx);
    ctx.run("CREATE TABLE site ( sid int, dept_id int, city varchar(10) ) ;");
    ctx.run("INSERT INTO site ( sid , dept_id , city ) VALUES ( 1 , 1 , \"berlin\" ) ;");
    ctx.run("INSERT INTO site ( sid , dept_id , city ) VALUES ( 2 , 2 , \"tokyo\" ) ;");
    let rows = ctx.rows(
        "SELECT ename , city FROM emp , dept , site WHERE emp.dept_id = dept.id and site.dept_id = dept.id ;",
    );
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], vec!["ann".to_string(), "berlin".to_string()]);
    assert_eq!(rows[2], vec!["cat".to_string(), "tokyo".to_string()]);
}

#[test]
fn test_qualified_projection_across_join() {
    let ctx = TestContext::new();
    dept_emp(&ctx);
    let rows = ctx.rows(
        "SELECT emp.dept_id , dept.id FROM emp , dept WHERE dept_id = dept.id ;",
    );
    for row in rows {
        assert_eq!(row[0], row[1]);
    }
}
