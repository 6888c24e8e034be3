use super::*;
use crate::dialect::{MySql, Postgres, Sqlite};
use crate::schema::{EntityRow, SchemaRegistry, TableMeta};

fn assert_protocol(err: OrmError, op: &str, in_state: State) {
    match err {
        OrmError::ProtocolViolation { operation, state } => {
            assert_eq!(operation, op);
            assert_eq!(state, in_state);
        }
        other => panic!("expected protocol violation, got {other:?}"),
    }
}

struct User {
    id: i64,
    name: String,
    email: Option<String>,
}

impl TableMeta for User {
    fn table_name() -> &'static str {
        "users"
    }
    fn columns() -> &'static [&'static str] {
        &["id", "name", "email"]
    }
    fn primary_key() -> &'static [&'static str] {
        &["id"]
    }
    fn auto_generated() -> &'static [&'static str] {
        &["id"]
    }
}

impl EntityRow for User {
    fn property_value(&self, property: &str) -> Option<Value> {
        match property {
            "id" => Some(self.id.to_value()),
            "name" => Some(self.name.to_value()),
            "email" => Some(self.email.to_value()),
            _ => None,
        }
    }
}

fn mapped(dialect: impl Dialect + 'static) -> Statement {
    let mut registry = SchemaRegistry::new();
    registry.register::<User>();
    Statement::with_config(&SqlConfig::new(dialect).with_schema(registry))
}

// ==================== SELECT ====================

#[test]
fn test_select_where_order_limit() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("id")?.select("name")?.from("users")?;
    q.where_col("status")?.eq("active")?;
    q.order_by_desc("created_at")?.limit(10)?;

    assert_eq!(
        q.as_str(),
        "SELECT `id`,`name` FROM `users` WHERE (`status`='active') ORDER BY `created_at` DESC LIMIT 10"
    );
    assert_eq!(q.state(), State::OrderByList);
    Ok(())
}

#[test]
fn test_select_uses_dialect_quotes() -> OrmResult<()> {
    let mut q = Statement::new(Sqlite);
    q.select_as("COUNT(id)", "n")?.from("orders")?;
    assert_eq!(q.to_sql(), "SELECT COUNT(\"id\") AS \"n\" FROM \"orders\"");
    assert_eq!(q.to_string(), q.to_sql());
    Ok(())
}

#[test]
fn test_join_with_aliases() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("u.name")?.select("o.total")?.from_as("users", "u")?;
    q.join(JoinKind::Left, "orders", Some("o"))?
        .join_on("o.user_id", "u.id")?
        .join_on("o.deleted", "0")?;

    assert_eq!(
        q.as_str(),
        "SELECT `u`.`name`,`o`.`total` FROM `users` `u`\nLEFT JOIN `orders` `o` ON `o`.`user_id`=`u`.`id` AND `o`.`deleted`=0"
    );
    assert_eq!(q.state(), State::JoinOnClause);
    Ok(())
}

#[test]
fn test_join_on_requires_join() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?;
    assert_protocol(q.join_on("a", "b").unwrap_err(), "join_on", State::FromClause);
    Ok(())
}

#[test]
fn test_limit_offset() -> OrmResult<()> {
    let mut q = Statement::new(Sqlite);
    q.select("a")?.from("t")?.limit_offset(10, 20)?;
    assert_eq!(q.as_str(), "SELECT \"a\" FROM \"t\" LIMIT 10 OFFSET 20");
    Ok(())
}

#[test]
fn test_limit_rejected_in_start() {
    let mut q = Statement::new(MySql);
    assert_protocol(q.limit(1).unwrap_err(), "limit", State::Start);
    assert!(q.is_empty());
}

// ==================== WHERE ====================

#[test]
fn test_compare_before_where_is_rejected() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?;
    let before = q.to_sql();

    assert_protocol(q.eq(1).unwrap_err(), "compare", State::FromClause);
    assert_eq!(q.as_str(), before);
    assert_eq!(q.state(), State::FromClause);
    Ok(())
}

#[test]
fn test_conditions_are_anded() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?;
    q.where_col("a")?.ge(1)?;
    q.where_col("b")?.like("x%")?;
    q.where_col("c")?.between(1.5, 2.5)?;
    q.where_col("d")?.is_not_null()?;

    assert_eq!(
        q.as_str(),
        "SELECT `a` FROM `t` WHERE (`a`>=1) AND (`b` LIKE 'x%') AND (`c` BETWEEN 1.5 AND 2.5) AND (`d` IS NOT NULL)"
    );
    Ok(())
}

#[test]
fn test_eq_null_renders_is_null() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.delete("t")?;
    q.where_col("a")?.eq(None::<i32>)?;
    assert_eq!(q.as_str(), "DELETE FROM `t` WHERE (`a` IS NULL)");
    Ok(())
}

#[test]
fn test_in_list() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.delete("t")?;
    q.where_col("id")?.in_list([1, 2, 3])?;
    q.where_col("kind")?.in_list(Vec::<String>::new())?;
    assert_eq!(
        q.as_str(),
        "DELETE FROM `t` WHERE (`id` IN (1,2,3)) AND (`kind` IN (NULL))"
    );
    Ok(())
}

#[test]
fn test_not_in_list() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("id")?.from("t")?;
    q.where_col("id")?.not_in_list([4, 5])?;
    q.where_col("LOWER(kind)")?.not_in_list(Vec::<String>::new())?;
    assert_eq!(
        q.as_str(),
        "SELECT `id` FROM `t` WHERE (`id` NOT IN (4,5)) AND (1=1)"
    );
    assert_eq!(q.state(), State::WhereClause);
    Ok(())
}

#[test]
fn test_empty_not_in_list_inside_or_group() -> OrmResult<()> {
    let mut q = Statement::new(Sqlite);
    q.delete("t")?;
    q.where_or_group()?;
    q.where_col("a")?.eq(1)?;
    q.where_col("b")?.not_in_list(Vec::<i64>::new())?;
    q.end_where_or_group()?;
    assert_eq!(q.as_str(), "DELETE FROM \"t\" WHERE (0 OR (\"a\"=1) OR (1=1))");
    Ok(())
}

#[test]
fn test_where_expr_escapes_arguments() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("id")?.from("users")?;
    q.where_expr("name = {0}", &[&"x' OR '1'='1"])?;
    assert_eq!(
        q.as_str(),
        "SELECT `id` FROM `users` WHERE (name = 'x'' OR ''1''=''1')"
    );
    Ok(())
}

#[test]
fn test_or_group() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?;
    q.where_col("a")?.eq(1)?;
    q.where_or_group()?;
    q.where_col("b")?.eq(2)?;
    q.where_col("c")?.is_null()?;
    assert_eq!(q.state(), State::WhereOrGroup);
    q.end_where_or_group()?;

    assert_eq!(
        q.as_str(),
        "SELECT `a` FROM `t` WHERE (`a`=1) AND (0 OR (`b`=2) OR (`c` IS NULL))"
    );
    assert_eq!(q.state(), State::WhereClause);
    Ok(())
}

#[test]
fn test_or_group_opens_where() -> OrmResult<()> {
    let mut q = Statement::new(Sqlite);
    q.update("t")?.set("a", 1)?;
    q.where_or_group()?;
    q.where_col("b")?.eq("x")?;
    q.end_where_or_group()?;
    assert_eq!(q.as_str(), "UPDATE \"t\" SET \"a\"=1 WHERE (0 OR (\"b\"='x'))");
    Ok(())
}

#[test]
fn test_open_or_group_blocks_limit_and_new_command() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?.where_or_group()?;
    assert_protocol(q.limit(1).unwrap_err(), "limit", State::WhereOrGroup);
    assert_protocol(
        q.new_command().unwrap_err(),
        "new_command",
        State::WhereOrGroup,
    );
    assert_protocol(
        q.where_or_group().unwrap_err(),
        "where_or_group",
        State::WhereOrGroup,
    );
    Ok(())
}

#[test]
fn test_postgres_booleans() -> OrmResult<()> {
    let mut q = Statement::new(Postgres);
    q.select("id")?.from("flags")?;
    q.where_col("active")?.eq(true)?;
    assert_eq!(
        q.as_str(),
        "SELECT \"id\" FROM \"flags\" WHERE (\"active\"=TRUE)"
    );
    Ok(())
}

#[test]
fn test_compare_with_operands() -> OrmResult<()> {
    let mut sub = Statement::new(MySql);
    sub.select("MAX(total)")?.from("orders")?;

    let mut q = Statement::new(MySql);
    q.select("id")?.from("orders")?;
    q.where_col("total")?.compare(CompareOp::Eq, Operand::subquery(sub))?;
    q.where_col("created")?.compare(
        CompareOp::Gt,
        Operand::expr("NOW() - INTERVAL {0} DAY", &[&7]),
    )?;

    assert_eq!(
        q.as_str(),
        "SELECT `id` FROM `orders` WHERE (`total`=(SELECT MAX(`total`) FROM `orders`)) AND (`created`>NOW() - INTERVAL 7 DAY)"
    );
    Ok(())
}

#[test]
fn test_unfinished_subquery_operand_is_rejected() -> OrmResult<()> {
    let mut sub = Statement::new(MySql);
    sub.select("a")?.from("t")?.where_col("b")?;

    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?.where_col("a")?;
    let err = q.compare(CompareOp::Eq, Operand::subquery(sub)).unwrap_err();
    assert!(err.is_protocol_violation());
    Ok(())
}

#[test]
fn test_non_finite_float_is_unrenderable() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?.where_col("x")?;
    assert!(matches!(
        q.eq(f64::INFINITY),
        Err(OrmError::UnrenderableValue(_))
    ));
    Ok(())
}

// ==================== Nested delegates ====================

#[test]
fn test_in_subquery_keeps_parent_bookmarks() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("name")?.from("users")?;
    q.where_col("id")?.in_subquery(|s| {
        s.select("user_id")?.from("orders")?;
        s.where_col("total")?.gt(100)?;
        Ok(())
    })?;

    assert_eq!(
        q.as_str(),
        "SELECT `name` FROM `users` WHERE (`id` IN (SELECT `user_id` FROM `orders` WHERE (`total`>100)))"
    );
    assert_eq!(q.state(), State::WhereClause);
    assert_eq!(
        q.to_count()?.as_str(),
        "SELECT COUNT(*) FROM `users` WHERE (`id` IN (SELECT `user_id` FROM `orders` WHERE (`total`>100)))"
    );
    Ok(())
}

#[test]
fn test_nested_failure_restores_parent_state() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?.where_col("id")?;

    let err = q
        .in_subquery(|s| {
            s.select("x")?.from("y")?;
            s.new_command()?;
            Ok(())
        })
        .unwrap_err();
    assert_protocol(err, "new_command", State::FromClause);
    assert_eq!(q.state(), State::WhereConditionPending);
    Ok(())
}

#[test]
fn test_nested_must_close_its_condition() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?.where_col("id")?;
    let err = q
        .in_subquery(|s| {
            s.select("x")?.from("y")?.where_col("z")?;
            Ok(())
        })
        .unwrap_err();
    assert_protocol(err, "in_subquery", State::WhereConditionPending);

    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?.where_col("id")?;
    let err = q.in_subquery(|_| Ok(())).unwrap_err();
    assert_protocol(err, "in_subquery", State::Start);
    Ok(())
}

#[test]
fn test_from_and_select_subqueries() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("n")?;
    q.select_subquery("total", |s| {
        s.select("SUM(amount)")?.from("payments")?;
        Ok(())
    })?;
    q.from_subquery("s", |s| {
        s.select_count()?.from("t")?;
        Ok(())
    })?;
    assert_eq!(
        q.as_str(),
        "SELECT `n`,(SELECT SUM(`amount`) FROM `payments`) AS `total` FROM (SELECT COUNT(*) FROM `t`) `s`"
    );
    Ok(())
}

#[test]
fn test_where_exists() -> OrmResult<()> {
    let mut q = Statement::new(Sqlite);
    q.select("id")?.from_as("users", "u")?;
    q.where_exists(|s| {
        s.select_raw("1")?.from_as("orders", "o")?;
        s.where_expr("o.user_id = u.id", &[])?;
        Ok(())
    })?;
    assert_eq!(
        q.as_str(),
        "SELECT \"id\" FROM \"users\" \"u\" WHERE (EXISTS (SELECT 1 FROM \"orders\" \"o\" WHERE (o.user_id = u.id)))"
    );
    Ok(())
}

// ==================== INSERT / UPDATE / DELETE ====================

#[test]
fn test_multi_row_insert_mysql_upsert() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.insert("t", &["k", "v"])?
        .values(&[&1, &"a"])?
        .values(&[&2, &"b"])?
        .upsert(&["k"])?;
    assert_eq!(
        q.as_str(),
        "INSERT INTO `t` (`k`,`v`) VALUES (1,'a'),(2,'b') ON DUPLICATE KEY UPDATE `v`=VALUES(`v`)"
    );
    assert_eq!(q.state(), State::TrailingOptions);
    Ok(())
}

#[test]
fn test_multi_row_insert_sqlite_upsert() -> OrmResult<()> {
    let mut q = Statement::new(Sqlite);
    q.insert("t", &["k", "v"])?
        .values(&[&1, &"a"])?
        .values(&[&2, &"b"])?
        .upsert(&["k"])?;
    assert_eq!(
        q.as_str(),
        "INSERT INTO \"t\" (\"k\",\"v\") VALUES (1,'a'),(2,'b') ON CONFLICT(\"k\") DO UPDATE SET \"v\"=EXCLUDED.\"v\""
    );
    Ok(())
}

#[test]
fn test_values_rows() -> OrmResult<()> {
    let mut q = Statement::new(Sqlite);
    q.insert("t", &["a", "b"])?.values_rows(vec![
        vec![Value::Int(1), Value::Bytes(vec![0xab])],
        vec![Value::Null, Value::Bool(true)],
    ])?;
    assert_eq!(
        q.as_str(),
        "INSERT INTO \"t\" (\"a\",\"b\") VALUES (1,x'ab'),(NULL,1)"
    );
    Ok(())
}

#[test]
fn test_values_arity_mismatch() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.insert("t", &["a", "b"])?;
    assert_protocol(q.values(&[&1]).unwrap_err(), "values", State::InsertHead);
    assert_eq!(q.as_str(), "INSERT INTO `t` (`a`,`b`)");
    Ok(())
}

#[test]
fn test_upsert_requires_values() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.insert("t", &["a"])?;
    assert_protocol(q.upsert(&["a"]).unwrap_err(), "upsert", State::InsertHead);
    Ok(())
}

#[test]
fn test_upsert_requires_keys() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.insert("t", &["a"])?.values(&[&1])?;
    assert_protocol(q.upsert(&[]).unwrap_err(), "upsert", State::ValuesList);
    assert_protocol(
        q.upsert_columns(&[], &[]).unwrap_err(),
        "upsert_columns",
        State::ValuesList,
    );
    assert_eq!(q.as_str(), "INSERT INTO `t` (`a`) VALUES (1)");

    let mut q = Statement::new(Sqlite);
    q.insert("t", &["a", "b"])?.values(&[&1, &2])?;
    assert_protocol(
        q.upsert_columns(&[], &["b"]).unwrap_err(),
        "upsert_columns",
        State::ValuesList,
    );
    assert_eq!(q.as_str(), "INSERT INTO \"t\" (\"a\",\"b\") VALUES (1,2)");

    let mut q = Statement::new(Postgres);
    q.insert("t", &["a"])?.values(&[&1])?;
    assert_protocol(q.upsert(&[]).unwrap_err(), "upsert", State::ValuesList);
    q.upsert(&["a"])?;
    assert_eq!(
        q.as_str(),
        "INSERT INTO \"t\" (\"a\") VALUES (1) ON CONFLICT(\"a\") DO NOTHING"
    );
    Ok(())
}

#[test]
fn test_insert_ignore_per_dialect() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.insert_ignore("t", &["a"])?.values(&[&1])?;
    assert_eq!(q.as_str(), "INSERT IGNORE INTO `t` (`a`) VALUES (1)");

    let mut q = Statement::new(Sqlite);
    q.insert_ignore("t", &["a"])?;
    assert_eq!(q.as_str(), "INSERT OR IGNORE INTO \"t\" (\"a\")");

    let mut q = Statement::new(Postgres);
    assert!(matches!(
        q.insert_ignore("t", &["a"]),
        Err(OrmError::UnsupportedDialect(_))
    ));
    assert!(q.is_empty());
    Ok(())
}

#[test]
fn test_insert_select() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.insert_select("archive", &["id", "name"], |s| {
        s.select("id")?.select("name")?.from("users")?;
        s.where_col("active")?.eq(false)?;
        Ok(())
    })?;
    assert_eq!(
        q.as_str(),
        "INSERT INTO `archive` (`id`,`name`) SELECT `id`,`name` FROM `users` WHERE (`active`=0)"
    );
    assert_eq!(q.state(), State::TrailingOptions);
    Ok(())
}

#[test]
fn test_update_set() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.update("users")?
        .set("name", "bob")?
        .set_expr("hits", "hits+{0}", &[&1])?;
    q.where_col("id")?.eq(7)?;
    assert_eq!(
        q.as_str(),
        "UPDATE `users` SET `name`='bob',`hits`=hits+1 WHERE (`id`=7)"
    );
    Ok(())
}

#[test]
fn test_set_column_with_append() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.update("t")?.set_column("note")?.append("CONCAT(note, {0})", &[&"!"])?;
    assert_eq!(q.as_str(), "UPDATE `t` SET `note`=CONCAT(note, '!')");
    assert_eq!(q.state(), State::SetList);
    Ok(())
}

#[test]
fn test_set_requires_update() {
    let mut q = Statement::new(MySql);
    assert_protocol(q.set("a", 1).unwrap_err(), "set", State::Start);
}

#[test]
fn test_delete() -> OrmResult<()> {
    let mut q = Statement::new(Sqlite);
    q.delete("sessions")?;
    q.where_col("expires")?.lt("2024-01-01")?;
    assert_eq!(
        q.as_str(),
        "DELETE FROM \"sessions\" WHERE (\"expires\"<'2024-01-01')"
    );
    Ok(())
}

// ==================== Commands ====================

#[test]
fn test_new_command_batches_with_separator() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.insert("t", &["a"])?.values(&[&1])?;
    q.new_command()?;
    q.select_last_insert_id()?;
    assert_eq!(
        q.as_str(),
        "INSERT INTO `t` (`a`) VALUES (1);\nSELECT LAST_INSERT_ID()"
    );

    let mut q = Statement::new(Sqlite);
    q.new_command()?;
    assert!(q.is_empty());
    q.select_last_insert_id()?;
    assert_eq!(q.as_str(), "SELECT last_insert_rowid()");
    Ok(())
}

#[test]
fn test_discard_empty_command() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?;
    q.new_command()?;
    q.update("x")?;
    q.discard_empty_command()?;
    assert_eq!(q.as_str(), "SELECT `a` FROM `t`;\n");
    assert_eq!(q.state(), State::Start);

    q.delete("y")?;
    assert_eq!(q.as_str(), "SELECT `a` FROM `t`;\nDELETE FROM `y`");
    Ok(())
}

#[test]
fn test_discard_rejects_built_clauses() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?;
    assert_protocol(
        q.discard_empty_command().unwrap_err(),
        "discard_empty_command",
        State::FromClause,
    );
    Ok(())
}

#[test]
fn test_clone_is_independent() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?;
    let mut copy = q.clone();
    copy.where_col("a")?.eq(1)?;
    assert_eq!(q.as_str(), "SELECT `a` FROM `t`");
    assert_eq!(q.state(), State::FromClause);
    assert_eq!(copy.state(), State::WhereClause);
    Ok(())
}

#[test]
fn test_tag() {
    let q = Statement::new(MySql).tagged("load_users");
    assert_eq!(q.get_tag(), Some("load_users"));
}

// ==================== Transforms ====================

#[test]
fn test_to_count_and_to_delete() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.select("b")?.from("t")?;
    q.where_col("a")?.eq(1)?;

    assert_eq!(
        q.to_count()?.as_str(),
        "SELECT COUNT(*) FROM `t` WHERE (`a`=1)"
    );
    assert_eq!(q.to_delete()?.as_str(), "DELETE FROM `t` WHERE (`a`=1)");
    // the source is untouched
    assert_eq!(q.as_str(), "SELECT `a`,`b` FROM `t` WHERE (`a`=1)");
    Ok(())
}

#[test]
fn test_to_count_keeps_previous_commands() -> OrmResult<()> {
    let mut q = Statement::new(Sqlite);
    q.delete("log")?;
    q.new_command()?;
    q.select("a")?.from("t")?;
    assert_eq!(
        q.to_count()?.as_str(),
        "DELETE FROM \"log\";\nSELECT COUNT(*) FROM \"t\""
    );
    assert_eq!(q.to_delete()?.as_str(), "DELETE FROM \"t\"");
    Ok(())
}

#[test]
fn test_to_count_requires_from() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?;
    assert_protocol(q.to_count().unwrap_err(), "to_count", State::SelectList);
    assert!(Statement::new(MySql).to_delete().is_err());
    Ok(())
}

#[test]
fn test_to_count_continues_building() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?.from("t")?;
    let mut count = q.to_count()?;
    count.where_col("a")?.gt(0)?;
    assert_eq!(count.as_str(), "SELECT COUNT(*) FROM `t` WHERE (`a`>0)");
    Ok(())
}

// ==================== Entities ====================

#[test]
fn test_select_all_supplies_implicit_from() -> OrmResult<()> {
    let mut q = mapped(MySql);
    q.select_all::<User>()?;
    q.where_prop::<User>("name")?.eq("x")?;
    assert_eq!(
        q.as_str(),
        "SELECT `id`,`name`,`email` FROM `users` WHERE (`name`='x')"
    );
    assert_eq!(
        q.to_count()?.as_str(),
        "SELECT COUNT(*) FROM `users` WHERE (`name`='x')"
    );
    Ok(())
}

#[test]
fn test_implicit_from_needs_entity() -> OrmResult<()> {
    let mut q = Statement::new(MySql);
    q.select("a")?;
    assert_protocol(q.where_col("a").unwrap_err(), "where_col", State::SelectList);
    assert_eq!(q.as_str(), "SELECT `a`");
    Ok(())
}

#[test]
fn test_unknown_property_is_unmapped() -> OrmResult<()> {
    let mut q = mapped(MySql);
    q.select_all::<User>()?;
    assert!(matches!(
        q.where_prop::<User>("nickname"),
        Err(OrmError::UnmappedSchema(_))
    ));
    Ok(())
}

#[test]
fn test_entity_without_resolver_is_unmapped() {
    let mut q = Statement::new(MySql);
    assert!(matches!(
        q.select_all::<User>(),
        Err(OrmError::UnmappedSchema(_))
    ));
}

#[test]
fn test_insert_entities_with_upsert() -> OrmResult<()> {
    let a = User {
        id: 0,
        name: "a".into(),
        email: None,
    };
    let b = User {
        id: 0,
        name: "b".into(),
        email: Some("b@x".into()),
    };

    let mut q = mapped(MySql);
    q.insert_entity::<User>()?
        .values_entity(&a)?
        .values_entity(&b)?
        .upsert_entity::<User>()?;
    assert_eq!(
        q.as_str(),
        "INSERT INTO `users` (`name`,`email`) VALUES ('a',NULL),('b','b@x') ON DUPLICATE KEY UPDATE `name`=VALUES(`name`),`email`=VALUES(`email`)"
    );
    Ok(())
}

#[test]
fn test_values_entity_needs_matching_insert() -> OrmResult<()> {
    let a = User {
        id: 1,
        name: "a".into(),
        email: None,
    };
    let mut q = mapped(MySql);
    q.insert("users", &["id", "name"])?;
    assert!(q.values_entity(&a).unwrap_err().is_protocol_violation());
    Ok(())
}

#[test]
fn test_update_entity() -> OrmResult<()> {
    let u = User {
        id: 7,
        name: "O'Neil".into(),
        email: None,
    };
    let mut q = mapped(Sqlite);
    q.update_entity(&u)?;
    assert_eq!(
        q.as_str(),
        "UPDATE \"users\" SET \"name\"='O''Neil',\"email\"=NULL WHERE (\"id\"=7)"
    );
    Ok(())
}

#[test]
fn test_delete_entity_with_where_prop() -> OrmResult<()> {
    let mut q = mapped(MySql);
    q.delete_entity::<User>()?;
    q.where_prop::<User>("id")?.in_list([1, 2])?;
    assert_eq!(q.as_str(), "DELETE FROM `users` WHERE (`id` IN (1,2))");
    Ok(())
}

#[test]
fn test_from_entity_and_clones_share_cache() -> OrmResult<()> {
    let mut q = mapped(MySql);
    q.select("u.id")?.from_entity::<User>(Some("u"))?;
    let copy = q.clone();
    assert!(Arc::ptr_eq(&q.entity::<User>()?, &copy.entity::<User>()?));
    assert_eq!(q.as_str(), "SELECT `u`.`id` FROM `users` `u`");
    Ok(())
}
