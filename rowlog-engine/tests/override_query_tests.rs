//! Override expressions, the `when` predicate, reserved columns, and the
//! prepared-plan lifecycle across cache invalidations.

use rowlog_core::{
    ConfigError, EventId, ExecError, Invalidation, Operation, RowlogError, SqlType, SqlValue,
    TableKey,
};
use rowlog_engine::{TriggerEngine, TriggerFlavor};
use rowlog_testkit::{CallBuilder, CallFixture, MemoryCatalog, MemorySink, ScriptedQueryEngine};

fn host() -> (MemoryCatalog, ScriptedQueryEngine, MemorySink) {
    let mut catalog = MemoryCatalog::new();
    catalog.add_table(TableKey(1), "public", "orders", &[(0, "id")]);
    (catalog, ScriptedQueryEngine::new(), MemorySink::new())
}

fn insert_with_args(args: &[&str]) -> CallFixture {
    let mut all = vec!["testqueue"];
    all.extend_from_slice(args);
    CallBuilder::new(Operation::Insert)
        .args(&all)
        .column("id", SqlType::Int4)
        .column("name", SqlType::Text)
        .new_row(vec![Some(SqlValue::Int4(7)), Some(SqlValue::from("x"))])
        .build()
}

#[test]
fn test_override_rewrites_column_references() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["ev_extra3=id + 1 + id"]);

    db.script_cell("select $1 + 1 + $1", Some(SqlValue::Int4(15)));
    engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();

    // one deduplicated parameter, typed from the column
    assert_eq!(
        db.prepared,
        vec![("select $1 + 1 + $1".to_string(), vec![SqlType::Int4])]
    );
    // the current row's value was bound
    assert_eq!(db.executed[0].1, vec![Some(SqlValue::Int4(7))]);
    assert_eq!(sink.last().unwrap().ev_extra3.as_deref(), Some("15"));
}

#[test]
fn test_override_null_result_clears_field() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["ev_type=lookup_type(id)"]);

    db.script_cell("select lookup_type($1)", None);
    engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();

    assert_eq!(sink.last().unwrap().ev_type, None);
}

#[test]
fn test_overrides_execute_in_field_order() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    // arguments deliberately out of field order
    let fixture = insert_with_args(&["ev_extra2='b'", "ev_type='a'"]);

    db.script_cell("select 'b'", Some(SqlValue::from("b")));
    db.script_cell("select 'a'", Some(SqlValue::from("a")));
    engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();

    let order: Vec<&str> = db.executed.iter().map(|(sql, _)| sql.as_str()).collect();
    assert_eq!(order, vec!["select 'a'", "select 'b'"]);
    let ev = sink.last().unwrap();
    assert_eq!(ev.ev_type.as_deref(), Some("a"));
    assert_eq!(ev.ev_extra2.as_deref(), Some("b"));
}

#[test]
fn test_when_false_vetoes_event() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["when=id > 100"]);

    db.script_cell("select $1 > 100", Some(SqlValue::Bool(false)));
    let outcome = engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();

    assert_eq!(outcome.event, None);
    assert!(sink.events.is_empty());
}

#[test]
fn test_when_true_lets_event_through() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["when=id > 1"]);

    db.script_cell("select $1 > 1", Some(SqlValue::Bool(true)));
    let outcome = engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();

    assert_eq!(outcome.event, Some(EventId(1)));
}

#[test]
fn test_when_null_is_fatal() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["when=maybe(id)"]);

    db.script_cell("select maybe($1)", None);
    let err = engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap_err();
    assert_eq!(err, RowlogError::Exec(ExecError::WhenNull));
}

#[test]
fn test_when_non_boolean_is_fatal() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["when=id"]);

    db.script_cell("select $1", Some(SqlValue::Int4(1)));
    let err = engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap_err();
    assert_eq!(err, RowlogError::Exec(ExecError::WhenNotBool));
}

#[test]
fn test_wrong_row_count_is_fatal() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["ev_type=multi()"]);

    db.script(
        "select multi()",
        vec![vec![Some(SqlValue::from("a"))], vec![Some(SqlValue::from("b"))]],
    );
    let err = engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap_err();
    assert_eq!(err, RowlogError::Exec(ExecError::BadRowCount { rows: 2 }));
    assert!(sink.events.is_empty());
}

#[test]
fn test_string_literals_survive_rewrite() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    // 'id' inside the string literal must not become a parameter
    let fixture = insert_with_args(&["ev_extra4='id' || id"]);

    db.script_cell("select 'id' || $1", Some(SqlValue::from("id7")));
    engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();

    assert_eq!(db.prepared[0].0, "select 'id' || $1");
    assert_eq!(sink.last().unwrap().ev_extra4.as_deref(), Some("id7"));
}

#[test]
fn test_malformed_expression_is_fatal_at_first_use() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["ev_type='unterminated"]);

    let err = engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap_err();
    assert!(matches!(err, RowlogError::Parse(_)));
    assert!(sink.events.is_empty());
}

#[test]
fn test_failed_prepare_retries_after_invalidation() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["ev_type=badfunc(id)"]);

    db.fail_prepare("select badfunc($1)");
    let err = engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap_err();
    assert!(matches!(err, RowlogError::Exec(ExecError::PrepareFailed { .. })));

    // the host fixes the schema and reports the change
    db.heal();
    db.script_cell("select badfunc($1)", Some(SqlValue::from("T")));
    catalog.signal(Invalidation::Table(TableKey(1)));

    engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();
    assert_eq!(sink.last().unwrap().ev_type.as_deref(), Some("T"));
}

#[test]
fn test_plans_survive_across_invocations() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["ev_extra1=id"]);

    db.script_cell("select $1", Some(SqlValue::Int4(7)));
    for _ in 0..3 {
        engine
            .fire(
                TriggerFlavor::UrlEncoded,
                &fixture.call(),
                &mut catalog,
                &mut db,
                &mut sink,
            )
            .unwrap();
    }
    // prepared once, executed three times
    assert_eq!(db.prepared.len(), 1);
    assert_eq!(db.executed.len(), 3);
}

#[test]
fn test_invalidation_releases_prepared_plans() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["ev_extra1=id"]);

    db.script_cell("select $1", Some(SqlValue::Int4(7)));
    engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();
    assert!(db.released.is_empty());

    catalog.signal(Invalidation::Table(TableKey(1)));
    engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();
    // the old plan was handed back and a fresh one prepared
    assert_eq!(db.released.len(), 1);
    assert_eq!(db.prepared.len(), 2);
}

#[test]
fn test_mid_rebuild_invalidation_leaves_no_stale_trigger_info() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = insert_with_args(&["ev_extra1=id"]);

    db.script_cell("select $1", Some(SqlValue::Int4(7)));
    catalog.signal_during_fill(Invalidation::Table(TableKey(1)));
    engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();

    // the mid-rebuild signal forces a fresh rebuild, including trigger state
    engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();
    assert_eq!(catalog.lookups, 2);
    assert_eq!(db.prepared.len(), 2);
    assert_eq!(sink.events.len(), 2);
}

#[test]
fn test_reserved_columns_fill_event_fields() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = CallBuilder::new(Operation::Insert)
        .column("id", SqlType::Int4)
        .column("_rowlog_ev_type", SqlType::Text)
        .new_row(vec![
            Some(SqlValue::Int4(1)),
            Some(SqlValue::from("custom-type")),
        ])
        .build();

    engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();

    let ev = sink.last().unwrap();
    assert_eq!(ev.ev_type.as_deref(), Some("custom-type"));
    // the reserved column never shows up in the payload
    assert_eq!(ev.ev_data.as_deref(), Some("id=1"));
}

#[test]
fn test_unknown_reserved_column_is_fatal() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = CallBuilder::new(Operation::Insert)
        .column("id", SqlType::Int4)
        .column("_rowlog_ev_bogus", SqlType::Text)
        .new_row(vec![Some(SqlValue::Int4(1)), None])
        .build();

    let err = engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RowlogError::Config(ConfigError::UnknownReservedColumn { .. })
    ));
}

#[test]
fn test_explicit_override_beats_reserved_column() {
    let (mut catalog, mut db, mut sink) = host();
    let mut engine = TriggerEngine::new();
    let fixture = CallBuilder::new(Operation::Insert)
        .arg("ev_type='from-override'")
        .column("id", SqlType::Int4)
        .column("_rowlog_ev_type", SqlType::Text)
        .new_row(vec![
            Some(SqlValue::Int4(1)),
            Some(SqlValue::from("from-column")),
        ])
        .build();

    db.script_cell("select 'from-override'", Some(SqlValue::from("from-override")));
    engine
        .fire(
            TriggerFlavor::UrlEncoded,
            &fixture.call(),
            &mut catalog,
            &mut db,
            &mut sink,
        )
        .unwrap();

    assert_eq!(sink.last().unwrap().ev_type.as_deref(), Some("from-override"));
}
