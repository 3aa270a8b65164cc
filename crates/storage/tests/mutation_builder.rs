#![forbid(unsafe_code)]

use serde_json::json;
use tj_core::SortOrder;
use tj_core::ids::RowId;
use tj_storage::{CmpOp, DbManager, GameTx, SqliteStore, StoreError, TableSpec, fields};

fn cards() -> TableSpec {
    TableSpec::try_new("cards", "card_id").expect("cards table")
}

fn seed(tx: &GameTx<'_>) -> Vec<RowId> {
    tx.table(&cards())
        .expect("builder")
        .multiple_insert(&["card_location", "card_color", "card_value"])
        .values(vec![
            vec![json!("hand_1"), json!("red"), json!(3)],
            vec![json!("hand_1"), json!("blue"), json!(5)],
            vec![json!("hand_2"), json!("red"), json!(7)],
            vec![json!("board"), json!("green"), json!(1)],
        ])
        .expect("seed cards")
}

fn ids(rows: tj_core::Collection<tj_storage::RowImage>) -> Vec<RowId> {
    rows.ids()
}

struct Unbound;

impl DbManager for Unbound {
    const TABLE: Option<&'static str> = None;
    const PRIMARY: &'static str = "id";
}

struct Cards;

impl DbManager for Cards {
    const TABLE: Option<&'static str> = Some("cards");
    const PRIMARY: &'static str = "card_id";
}

#[test]
fn batch_insert_predicts_consecutive_ids() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let tx = store.transaction().expect("tx");
    let inserted = seed(&tx);
    assert_eq!(
        inserted,
        vec![RowId::Int(1), RowId::Int(2), RowId::Int(3), RowId::Int(4)]
    );

    tx.table(&cards())
        .expect("builder")
        .delete_by_id(4)
        .expect("delete last");
    let next = tx
        .table(&cards())
        .expect("builder")
        .insert(fields([
            ("card_location", json!("deck")),
            ("card_color", json!("red")),
            ("card_value", json!(9)),
        ]))
        .expect("insert");
    assert_eq!(next, RowId::Int(5), "ids are never reused after a delete");
}

#[test]
fn or_where_wraps_everything_before_it() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let tx = store.transaction().expect("tx");
    seed(&tx);

    // (location = hand_1 AND color = red) OR location = board
    let rows = tx
        .table(&cards())
        .expect("builder")
        .where_eq("card_location", "hand_1")
        .where_eq("card_color", "red")
        .or_where("card_location", "board")
        .get()
        .expect("read");
    assert_eq!(ids(rows), vec![RowId::Int(1), RowId::Int(4)]);

    // ((hand_1 AND red) OR board) AND value > 2
    let rows = tx
        .table(&cards())
        .expect("builder")
        .where_eq("card_location", "hand_1")
        .where_eq("card_color", "red")
        .or_where("card_location", "board")
        .where_op("card_value", CmpOp::Gt, 2)
        .get()
        .expect("read");
    assert_eq!(ids(rows), vec![RowId::Int(1)]);
}

#[test]
fn in_lists_and_null_checks() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let tx = store.transaction().expect("tx");
    seed(&tx);

    let none = tx
        .table(&cards())
        .expect("builder")
        .where_in("card_id", Vec::<i64>::new())
        .count()
        .expect("count");
    assert_eq!(none, 0);

    let all = tx
        .table(&cards())
        .expect("builder")
        .where_not_in("card_id", Vec::<i64>::new())
        .count()
        .expect("count");
    assert_eq!(all, 4);

    let hands = tx
        .table(&cards())
        .expect("builder")
        .where_in("card_location", ["hand_1", "hand_2"])
        .where_not_in("card_color", ["blue"])
        .get()
        .expect("read");
    assert_eq!(ids(hands), vec![RowId::Int(1), RowId::Int(3)]);

    assert_eq!(
        tx.table(&cards())
            .expect("builder")
            .where_null("card_location")
            .count()
            .expect("count"),
        0
    );
    assert_eq!(
        tx.table(&cards())
            .expect("builder")
            .where_not_null("card_location")
            .count()
            .expect("count"),
        4
    );
}

#[test]
fn aggregates_ordering_and_projection() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let tx = store.transaction().expect("tx");
    seed(&tx);

    let builder = || tx.table(&cards()).expect("builder");
    assert_eq!(builder().max("card_value").expect("max"), 7);
    assert_eq!(builder().min("card_value").expect("min"), 1);
    assert_eq!(builder().func("count", None).expect("count"), 4);
    assert_eq!(
        builder()
            .where_eq("card_location", "nowhere")
            .max("card_value")
            .expect("max of nothing"),
        0
    );

    match builder().func("AVG", Some("card_value")) {
        Err(StoreError::Configuration(message)) => assert!(message.contains("AVG")),
        other => panic!("expected configuration error, got {other:?}"),
    }

    let top = builder()
        .select(&["card_value"])
        .order_by("card_value", SortOrder::Desc)
        .limit(2)
        .get_as(|row| Ok(row["card_value"].as_i64().unwrap_or_default()))
        .expect("top two");
    assert_eq!(top.ids(), vec![RowId::Int(3), RowId::Int(2)]);
    assert_eq!(top.into_values(), vec![7, 5]);

    let single = builder()
        .select(&["card_color"])
        .where_id(2)
        .get_single()
        .expect("single")
        .expect("row");
    assert_eq!(single.len(), 2, "projection keeps the primary key: {single:?}");
    assert_eq!(single["card_color"], json!("blue"));
}

#[test]
fn invalid_identifiers_are_reported_at_execution() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let tx = store.transaction().expect("tx");
    seed(&tx);

    let result = tx
        .table(&cards())
        .expect("builder")
        .where_eq("card_value; DROP TABLE cards", 1)
        .get();
    assert!(matches!(result, Err(StoreError::Configuration(_))));
    assert_eq!(
        tx.table(&cards()).expect("builder").count().expect("count"),
        4
    );
}

#[test]
fn writes_return_affected_counts() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let tx = store.transaction().expect("tx");
    seed(&tx);

    let moved = tx
        .table(&cards())
        .expect("builder")
        .where_eq("card_location", "hand_1")
        .update(fields([("card_location", json!("deck"))]))
        .expect("update");
    assert_eq!(moved, 2);

    let bumped = tx
        .table(&cards())
        .expect("builder")
        .where_eq("card_location", "deck")
        .inc(fields([("card_value", json!(10))]))
        .expect("inc");
    assert_eq!(bumped, 2);
    assert_eq!(
        tx.table(&cards())
            .expect("builder")
            .max("card_value")
            .expect("max"),
        15
    );

    let untouched = tx
        .table(&cards())
        .expect("builder")
        .where_eq("card_location", "nowhere")
        .delete()
        .expect("delete");
    assert_eq!(untouched, 0);

    let rewrite_key = tx
        .table(&cards())
        .expect("builder")
        .update_by_id(1, fields([("card_id", json!(99))]));
    assert!(matches!(rewrite_key, Err(StoreError::InvalidInput(_))));
}

#[test]
fn managers_bind_tables_statically() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let tx = store.transaction().expect("tx");
    seed(&tx);

    assert_eq!(tx.db::<Cards>().expect("cards").count().expect("count"), 4);
    match tx.db::<Unbound>() {
        Err(StoreError::Configuration(message)) => assert_eq!(message, "no table bound"),
        Err(other) => panic!("expected configuration error, got {other:?}"),
        Ok(_) => panic!("unbound manager must not produce a builder"),
    }
}
