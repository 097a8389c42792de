// Integration tests for AmazeDB core over the file backend
use amazedb_core::{
    AmazeError, Document, Durability, ErrorKind, Query, Store, StoreOptions, Update,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

// Helper to create a file-backed store in a fresh directory
fn create_test_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open(StoreOptions::new().with_root(temp_dir.path())).unwrap();
    (temp_dir, store)
}

fn doc(value: Value) -> Document {
    Document::from_value(value).unwrap()
}

fn names(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .map(|d| d.get("name").and_then(|v| v.as_str()).unwrap().to_string())
        .collect()
}

#[test]
fn test_abcd_efgh_scenario() {
    let (_temp, store) = create_test_store();
    let group = store.db("test").unwrap().create_group("people").unwrap();

    group.insert(doc(json!({"name": "ABCD", "age": 10}))).unwrap();
    group.insert(doc(json!({"name": "EFGH", "age": 20}))).unwrap();

    let older = group
        .get(&Query::from_json(&json!({"age": {"__gt": 10}})).unwrap(), None)
        .unwrap();
    assert_eq!(older, vec![doc(json!({"name": "EFGH", "age": 20}))]);

    let updated = group
        .update(
            &Query::from_json(&json!({"name": "ABCD"})).unwrap(),
            &Update::from_json(&json!({"age": 99})).unwrap(),
        )
        .unwrap();
    assert_eq!(updated, 1);

    let abcd = group
        .get_one(&Query::from_json(&json!({"name": "ABCD"})).unwrap(), None)
        .unwrap()
        .unwrap();
    assert_eq!(abcd, doc(json!({"name": "ABCD", "age": 99})));
}

#[test]
fn test_insert_then_get_one_roundtrip() {
    let (_temp, store) = create_test_store();
    let group = store.db("test").unwrap().group("things").unwrap();

    let original = doc(json!({
        "title": "Ünïcödé ✓",
        "count": 3,
        "ratio": 0.25,
        "whole": 2.0,
        "flag": false,
        "nothing": null,
        "tags": ["a", 1, true],
        "nested": {"x": {"y": [1, 2]}}
    }));
    group.insert(original.clone()).unwrap();

    let back = group
        .get_one(&Query::new().eq("title", "Ünïcödé ✓").eq("count", 3), None)
        .unwrap()
        .unwrap();
    assert_eq!(back, original);
    assert!(back.get("count").unwrap().is_i64());
    assert!(back.get("whole").unwrap().is_f64());
}

#[test]
fn test_equality_is_type_sensitive() {
    let (_temp, store) = create_test_store();
    let group = store.db("test").unwrap().group("ages").unwrap();
    group
        .insert_many(vec![
            doc(json!({"name": "num", "age": 5})),
            doc(json!({"name": "str", "age": "5"})),
        ])
        .unwrap();

    let found = group.get(&Query::from_json(&json!({"age": "5"})).unwrap(), None).unwrap();
    assert_eq!(names(&found), vec!["str"]);
    let found = group.get(&Query::from_json(&json!({"age": 5})).unwrap(), None).unwrap();
    assert_eq!(names(&found), vec!["num"]);
}

#[test]
fn test_ordering_operators_agree_with_numeric_order() {
    let (_temp, store) = create_test_store();
    let group = store.db("test").unwrap().group("abc").unwrap();
    group
        .insert_many(vec![
            doc(json!({"name": "a", "v": 1})),
            doc(json!({"name": "b", "v": 2})),
            doc(json!({"name": "c", "v": 3})),
        ])
        .unwrap();

    let gt_a = group.get(&Query::new().gt("v", 1), None).unwrap();
    assert_eq!(names(&gt_a), vec!["b", "c"]);
    let lte_b = group.get(&Query::new().lte("v", 2), None).unwrap();
    assert_eq!(names(&lte_b), vec!["a", "b"]);
    let gte_b = group.get(&Query::new().gte("v", 2), None).unwrap();
    assert_eq!(names(&gte_b), vec!["b", "c"]);
    let lt_b = group.get(&Query::new().lt("v", 2), None).unwrap();
    assert_eq!(names(&lt_b), vec!["a"]);
}

#[test]
fn test_large_integers_compare_exactly_with_floats() {
    let (_temp, store) = create_test_store();
    let group = store.db("test").unwrap().group("ids").unwrap();
    group
        .insert_many(vec![
            doc(json!({"name": "above", "id": 9_007_199_254_740_993i64})),
            doc(json!({"name": "at", "id": 9_007_199_254_740_992i64})),
        ])
        .unwrap();

    let eq = Query::from_json(&json!({"id": {"__eq": 9_007_199_254_740_992.0}})).unwrap();
    assert_eq!(names(&group.get(&eq, None).unwrap()), vec!["at"]);
    let gt = Query::from_json(&json!({"id": {"__gt": 9_007_199_254_740_992.0}})).unwrap();
    assert_eq!(names(&group.get(&gt, None).unwrap()), vec!["above"]);
}

#[test]
fn test_heterogeneous_group_scan_survives_mismatches() {
    let (_temp, store) = create_test_store();
    let group = store.db("test").unwrap().group("mixed").unwrap();
    group
        .insert_many(vec![
            doc(json!({"name": "n", "v": 10})),
            doc(json!({"name": "s", "v": "ten"})),
            doc(json!({"name": "x"})),
            doc(json!({"name": "m", "v": 30})),
        ])
        .unwrap();

    let found = group.get(&Query::new().gt("v", 5), None).unwrap();
    assert_eq!(names(&found), vec!["n", "m"]);

    let picky = Query::new().custom("v", |v| v.as_i64().expect("only numbers") > 20);
    let found = group.get(&picky, None).unwrap();
    assert_eq!(names(&found), vec!["m"]);
}

#[test]
fn test_regex_partial_match() {
    let (_temp, store) = create_test_store();
    let group = store.db("test").unwrap().group("people").unwrap();
    group
        .insert_many(vec![
            doc(json!({"name": "Jalaj Kumar"})),
            doc(json!({"name": "Someone Else"})),
        ])
        .unwrap();

    for pattern in ["Jal", ".*Kum.*", "Kumar$"] {
        let q = Query::from_json(&json!({"name": {"__re": pattern}})).unwrap();
        assert_eq!(names(&group.get(&q, None).unwrap()), vec!["Jalaj Kumar"]);
    }
}

#[test]
fn test_update_many_leaves_other_fields() {
    let (_temp, store) = create_test_store();
    let group = store.db("test").unwrap().group("staff").unwrap();
    group
        .insert_many(vec![
            doc(json!({"name": "a", "dept": "x", "level": 1})),
            doc(json!({"name": "b", "dept": "y", "level": 2})),
            doc(json!({"name": "c", "dept": "x", "level": 3})),
        ])
        .unwrap();

    let n = group
        .update(&Query::new().eq("dept", "x"), &Update::new().set("active", true))
        .unwrap();
    assert_eq!(n, 2);

    let all = group.get(&Query::new(), None).unwrap();
    assert_eq!(all[0], doc(json!({"name": "a", "dept": "x", "level": 1, "active": true})));
    assert_eq!(all[1], doc(json!({"name": "b", "dept": "y", "level": 2})));
    assert_eq!(all[2], doc(json!({"name": "c", "dept": "x", "level": 3, "active": true})));
}

#[test]
fn test_remove_twice_second_returns_zero() {
    let (_temp, store) = create_test_store();
    let group = store.db("test").unwrap().group("tmp").unwrap();
    group
        .insert_many(vec![
            doc(json!({"k": 1})),
            doc(json!({"k": 2})),
            doc(json!({"k": 1})),
        ])
        .unwrap();

    let q = Query::new().eq("k", 1);
    assert_eq!(group.remove(&q).unwrap(), 2);
    assert_eq!(group.remove(&q).unwrap(), 0);
    assert_eq!(group.count(&Query::new()).unwrap(), 1);
}

#[test]
fn test_sorted_get_with_missing_keys() {
    let (_temp, store) = create_test_store();
    let group = store.db("test").unwrap().group("sort").unwrap();
    group
        .insert_many(vec![
            doc(json!({"name": "c", "rank": 3})),
            doc(json!({"name": "none"})),
            doc(json!({"name": "a", "rank": 1})),
            doc(json!({"name": "b", "rank": 2})),
        ])
        .unwrap();

    let sorted = group.get(&Query::new(), Some("rank")).unwrap();
    assert_eq!(names(&sorted), vec!["none", "a", "b", "c"]);
    let filtered = group.get(&Query::new().gt("rank", 1), Some("rank")).unwrap();
    assert_eq!(names(&filtered), vec!["b", "c"]);
}

#[test]
fn test_data_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = Store::open(StoreOptions::new().with_root(temp_dir.path())).unwrap();
        let group = store.db("keep").unwrap().group("g").unwrap();
        group.insert(doc(json!({"z": 1, "a": 2}))).unwrap();
    }

    let store = Store::open(
        StoreOptions::new()
            .with_root(temp_dir.path())
            .with_durability(Durability::Fast),
    )
    .unwrap();
    assert_eq!(store.list_dbs().unwrap(), vec!["keep"]);
    let group = store.open_db("keep").unwrap().get_group("g").unwrap();
    let docs = group.get(&Query::new(), None).unwrap();
    let keys: Vec<&String> = docs[0].keys().collect();
    assert_eq!(keys, vec!["z", "a"]);

    // On-disk format is a plain JSON array of objects
    let raw = std::fs::read_to_string(temp_dir.path().join("db/keep/g.group")).unwrap();
    assert_eq!(raw, r#"[{"z":1,"a":2}]"#);
}

#[test]
fn test_missing_group_and_database_errors() {
    let (_temp, store) = create_test_store();
    let db = store.db("test").unwrap();
    let group = db.group("ghost").unwrap();

    let err = group.get(&Query::new(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, AmazeError::GroupNotFound { .. }));
    assert!(group.update(&Query::new(), &Update::new()).unwrap_err().is_not_found());
    assert!(group.remove_one(&Query::new()).unwrap_err().is_not_found());

    db.drop().unwrap();
    assert!(matches!(
        group.insert(doc(json!({"a": 1}))),
        Err(AmazeError::DatabaseNotFound(_))
    ));
}

#[test]
fn test_database_drop_removes_files() {
    let (temp, store) = create_test_store();
    let db = store.db("gone").unwrap();
    db.group("a").unwrap().insert(doc(json!({"a": 1}))).unwrap();
    db.group("b").unwrap().insert(doc(json!({"b": 1}))).unwrap();

    store.drop_db("gone").unwrap();
    assert!(!temp.path().join("db/gone").exists());
    assert!(store.list_dbs().unwrap().is_empty());
}

#[test]
fn test_concurrent_inserts_do_not_lose_writes() {
    let (_temp, store) = create_test_store();
    let group = Arc::new(store.db("test").unwrap().create_group("busy").unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let group = Arc::clone(&group);
            thread::spawn(move || {
                for i in 0..10 {
                    group.insert(doc(json!({"thread": t, "i": i}))).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(group.count(&Query::new()).unwrap(), 80);
    for t in 0..8 {
        assert_eq!(group.count(&Query::new().eq("thread", t)).unwrap(), 10);
    }
}

#[test]
fn test_concurrent_updates_and_removes_are_serialized() {
    let (_temp, store) = create_test_store();
    let group = store.db("test").unwrap().create_group("work").unwrap();
    let seed: Vec<Document> = (0..40).map(|i| doc(json!({"id": i, "done": false}))).collect();
    group.insert_many(seed).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let group = group.clone();
            thread::spawn(move || {
                for i in (t..40).step_by(4) {
                    let q = Query::new().eq("id", i);
                    if i % 2 == 0 {
                        assert_eq!(group.update_one(&q, &Update::new().set("done", true)).unwrap(), 1);
                    } else {
                        assert_eq!(group.remove_one(&q).unwrap(), 1);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(group.count(&Query::new()).unwrap(), 20);
    assert_eq!(group.count(&Query::new().eq("done", true)).unwrap(), 20);
}

#[test]
fn test_invalid_filter_fails_before_io() {
    let err = Query::from_json(&json!({"age": {"__between": [1, 2]}})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}
