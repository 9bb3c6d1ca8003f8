use bson_core::{Document, Value};

/// Helper: {"a": 1, "b": 2, "c": 3, "d": 4, "e": 5} as int32s.
fn five() -> Document {
    Document::from_pairs([("a", 1i32), ("b", 2i32), ("c", 3i32), ("d", 4i32), ("e", 5i32)])
}

fn keys(doc: &Document) -> Vec<&str> {
    doc.keys().collect()
}

fn int(value: &Value) -> i32 {
    value.as_i32().unwrap()
}

// ============================================================================
// values / filter / map_values
// ============================================================================

#[test]
fn values_in_order() {
    let values: Vec<i32> = five().values().iter().map(int).collect();
    assert_eq!(values, [1, 2, 3, 4, 5]);
}

#[test]
fn filter_keeps_matching_pairs_in_order() {
    let even = five().filter(|_, v| int(v) % 2 == 0);
    assert_eq!(keys(&even), ["b", "d"]);
    assert_eq!(even.get("d"), Some(Value::Int32(4)));
    assert_eq!(Document::from_bytes(even.raw_bytes()).unwrap(), even);
}

#[test]
fn filter_by_key() {
    let doc = five().filter(|k, _| k != "c");
    assert_eq!(keys(&doc), ["a", "b", "d", "e"]);
}

#[test]
fn filter_nothing_is_empty() {
    assert_eq!(five().filter(|_, _| false), Document::new());
}

#[test]
fn map_values_transforms_every_value() {
    let doubled = five().map_values(|v| Value::Int64(i64::from(int(&v)) * 2));
    assert_eq!(keys(&doubled), ["a", "b", "c", "d", "e"]);
    assert_eq!(doubled.get("e"), Some(Value::Int64(10)));
}

// ============================================================================
// Count-based slicing
// ============================================================================

#[test]
fn drop_first() {
    assert_eq!(keys(&five().drop_first(2)), ["c", "d", "e"]);
    assert_eq!(five().drop_first(0), five());
    assert!(five().drop_first(9).is_empty());
}

#[test]
fn drop_last() {
    assert_eq!(keys(&five().drop_last(2)), ["a", "b", "c"]);
    assert_eq!(five().drop_last(0), five());
    assert!(five().drop_last(5).is_empty());
}

#[test]
fn prefix() {
    assert_eq!(keys(&five().prefix(2)), ["a", "b"]);
    assert!(five().prefix(0).is_empty());
    assert_eq!(five().prefix(10), five());
}

#[test]
fn suffix() {
    assert_eq!(keys(&five().suffix(2)), ["d", "e"]);
    assert!(five().suffix(0).is_empty());
    assert_eq!(five().suffix(10), five());
}

#[test]
fn slices_are_independent_documents() {
    let source = five();
    let mut head = source.prefix(2);
    head.insert("z", 26i32);
    assert!(!source.contains_key("z"));
    assert_eq!(source.len(), 5);
}

// ============================================================================
// Predicate-based slicing
// ============================================================================

#[test]
fn drop_while_stops_at_first_mismatch() {
    let doc = Document::from_pairs([("a", 1i32), ("b", 5i32), ("c", 2i32), ("d", 7i32)]);
    let rest = doc.drop_while(|_, v| int(v) < 3);
    // "c" is kept even though it matches: dropping ended at "b".
    assert_eq!(keys(&rest), ["b", "c", "d"]);
}

#[test]
fn prefix_while_stops_at_first_mismatch() {
    let doc = Document::from_pairs([("a", 1i32), ("b", 5i32), ("c", 2i32)]);
    let head = doc.prefix_while(|_, v| int(v) < 3);
    assert_eq!(keys(&head), ["a"]);
}

#[test]
fn prefix_while_all_and_none() {
    assert_eq!(five().prefix_while(|_, _| true), five());
    assert!(five().prefix_while(|_, _| false).is_empty());
}

// ============================================================================
// split
// ============================================================================

#[test]
fn split_on_separator() {
    let parts = five().split(usize::MAX, true, |k, _| k == "c");
    assert_eq!(parts.len(), 2);
    assert_eq!(keys(&parts[0]), ["a", "b"]);
    assert_eq!(keys(&parts[1]), ["d", "e"]);
}

#[test]
fn split_omits_empty_subdocuments() {
    let parts = five().split(usize::MAX, true, |k, _| k == "a" || k == "b" || k == "e");
    assert_eq!(parts.len(), 1);
    assert_eq!(keys(&parts[0]), ["c", "d"]);
}

#[test]
fn split_keeps_empty_subdocuments_when_asked() {
    let parts = five().split(usize::MAX, false, |k, _| k == "a" || k == "e");
    assert_eq!(parts.len(), 3);
    assert!(parts[0].is_empty());
    assert_eq!(keys(&parts[1]), ["b", "c", "d"]);
    assert!(parts[2].is_empty());
}

#[test]
fn split_respects_max_splits() {
    let parts = five().split(1, true, |_, v| int(v) % 2 == 0);
    assert_eq!(parts.len(), 2);
    assert_eq!(keys(&parts[0]), ["a"]);
    // After the single split, the remaining separator "d" stays in place.
    assert_eq!(keys(&parts[1]), ["c", "d", "e"]);
}

#[test]
fn split_with_zero_max_splits_returns_whole_document() {
    let parts = five().split(0, true, |_, _| true);
    assert_eq!(parts, vec![five()]);
}

#[test]
fn split_empty_document() {
    assert!(Document::new().split(usize::MAX, true, |_, _| true).is_empty());
    assert_eq!(
        Document::new().split(usize::MAX, false, |_, _| true),
        vec![Document::new()]
    );
}
