use json_conform::{
    build_schema, resolve, validate, ErrorKind, NodeSource, PathSegment, Schema, Severity, TypeUniverse,
};
use serde_json::{json, Value};

fn write(dir: &tempfile::TempDir, name: &str, doc: Value) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, doc.to_string()).unwrap();
    path
}

fn shop_schema() -> Schema {
    let dir = tempfile::tempdir().unwrap();
    let order = write(&dir, "order.json", json!({
        "file": "models/order.ts",
        "declarations": [
            { "kind": "interface", "name": "Order", "line": 1, "members": [
                { "name": "_id", "type": "string" },
                { "name": "items", "type": { "array": "LineItem" } },
                { "name": "buyer", "type": "string" },
                { "name": "status", "optional": true, "type": "Status" },
            ]},
            { "kind": "interface", "name": "LineItem", "line": 7, "members": [
                { "name": "product_id", "type": "string" },
                { "name": "quantity", "type": "number" },
            ]},
            { "kind": "enum", "name": "Status", "line": 12, "members": [
                { "name": "Open", "value": "open" },
                { "name": "Closed", "value": "closed" },
            ]},
        ]
    }));
    let post = write(&dir, "post.json", json!({
        "file": "models/post.ts",
        "declarations": [
            { "kind": "interface", "name": "PostData", "line": 4, "members": [
                { "name": "stamp", "type": "Date" },
                { "name": "order", "type": "Order" },
                { "name": "tags", "type": { "ref": "Record", "args": ["string", "number"] } },
                { "name": "note", "optional": true, "type": { "union": ["string", "null"] } },
            ]},
        ]
    }));
    let universe = TypeUniverse::from_files(&[order, post]).unwrap();
    build_schema(&universe)
}

fn post() -> Value {
    json!({
        "stamp": { "$date": "2023-05-12T10:07:28.417Z" },
        "order": {
            "_id": "o-1",
            "items": [{ "product_id": "p-1", "quantity": 2 }],
            "buyer": "BMQ",
            "status": "open",
        },
        "tags": { "fresh": 1 },
        "note": null,
    })
}

#[test]
fn named_types_are_sorted_with_locations() {
    let schema = shop_schema();
    let named: Vec<_> = schema
        .types()
        .map(|(_, n)| (n.name.clone().unwrap(), n.source_location.clone().unwrap()))
        .collect();
    assert_eq!(
        named,
        [
            ("LineItem".to_string(), "models/order.ts:7".to_string()),
            ("Order".to_string(), "models/order.ts:1".to_string()),
            ("PostData".to_string(), "models/post.ts:4".to_string()),
            ("Status".to_string(), "models/order.ts:12".to_string()),
        ]
    );
}

#[test]
fn conforming_documents_validate_cleanly() {
    let schema = shop_schema();
    let result = validate(&post(), &schema, "PostData");
    assert!(result.is_empty(), "{:?}", result.errors);
}

#[test]
fn problems_are_collected_in_one_pass() {
    let schema = shop_schema();
    let mut doc = post();
    doc["stamp"] = json!("2023-05-12");
    doc["order"]["items"][0]["quantity"] = json!("2");
    doc["order"]["status"] = json!("lost");
    doc["tags"]["stale"] = json!("x");
    doc["extra"] = json!(true);

    let result = validate(&doc, &schema, "PostData");
    let found: Vec<_> = result.errors.iter().map(|e| (e.error_type, e.dotted_path())).collect();
    assert_eq!(
        found,
        [
            (ErrorKind::StringToDate, "stamp".to_string()),
            (ErrorKind::TypeMismatch, "order.items.0.quantity".to_string()),
            (ErrorKind::TypeMismatch, "order.status".to_string()),
            (ErrorKind::TypeMismatch, "tags.stale".to_string()),
            (ErrorKind::UnknownProperty, "".to_string()),
        ]
    );
    assert!(result.has_errors());
    assert_eq!(result.by_severity(Severity::Warning).count(), 4);
    assert_eq!(result.errors[1].path, vec![
        PathSegment::from("order"),
        PathSegment::from("items"),
        PathSegment::Index(0),
        PathSegment::from("quantity"),
    ]);
}

#[test]
fn schemas_survive_serialization() {
    let schema = shop_schema();
    let text = serde_json::to_string(&schema).unwrap();
    let reloaded = Schema::from_json_str(&text).unwrap();
    assert_eq!(reloaded.len(), schema.len());
    assert!(validate(&post(), &reloaded, "PostData").is_empty());

    let bad = json!({ "order": { "_id": 1 } });
    assert_eq!(
        validate(&bad, &schema, "PostData").errors,
        validate(&bad, &reloaded, "PostData").errors
    );
}

#[test]
fn qualified_and_array_roots() {
    let schema = shop_schema();
    let items = json!([{ "product_id": "a", "quantity": 1 }, { "product_id": "b", "quantity": 2 }]);
    assert!(validate(&items, &schema, "models/order/LineItem[]").is_empty());
    assert!(validate(&items, &schema, "LineItem[]").is_empty());

    let missing = validate(&items, &schema, "models/post/LineItem[]");
    assert_eq!(missing.errors.len(), 1);
    assert_eq!(missing.errors[0].error_type, ErrorKind::Unsupported);

    let resolved = resolve(&schema, "Order[]").unwrap();
    let element = resolved.node(resolved.root_node().array_of.unwrap());
    assert_eq!(element.name.as_deref(), Some("Order"));
}

#[test]
fn shared_scalars_are_one_node() {
    let schema = shop_schema();
    let (_, order) = schema.types().find(|(_, n)| n.name.as_deref() == Some("Order")).unwrap();
    let (_, item) = schema.types().find(|(_, n)| n.name.as_deref() == Some("LineItem")).unwrap();
    assert_eq!(order.property("_id").unwrap().ty, item.property("product_id").unwrap().ty);
    assert_eq!(order.property("buyer").unwrap().ty, order.property("_id").unwrap().ty);
}

#[test]
fn recursive_json_values_validate_at_any_depth() {
    let unit = json!({ "file": "models/json.ts", "declarations": [
        { "kind": "alias", "name": "Json", "line": 1, "type": { "union": ["string", "number", { "array": "Json" }] } },
    ]});
    let universe = TypeUniverse::from_json_str(&unit.to_string()).unwrap();
    let schema = build_schema(&universe);

    assert!(validate(&json!(["a", [1, ["b"]]]), &schema, "Json").is_empty());
    assert!(validate(&json!([[[[]]]]), &schema, "Json").is_empty());

    let result = validate(&json!(["a", [1, [true]]]), &schema, "Json");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].error_type, ErrorKind::TypeMismatch);
    assert_eq!(result.errors[0].dotted_path(), "");
    assert!(result.errors[0].message.contains("string | number | Json[]"), "{}", result.errors[0].message);
}
