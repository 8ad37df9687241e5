//! The page-builder document tree.
//!
//! A persisted page is a nested JSON value: a root object carrying a `props`
//! map and an ordered `content` list of nodes, where nested nodes may hold
//! children under named `slots`/`zones` buckets. Editors and older clients
//! have produced several looser shapes over time; [`normalize`] folds all of
//! them into the canonical root form before anything else touches the tree.

mod sanitize;
mod substitute;

pub use sanitize::{sanitize, EPHEMERAL_KEYS};
pub use substitute::substitute;

use serde_json::{json, Value};

/// The canonical shape of a page nobody has built yet.
pub fn empty_root() -> Value {
    json!({ "props": {}, "content": [] })
}

/// Coerce an arbitrary value into the canonical root-with-content shape.
///
/// Shape detection, in order: an object with a `content` array is already a
/// root (missing or malformed `props` is defaulted); a bare array is taken
/// as the content list itself; any other object is wrapped as a
/// single-element content list; everything else yields [`empty_root`].
///
/// Total and pure: never panics, never mutates `input`, and the output
/// shares no structure with it. Applying it twice is the same as applying
/// it once.
pub fn normalize(input: &Value) -> Value {
    match input {
        Value::Object(map) => {
            if matches!(map.get("content"), Some(Value::Array(_))) {
                let mut root = map.clone();
                if !matches!(root.get("props"), Some(Value::Object(_))) {
                    root.insert("props".to_string(), json!({}));
                }
                Value::Object(root)
            } else {
                json!({ "props": {}, "content": [Value::Object(map.clone())] })
            }
        }
        Value::Array(items) => json!({ "props": {}, "content": items.clone() }),
        _ => empty_root(),
    }
}

/// Parse serialized tree text and normalize it. Unparseable input degrades
/// to the empty root instead of failing the request.
pub fn normalize_json(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => normalize(&value),
        Err(_) => empty_root(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_root_passes_through() {
        let input = json!({
            "props": { "title": "Links" },
            "content": [{ "type": "Button", "props": { "label": "Hi" } }]
        });
        assert_eq!(normalize(&input), input);
    }

    #[test]
    fn bare_object_with_content_gets_default_props() {
        let input = json!({ "content": [{ "type": "Text" }] });
        let out = normalize(&input);
        assert_eq!(out["props"], json!({}));
        assert_eq!(out["content"], input["content"]);
    }

    #[test]
    fn extra_root_keys_are_preserved() {
        let input = json!({
            "content": [],
            "zones": { "Hero:items": [{ "type": "Link" }] }
        });
        let out = normalize(&input);
        assert_eq!(out["zones"], input["zones"]);
    }

    #[test]
    fn bare_array_becomes_content_list() {
        let input = json!([{ "type": "Gallery" }, { "type": "Text" }]);
        let out = normalize(&input);
        assert_eq!(out["props"], json!({}));
        assert_eq!(out["content"], input);
    }

    #[test]
    fn opaque_object_is_wrapped_as_single_node() {
        let input = json!({ "type": "Button", "props": { "label": "One" } });
        let out = normalize(&input);
        assert_eq!(out["content"], json!([input]));
    }

    #[test]
    fn null_and_scalars_fall_back_to_empty_root() {
        assert_eq!(normalize(&Value::Null), empty_root());
        assert_eq!(normalize(&json!(42)), empty_root());
        assert_eq!(normalize(&json!("not a tree")), empty_root());
        assert_eq!(normalize(&json!(true)), empty_root());
    }

    #[test]
    fn malformed_props_is_replaced() {
        let input = json!({ "props": "oops", "content": [] });
        assert_eq!(normalize(&input)["props"], json!({}));
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = vec![
            json!(null),
            json!([{ "type": "Text" }]),
            json!({ "type": "Button" }),
            json!({ "content": [{ "type": "Text" }] }),
            json!({ "props": 7, "content": [] }),
        ];
        for input in inputs {
            let once = normalize(&input);
            assert_eq!(normalize(&once), once, "input: {input}");
        }
    }

    #[test]
    fn input_is_not_mutated() {
        let input = json!({ "content": [{ "type": "Text" }] });
        let snapshot = input.clone();
        let _ = normalize(&input);
        assert_eq!(input, snapshot);
    }

    #[test]
    fn unparseable_text_degrades_to_empty_root() {
        assert_eq!(normalize_json("{not json"), empty_root());
        assert_eq!(normalize_json(""), empty_root());
        assert_eq!(
            normalize_json(r#"{"content": []}"#),
            json!({ "props": {}, "content": [] })
        );
    }
}
