use serde_json::{Map, Value};

/// Editor-internal identifier keys. They track selection and drag state in
/// the editor and carry no durable content meaning; stripping them must
/// never change what a page renders as.
pub const EPHEMERAL_KEYS: &[&str] = &["id", "_id", "editorId"];

/// Strip ephemeral identifiers from a subtree, at every depth.
///
/// Run before a subtree is stored for reuse in other owners' pages, so the
/// stored copy holds no reference back to the source editor's state. All
/// non-ephemeral keys, nested `props` included, pass through untouched.
/// Pure: the input is left unchanged.
pub fn sanitize(node: &Value) -> Value {
    match node {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                if EPHEMERAL_KEYS.contains(&key.as_str()) {
                    continue;
                }
                let cleaned = if key == "slots" || key == "zones" {
                    sanitize_child_map(value)
                } else {
                    sanitize(value)
                };
                out.insert(key.clone(), cleaned);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        other => other.clone(),
    }
}

/// `slots` and `zones` are maps of named child lists. Bucket names are part
/// of durable identity and are kept verbatim even when they collide with an
/// ephemeral key; only the bucket contents are cleaned.
fn sanitize_child_map(value: &Value) -> Value {
    match value {
        Value::Object(buckets) => Value::Object(
            buckets
                .iter()
                .map(|(name, children)| (name.clone(), sanitize(children)))
                .collect(),
        ),
        other => sanitize(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_ephemeral_keys_at_every_depth() {
        let input = json!({
            "id": "root-1",
            "type": "Section",
            "props": {
                "_id": "n-42",
                "title": "Hello",
                "nested": { "editorId": "e-9", "keep": true }
            },
            "content": [
                { "id": "n-1", "type": "Button" },
                { "type": "Text", "props": { "id": "n-2", "body": "hi" } }
            ]
        });

        let out = sanitize(&input);

        assert_eq!(
            out,
            json!({
                "type": "Section",
                "props": {
                    "title": "Hello",
                    "nested": { "keep": true }
                },
                "content": [
                    { "type": "Button" },
                    { "type": "Text", "props": { "body": "hi" } }
                ]
            })
        );
    }

    #[test]
    fn zone_buckets_are_cleaned_but_bucket_names_survive() {
        let input = json!({
            "type": "Columns",
            "zones": {
                "Columns-abc:left": [{ "id": "n-3", "type": "Link" }],
                "Columns-abc:right": [{ "type": "Text", "_id": "n-4" }]
            },
            "slots": {
                "id": [{ "editorId": "n-5", "type": "Badge" }]
            }
        });

        let out = sanitize(&input);

        assert_eq!(
            out["zones"],
            json!({
                "Columns-abc:left": [{ "type": "Link" }],
                "Columns-abc:right": [{ "type": "Text" }]
            })
        );
        // A bucket merely named like an ephemeral key is still a bucket.
        assert_eq!(out["slots"], json!({ "id": [{ "type": "Badge" }] }));
    }

    #[test]
    fn non_ephemeral_content_is_untouched() {
        let input = json!({
            "type": "Gallery",
            "props": { "images": ["a.png", "b.png"], "columns": 3, "loop": null }
        });
        assert_eq!(sanitize(&input), input);
    }

    #[test]
    fn scalars_and_arrays_pass_through() {
        assert_eq!(sanitize(&json!("text")), json!("text"));
        assert_eq!(sanitize(&json!([1, "two", null])), json!([1, "two", null]));
    }

    #[test]
    fn input_is_not_mutated() {
        let input = json!({ "id": "x", "type": "Button", "props": { "_id": "y" } });
        let snapshot = input.clone();
        let _ = sanitize(&input);
        assert_eq!(input, snapshot);
    }

    #[test]
    fn no_ephemeral_key_survives_anywhere() {
        fn assert_clean(value: &serde_json::Value) {
            match value {
                serde_json::Value::Object(map) => {
                    for (key, child) in map {
                        assert!(
                            !EPHEMERAL_KEYS.contains(&key.as_str()),
                            "ephemeral key {key} survived"
                        );
                        assert_clean(child);
                    }
                }
                serde_json::Value::Array(items) => items.iter().for_each(assert_clean),
                _ => {}
            }
        }

        let input = json!({
            "id": "a",
            "content": [{ "_id": "b", "props": { "editorId": "c", "deep": [{ "id": "d" }] } }]
        });
        assert_clean(&sanitize(&input));
    }
}
