use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

/// `{{ key }}` with optional inner whitespace; keys are word characters
/// plus `.` and `-`.
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_][A-Za-z0-9_.\-]*)\s*\}\}")
            .expect("placeholder pattern is valid")
    })
}

/// Replace every placeholder token bound to a key in `vars` with that
/// variable's value, throughout an arbitrarily nested document.
///
/// Keys absent from `vars` stay as literal text; non-string values and the
/// overall structure are untouched. Returns a new value and leaves `doc`
/// unchanged: the persisted tree is never rewritten, so this runs on every
/// public read and variable edits take effect without republishing.
pub fn substitute(doc: &Value, vars: &HashMap<String, String>) -> Value {
    match doc {
        Value::String(text) => Value::String(substitute_text(text, vars)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, vars)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), substitute(value, vars)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn substitute_text(text: &str, vars: &HashMap<String, String>) -> String {
    token_pattern()
        .replace_all(text, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            // Unknown keys render as-is rather than vanishing.
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn replaces_known_tokens_everywhere() {
        let doc = json!({
            "props": { "title": "{{name}}'s links" },
            "content": [
                { "type": "Text", "props": { "body": "Contact {{name}} at {{email}}" } }
            ]
        });
        let out = substitute(&doc, &vars(&[("name", "Alice"), ("email", "a@example.com")]));
        assert_eq!(out["props"]["title"], "Alice's links");
        assert_eq!(
            out["content"][0]["props"]["body"],
            "Contact Alice at a@example.com"
        );
    }

    #[test]
    fn unknown_tokens_stay_literal() {
        let doc = json!({ "text": "Hello {{missing}} and {{name}}" });
        let out = substitute(&doc, &vars(&[("name", "Bob")]));
        assert_eq!(out["text"], "Hello {{missing}} and Bob");
    }

    #[test]
    fn whitespace_inside_tokens_is_tolerated() {
        let doc = json!("{{ name }} / {{name}}");
        let out = substitute(&doc, &vars(&[("name", "Cara")]));
        assert_eq!(out, json!("Cara / Cara"));
    }

    #[test]
    fn non_string_values_are_untouched() {
        let doc = json!({ "count": 3, "on": true, "none": null, "items": [1, 2] });
        assert_eq!(substitute(&doc, &vars(&[("count", "9")])), doc);
    }

    #[test]
    fn plain_text_without_tokens_is_unchanged() {
        let doc = json!({ "text": "no tokens here, just {braces}" });
        assert_eq!(substitute(&doc, &vars(&[("name", "x")])), doc);
    }

    #[test]
    fn empty_variable_map_is_a_no_op() {
        let doc = json!({ "text": "{{name}}" });
        assert_eq!(substitute(&doc, &HashMap::new()), doc);
    }

    #[test]
    fn input_is_not_mutated() {
        let doc = json!({ "text": "{{name}}" });
        let snapshot = doc.clone();
        let _ = substitute(&doc, &vars(&[("name", "Dee")]));
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn dotted_and_dashed_keys_resolve() {
        let doc = json!("{{social.x}} {{phone-mobile}}");
        let out = substitute(
            &doc,
            &vars(&[("social.x", "@alice"), ("phone-mobile", "555-0100")]),
        );
        assert_eq!(out, json!("@alice 555-0100"));
    }
}
