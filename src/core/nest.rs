//! Bidirectional dotted-path transform
//!
//! Projected query results travel through the pipeline as flat maps
//! keyed by dotted paths (`"Provider.Billing_Provider_NPI"`). This
//! module converts between that shape and nested JSON objects.
//!
//! `nest` and `flatten` are inverses for objects whose keys contain no
//! literal dots. Arrays are leaf values: they are never descended into.

use serde_json::{Map, Value};

/// Converts a flat map of dotted paths into a nested JSON object.
///
/// Intermediate objects are created as needed. If two keys disagree
/// about whether a path segment is a leaf or an object, the later key
/// wins.
///
/// # Examples
///
/// ```
/// use serde_json::{json, Map};
/// use claimsync::core::nest::nest;
///
/// let mut flat = Map::new();
/// flat.insert("Claim.ClaimID".to_string(), json!("C-1"));
/// flat.insert("Claim.POS".to_string(), json!("11"));
///
/// assert_eq!(nest(&flat), json!({"Claim": {"ClaimID": "C-1", "POS": "11"}}));
/// ```
pub fn nest(flat: &Map<String, Value>) -> Value {
    let mut root = Map::new();

    for (key, value) in flat {
        let mut parts = key.split('.').peekable();
        let mut current = &mut root;

        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                current.insert(part.to_string(), value.clone());
            } else {
                let entry = current
                    .entry(part.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                match entry {
                    Value::Object(map) => current = map,
                    // Just replaced with an object above
                    _ => unreachable!(),
                }
            }
        }
    }

    Value::Object(root)
}

/// Flattens a JSON value into a map of dotted paths.
///
/// Only objects are descended into; arrays, scalars and nulls are kept
/// as leaf values. Empty objects are kept as leaves so the transform
/// loses no keys.
pub fn flatten(value: &Value) -> Map<String, Value> {
    let mut flat = Map::new();
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                flatten_into(&mut flat, key.clone(), inner);
            }
        }
        other => {
            flat.insert(String::new(), other.clone());
        }
    }
    flat
}

fn flatten_into(flat: &mut Map<String, Value>, prefix: String, value: &Value) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, inner) in map {
                flatten_into(flat, format!("{prefix}.{key}"), inner);
            }
        }
        other => {
            flat.insert(prefix, other.clone());
        }
    }
}

/// Applies a dotted-path projection to a flat document.
///
/// A flat key is kept when it equals a projected path, sits under a
/// projected path, or equals the key field. This mirrors how document
/// databases treat a projection on an embedded document: naming a
/// subdocument includes everything beneath it.
pub fn project(
    flat: &Map<String, Value>,
    key_field: &str,
    projection: &[&str],
) -> Map<String, Value> {
    flat.iter()
        .filter(|(key, _)| {
            key.as_str() == key_field || projection.iter().any(|p| path_covers(p, key))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn path_covers(projected: &str, key: &str) -> bool {
    key == projected
        || (key.len() > projected.len()
            && key.starts_with(projected)
            && key.as_bytes()[projected.len()] == b'.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_nest_simple() {
        let input = flat(&[
            ("Claim.ClaimID", json!("C-100")),
            ("Claim.POS", json!("11")),
            ("Type_of_Bill", json!("0111")),
        ]);

        assert_eq!(
            nest(&input),
            json!({
                "Claim": {"ClaimID": "C-100", "POS": "11"},
                "Type_of_Bill": "0111"
            })
        );
    }

    #[test]
    fn test_nest_deep_paths() {
        let input = flat(&[("a.b.c.d", json!(1)), ("a.b.e", json!(2))]);
        assert_eq!(nest(&input), json!({"a": {"b": {"c": {"d": 1}, "e": 2}}}));
    }

    #[test]
    fn test_nest_array_leaf() {
        let input = flat(&[("Diagnosis.Diag_Codes", json!(["E11.9", "I10"]))]);
        assert_eq!(
            nest(&input),
            json!({"Diagnosis": {"Diag_Codes": ["E11.9", "I10"]}})
        );
    }

    #[test]
    fn test_flatten_nested_object() {
        let input = json!({
            "Member": {"Subscriber_ID": "S1", "First_Name": "Ada"},
            "Type_of_Bill": "0111"
        });

        let result = flatten(&input);
        assert_eq!(result.get("Member.Subscriber_ID"), Some(&json!("S1")));
        assert_eq!(result.get("Member.First_Name"), Some(&json!("Ada")));
        assert_eq!(result.get("Type_of_Bill"), Some(&json!("0111")));
    }

    #[test]
    fn test_flatten_keeps_arrays_as_leaves() {
        let input = json!({"ServiceLine": [{"Proc_Code": "99213"}]});
        let result = flatten(&input);
        assert_eq!(
            result.get("ServiceLine"),
            Some(&json!([{"Proc_Code": "99213"}]))
        );
    }

    #[test]
    fn test_flatten_nest_round_trip() {
        let original = json!({
            "Claim": {"ClaimID": "C-7", "POS": "21"},
            "Diagnosis": {"Diag_Codes": ["E11.9"]},
            "Member": {"Subscriber_ID": "S-9"},
            "amount": 120.5,
            "flags": null
        });

        assert_eq!(nest(&flatten(&original)), original);
    }

    #[test]
    fn test_flatten_keeps_empty_objects() {
        let original = json!({"Provider": {}, "x": 1});
        assert_eq!(nest(&flatten(&original)), original);
    }

    #[test]
    fn test_project_exact_and_prefix() {
        let input = flat(&[
            ("Claim.ClaimID", json!("C-1")),
            ("Claim.Secret", json!("drop-me")),
            ("ServiceLine.Proc_Code", json!("99213")),
            ("ServiceLine.Units", json!(2)),
            ("Member.Subscriber_ID", json!("S-1")),
        ]);

        let result = project(
            &input,
            "Member.Subscriber_ID",
            &["Claim.ClaimID", "ServiceLine"],
        );

        assert_eq!(result.get("Claim.ClaimID"), Some(&json!("C-1")));
        assert_eq!(result.get("ServiceLine.Proc_Code"), Some(&json!("99213")));
        assert_eq!(result.get("ServiceLine.Units"), Some(&json!(2)));
        assert_eq!(result.get("Member.Subscriber_ID"), Some(&json!("S-1")));
        assert!(!result.contains_key("Claim.Secret"));
    }

    #[test]
    fn test_project_prefix_requires_path_boundary() {
        let input = flat(&[
            ("ServiceLine.Units", json!(1)),
            ("ServiceLineExtra.Units", json!(2)),
        ]);

        let result = project(&input, "memberId", &["ServiceLine"]);
        assert!(result.contains_key("ServiceLine.Units"));
        assert!(!result.contains_key("ServiceLineExtra.Units"));
    }
}
