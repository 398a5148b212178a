//! Mapping of schema.org `Dataset` metadata onto [Dataset] records.

use std::fmt::Display;

use serde_json::{Map, Value};

use crate::dataset::{section_of, Dataset, Distribution};
use crate::store::ObjectInfo;

/// Returns the dataset id of a metadata object key, which is the key
/// without `suffix` (and without a dangling `/`).
pub fn dataset_id(key: &str, suffix: &str) -> String {
    key.strip_suffix(suffix)
        .unwrap_or(key)
        .trim_end_matches('/')
        .to_string()
}

/// Parses a metadata payload into a [Dataset].
///
/// This function never fails. If the payload isn't usable, the
/// returned dataset is marked as invalid, its title is a placeholder
/// naming the dataset and its description holds the reason.
pub fn parse(
    raw: &str,
    key: &str,
    info: Option<&ObjectInfo>,
    suffix: &str,
) -> Dataset {
    let mut dataset = skeleton(key, info, suffix);

    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(e) => return invalid(dataset, format!("invalid JSON: {e}")),
    };

    let Some(node) = dataset_node(&value) else {
        return invalid(dataset, "no schema.org object found".into());
    };

    if !is_type(node, "Dataset") {
        log::debug!("{key}: @type is not Dataset, parsing anyway");
    }

    dataset.title = node.get("name").and_then(text).unwrap_or_default();
    dataset.description =
        node.get("description").and_then(text).unwrap_or_default();
    dataset.creator = node.get("creator").and_then(names);
    dataset.date_created = node
        .get("dateCreated")
        .or_else(|| node.get("datePublished"))
        .and_then(text);
    dataset.keywords =
        node.get("keywords").map(keywords).unwrap_or_default();
    dataset.license = node.get("license").and_then(|v| {
        v.get("url").and_then(text).or_else(|| text(v))
    });
    dataset.url = node.get("url").and_then(text);
    dataset.distribution = match node.get("distribution") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(distribution)
            .collect(),
        Some(Value::Object(item)) => vec![distribution(item)],
        _ => vec![],
    };
    dataset.is_valid = true;
    dataset
}

/// Returns the invalid dataset standing in for a metadata object
/// which couldn't be read at all.
pub fn unreadable<R: Display>(
    key: &str,
    info: Option<&ObjectInfo>,
    suffix: &str,
    reason: R,
) -> Dataset {
    invalid(skeleton(key, info, suffix), reason.to_string())
}

fn skeleton(
    key: &str,
    info: Option<&ObjectInfo>,
    suffix: &str,
) -> Dataset {
    Dataset {
        id: dataset_id(key, suffix),
        section: section_of(key),
        last_modified: info.and_then(|info| info.last_modified),
        ..Default::default()
    }
}

fn invalid(mut dataset: Dataset, reason: String) -> Dataset {
    log::debug!("{}: {reason}", dataset.id);

    dataset.title = format!("Invalid metadata: {}", dataset.id);
    dataset.description = reason;
    dataset.is_valid = false;
    dataset
}

fn is_type(node: &Map<String, Value>, name: &str) -> bool {
    let matches = |v: &Value| {
        v.as_str()
            .map(|s| s == name || s.ends_with(&format!("/{name}")))
            .unwrap_or(false)
    };

    match node.get("@type") {
        Some(Value::Array(types)) => types.iter().any(matches),
        Some(value) => matches(value),
        None => false,
    }
}

/// Finds the object describing the dataset. Besides a plain object,
/// `@graph` containers and top-level arrays are accepted; the first
/// `Dataset` node wins, otherwise the first object.
fn dataset_node(value: &Value) -> Option<&Map<String, Value>> {
    let candidates = match value {
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(items)) => items,
            _ => return Some(map),
        },
        Value::Array(items) => items,
        _ => return None,
    };

    let objects = || candidates.iter().filter_map(Value::as_object);
    objects()
        .find(|node| is_type(node, "Dataset"))
        .or_else(|| objects().next())
}

fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => {
            return map
                .get("name")
                .or_else(|| map.get("@value"))
                .and_then(text);
        }
        _ => return None,
    };

    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn names(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let names: Vec<_> = items.iter().filter_map(text).collect();
            if names.is_empty() {
                None
            } else {
                Some(names.join(", "))
            }
        }
        value => text(value),
    }
}

fn keywords(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => vec![],
    }
}

fn content_size(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn distribution(item: &Map<String, Value>) -> Distribution {
    Distribution {
        name: item.get("name").and_then(text),
        content_url: item.get("contentUrl").and_then(text),
        encoding_format: item
            .get("encodingFormat")
            .or_else(|| item.get("fileFormat"))
            .and_then(text),
        content_size: item.get("contentSize").and_then(content_size),
        description: item.get("description").and_then(text),
    }
}
