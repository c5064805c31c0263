use crate::config::{AUTHOR_KEY_PREFIX, CREATED_TIMESTAMP_FORMAT, WORK_KEY_PREFIX};
use crate::models::{Author, Book};
use crate::store::AuthorLookup;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, warn};

/// Parses the JSON payload of one dump line, skipping the tab-separated key
/// columns in front of it. Returns `None` for lines the pass should skip:
/// no `{` at all, or a payload that does not parse.
fn parse_payload(line: &str) -> Option<Value> {
    let start = match line.find('{') {
        Some(start) => start,
        None => {
            warn!("Skipping line without a JSON object");
            return None;
        }
    };
    match serde_json::from_str(&line[start..]) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "Skipping line with malformed JSON");
            None
        }
    }
}

/// `key` field with the given prefix stripped; absent field yields an empty
/// id, not an error.
fn stripped_id(record: &Value, prefix: &str) -> String {
    let key = record["key"].as_str().unwrap_or_default();
    key.strip_prefix(prefix).unwrap_or(key).to_string()
}

fn string_field(record: &Value, field: &str) -> String {
    record[field].as_str().unwrap_or_default().to_string()
}

/// Extracts one author record from a dump line.
pub fn extract_author(line: &str) -> Option<Author> {
    let record = parse_payload(line)?;
    Some(Author {
        id: stripped_id(&record, AUTHOR_KEY_PREFIX),
        name: string_field(&record, "name"),
        personal_name: string_field(&record, "personal_name"),
    })
}

/// Extracts one work record from a dump line, resolving author display
/// names through the store at load time.
///
/// Every field apart from the skip-on-malformed-JSON preamble degrades
/// gracefully: a missing or unparseable nested value drops only that field,
/// never the line.
pub fn extract_book(line: &str, lookup: &dyn AuthorLookup) -> Option<Book> {
    let record = parse_payload(line)?;

    let description = record["description"]["value"].as_str().map(str::to_string);
    let published_date = record["created"]["value"].as_str().and_then(parse_created);

    let cover_ids = match record["covers"].as_array() {
        Some(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(stringify)
            .collect(),
        None => Vec::new(),
    };

    let (author_ids, author_names) = extract_author_refs(&record, lookup);

    Some(Book {
        id: stripped_id(&record, WORK_KEY_PREFIX),
        name: string_field(&record, "title"),
        description,
        published_date,
        cover_ids,
        author_ids,
        author_names,
    })
}

fn parse_created(raw: &str) -> Option<NaiveDate> {
    match NaiveDateTime::parse_from_str(raw, CREATED_TIMESTAMP_FORMAT) {
        Ok(timestamp) => Some(timestamp.date()),
        Err(e) => {
            debug!(value = raw, error = %e, "Dropping unparseable created timestamp");
            None
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Walks the `authors` array, collecting `element.author.key` ids and the
/// display name the store currently holds for each. A null or absent array
/// means the work has no authors; elements without a key are dropped. The
/// two returned sequences are always the same length.
fn extract_author_refs(record: &Value, lookup: &dyn AuthorLookup) -> (Vec<String>, Vec<String>) {
    let items = match record["authors"].as_array() {
        Some(items) => items,
        None => return (Vec::new(), Vec::new()),
    };

    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        match item["author"]["key"].as_str() {
            Some(key) => ids.push(
                key.strip_prefix(AUTHOR_KEY_PREFIX)
                    .unwrap_or(key)
                    .to_string(),
            ),
            None => debug!("Dropping author reference without a key"),
        }
    }

    let names = ids.iter().map(|id| lookup.display_name(id)).collect();
    (ids, names)
}
