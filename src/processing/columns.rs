//! Column name normalization for schema-less input headers.

use std::collections::{HashMap, HashSet};

/// Rename repeated column names so every name is unique.
///
/// The first occurrence keeps its name; the 2nd, 3rd, … occurrences get `_1`, `_2`, … appended.
/// A suffix that would collide with another input name is skipped, so the output is always
/// unique. Inputs without repeats are returned unchanged.
pub fn deduplicate_columns<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    deduplicate_reserving(names, &[])
}

/// Like [`deduplicate_columns`], but treats every name in `reserved` as already taken.
fn deduplicate_reserving<S: AsRef<str>>(names: &[S], reserved: &[&str]) -> Vec<String> {
    let originals: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
    let mut counters: HashMap<&str, usize> = HashMap::new();
    let mut taken: HashSet<String> = reserved.iter().map(|r| (*r).to_string()).collect();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        let name = name.as_ref();
        let unique = if taken.contains(name) {
            let counter = counters.entry(name).or_insert(0);
            loop {
                *counter += 1;
                let candidate = format!("{name}_{counter}");
                if !taken.contains(&candidate) && !originals.contains(candidate.as_str()) {
                    break candidate;
                }
            }
        } else {
            name.to_string()
        };
        taken.insert(unique.clone());
        out.push(unique);
    }
    out
}

/// Make a column name safe for use as a document field.
///
/// `.` becomes `_` (so the store does not treat the name as an object path), then any character
/// outside `[A-Za-z0-9_@#]` becomes `_`.
pub fn sanitize_column_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '@' | '#' => c,
            _ => '_',
        })
        .collect()
}

/// Turn a raw CSV header into the field names used for documents.
///
/// Repeats are deduplicated, names sanitized, then deduplicated again so sanitization collisions
/// (`a.b` vs `a_b`) and the `reserved` field names can never produce duplicate keys.
pub fn prepare_headers<S: AsRef<str>>(raw: &[S], reserved: &[&str]) -> Vec<String> {
    let sanitized: Vec<String> = deduplicate_columns(raw)
        .iter()
        .map(|name| sanitize_column_name(name))
        .collect();
    deduplicate_reserving(&sanitized, reserved)
}

#[cfg(test)]
mod tests {
    use super::{deduplicate_columns, prepare_headers, sanitize_column_name};

    #[test]
    fn unique_names_pass_through() {
        let names = ["id", "name", "ts"];
        assert_eq!(deduplicate_columns(&names), vec!["id", "name", "ts"]);
    }

    #[test]
    fn repeats_get_increasing_suffixes_in_order() {
        let names = ["a", "b", "a", "a", "b"];
        assert_eq!(
            deduplicate_columns(&names),
            vec!["a", "b", "a_1", "a_2", "b_1"]
        );
    }

    #[test]
    fn suffix_skips_names_already_in_the_header() {
        let names = ["a", "a_1", "a"];
        assert_eq!(deduplicate_columns(&names), vec!["a", "a_1", "a_2"]);
    }

    #[test]
    fn sanitize_replaces_dots_and_symbols() {
        assert_eq!(sanitize_column_name("user.name"), "user_name");
        assert_eq!(sanitize_column_name("@timestamp"), "@timestamp");
        assert_eq!(sanitize_column_name("#tag"), "#tag");
        assert_eq!(sanitize_column_name("Event Time (UTC)"), "Event_Time__UTC_");
        assert_eq!(sanitize_column_name("größe"), "gr__e");
    }

    #[test]
    fn prepare_headers_resolves_sanitize_collisions() {
        let raw = ["a.b", "a_b", "id", "id"];
        assert_eq!(prepare_headers(&raw, &[]), vec!["a_b", "a_b_1", "id", "id_1"]);
    }

    #[test]
    fn prepare_headers_keeps_reserved_names_free() {
        let raw = ["timestamp_field", "x"];
        assert_eq!(
            prepare_headers(&raw, &["timestamp_field"]),
            vec!["timestamp_field_1", "x"]
        );
    }
}
