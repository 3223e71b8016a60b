//! Key/value grammar used for templated headers, query strings and
//! configuration lists.
//!
//! Pairs are separated by `;` (query strings also accept `&`), each pair is
//! split on its first `=`. Keys and values are trimmed, empty pairs are
//! dropped and a pair without `=` yields an empty value.

use model::http::headers::Headers;
use std::collections::BTreeMap;

const HEADER_SEPARATORS: &[char] = &[';'];
const QUERY_SEPARATORS: &[char] = &[';', '&'];

pub fn break_down_pairs(input: &str, separators: &[char]) -> Vec<(String, String)> {
    input
        .split(separators)
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .collect()
}

pub fn break_down_headers(input: &str) -> Headers {
    break_down_pairs(input, HEADER_SEPARATORS).into_iter().collect()
}

pub fn break_down_query_params(input: &str) -> Vec<(String, String)> {
    break_down_pairs(input, QUERY_SEPARATORS)
}

/// Single-valued variant; later keys win.
pub fn break_down_map(input: &str, separators: &[char]) -> BTreeMap<String, String> {
    break_down_pairs(input, separators).into_iter().collect()
}
