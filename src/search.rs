//! Query engine: category-scoped fuzzy retrieval over a catalog snapshot.
//!
//! `search` is a pure function of the snapshot, the category filter, and
//! the query text. Matching runs across a fixed field set (filename,
//! extracted text preview, category, tags) and tolerates case differences,
//! partial substrings, and minor misspellings via normalized edit distance.
//! One dissimilarity threshold governs all fields; lower is stricter.
//!
//! # Ranking
//!
//! Each document's score is the lowest dissimilarity across its fields.
//! Results are sorted ascending by that score (best match first) with a
//! stable sort, so documents that tie keep their snapshot order.

use std::cmp::Ordering;

use crate::index::ALL_CATEGORY;
use crate::models::Document;

/// Dissimilarity ceiling applied when one string contains the other.
/// Keeps any substring hit comfortably inside the default threshold while
/// still ranking short partial matches below exact ones.
const SUBSTRING_PENALTY: f64 = 0.2;

/// Run a ranked query against a catalog snapshot.
///
/// 1. If `category` is not the `all` sentinel, retain only documents whose
///    `category` equals it exactly.
/// 2. An empty (or whitespace) query returns the category-filtered
///    sequence in original order. No ranking pass runs on this path.
/// 3. Otherwise every retained document is scored field by field and those
///    within `threshold` are returned best match first.
///
/// Repeated calls with identical inputs return identical results; the
/// snapshot is never mutated.
pub fn search(
    snapshot: &[Document],
    category: &str,
    query: &str,
    threshold: f64,
) -> Vec<Document> {
    let filtered = snapshot
        .iter()
        .filter(|d| category == ALL_CATEGORY || d.category == category);

    let query = query.trim();
    if query.is_empty() {
        return filtered.cloned().collect();
    }

    let query_lower = query.to_lowercase();
    let mut tokens: Vec<String> = query_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if tokens.is_empty() {
        tokens.push(query_lower.clone());
    }

    let mut hits: Vec<(f64, &Document)> = filtered
        .filter_map(|d| {
            document_dissimilarity(d, &query_lower, &tokens)
                .filter(|&score| score <= threshold)
                .map(|score| (score, d))
        })
        .collect();

    // Stable sort: ties keep their snapshot order.
    hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    hits.into_iter().map(|(_, d)| d.clone()).collect()
}

/// Best (lowest) dissimilarity across the searchable fields, or `None` when
/// no field holds any text. Absent fields are non-matching, never errors.
fn document_dissimilarity(doc: &Document, query: &str, tokens: &[String]) -> Option<f64> {
    let tags = doc.tags_text();
    let fields = [
        doc.filename.as_str(),
        doc.extracted_text_preview.as_str(),
        doc.category.as_str(),
        tags.as_deref().unwrap_or(""),
    ];

    fields
        .iter()
        .filter_map(|field| field_dissimilarity(field, query, tokens))
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
}

/// Dissimilarity of one field against the query, averaged over query tokens.
fn field_dissimilarity(field: &str, query: &str, tokens: &[String]) -> Option<f64> {
    if field.is_empty() {
        return None;
    }
    let field_lower = field.to_lowercase();

    // Whole-field containment covers multi-word phrases with their spacing.
    if let Some(score) = containment(&field_lower, query) {
        return Some(score);
    }

    let words: Vec<&str> = field_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return None;
    }

    let total: f64 = tokens
        .iter()
        .map(|token| {
            words
                .iter()
                .map(|word| token_dissimilarity(word, token))
                .fold(f64::INFINITY, f64::min)
        })
        .sum();
    Some(total / tokens.len() as f64)
}

/// Score for an exact or substring hit, graded by how much of the haystack
/// the needle covers. `None` when the haystack does not contain the needle.
fn containment(haystack: &str, needle: &str) -> Option<f64> {
    if haystack == needle {
        Some(0.0)
    } else if haystack.contains(needle) {
        let coverage = needle.chars().count() as f64 / haystack.chars().count() as f64;
        Some((1.0 - coverage) * SUBSTRING_PENALTY)
    } else {
        None
    }
}

fn token_dissimilarity(word: &str, token: &str) -> f64 {
    containment(word, token).unwrap_or_else(|| 1.0 - strsim::normalized_levenshtein(word, token))
}
