//! Category index derivation.
//!
//! Pure functions from the current snapshot plus an ordered list of
//! category definitions to per-bucket membership counts. Nothing here is
//! stored; callers recompute after every snapshot change.

use serde::{Deserialize, Serialize};

use crate::models::Document;

/// Distinguished bucket id matching every document in the snapshot.
pub const ALL_CATEGORY: &str = "all";

/// One entry in the fixed, ordered category list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDef {
    pub id: String,
    pub label: String,
}

/// A derived bucket: a category definition plus its membership count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBucket {
    pub id: String,
    pub label: String,
    pub count: usize,
}

/// Count snapshot membership per category definition.
///
/// Output preserves the definitions' declared order. The `all` sentinel
/// counts the whole snapshot; every other id counts documents whose
/// `category` equals it exactly (case sensitive). Documents with
/// unrecognized categories count toward `all` only.
pub fn bucket_counts(snapshot: &[Document], defs: &[CategoryDef]) -> Vec<CategoryBucket> {
    defs.iter()
        .map(|def| {
            let count = if def.id == ALL_CATEGORY {
                snapshot.len()
            } else {
                snapshot.iter().filter(|d| d.category == def.id).count()
            };
            CategoryBucket {
                id: def.id.clone(),
                label: def.label.clone(),
                count,
            }
        })
        .collect()
}
