//! Determinism utilities: index maps and stable orderings.
//!
//! Candidate input order is the only tie-break the engine knows. Everything
//! here iterates by index over the caller's slice; map iteration order is
//! never observable in results.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use crate::errors::CoreError;
use crate::ids::ProjectId;

/* -------------------------------------------------------------------------- */
/*                                 Index maps                                 */
/* -------------------------------------------------------------------------- */

/// Map candidate id → position in `ids`. On a (contract-violating) duplicate,
/// the first occurrence keeps the index.
pub fn candidate_index(ids: &[ProjectId]) -> BTreeMap<&str, usize> {
    let mut idx = BTreeMap::new();
    for (i, id) in ids.iter().enumerate() {
        idx.entry(id.as_str()).or_insert(i);
    }
    idx
}

/// First id that appears twice, scanning in input order.
pub fn first_duplicate(ids: &[ProjectId]) -> Option<&ProjectId> {
    let mut seen = BTreeSet::new();
    ids.iter().find(|id| !seen.insert(id.as_str()))
}

/// Reject candidate sets with duplicate ids, naming the first repeat.
pub fn ensure_unique(ids: &[ProjectId]) -> Result<(), CoreError> {
    match first_duplicate(ids) {
        Some(dup) => Err(CoreError::DuplicateCandidate(dup.clone())),
        None => Ok(()),
    }
}

/* -------------------------------------------------------------------------- */
/*                               Stable ordering                              */
/* -------------------------------------------------------------------------- */

/// Indices `0..keys.len()` ordered by key descending. Equal keys keep their
/// relative input order (stable sort).
pub fn stable_order_desc(keys: &[u32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[b].cmp(&keys[a]));
    order
}

/* ---------------------------------- Tests --------------------------------- */
