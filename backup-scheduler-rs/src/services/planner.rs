//! Decides which discovered units actually need a new artifact.

use std::collections::HashSet;

use crate::cache::TransactionCache;
use crate::models::unit::BackupUnit;

/// Filters the discovered units down to the ones worth dumping this cycle:
/// a unit is planned iff it has a non-empty fingerprint and is either
/// unknown to the cache or carries a different fingerprint than the one on
/// record. Discovery order is preserved.
pub fn plan(
    known: &HashSet<String>,
    cache: &TransactionCache,
    discovered: Vec<BackupUnit>,
) -> Vec<BackupUnit> {
    discovered
        .into_iter()
        .filter(|unit| {
            let Some(fingerprint) = unit.fingerprint.as_deref().filter(|f| !f.is_empty()) else {
                return false;
            };
            !known.contains(&unit.artifact_name)
                || cache.has_changed(&unit.artifact_name, fingerprint)
        })
        .collect()
}
