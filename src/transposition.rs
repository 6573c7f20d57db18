// Transposition table keyed by canonical position, remaining depth and node type
//
// Only exact values are stored: a result taken from a subtree where a cutoff
// happened is a bound and the caller must not hand it to `store`.

use log::debug;
use std::collections::HashMap;

use crate::canonical::CanonicalKey;
use crate::simple_profiler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EntryKey {
    position: CanonicalKey,
    depth: u8,
    is_max: bool,
}

/// Running counters of table activity
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
    /// Entries dropped by the soft capacity, not counting precision eviction
    pub evictions: u64,
}

/// In-memory score cache shared by every node of the searches run through one context
#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: HashMap<EntryKey, f64>,
    soft_capacity: Option<usize>,
    stats: TableStats,
}

impl TranspositionTable {
    /// Creates an unbounded table
    pub fn new() -> Self {
        TranspositionTable::default()
    }

    /// Creates a table that drops its shallowest entries once it grows past
    /// `soft_capacity`; `None` never evicts
    pub fn with_soft_capacity(soft_capacity: Option<usize>) -> Self {
        TranspositionTable {
            soft_capacity,
            ..TranspositionTable::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> TableStats {
        self.stats
    }

    /// Single-depth probe without side effects
    pub fn get(&self, position: &CanonicalKey, depth: u8, is_max: bool) -> Option<f64> {
        self.entries
            .get(&EntryKey {
                position: *position,
                depth,
                is_max,
            })
            .copied()
    }

    /// Returns the deepest cached value for `position` between `max_depth` and
    /// `min_depth` inclusive
    ///
    /// Probing runs from `max_depth` downward. Once a hit is found, every
    /// shallower entry encountered for the same key is deleted.
    pub fn lookup_best(
        &mut self,
        position: &CanonicalKey,
        min_depth: u8,
        max_depth: u8,
        is_max: bool,
    ) -> Option<f64> {
        let mut found = None;

        for depth in (min_depth..=max_depth).rev() {
            let key = EntryKey {
                position: *position,
                depth,
                is_max,
            };
            if found.is_none() {
                found = self.entries.get(&key).copied();
            } else {
                self.entries.remove(&key);
            }
        }

        self.stats.probes += 1;
        if found.is_some() {
            self.stats.hits += 1;
        }
        simple_profiler::record_tt_lookup(found.is_some());

        found
    }

    /// Unconditional upsert of an exact value
    pub fn store(&mut self, position: CanonicalKey, depth: u8, is_max: bool, value: f64) {
        self.entries.insert(
            EntryKey {
                position,
                depth,
                is_max,
            },
            value,
        );
        self.stats.stores += 1;
        self.enforce_capacity();
    }

    fn enforce_capacity(&mut self) {
        let Some(capacity) = self.soft_capacity else {
            return;
        };
        if self.entries.len() <= capacity {
            return;
        }

        let shallowest = match self.entries.keys().map(|k| k.depth).min() {
            Some(depth) => depth,
            None => return,
        };

        let before = self.entries.len();
        self.entries.retain(|key, _| key.depth > shallowest);
        let evicted = before - self.entries.len();
        self.stats.evictions += evicted as u64;

        debug!(
            "Transposition table over soft capacity {}: evicted {} entries at depth {}",
            capacity, evicted, shallowest
        );
    }
}
