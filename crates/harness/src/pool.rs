//! Discovered content pool.
//!
//! Itinerary ids found by search/discovery actions, shared by every virtual
//! user of a run. Two views: `hot` (believed viral) and `all` (everything
//! seen). Append-only, and every hot id is also in `all`.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use parking_lot::RwLock;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

/// Itinerary identifier as returned by the itinerary service.
pub type ItineraryId = i64;

/// Ids guessed from when nothing has been discovered yet.
pub const FALLBACK_IDS: RangeInclusive<ItineraryId> = 1..=100;

#[derive(Debug, Default)]
struct Members {
    order: Vec<ItineraryId>,
    seen: HashSet<ItineraryId>,
}

impl Members {
    fn insert(&mut self, id: ItineraryId) -> bool {
        if self.seen.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Default)]
struct Pools {
    hot: Members,
    all: Members,
}

/// Shared hot/all id pools.
#[derive(Debug, Default)]
pub struct ContentPool {
    inner: RwLock<Pools>,
}

/// Sizes of both pools at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSizes {
    pub hot: usize,
    pub all: usize,
}

impl ContentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add ids to `all`. Returns how many were new.
    pub fn discover<I: IntoIterator<Item = ItineraryId>>(&self, ids: I) -> usize {
        let mut pools = self.inner.write();
        ids.into_iter().filter(|&id| pools.all.insert(id)).count()
    }

    /// Add ids to both `hot` and `all`. Returns how many were new to `hot`.
    pub fn discover_hot<I: IntoIterator<Item = ItineraryId>>(&self, ids: I) -> usize {
        let mut pools = self.inner.write();
        let mut added = 0;
        for id in ids {
            pools.all.insert(id);
            if pools.hot.insert(id) {
                added += 1;
            }
        }
        added
    }

    pub fn sizes(&self) -> PoolSizes {
        let pools = self.inner.read();
        PoolSizes {
            hot: pools.hot.order.len(),
            all: pools.all.order.len(),
        }
    }

    pub fn contains(&self, id: ItineraryId) -> bool {
        self.inner.read().all.seen.contains(&id)
    }

    pub fn is_hot(&self, id: ItineraryId) -> bool {
        self.inner.read().hot.seen.contains(&id)
    }

    /// Pick a target with a bias toward hot content.
    ///
    /// With probability `hot_bias` a hot id is chosen (when any are known),
    /// otherwise any known id, otherwise a guess from [`FALLBACK_IDS`].
    pub fn select_target<R: Rng + ?Sized>(&self, hot_bias: f64, rng: &mut R) -> ItineraryId {
        let pools = self.inner.read();

        if !pools.hot.order.is_empty() && rng.gen_range(0.0..1.0) < hot_bias {
            if let Some(&id) = pools.hot.order.choose(rng) {
                return id;
            }
        }

        match pools.all.order.choose(rng) {
            Some(&id) => id,
            None => rng.gen_range(FALLBACK_IDS),
        }
    }

    /// Pick any known id, or `None` when nothing has been discovered.
    pub fn select_known<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ItineraryId> {
        self.inner.read().all.order.choose(rng).copied()
    }
}
