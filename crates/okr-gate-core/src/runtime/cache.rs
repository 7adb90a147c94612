// crates/okr-gate-core/src/runtime/cache.rs
// ============================================================================
// Module: OKR Gate Context Cache
// Description: TTL-bounded in-memory UserContext cache with ticketed population.
// Purpose: Avoid role store reads per request while honoring revocations at once.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryContextCache`] memoizes [`UserContext`] values per user for a
//! short TTL. Invalidation is an explicit delete and bumps a generation
//! counter; a miss hands out a [`CacheTicket`] stamped with the generation,
//! and populating with a ticket older than the user's last invalidation is a
//! no-op. A rebuild that raced a revoke can therefore never reinstate the
//! revoked role.
//!
//! Expiry reads an injected [`Clock`] so tests control time.
//!
//! Security posture: the cache holds authorization state; a poisoned mutex
//! surfaces as [`CacheError::Unavailable`] instead of serving stale data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::core::context::UserContext;
use crate::core::identifiers::UserId;
use crate::interfaces::CacheError;
use crate::interfaces::CacheLookup;
use crate::interfaces::CacheTicket;
use crate::interfaces::ContextCache;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default context TTL in milliseconds.
pub const DEFAULT_CACHE_TTL_MS: u64 = 30_000;
/// Default maximum cached contexts.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Monotonic millisecond clock used for cache expiry.
pub trait Clock: Send + Sync {
    /// Returns elapsed milliseconds since an arbitrary fixed origin.
    fn now_millis(&self) -> u64;
}

/// Clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    /// Origin instant.
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Manually advanced clock for tests and deterministic hosts.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    /// Current time in milliseconds.
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a manual clock at `start_ms`.
    #[must_use]
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Advances the clock.
    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ============================================================================
// SECTION: In-Memory Cache
// ============================================================================

/// Cached context with its insertion time.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Cached context.
    context: UserContext,
    /// Clock reading at insertion.
    inserted_at: u64,
}

/// Mutable cache state.
#[derive(Debug, Default)]
struct CacheState {
    /// Live entries keyed by user.
    entries: BTreeMap<UserId, CacheEntry>,
    /// Generation counter, bumped on every invalidation.
    generation: u64,
    /// Generation of each user's most recent invalidation.
    invalidated: BTreeMap<UserId, u64>,
    /// Generation of the most recent full clear.
    cleared_at: u64,
}

impl CacheState {
    /// Returns true when a ticket predates an invalidation of its user.
    fn is_stale(&self, ticket: &CacheTicket) -> bool {
        if self.cleared_at > ticket.generation() {
            return true;
        }
        self.invalidated.get(ticket.user_id()).is_some_and(|at| *at > ticket.generation())
    }
}

/// TTL-bounded in-memory context cache.
///
/// # Invariants
/// - At most `max_entries` contexts are held.
/// - An entry older than `ttl_ms` is never returned.
pub struct InMemoryContextCache {
    /// Entry lifetime in milliseconds.
    ttl_ms: u64,
    /// Maximum live entries (and tracked invalidations).
    max_entries: usize,
    /// Expiry clock.
    clock: Arc<dyn Clock>,
    /// Cache state protected by a mutex.
    state: Mutex<CacheState>,
}

impl InMemoryContextCache {
    /// Creates a cache using the monotonic clock.
    #[must_use]
    pub fn new(ttl_ms: u64, max_entries: usize) -> Self {
        Self::with_clock(ttl_ms, max_entries, Arc::new(MonotonicClock::new()))
    }

    /// Creates a cache with an explicit clock.
    #[must_use]
    pub fn with_clock(ttl_ms: u64, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl_ms,
            max_entries: max_entries.max(1),
            clock,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the number of live (possibly expired) entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the cache mutex is poisoned.
    pub fn entry_count(&self) -> Result<usize, CacheError> {
        Ok(self.lock()?.entries.len())
    }

    /// Returns true when an entry inserted at `inserted_at` has expired.
    const fn is_expired(&self, inserted_at: u64, now: u64) -> bool {
        now.saturating_sub(inserted_at) >= self.ttl_ms
    }

    /// Makes room for one entry: expired entries first, then the oldest.
    fn evict(&self, state: &mut CacheState, now: u64) {
        if state.entries.len() < self.max_entries {
            return;
        }
        state.entries.retain(|_, entry| !self.is_expired(entry.inserted_at, now));
        while state.entries.len() >= self.max_entries {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(user_id, _)| user_id.clone());
            match oldest {
                Some(user_id) => {
                    state.entries.remove(&user_id);
                }
                None => break,
            }
        }
    }

    /// Acquires the cache lock.
    fn lock(&self) -> Result<MutexGuard<'_, CacheState>, CacheError> {
        self.state
            .lock()
            .map_err(|_| CacheError::Unavailable("context cache mutex poisoned".to_string()))
    }
}

impl ContextCache for InMemoryContextCache {
    fn get(&self, user_id: &UserId) -> Result<CacheLookup, CacheError> {
        let now = self.clock.now_millis();
        let mut state = self.lock()?;
        if let Some(entry) = state.entries.get(user_id) {
            if !self.is_expired(entry.inserted_at, now) {
                return Ok(CacheLookup::Hit(entry.context.clone()));
            }
            state.entries.remove(user_id);
        }
        let ticket = CacheTicket::new(user_id.clone(), state.generation);
        drop(state);
        Ok(CacheLookup::Miss(ticket))
    }

    fn set(&self, ticket: CacheTicket, context: UserContext) -> Result<(), CacheError> {
        if context.user_id != *ticket.user_id() {
            return Ok(());
        }
        let now = self.clock.now_millis();
        let mut state = self.lock()?;
        if state.is_stale(&ticket) {
            return Ok(());
        }
        if !state.entries.contains_key(&context.user_id) {
            self.evict(&mut state, now);
        }
        state.entries.insert(
            context.user_id.clone(),
            CacheEntry {
                context,
                inserted_at: now,
            },
        );
        drop(state);
        Ok(())
    }

    fn invalidate(&self, user_id: &UserId) -> Result<(), CacheError> {
        let mut state = self.lock()?;
        state.generation += 1;
        let generation = state.generation;
        state.entries.remove(user_id);
        state.invalidated.insert(user_id.clone(), generation);
        if state.invalidated.len() > self.max_entries {
            state.invalidated.clear();
            state.cleared_at = generation;
        }
        drop(state);
        Ok(())
    }

    fn invalidate_all(&self) -> Result<(), CacheError> {
        let mut state = self.lock()?;
        state.generation += 1;
        state.cleared_at = state.generation;
        state.entries.clear();
        state.invalidated.clear();
        drop(state);
        Ok(())
    }
}

// ============================================================================
// SECTION: Noop Cache
// ============================================================================

/// Cache that never stores anything; every lookup is a miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopContextCache;

impl ContextCache for NoopContextCache {
    fn get(&self, user_id: &UserId) -> Result<CacheLookup, CacheError> {
        Ok(CacheLookup::Miss(CacheTicket::new(user_id.clone(), 0)))
    }

    fn set(&self, _ticket: CacheTicket, _context: UserContext) -> Result<(), CacheError> {
        Ok(())
    }

    fn invalidate(&self, _user_id: &UserId) -> Result<(), CacheError> {
        Ok(())
    }

    fn invalidate_all(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
