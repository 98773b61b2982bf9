//! Circuit-breaking connection pool guard.
//!
//! The engine shares one `SQLite` datastore between interactive and
//! background callers. This module fronts it with a small pool of
//! [`Database`] handles and a saturation breaker: once the in-use ratio
//! crosses the configured threshold, new acquisitions fail fast with
//! [`Error::PoolSaturated`] instead of queueing, so interactive load is
//! shed before it piles up behind the write lock. Below the threshold,
//! an exhausted pool is retried with bounded exponential backoff.
//!
//! Handles are returned through [`PooledConnection`]'s `Drop`, which
//! also rolls back any transaction the borrower left open. Drop runs
//! during unwinding too, so a panicking caller cannot leak a handle.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::database::{Database, DatabaseConfig};
use crate::error::{Error, Result};

/// Default number of pooled connections.
pub const DEFAULT_CAPACITY: usize = 10;

/// Default in-use ratio at which the breaker opens.
pub const DEFAULT_SATURATION_THRESHOLD: f64 = 0.9;

/// Default first backoff delay when the pool is exhausted.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Default backoff ceiling.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Default number of acquisition retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for [`PoolGuard`].
///
/// `reserved_headroom` holds back part of the capacity from ordinary
/// callers; maintenance work acquires through
/// [`PoolGuard::acquire_reserved`] to use it. Tier shares from the
/// deployment config feed into these two numbers, they are not
/// per-tier sub-pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Total number of connections the pool may open.
    pub capacity: usize,
    /// In-use ratio in `(0, 1]` at which the breaker opens. A value
    /// of exactly 1 disables shedding; a full pool then waits with
    /// backoff instead.
    pub saturation_threshold: f64,
    /// First backoff delay when the pool is exhausted.
    pub backoff_base: Duration,
    /// Backoff ceiling.
    pub backoff_max: Duration,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Connections held back from ordinary acquisition.
    pub reserved_headroom: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            saturation_threshold: DEFAULT_SATURATION_THRESHOLD,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_max: DEFAULT_BACKOFF_MAX,
            max_retries: DEFAULT_MAX_RETRIES,
            reserved_headroom: 0,
        }
    }
}

impl PoolConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the capacity is zero, the
    /// threshold is outside `(0, 1]`, the headroom leaves no ordinary
    /// capacity, or the backoff ceiling is below the base delay.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::validation("capacity", "must be at least 1"));
        }
        if !(self.saturation_threshold > 0.0 && self.saturation_threshold <= 1.0) {
            return Err(Error::validation(
                "saturation_threshold",
                "must be within (0, 1]",
            ));
        }
        if self.reserved_headroom >= self.capacity {
            return Err(Error::validation(
                "reserved_headroom",
                "must leave at least one ordinary connection",
            ));
        }
        if self.backoff_max < self.backoff_base {
            return Err(Error::validation(
                "backoff_max",
                "must not be below backoff_base",
            ));
        }
        Ok(())
    }
}

/// A point-in-time snapshot of pool state.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    /// Total capacity.
    pub capacity: usize,
    /// Connections currently checked out.
    pub in_use: usize,
    /// Opened connections sitting idle in the pool.
    pub idle: usize,
    /// `in_use / capacity`.
    pub saturation: f64,
    /// True when ordinary acquisitions are being shed.
    pub breaker_open: bool,
}

#[derive(Debug)]
struct PoolState {
    free: Vec<Database>,
    in_use: usize,
    opened: usize,
}

/// A saturation-aware pool of database handles.
///
/// Created once per process and shared by reference; there is no
/// global instance.
///
/// # Examples
///
/// ```no_run
/// use aula::database::DatabaseConfig;
/// use aula::pool::{PoolConfig, PoolGuard};
///
/// let pool = PoolGuard::new(PoolConfig::default(), DatabaseConfig::new("/tmp/aula.db")).unwrap();
/// let conn = pool.acquire("booking-form").unwrap();
/// let rooms = conn.list_rooms().unwrap();
/// drop(conn);
/// # let _ = rooms;
/// ```
#[derive(Debug)]
pub struct PoolGuard {
    config: PoolConfig,
    db_config: DatabaseConfig,
    state: Mutex<PoolState>,
}

impl PoolGuard {
    /// Creates a pool guard. Connections are opened lazily, but the
    /// first one is opened here so misconfiguration surfaces early.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool configuration is invalid or the
    /// database cannot be opened.
    pub fn new(config: PoolConfig, db_config: DatabaseConfig) -> Result<Self> {
        config.validate()?;
        let first = Database::open(db_config.clone())?;
        Ok(Self {
            config,
            db_config,
            state: Mutex::new(PoolState {
                free: vec![first],
                in_use: 0,
                opened: 1,
            }),
        })
    }

    /// Acquires a connection for an ordinary caller.
    ///
    /// Fails fast with [`Error::PoolSaturated`] when the in-use ratio
    /// has crossed the saturation threshold, without consuming a
    /// handle. Otherwise, an exhausted pool is retried with bounded
    /// exponential backoff before giving up with
    /// [`Error::ConnectionUnavailable`]. The retry budget in
    /// [`PoolConfig`] bounds the total wait; there is no per-call
    /// timeout.
    ///
    /// `caller` only labels log lines.
    ///
    /// # Errors
    ///
    /// Returns an error on saturation, exhaustion of the retry budget,
    /// or failure to open a new connection.
    pub fn acquire(&self, caller: &str) -> Result<PooledConnection<'_>> {
        self.acquire_inner(caller, false)
    }

    /// Acquires a connection using the reserved headroom.
    ///
    /// Skips the breaker and the headroom limit; intended for
    /// maintenance callers that must make progress while interactive
    /// load is being shed.
    ///
    /// # Errors
    ///
    /// Returns an error when even the full capacity is exhausted for
    /// the whole retry budget.
    pub fn acquire_reserved(&self, caller: &str) -> Result<PooledConnection<'_>> {
        self.acquire_inner(caller, true)
    }

    fn acquire_inner(&self, caller: &str, reserved: bool) -> Result<PooledConnection<'_>> {
        let limit = if reserved {
            self.config.capacity
        } else {
            self.config.capacity - self.config.reserved_headroom
        };

        let mut waited = Duration::ZERO;
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match self.try_checkout(caller, reserved, limit)? {
                Some(db) => {
                    log::debug!("pool: handed connection to {caller} (attempt {attempts})");
                    return Ok(PooledConnection {
                        guard: self,
                        db: Some(db),
                    });
                }
                None => {
                    if attempts > self.config.max_retries {
                        return Err(Error::ConnectionUnavailable {
                            attempts,
                            waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                        });
                    }
                    let delay = self
                        .config
                        .backoff_base
                        .saturating_mul(1 << (attempts - 1).min(31))
                        .min(self.config.backoff_max);
                    log::debug!(
                        "pool: exhausted for {caller}, backing off {}ms (attempt {attempts})",
                        delay.as_millis()
                    );
                    std::thread::sleep(delay);
                    waited += delay;
                }
            }
        }
    }

    /// One checkout attempt. `Ok(None)` means the pool is exhausted
    /// below the breaker threshold and the caller should back off.
    fn try_checkout(&self, caller: &str, reserved: bool, limit: usize) -> Result<Option<Database>> {
        let mut state = self.lock_state();

        if !reserved && self.config.saturation_threshold < 1.0 {
            #[allow(clippy::cast_precision_loss)]
            let saturation = state.in_use as f64 / self.config.capacity as f64;
            if saturation >= self.config.saturation_threshold {
                log::warn!(
                    "pool: shedding {caller} at saturation {:.2} (threshold {:.2})",
                    saturation,
                    self.config.saturation_threshold
                );
                return Err(Error::PoolSaturated {
                    in_use: state.in_use,
                    capacity: self.config.capacity,
                    threshold: self.config.saturation_threshold * 100.0,
                });
            }
        }

        if state.in_use >= limit {
            return Ok(None);
        }

        if let Some(db) = state.free.pop() {
            state.in_use += 1;
            return Ok(Some(db));
        }

        if state.opened < self.config.capacity {
            let db = Database::open(self.db_config.clone())?;
            state.opened += 1;
            state.in_use += 1;
            return Ok(Some(db));
        }

        Ok(None)
    }

    /// Returns a snapshot of pool state.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.lock_state();
        #[allow(clippy::cast_precision_loss)]
        let saturation = state.in_use as f64 / self.config.capacity as f64;
        PoolStats {
            capacity: self.config.capacity,
            in_use: state.in_use,
            idle: state.free.len(),
            saturation,
            breaker_open: self.config.saturation_threshold < 1.0
                && saturation >= self.config.saturation_threshold,
        }
    }

    /// Locks the pool state, recovering from poisoning.
    ///
    /// The pool must stay usable after a borrower panics; the state
    /// itself is kept consistent by the return path in `Drop`.
    fn lock_state(&self) -> std::sync::MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn give_back(&self, db: Database) {
        let mut state = self.lock_state();
        state.in_use = state.in_use.saturating_sub(1);
        state.free.push(db);
    }
}

/// A pooled database handle.
///
/// Dereferences to [`Database`]. On drop, any transaction left open is
/// rolled back and the handle is returned to the pool, on every exit
/// path including unwinding.
#[derive(Debug)]
pub struct PooledConnection<'a> {
    guard: &'a PoolGuard,
    db: Option<Database>,
}

impl Deref for PooledConnection<'_> {
    type Target = Database;

    fn deref(&self) -> &Database {
        self.db.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Database {
        self.db.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            // Errors (usually "no transaction is active") are expected
            let _ = db.connection().execute_batch("ROLLBACK");
            self.guard.give_back(db);
        }
    }
}
