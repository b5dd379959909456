//! Owner-side accounting of issued credit.
//!
//! Every locality tracks, per owned name, how much credit it has handed out
//! to the rest of the system. The table is the other half of the weighted
//! reference-counting protocol: handles return their credit through
//! decrement messages, and a name whose outstanding credit reaches zero has
//! no live reference anywhere.
//!
//! Entries are keyed by the stripped GID; the per-copy state bits of a key
//! never matter here.

use crossbeam_utils::CachePadded;
use hashbrown::HashMap;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::consts;
use crate::core::Gid;
use crate::core::fatal;
use crate::core::raise;

/// Per-locality table of outstanding credit per owned name.
///
/// Sharded by a cheap fold of the name so that unrelated names do not
/// contend. Each shard is an independent map under its own lock.
pub struct IssueTable {
  shards: Box<[CachePadded<Mutex<HashMap<Gid, u64>>>]>,
}

impl IssueTable {
  /// Creates an empty table.
  pub fn new() -> Self {
    let shards: Box<[CachePadded<Mutex<HashMap<Gid, u64>>>]> = (0..consts::ISSUE_TABLE_SHARDS)
      .map(|_| CachePadded::new(Mutex::new(HashMap::with_capacity(consts::CAP_ISSUE_NAMES))))
      .collect();

    Self { shards }
  }

  /// Issues the initial credit for a newly bound name.
  ///
  /// Records [`CREDIT_INITIAL`] as outstanding and returns a copy of `gid`
  /// stamped with that credit, ready to hand to the first handle.
  ///
  /// [`CREDIT_INITIAL`]: consts::CREDIT_INITIAL
  pub fn issue(&self, gid: Gid) -> Gid {
    self.grant(gid, consts::CREDIT_INITIAL);

    let mut issued: Gid = gid;

    issued.set_credit(consts::CREDIT_INITIAL);

    tracing::debug!(gid = %gid.stripped(), credits = consts::CREDIT_INITIAL, "credit issued");

    issued
  }

  /// Records `credits` additional outstanding credit for `gid`.
  ///
  /// Called by the replenish handler when a remote copy ran out of
  /// divisible credit.
  pub fn grant(&self, gid: Gid, credits: u64) {
    let key: Gid = gid.stripped();
    let mut shard: MutexGuard<'_, HashMap<Gid, u64>> = self.shard(key).lock();
    let outstanding: &mut u64 = shard.entry(key).or_insert(0);

    let Some(total) = outstanding.checked_add(credits) else {
      raise!(Capacity, "credit issue counter overflow for {key}");
    };

    *outstanding = total;
  }

  /// Returns `credits` previously issued credit for `gid`.
  ///
  /// Called by the decrement handler when the last local reference on some
  /// locality died. Returns the credit still outstanding; zero means the
  /// name has no live reference anywhere and the object can be destroyed.
  pub fn settle(&self, gid: Gid, credits: u64) -> u64 {
    let key: Gid = gid.stripped();
    let mut shard: MutexGuard<'_, HashMap<Gid, u64>> = self.shard(key).lock();

    let Some(outstanding) = shard.get_mut(&key) else {
      fatal!("settled credit for unissued name {key}");
    };

    if credits > *outstanding {
      fatal!("settled more credit than was ever issued for {key}");
    }

    *outstanding -= credits;

    let remaining: u64 = *outstanding;

    if remaining == 0 {
      let _entry: Option<u64> = shard.remove(&key);

      tracing::debug!(gid = %key, "name fully released");
    } else {
      tracing::trace!(gid = %key, credits, remaining, "credit settled");
    }

    remaining
  }

  /// Returns the credit currently outstanding for `gid`.
  pub fn outstanding(&self, gid: Gid) -> u64 {
    let key: Gid = gid.stripped();

    self.shard(key).lock().get(&key).copied().unwrap_or(0)
  }

  /// Returns the number of names with outstanding credit.
  pub fn len(&self) -> usize {
    self.shards.iter().map(|shard| shard.lock().len()).sum()
  }

  /// Returns `true` if no name has outstanding credit.
  pub fn is_empty(&self) -> bool {
    self.shards.iter().all(|shard| shard.lock().is_empty())
  }

  #[inline]
  fn shard(&self, key: Gid) -> &Mutex<HashMap<Gid, u64>> {
    // A cheap fold is enough to spread unrelated names; the maps hash
    // properly within each shard.
    let fold: u64 = key.lsb() ^ key.msb();

    &self.shards[fold as usize & (consts::ISSUE_TABLE_SHARDS - 1)]
  }
}

impl Debug for IssueTable {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("IssueTable").field("names", &self.len()).finish()
  }
}

impl Default for IssueTable {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
