use crossbeam_utils::CachePadded;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::consts;
use crate::core::Gid;
use crate::loom::hint;
use crate::loom::sync::atomic::AtomicU8;
use crate::loom::sync::atomic::AtomicU64;
use crate::loom::sync::atomic::Ordering;
use crate::loom::thread;

// -----------------------------------------------------------------------------
// Lock Pool
// -----------------------------------------------------------------------------

/// One shard of the process-wide lock pool.
///
/// The shard only guards the read-modify-write of the lock token inside a
/// [`GidCell`]; it is never held across a credit mutation, so a plain
/// test-and-set spinlock suffices.
struct Shard {
  flag: AtomicU8,
}

impl Shard {
  #[cfg(not(loom))]
  const fn new() -> Self {
    Self {
      flag: AtomicU8::new(0),
    }
  }

  #[cfg(loom)]
  fn new() -> Self {
    Self {
      flag: AtomicU8::new(0),
    }
  }

  /// Runs `f` with the shard held.
  #[inline]
  fn with<F, R>(&self, f: F) -> R
  where
    F: FnOnce() -> R,
  {
    while self
      .flag
      .compare_exchange_weak(0, 1, Ordering::Acquire, Ordering::Relaxed)
      .is_err()
    {
      hint::spin_loop();
      thread::yield_now();
    }

    let out: R = f();

    self.flag.store(0, Ordering::Release);

    out
  }
}

#[cfg(not(loom))]
mod pool {
  use super::*;

  static SHARDS: [CachePadded<Shard>; consts::LOCK_POOL_SHARDS] =
    [const { CachePadded::new(Shard::new()) }; consts::LOCK_POOL_SHARDS];

  #[inline]
  pub(super) fn shard(addr: usize) -> &'static CachePadded<Shard> {
    &SHARDS[index(addr)]
  }
}

#[cfg(loom)]
mod pool {
  use super::*;

  loom::lazy_static! {
    static ref SHARDS: Box<[CachePadded<Shard>]> = (0..consts::LOCK_POOL_SHARDS)
      .map(|_| CachePadded::new(Shard::new()))
      .collect();
  }

  pub(super) fn shard(addr: usize) -> &'static CachePadded<Shard> {
    &SHARDS[index(addr)]
  }
}

/// Maps a cell address to its lock pool shard.
#[inline]
fn index(addr: usize) -> usize {
  // Cells are 16 bytes; drop the alignment zeros before folding.
  (addr >> 4) & (consts::LOCK_POOL_SHARDS - 1)
}

// -----------------------------------------------------------------------------
// Gid Cell
// -----------------------------------------------------------------------------

/// A shared, lockable GID.
///
/// Cells hold the live form of a [`Gid`] whose credit field may be mutated
/// by concurrent senders. Mutual exclusion uses the in-band lock token (bit
/// 29 of the high word): the token marks logical ownership, while the
/// actual test-and-set runs under a process-wide sharded lock pool keyed by
/// the cell's address. Readers never take the lock; [`get`][Self::get]
/// returns a plain snapshot with the token stripped.
///
/// # Lifetime
///
/// A cell must not be dropped while locked: the token lives inside the
/// value, so freeing the cell would teleport the lock. This is asserted in
/// debug builds.
pub struct GidCell {
  msb: AtomicU64,
  lsb: AtomicU64,
}

impl GidCell {
  /// Creates a new cell holding `gid`.
  ///
  /// The lock token of the incoming value is stripped.
  #[inline]
  pub fn new(gid: Gid) -> Self {
    Self {
      msb: AtomicU64::new(gid.msb() & !Gid::IS_LOCKED_MASK),
      lsb: AtomicU64::new(gid.lsb()),
    }
  }

  /// Returns a snapshot of the held GID with the lock token stripped.
  #[inline]
  pub fn get(&self) -> Gid {
    Gid::new(self.msb.load(Ordering::Acquire), self.lsb.load(Ordering::Acquire))
  }

  /// Returns `true` if some thread currently owns the lock token.
  #[inline]
  pub fn is_locked(&self) -> bool {
    self.msb.load(Ordering::Acquire) & Gid::IS_LOCKED_MASK != 0
  }

  /// Acquires the cell lock, yielding the calling thread while contended.
  pub fn lock(&self) -> GidGuard<'_> {
    'acquire: loop {
      if self.acquire() {
        break 'acquire;
      }

      while self.is_locked() {
        hint::spin_loop();
        thread::yield_now();
      }
    }

    GidGuard { cell: self }
  }

  /// Attempts to acquire the cell lock without blocking.
  #[inline]
  pub fn try_lock(&self) -> Option<GidGuard<'_>> {
    if self.acquire() {
      Some(GidGuard { cell: self })
    } else {
      None
    }
  }

  /// Attempts to claim the lock token under the pool shard.
  fn acquire(&self) -> bool {
    pool::shard(self as *const Self as usize).with(|| {
      let msb: u64 = self.msb.load(Ordering::Acquire);

      if msb & Gid::IS_LOCKED_MASK != 0 {
        return false;
      }

      self.msb.store(msb | Gid::IS_LOCKED_MASK, Ordering::Release);

      true
    })
  }

  /// Returns the lock token under the pool shard.
  fn release(&self) {
    pool::shard(self as *const Self as usize).with(|| {
      let msb: u64 = self.msb.load(Ordering::Acquire);

      debug_assert!(msb & Gid::IS_LOCKED_MASK != 0);

      self.msb.store(msb & !Gid::IS_LOCKED_MASK, Ordering::Release);
    });
  }
}

impl Debug for GidCell {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "GidCell({})", self.get())
  }
}

impl Drop for GidCell {
  fn drop(&mut self) {
    debug_assert!(!self.is_locked(), "dropped a locked GID");
  }
}

impl From<Gid> for GidCell {
  #[inline]
  fn from(other: Gid) -> Self {
    Self::new(other)
  }
}

// -----------------------------------------------------------------------------
// Gid Guard
// -----------------------------------------------------------------------------

/// Exclusive access to a locked [`GidCell`].
///
/// The lock token is returned when the guard drops, including on unwind, so
/// an error path can simply propagate without leaving the cell locked.
pub struct GidGuard<'cell> {
  cell: &'cell GidCell,
}

impl GidGuard<'_> {
  /// Returns the held GID with the lock token stripped.
  #[inline]
  pub fn get(&self) -> Gid {
    self.cell.get()
  }

  /// Replaces the held GID.
  ///
  /// The stored high word keeps the lock token set; the token is owned by
  /// this guard, not by the incoming value.
  #[inline]
  pub fn set(&mut self, gid: Gid) {
    self
      .cell
      .msb
      .store(gid.msb() | Gid::IS_LOCKED_MASK, Ordering::Release);
    self.cell.lsb.store(gid.lsb(), Ordering::Release);
  }
}

impl Debug for GidGuard<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "GidGuard({})", self.get())
  }
}

impl Drop for GidGuard<'_> {
  fn drop(&mut self) {
    self.cell.release();
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
