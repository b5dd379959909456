use std::cmp::Ordering as CmpOrdering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::hash::Hash;
use std::hash::Hasher;
use std::panic::RefUnwindSafe;
use std::panic::UnwindSafe;
use std::ptr::NonNull;

use crate::consts;
use crate::core::Gid;
use crate::core::GidCell;
use crate::core::GidGuard;
use crate::core::Management;
use crate::core::SlotPool;
use crate::core::fatal;
use crate::locality::Locality;
use crate::locality::ReplenishError;
use crate::loom::sync::atomic::AtomicU8;
use crate::loom::sync::atomic::AtomicU32;
use crate::loom::sync::atomic::Ordering;
use crate::loom::sync::atomic::fence;

/// Pool of recycled handle state blocks.
#[cfg(not(loom))]
static STATES: SlotPool<HandleState> = SlotPool::new(consts::CAP_HANDLE_STATES);

#[cfg(loom)]
loom::lazy_static! {
  static ref STATES: SlotPool<HandleState> = SlotPool::new(consts::CAP_HANDLE_STATES);
}

// -----------------------------------------------------------------------------
// Handle State
// -----------------------------------------------------------------------------

/// Shared state behind every local copy of a [`Handle`].
///
/// All copies of a handle within one locality point at a single state
/// block: the lockable GID whose credit they collectively hold, the local
/// reference count, and the management mode.
#[repr(C)]
pub(crate) struct HandleState {
  gid: GidCell,
  count: AtomicU32,
  mode: AtomicU8,
}

impl HandleState {
  #[inline]
  fn new(gid: Gid, mode: Management) -> Self {
    Self {
      gid: GidCell::new(gid),
      count: AtomicU32::new(1),
      mode: AtomicU8::new(mode.tag()),
    }
  }

  #[inline]
  fn mode(&self) -> Management {
    let tag: u8 = self.mode.load(Ordering::Relaxed);

    match Management::from_tag(tag) {
      Some(mode) => mode,
      None => fatal!("corrupt management mode tag {tag:#04x}"),
    }
  }
}

// -----------------------------------------------------------------------------
// Handle
// -----------------------------------------------------------------------------

/// Reference-counted owner of a [`Gid`] participating in distributed
/// reference counting.
///
/// Handles are the only way user code holds remote names. Copying a handle
/// within a locality is an atomic count increment; no credit moves. Credit
/// moves at exactly two points:
///
/// - **Serialization out** splits the held credit (or transfers all of it,
///   see [`Management::ManagedMoveCredit`]) into the wire image.
/// - **Dropping the last local copy** of a managed handle schedules a
///   credit decrement to the owning locality for the amount still held.
///
/// The owning locality destroys the named object once every credit it ever
/// issued has been returned, so a remote object dies exactly when the last
/// handle anywhere goes away.
pub struct Handle {
  state: NonNull<HandleState>,
}

impl Handle {
  /// Creates a handle owning `gid` with an explicit management mode.
  #[inline]
  pub fn new(gid: Gid, mode: Management) -> Self {
    Self {
      state: STATES.allocate(HandleState::new(gid, mode)),
    }
  }

  /// Creates a handle owning `gid` with the default mode for its credit
  /// state: credited names are managed, uncredited names are unmanaged.
  #[inline]
  pub fn from_gid(gid: Gid) -> Self {
    if gid.has_credits() {
      Self::new(gid, Management::Managed)
    } else {
      Self::new(gid, Management::Unmanaged)
    }
  }

  /// Converts a batch of raw GIDs arriving from the network into handles.
  ///
  /// Each element follows the credited ⇒ managed rule independently. Order
  /// is preserved and duplicates are kept: two equal GIDs in the batch
  /// yield two independent handles, each accounting for its own credit.
  /// When a mixed batch later drops, decrements are emitted in the drop
  /// order of the individual handles.
  #[inline]
  pub fn from_gids(gids: &[Gid]) -> Vec<Self> {
    gids.iter().copied().map(Self::from_gid).collect()
  }

  /// Creates the unmanaged handle naming the locality `locality_id`.
  #[inline]
  pub fn from_locality(locality_id: u32) -> Self {
    Self::new(Gid::from_locality(locality_id), Management::Unmanaged)
  }

  /// Creates a handle on the canonical null name.
  #[inline]
  pub fn invalid() -> Self {
    Self::new(Gid::INVALID, Management::Unmanaged)
  }

  /// Returns a snapshot of the held GID.
  ///
  /// The snapshot never carries the lock token. Credit bits reflect the
  /// moment of the call and may be stale under concurrent serialization.
  #[inline]
  pub fn gid(&self) -> Gid {
    self.state().gid.get()
  }

  /// Returns the management mode of this handle.
  #[inline]
  pub fn mode(&self) -> Management {
    self.state().mode()
  }

  /// Returns `false` only for handles on the null name.
  #[inline]
  pub fn is_valid(&self) -> bool {
    self.gid().is_valid()
  }

  /// Returns the identifier of the hosting locality.
  #[inline]
  pub fn locality_id(&self) -> u32 {
    self.gid().locality_id()
  }

  /// Returns `true` if this handle names a locality.
  #[inline]
  pub fn is_locality(&self) -> bool {
    self.gid().is_locality()
  }

  /// Prepares this handle for serialization, returning the wire image.
  ///
  /// Called while other threads may hold copies of the same handle. The
  /// held credit moves into the returned image:
  ///
  /// - an unmanaged handle (or a managed one whose credit already moved)
  ///   serializes as an uncredited, unmanaged image;
  /// - a move-credit handle, or the sole local reference at send time,
  ///   transfers its entire credit and keeps none;
  /// - otherwise the credit is split, half staying local.
  ///
  /// Move-credit normalizes to [`Management::Managed`] on the wire; the
  /// receiver has no move obligation.
  ///
  /// # Errors
  ///
  /// Returns [`ReplenishError`] when the split needed a replenishment that
  /// failed. The handle is left unchanged and unlocked.
  pub(crate) fn preprocess(&self) -> Result<(Gid, Management), ReplenishError> {
    let state: &HandleState = self.state();
    let mode: Management = state.mode();

    if !mode.is_managed() {
      return Ok((state.gid.get(), Management::Unmanaged));
    }

    let mut guard: GidGuard<'_> = state.gid.lock();
    let mut gid: Gid = guard.get();

    // A managed handle whose credit already moved has nothing left to
    // account for; the receiver gets an unmanaged image.
    if !gid.has_credits() {
      return Ok((gid, Management::Unmanaged));
    }

    let sole: bool = state.count.load(Ordering::Acquire) == 1;

    if mode == Management::ManagedMoveCredit || sole {
      let wire: Gid = gid;

      gid.strip_credits();
      guard.set(gid);

      tracing::trace!(gid = %wire.stripped(), credits = wire.credit(), "credit moved to wire");

      return Ok((wire, Management::Managed));
    }

    let wire: Gid = GidCell::split_credits_locked(&mut guard)?;

    Ok((wire, Management::Managed))
  }

  #[inline]
  fn state(&self) -> &HandleState {
    // SAFETY: The state block stays alive until the count reaches zero,
    // and `self` contributes one reference to that count.
    unsafe { self.state.as_ref() }
  }
}

impl Clone for Handle {
  #[inline]
  fn clone(&self) -> Self {
    let _count: u32 = self.state().count.fetch_add(1, Ordering::Relaxed);

    Self { state: self.state }
  }
}

impl Drop for Handle {
  fn drop(&mut self) {
    if self.state().count.fetch_sub(1, Ordering::Release) != 1 {
      return;
    }

    // Synchronize with every previous release decrement before finalizing.
    fence(Ordering::Acquire);

    let gid: Gid = self.state().gid.get();

    if self.state().mode().is_managed() {
      let credits: u64 = gid.credit();

      if credits > 0 {
        Locality::schedule_decrement(gid, credits);
      }
    }

    // SAFETY: The count reached zero, so no other handle refers to this
    // state block and it holds a live value.
    unsafe { STATES.release(self.state) };
  }
}

impl Debug for Handle {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(self, f)
  }
}

impl Display for Handle {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "{} ({})", self.gid(), self.mode())
  }
}

impl PartialEq for Handle {
  #[inline]
  fn eq(&self, other: &Self) -> bool {
    self.gid() == other.gid()
  }
}

impl Eq for Handle {}

impl PartialOrd for Handle {
  #[inline]
  fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
    Some(self.cmp(other))
  }
}

impl Ord for Handle {
  #[inline]
  fn cmp(&self, other: &Self) -> CmpOrdering {
    self.gid().cmp(&other.gid())
  }
}

impl Hash for Handle {
  #[inline]
  fn hash<H>(&self, state: &mut H)
  where
    H: Hasher,
  {
    self.gid().hash(state);
  }
}

// SAFETY: The state block is only mutated through atomics and the locked
// cell; the count keeps it alive for as long as any copy exists.
unsafe impl Send for Handle {}

// SAFETY: See the `Send` impl.
unsafe impl Sync for Handle {}

impl RefUnwindSafe for Handle {}
impl UnwindSafe for Handle {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
