use std::alloc::handle_alloc_error;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::ptr;
use std::ptr::NonNull;

use crate::loom::alloc::Layout;
use crate::loom::alloc::alloc;
use crate::loom::alloc::dealloc;
use crate::loom::sync::Mutex;
use crate::loom::sync::MutexGuard;

/// A bounded free-list allocator for fixed-size objects.
///
/// Handle state blocks are small and churn quickly as names travel through
/// the system; routing them through the general heap on every copy chain
/// would dominate the cost of the handles themselves. The pool caches up to
/// `capacity` released blocks for reuse and falls back to the global
/// allocator beyond that.
///
/// The pool never shrinks below its cached set; blocks held in the free
/// list are returned to the global allocator only on [`Drop`].
pub(crate) struct SlotPool<T> {
  free: Mutex<Vec<NonNull<T>>>,
  capacity: usize,
}

impl<T> SlotPool<T> {
  /// Creates an empty pool caching at most `capacity` released blocks.
  #[cfg(not(loom))]
  pub(crate) const fn new(capacity: usize) -> Self {
    Self {
      free: Mutex::new(Vec::new()),
      capacity,
    }
  }

  #[cfg(loom)]
  pub(crate) fn new(capacity: usize) -> Self {
    Self {
      free: Mutex::new(Vec::new()),
      capacity,
    }
  }

  /// Returns the number of blocks currently cached for reuse.
  pub(crate) fn cached(&self) -> usize {
    self.free_list().len()
  }

  /// Allocates a block holding `value`.
  ///
  /// Reuses a cached block when one is available.
  pub(crate) fn allocate(&self, value: T) -> NonNull<T> {
    if let Some(block) = self.free_list().pop() {
      // SAFETY: The block came from a previous allocation of `T` and its
      // previous value was dropped in `release`.
      unsafe { block.as_ptr().write(value) };

      return block;
    }

    let layout: Layout = Layout::new::<T>();

    // SAFETY: `T` is a concrete sized type, so the layout is non-zero.
    let raw: *mut T = unsafe { alloc(layout) }.cast();

    let Some(block) = NonNull::new(raw) else {
      handle_alloc_error(layout);
    };

    // SAFETY: The block was just allocated with the layout of `T`.
    unsafe { block.as_ptr().write(value) };

    block
  }

  /// Drops the value in `block` and recycles the memory.
  ///
  /// # Safety
  ///
  /// `block` must have been returned by [`allocate`][Self::allocate] on
  /// this pool, must hold a live value, and must not be used after this
  /// call.
  pub(crate) unsafe fn release(&self, block: NonNull<T>) {
    // SAFETY: The caller guarantees the block holds a live value.
    unsafe { ptr::drop_in_place(block.as_ptr()) };

    let mut free: MutexGuard<'_, Vec<NonNull<T>>> = self.free_list();

    if free.len() < self.capacity {
      free.push(block);
      return;
    }

    drop(free);

    // SAFETY: The block was allocated with the layout of `T` and the value
    // it held was dropped above.
    unsafe { dealloc(block.as_ptr().cast(), Layout::new::<T>()) };
  }

  /// Locks the free list.
  #[cfg(not(loom))]
  fn free_list(&self) -> MutexGuard<'_, Vec<NonNull<T>>> {
    self.free.lock()
  }

  #[cfg(loom)]
  fn free_list(&self) -> MutexGuard<'_, Vec<NonNull<T>>> {
    self.free.lock().unwrap()
  }
}

impl<T> Debug for SlotPool<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("SlotPool")
      .field("cached", &self.cached())
      .field("capacity", &self.capacity)
      .finish()
  }
}

impl<T> Drop for SlotPool<T> {
  fn drop(&mut self) {
    for block in self.free_list().drain(..) {
      // SAFETY: Cached blocks hold no live value and were allocated with
      // the layout of `T`.
      unsafe { dealloc(block.as_ptr().cast(), Layout::new::<T>()) };
    }
  }
}

// SAFETY: The pool hands out exclusive ownership of raw blocks; the free
// list itself is guarded by a mutex and cached blocks hold no live value.
unsafe impl<T: Send> Send for SlotPool<T> {}

// SAFETY: See the `Send` impl; all shared access goes through the mutex.
unsafe impl<T: Send> Sync for SlotPool<T> {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
