//! Weighted reference-count credit arithmetic.
//!
//! Credit is the unit of distributed reference share. Every live copy of a
//! name carries a power-of-two credit, stored as `log2(credit)` in the five
//! credit bits of the high word. The global invariant:
//!
//! > For any live object named by `g`, the credits held by every copy of
//! > `g` anywhere in the system sum to the total credit issued by the
//! > owning locality.
//!
//! Splitting a credit halves the exponent so both copies carry half the
//! share; a copy that is down to a single credit asks the owning locality
//! to replenish before it can split again. This is weighted reference
//! counting: the owner accounts per name, never per handle.

use crate::consts;
use crate::core::Gid;
use crate::core::GidCell;
use crate::core::GidGuard;
use crate::locality::Locality;
use crate::locality::ReplenishError;

impl Gid {
  /// Returns the log2 of the credit held by this copy.
  ///
  /// Asserts that the credit field is meaningful.
  #[inline]
  pub fn log2_credit(&self) -> u8 {
    debug_assert!(self.has_credits());
    ((self.msb() >> Self::CREDIT_SHIFT) & Self::CREDIT_BASE_MASK) as u8
  }

  /// Returns the credit held by this copy, or zero when the credit field is
  /// not meaningful.
  #[inline]
  pub fn credit(&self) -> u64 {
    if self.has_credits() {
      1 << self.log2_credit()
    } else {
      0
    }
  }

  /// Stores `log2` in the credit field and marks the field meaningful.
  #[inline]
  pub(crate) fn set_log2_credit(&mut self, log2: u8) {
    debug_assert!(log2 <= consts::MAX_LOG2_CREDIT);

    self.set_msb(
      (self.msb() & !Self::CREDIT_MASK)
        | (((log2 as u64) << Self::CREDIT_SHIFT) & Self::CREDIT_MASK)
        | Self::HAS_CREDITS_MASK,
    );
  }

  /// Sets the credit held by this copy.
  ///
  /// A zero credit clears the whole credit cluster. A non-zero credit must
  /// be a power of two; this is asserted.
  #[inline]
  pub fn set_credit(&mut self, credits: u64) {
    if credits == 0 {
      self.strip_credits();
    } else {
      debug_assert!(credits.is_power_of_two());
      self.set_log2_credit(credits.trailing_zeros() as u8);
    }
  }

  /// Adds `credits` to this copy and returns the new total.
  ///
  /// The caller guarantees the result is a power of two; this is asserted.
  #[inline]
  pub fn add_credit(&mut self, credits: u64) -> u64 {
    let total: u64 = self.credit() + credits;

    debug_assert!(total.is_power_of_two());
    self.set_log2_credit(total.trailing_zeros() as u8);

    total
  }

  /// Removes `debit` from this copy and returns the new total.
  ///
  /// The caller guarantees the result is a power of two or zero; this is
  /// asserted.
  #[inline]
  pub fn remove_credit(&mut self, debit: u64) -> u64 {
    let credits: u64 = self.credit();

    debug_assert!(debit <= credits);

    let total: u64 = credits - debit;

    self.set_credit(total);

    total
  }

  /// Clears the credit cluster: credit field, split marker, and validity
  /// flag.
  #[inline]
  pub fn strip_credits(&mut self) {
    self.set_msb(self.msb() & !Self::CREDIT_BITS_MASK);
  }
}

impl GidCell {
  /// Splits the credit held by this cell, returning a copy carrying the
  /// other half.
  ///
  /// Locks the cell for the duration. When the held credit is down to one
  /// and cannot be subdivided, the owning locality is first asked to
  /// replenish through the installed [`Resolver`].
  ///
  /// # Errors
  ///
  /// Returns [`ReplenishError`] when a required replenishment fails; the
  /// cell is unlocked and its credit left unchanged.
  ///
  /// [`Resolver`]: crate::locality::Resolver
  pub fn split_credits(&self) -> Result<Gid, ReplenishError> {
    let mut guard: GidGuard<'_> = self.lock();

    Self::split_credits_locked(&mut guard)
  }

  /// Splits the credit of an already locked cell.
  pub(crate) fn split_credits_locked(guard: &mut GidGuard<'_>) -> Result<Gid, ReplenishError> {
    let mut gid: Gid = guard.get();

    debug_assert!(gid.has_credits());

    if gid.log2_credit() == 0 {
      Self::replenish_locked(guard)?;
      gid = guard.get();
    }

    let log2: u8 = gid.log2_credit();

    debug_assert!(log2 > 0);

    gid.set_log2_credit(log2 - 1);
    gid.mark_split();
    guard.set(gid);

    Ok(gid)
  }

  /// Asks the owning locality for more credit on the held name.
  ///
  /// On success the held credit is raised to the full issue amount and the
  /// split marker is set, since the owner now accounts for more than one
  /// outstanding share.
  ///
  /// # Errors
  ///
  /// Returns [`ReplenishError`] when the owning locality is unreachable,
  /// has exhausted its issue supply, or the request was cancelled.
  pub fn replenish(&self) -> Result<u64, ReplenishError> {
    let mut guard: GidGuard<'_> = self.lock();

    Self::replenish_locked(&mut guard)
  }

  /// Replenishes the credit of an already locked cell.
  fn replenish_locked(guard: &mut GidGuard<'_>) -> Result<u64, ReplenishError> {
    let mut gid: Gid = guard.get();
    let added: u64 = Locality::replenish(gid.stripped())?;
    let total: u64 = gid.add_credit(added);

    gid.mark_split();
    guard.set(gid);

    tracing::trace!(gid = %gid.stripped(), added, total, "credit replenished");

    Ok(added)
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
