use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

/// Management mode of a [`Handle`].
///
/// The mode decides whether a handle participates in distributed reference
/// counting and what happens to its credit when the handle is serialized
/// out or dropped.
///
/// [`Handle`]: crate::types::Handle
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Management {
  /// No credit tracking; dropping the handle never notifies the owner.
  Unmanaged = 0,
  /// Full participation: credit splits on send, a decrement is scheduled
  /// when the last local reference drops.
  Managed = 1,
  /// As [`Managed`][Self::Managed], but the next serialization transfers
  /// the handle's entire credit instead of splitting it. Used for tail
  /// arguments of outgoing calls, where the local handle dies right after
  /// the send; moving the whole share avoids a split and the later
  /// decrement message.
  ManagedMoveCredit = 2,
}

impl Management {
  /// Returns the wire tag of this mode.
  #[inline]
  pub const fn tag(self) -> u8 {
    self as u8
  }

  /// Parses a wire tag back into a mode.
  #[inline]
  pub const fn from_tag(tag: u8) -> Option<Self> {
    match tag {
      0 => Some(Self::Unmanaged),
      1 => Some(Self::Managed),
      2 => Some(Self::ManagedMoveCredit),
      _ => None,
    }
  }

  /// Returns `true` if this mode participates in distributed reference
  /// counting.
  #[inline]
  pub const fn is_managed(self) -> bool {
    !matches!(self, Self::Unmanaged)
  }
}

impl Debug for Management {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(self, f)
  }
}

impl Display for Management {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::Unmanaged => f.write_str("unmanaged"),
      Self::Managed => f.write_str("managed"),
      Self::ManagedMoveCredit => f.write_str("managed-move-credit"),
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
