//! Interfaces to the locality layer hosting this process.
//!
//! The naming layer does not resolve addresses or move bytes itself; it
//! consumes three things from the surrounding runtime:
//!
//! - the identifier of the current locality,
//! - a [`Resolver`] that can replenish credit for a name on its owning
//!   locality,
//! - a [`Transport`] that can schedule a credit decrement to a name's
//!   owning locality.
//!
//! [`Locality::start`] installs these once per process. The provided
//! [`QueueTransport`] covers the common case where the outer transport
//! drains scheduled decrements from a queue; [`LoopbackResolver`] serves
//! single-locality deployments and tests.

mod local;

use std::error::Error;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::error::TryRecvError;

use crate::consts;
use crate::core::Gid;

pub use self::local::Locality;

#[cfg(test)]
pub(crate) use self::local::testing;

// -----------------------------------------------------------------------------
// @error - ReplenishError
// -----------------------------------------------------------------------------

/// The error type returned when a credit replenishment fails.
///
/// Surfaced by credit splits that hit a single indivisible credit and by
/// explicit replenish calls. The caller may retry or propagate; the
/// affected name is left unlocked with its credit unchanged.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReplenishError {
  /// The owning locality cannot be reached, or no resolver is installed.
  Unreachable,
  /// The owning locality has exhausted its issue supply for this name.
  Exhausted,
  /// The request was cancelled by the transport.
  Cancelled,
}

impl Display for ReplenishError {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::Unreachable => f.write_str("owning locality unreachable"),
      Self::Exhausted => f.write_str("credit issue supply exhausted"),
      Self::Cancelled => f.write_str("replenish request cancelled"),
    }
  }
}

impl Error for ReplenishError {}

// -----------------------------------------------------------------------------
// @type - Decrement
// -----------------------------------------------------------------------------

/// A scheduled credit decrement to a name's owning locality.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decrement {
  /// The owning locality the decrement is addressed to.
  pub locality: u32,
  /// The affected name in stripped form.
  pub gid: Gid,
  /// The credit being returned.
  pub credits: u64,
}

// -----------------------------------------------------------------------------
// @trait - Resolver
// -----------------------------------------------------------------------------

/// Address-resolution service able to replenish credit for a name.
pub trait Resolver: Send + Sync {
  /// Asks the owning locality of `gid` for additional credit.
  ///
  /// `gid` is in stripped form. On success the owner has already recorded
  /// the returned amount as outstanding; the caller adds it to its local
  /// copy.
  ///
  /// # Errors
  ///
  /// Returns [`ReplenishError`] when the owner is unreachable, exhausted,
  /// or the request was cancelled.
  fn replenish(&self, gid: Gid) -> Result<u64, ReplenishError>;
}

// -----------------------------------------------------------------------------
// @trait - Transport
// -----------------------------------------------------------------------------

/// Message layer able to deliver credit decrements to owning localities.
pub trait Transport: Send + Sync {
  /// Schedules a decrement of `credits` for `gid` on `locality`.
  ///
  /// `gid` is in stripped form. Delivery is asynchronous; per-destination
  /// ordering is the transport's concern.
  fn send_decrement(&self, locality: u32, gid: Gid, credits: u64);
}

// -----------------------------------------------------------------------------
// @type - QueueTransport
// -----------------------------------------------------------------------------

/// A [`Transport`] that parks scheduled decrements on an in-process queue.
///
/// The outer transport drains the paired [`DecrementQueue`] and ships each
/// message to its destination.
#[derive(Clone)]
#[repr(transparent)]
pub struct QueueTransport {
  inner: UnboundedSender<Decrement>,
}

impl Transport for QueueTransport {
  fn send_decrement(&self, locality: u32, gid: Gid, credits: u64) {
    let message: Decrement = Decrement {
      locality,
      gid,
      credits,
    };

    if let Err(error) = self.inner.send(message) {
      tracing::error!(%error, "decrement queue closed");
    }
  }
}

impl Debug for QueueTransport {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("QueueTransport(..)")
  }
}

// -----------------------------------------------------------------------------
// @type - DecrementQueue
// -----------------------------------------------------------------------------

/// Receiving half of a [`QueueTransport`].
#[repr(transparent)]
pub struct DecrementQueue {
  inner: UnboundedReceiver<Decrement>,
}

impl DecrementQueue {
  /// Receives the next scheduled decrement, waiting for one to arrive.
  ///
  /// Returns `None` once every paired [`QueueTransport`] has been dropped.
  #[inline]
  pub async fn recv(&mut self) -> Option<Decrement> {
    self.inner.recv().await
  }

  /// Receives the next scheduled decrement without waiting.
  #[inline]
  pub fn try_recv(&mut self) -> Result<Decrement, TryRecvError> {
    self.inner.try_recv()
  }

  /// Drains every decrement currently in the queue.
  pub fn drain(&mut self) -> Vec<Decrement> {
    let mut out: Vec<Decrement> = Vec::new();

    while let Ok(message) = self.try_recv() {
      out.push(message);
    }

    out
  }
}

impl Debug for DecrementQueue {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str("DecrementQueue(..)")
  }
}

/// Creates a connected transport/queue pair.
#[inline]
pub fn queue_transport() -> (QueueTransport, DecrementQueue) {
  let channel: _ = mpsc::unbounded_channel();
  let transport: QueueTransport = QueueTransport { inner: channel.0 };
  let decrements: DecrementQueue = DecrementQueue { inner: channel.1 };

  (transport, decrements)
}

// -----------------------------------------------------------------------------
// @type - LoopbackResolver
// -----------------------------------------------------------------------------

/// A [`Resolver`] that grants credit from the local issue table.
///
/// Suitable when every name is owned by the current locality: replenish
/// requests never leave the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoopbackResolver;

impl Resolver for LoopbackResolver {
  fn replenish(&self, gid: Gid) -> Result<u64, ReplenishError> {
    // The requester holds one indivisible credit; top it up to a full fill.
    let added: u64 = consts::CREDIT_INITIAL - 1;

    Locality::issued().grant(gid, added);

    tracing::debug!(gid = %gid.stripped(), added, "replenish granted locally");

    Ok(added)
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_queue_transport_delivers() {
    let (transport, mut decrements): (QueueTransport, DecrementQueue) = queue_transport();

    transport.send_decrement(3, Gid::from_lsb(7), 16);
    transport.send_decrement(4, Gid::from_lsb(8), 32);

    let drained: Vec<Decrement> = decrements.drain();

    assert_eq!(
      drained,
      vec![
        Decrement {
          locality: 3,
          gid: Gid::from_lsb(7),
          credits: 16,
        },
        Decrement {
          locality: 4,
          gid: Gid::from_lsb(8),
          credits: 32,
        },
      ],
    );
  }

  #[test]
  fn test_queue_transport_closed_is_silent() {
    let (transport, decrements): (QueueTransport, DecrementQueue) = queue_transport();

    drop(decrements);

    // Dropped queues only log; late decrements must not panic.
    transport.send_decrement(0, Gid::from_lsb(1), 1);
  }

  #[test]
  fn test_loopback_resolver_grants() {
    testing::start();

    let gid: Gid = testing::unique_gid();
    let added: u64 = LoopbackResolver.replenish(gid).unwrap();

    assert_eq!(added, consts::CREDIT_INITIAL - 1);
    assert_eq!(Locality::issued().outstanding(gid), added);
  }
}
