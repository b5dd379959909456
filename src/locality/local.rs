use std::sync::Arc;
use std::sync::OnceLock;

use crate::consts;
use crate::core::Gid;
use crate::core::IssueTable;
use crate::core::fatal;
use crate::locality::ReplenishError;
use crate::locality::Resolver;
use crate::locality::Transport;

static NODE: OnceLock<LocalLocality> = OnceLock::new();

/// Local locality state.
///
/// Centralizes the naming layer's view of the hosting process: its locality
/// identifier, the credit issue table for names it owns, and the installed
/// resolver and transport.
struct LocalLocality {
  id: u32,
  issued: IssueTable,
  resolver: Arc<dyn Resolver>,
  transport: Arc<dyn Transport>,
}

// -----------------------------------------------------------------------------
// @api - Locality
// -----------------------------------------------------------------------------

/// Naming-layer API of the hosting locality.
pub struct Locality;

impl Locality {
  /// Installs the locality identity and collaborator services.
  ///
  /// Returns `true` on first installation; later calls are ignored and
  /// return `false`. Handles created before `start` behave degenerately:
  /// replenishment fails as [`Unreachable`] and decrements are dropped with
  /// a warning.
  ///
  /// [`Unreachable`]: ReplenishError::Unreachable
  pub fn start(id: u32, resolver: Arc<dyn Resolver>, transport: Arc<dyn Transport>) -> bool {
    let mut fresh: bool = false;

    let _node: &LocalLocality = NODE.get_or_init(|| {
      fresh = true;

      tracing::debug!(locality = id, "naming layer started");

      LocalLocality {
        id,
        issued: IssueTable::new(),
        resolver,
        transport,
      }
    });

    fresh
  }

  /// Returns `true` if [`start`][Self::start] has completed.
  #[inline]
  pub fn started() -> bool {
    NODE.get().is_some()
  }

  /// Returns the identifier of the current locality.
  ///
  /// Returns [`INVALID_LOCALITY_ID`] before [`start`][Self::start].
  ///
  /// [`INVALID_LOCALITY_ID`]: consts::INVALID_LOCALITY_ID
  #[inline]
  pub fn id() -> u32 {
    NODE.get().map_or(consts::INVALID_LOCALITY_ID, |node| node.id)
  }

  /// Returns the credit issue table for names owned by this locality.
  #[inline]
  pub fn issued() -> &'static IssueTable {
    let Some(node) = NODE.get() else {
      fatal!("issue table accessed before the naming layer was started");
    };

    &node.issued
  }

  /// Asks the owning locality of `gid` for additional credit.
  pub(crate) fn replenish(gid: Gid) -> Result<u64, ReplenishError> {
    match NODE.get() {
      Some(node) => node.resolver.replenish(gid),
      None => Err(ReplenishError::Unreachable),
    }
  }

  /// Schedules a credit decrement to the owning locality of `gid`.
  pub(crate) fn schedule_decrement(gid: Gid, credits: u64) {
    let owner: u32 = gid.locality_id();

    if owner == consts::INVALID_LOCALITY_ID {
      tracing::warn!(gid = %gid.stripped(), credits, "decrement for a name without a locality");
      return;
    }

    match NODE.get() {
      Some(node) => {
        tracing::trace!(gid = %gid.stripped(), owner, credits, "decrement scheduled");
        node.transport.send_decrement(owner, gid.stripped(), credits);
      }
      None => {
        tracing::warn!(gid = %gid.stripped(), credits, "decrement dropped: naming layer not started");
      }
    }
  }
}

// -----------------------------------------------------------------------------
// Test Support
// -----------------------------------------------------------------------------


// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
