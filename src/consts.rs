//! Runtime configuration constants and default values.
//!
//! This module defines the fundamental limits, default behaviors, and tuning
//! parameters for the Alkaid naming layer. These constants control credit
//! issuance, lock sharding, wire versioning, and allocation caching.
//!
//! # Categories
//!
//! - **Wire Format**: Version tags emitted with serialized names
//! - **Credit**: Issue amounts and representable credit range
//! - **Locking**: Sharding of the process-wide GID lock pool
//! - **Memory Allocation**: Capacities of internal caches and tables
//! - **Localities**: Reserved locality identifiers

// -----------------------------------------------------------------------------
// Wire Format
// -----------------------------------------------------------------------------

/// Version tag emitted with a serialized raw [`Gid`].
///
/// The high nibble is the major version; readers reject frames whose major
/// does not match.
///
/// [`Gid`]: crate::types::Gid
pub const GID_VERSION: u8 = 0x10;

/// Version tag emitted with a serialized [`Handle`].
///
/// The high nibble is the major version; readers reject frames whose major
/// does not match.
///
/// [`Handle`]: crate::types::Handle
pub const ID_VERSION: u8 = 0x20;

/// Bitmask selecting the major portion of a wire version tag.
pub const VERSION_MAJOR_MASK: u8 = 0xF0;

// -----------------------------------------------------------------------------
// Credit
// -----------------------------------------------------------------------------

/// Log2 of the credit a locality hands out per issue or replenish fill.
///
/// The credit field of a [`Gid`] stores `log2(credit)` in five bits, so a
/// fill must itself be a power of two. Thirty levels of splitting are
/// possible before a copy has to replenish.
///
/// [`Gid`]: crate::types::Gid
pub const LOG2_CREDIT_INITIAL: u8 = 30;

/// Credit a locality hands out per issue or replenish fill.
pub const CREDIT_INITIAL: u64 = 1 << LOG2_CREDIT_INITIAL;

/// Largest representable log2 credit value.
///
/// The credit field is five bits wide, so credits range over the powers of
/// two from `2^0` through `2^31`.
pub const MAX_LOG2_CREDIT: u8 = 31;

// -----------------------------------------------------------------------------
// Locking
// -----------------------------------------------------------------------------

/// Number of shards in the process-wide GID lock pool.
///
/// Lock acquisition hashes the address of the [`GidCell`] into this table,
/// so the value bounds worst-case false contention between unrelated names.
/// Must be a power of two.
///
/// [`GidCell`]: crate::types::GidCell
pub const LOCK_POOL_SHARDS: usize = 64;

// -----------------------------------------------------------------------------
// Memory Allocation
// -----------------------------------------------------------------------------

/// Number of shards in the per-locality credit issue table.
///
/// Must be a power of two.
pub const ISSUE_TABLE_SHARDS: usize = 16;

/// Initial capacity of each credit issue table shard.
pub const CAP_ISSUE_NAMES: usize = 32;

/// Maximum number of handle allocations cached for reuse.
///
/// Handle state blocks released beyond this bound are returned to the
/// global allocator.
pub const CAP_HANDLE_STATES: usize = 256;

// -----------------------------------------------------------------------------
// Localities
// -----------------------------------------------------------------------------

/// Reserved locality identifier denoting "no locality".
///
/// The locality field of a [`Gid`] stores `locality_id + 1`, so a zero field
/// decodes to this sentinel.
///
/// [`Gid`]: crate::types::Gid
pub const INVALID_LOCALITY_ID: u32 = u32::MAX;
