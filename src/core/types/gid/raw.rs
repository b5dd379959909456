use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::hash::Hash;
use std::hash::Hasher;
use std::ops::Add;
use std::ops::AddAssign;
use std::ops::BitAnd;
use std::ops::Sub;
use std::ops::SubAssign;

/// Global identifier naming an object across localities.
///
/// A GID is two 64-bit words. The `lsb` word is unstructured payload: either
/// the local virtual address of the object or an allocator-issued ordinal.
/// The `msb` word is a packed bitfield:
///
/// - **Bit 0**: dynamically assigned (0 ⇒ `lsb` is a local virtual address)
/// - **Bits 1-20**: component type (address-based names only)
/// - **Bit 21**: reserved
/// - **Bit 22**: the object may migrate between localities
/// - **Bit 23**: resolution must not cache this name
/// - **Bits 24-28**: log2 of the credit held by this copy
/// - **Bit 29**: in-band lock token (see [`GidCell`])
/// - **Bit 30**: the credit field is meaningful
/// - **Bit 31**: the credit on this name has been split
/// - **Bits 32-63**: hosting locality encoded as `locality_id + 1`
///
/// # Identity
///
/// Equality, ordering, and hashing ignore the internal bits (the credit
/// cluster plus the lock, caching, and migration flags): two GIDs that
/// differ only in those bits name the same object. Use [`stripped`] to
/// obtain the canonical form.
///
/// # Arithmetic
///
/// GIDs support addition and subtraction over their addressable portion so
/// they can key interval containers. Carry from `lsb` propagates into the
/// non-special bits of `msb`, which add as a dense integer: a carry out of
/// bit 0 lands on bit 21, crossing the packed fields in between, and the
/// addressable high portion wraps modulo its own width. Locality, credit,
/// lock, and type bits are taken verbatim from the left operand.
///
/// [`GidCell`]: crate::types::GidCell
/// [`stripped`]: Self::stripped
#[derive(Clone, Copy)]
#[repr(C)]
pub struct Gid {
  msb: u64,
  lsb: u64,
}

impl Gid {
  /// Flag marking a name as issued by the allocator rather than derived
  /// from a local virtual address.
  pub(crate) const DYNAMICALLY_ASSIGNED_MASK: u64 = 0x1;

  /// Bit offset of the component type field.
  pub(crate) const COMPONENT_TYPE_SHIFT: u32 = 1;

  /// Unshifted bitmask of the 20-bit component type field.
  pub(crate) const COMPONENT_TYPE_BASE_MASK: u64 = 0xF_FFFF;

  /// In-place bitmask of the component type field.
  pub(crate) const COMPONENT_TYPE_MASK: u64 =
    Self::COMPONENT_TYPE_BASE_MASK << Self::COMPONENT_TYPE_SHIFT;

  /// Bit offset of the reserved bit above the component type field.
  pub(crate) const RESERVED_SHIFT: u32 = 21;

  /// The reserved bit. Together with bit 0 it forms the arithmetic
  /// portion of the high word.
  pub(crate) const RESERVED_MASK: u64 = 1 << Self::RESERVED_SHIFT;

  /// Low bits that are all zero when a name refers to the locality's
  /// virtual-memory region.
  pub(crate) const VIRTUAL_MEMORY_MASK: u64 = 0x3F_FFFF;

  /// Flag marking the named object as migratable.
  pub(crate) const IS_MIGRATABLE_MASK: u64 = 0x40_0000;

  /// Flag excluding a name from resolver caches.
  pub(crate) const DONT_CACHE_MASK: u64 = 0x80_0000;

  /// Bit offset of the log2 credit field.
  pub(crate) const CREDIT_SHIFT: u32 = 24;

  /// Unshifted bitmask of the 5-bit log2 credit field.
  pub(crate) const CREDIT_BASE_MASK: u64 = 0x1F;

  /// In-place bitmask of the log2 credit field.
  pub(crate) const CREDIT_MASK: u64 = Self::CREDIT_BASE_MASK << Self::CREDIT_SHIFT;

  /// In-band lock token (see [`GidCell`][crate::types::GidCell]).
  pub(crate) const IS_LOCKED_MASK: u64 = 0x2000_0000;

  /// Flag marking the credit field as meaningful.
  pub(crate) const HAS_CREDITS_MASK: u64 = 0x4000_0000;

  /// Flag marking a name whose credit has ever been split.
  pub(crate) const WAS_SPLIT_MASK: u64 = 0x8000_0000;

  /// Bit offset of the locality field.
  pub(crate) const LOCALITY_ID_SHIFT: u32 = 32;

  /// In-place bitmask of the locality field.
  pub(crate) const LOCALITY_ID_MASK: u64 = 0xFFFF_FFFF_0000_0000;

  /// The credit cluster: credit field, split marker, credit validity flag.
  pub(crate) const CREDIT_BITS_MASK: u64 =
    Self::CREDIT_MASK | Self::WAS_SPLIT_MASK | Self::HAS_CREDITS_MASK;

  /// All internal bits ignored by equality, ordering, and hashing.
  pub(crate) const INTERNAL_BITS_MASK: u64 = Self::CREDIT_BITS_MASK
    | Self::IS_LOCKED_MASK
    | Self::DONT_CACHE_MASK
    | Self::IS_MIGRATABLE_MASK;

  /// All bits exempt from arithmetic carry propagation.
  pub(crate) const SPECIAL_BITS_MASK: u64 =
    Self::LOCALITY_ID_MASK | Self::INTERNAL_BITS_MASK | Self::COMPONENT_TYPE_MASK;

  /// The canonical null name.
  ///
  /// [`is_valid`][Self::is_valid] is `false` only for this value.
  pub const INVALID: Self = Self { msb: 0, lsb: 0 };

  /// Creates a GID from its two raw words.
  ///
  /// The lock token is stripped from the incoming `msb`: locks never
  /// survive copying or reconstruction.
  #[inline]
  pub const fn new(msb: u64, lsb: u64) -> Self {
    Self {
      msb: msb & !Self::IS_LOCKED_MASK,
      lsb,
    }
  }

  /// Creates a GID from its low word alone (`msb = 0`).
  #[inline]
  pub const fn from_lsb(lsb: u64) -> Self {
    Self { msb: 0, lsb }
  }

  /// Creates the GID naming the locality `locality_id`.
  ///
  /// Localities are encoded as `((locality_id + 1) << 32, 0)`; the offset
  /// keeps a zero locality field available as the "no locality" sentinel.
  #[inline]
  pub const fn from_locality(locality_id: u32) -> Self {
    Self {
      msb: (locality_id as u64 + 1).wrapping_shl(Self::LOCALITY_ID_SHIFT),
      lsb: 0,
    }
  }

  /// Returns the raw high word.
  #[inline]
  pub const fn msb(&self) -> u64 {
    self.msb
  }

  /// Returns the raw low word.
  #[inline]
  pub const fn lsb(&self) -> u64 {
    self.lsb
  }

  /// Replaces the raw high word.
  #[inline]
  pub(crate) fn set_msb(&mut self, msb: u64) {
    self.msb = msb;
  }

  /// Returns `false` only for [`INVALID`][Self::INVALID].
  #[inline]
  pub const fn is_valid(&self) -> bool {
    self.msb != 0 || self.lsb != 0
  }

  // ---------------------------------------------------------------------------
  // Field Accessors
  // ---------------------------------------------------------------------------

  /// Returns `true` if this name was issued by the allocator.
  ///
  /// When `false`, [`lsb`][Self::lsb] is the raw local virtual address of
  /// the named object.
  #[inline]
  pub const fn is_dynamically_assigned(&self) -> bool {
    self.msb & Self::DYNAMICALLY_ASSIGNED_MASK != 0
  }

  /// Marks this name as issued by the allocator.
  #[inline]
  pub fn set_dynamically_assigned(&mut self) {
    self.msb |= Self::DYNAMICALLY_ASSIGNED_MASK;
  }

  /// Returns `true` if [`lsb`][Self::lsb] is a local virtual address.
  #[inline]
  pub const fn refers_to_local_lva(&self) -> bool {
    !self.is_dynamically_assigned()
  }

  /// Returns `true` if this name refers to the locality's virtual-memory
  /// region.
  #[inline]
  pub const fn refers_to_virtual_memory(&self) -> bool {
    self.msb & Self::VIRTUAL_MEMORY_MASK == 0
  }

  /// Returns the 20-bit component type tag.
  ///
  /// Meaningful only for address-based names; asserts that this name is not
  /// dynamically assigned.
  #[inline]
  pub fn component_type(&self) -> u32 {
    debug_assert!(!self.is_dynamically_assigned());
    ((self.msb >> Self::COMPONENT_TYPE_SHIFT) & Self::COMPONENT_TYPE_BASE_MASK) as u32
  }

  /// Returns a copy of this GID with the component type replaced by `tag`.
  ///
  /// Asserts that this name is not dynamically assigned.
  #[inline]
  pub fn with_component_type(self, tag: u32) -> Self {
    debug_assert!(!self.is_dynamically_assigned());
    debug_assert_eq!(tag as u64, tag as u64 & Self::COMPONENT_TYPE_BASE_MASK);

    let msb: u64 = (self.msb & !Self::COMPONENT_TYPE_MASK)
      | (((tag as u64) << Self::COMPONENT_TYPE_SHIFT) & Self::COMPONENT_TYPE_MASK);

    Self { msb, lsb: self.lsb }
  }

  /// Returns `true` if the named object may migrate between localities.
  #[inline]
  pub const fn is_migratable(&self) -> bool {
    self.msb & Self::IS_MIGRATABLE_MASK != 0
  }

  /// Marks the named object as migratable.
  #[inline]
  pub fn set_migratable(&mut self) {
    self.msb |= Self::IS_MIGRATABLE_MASK;
  }

  /// Returns `true` if resolver caches may store this name.
  #[inline]
  pub const fn store_in_cache(&self) -> bool {
    self.msb & Self::DONT_CACHE_MASK == 0
  }

  /// Excludes this name from resolver caches.
  #[inline]
  pub fn set_dont_cache(&mut self) {
    self.msb |= Self::DONT_CACHE_MASK;
  }

  /// Returns `true` if the credit field is meaningful.
  #[inline]
  pub const fn has_credits(&self) -> bool {
    self.msb & Self::HAS_CREDITS_MASK != 0
  }

  /// Returns `true` if the credit on this name has ever been split.
  #[inline]
  pub const fn was_split(&self) -> bool {
    self.msb & Self::WAS_SPLIT_MASK != 0
  }

  /// Records that the credit on this name has been split.
  #[inline]
  pub(crate) fn mark_split(&mut self) {
    self.msb |= Self::WAS_SPLIT_MASK;
  }

  /// Returns `true` if the in-band lock token is set.
  ///
  /// Only a [`GidCell`][crate::types::GidCell] can produce a value with
  /// this bit set; plain constructors strip it.
  #[inline]
  pub const fn is_locked(&self) -> bool {
    self.msb & Self::IS_LOCKED_MASK != 0
  }

  // ---------------------------------------------------------------------------
  // Localities
  // ---------------------------------------------------------------------------

  /// Returns the identifier of the hosting locality.
  ///
  /// Returns [`INVALID_LOCALITY_ID`] when the locality field is zero.
  ///
  /// [`INVALID_LOCALITY_ID`]: crate::consts::INVALID_LOCALITY_ID
  #[inline]
  pub const fn locality_id(&self) -> u32 {
    ((self.msb >> Self::LOCALITY_ID_SHIFT) as u32).wrapping_sub(1)
  }

  /// Returns a copy of this GID with the locality field replaced.
  #[inline]
  pub fn with_locality_id(self, locality_id: u32) -> Self {
    let msb: u64 =
      (self.msb & !Self::LOCALITY_ID_MASK) | Self::from_locality(locality_id).msb;

    Self { msb, lsb: self.lsb }
  }

  /// Returns the GID naming the hosting locality itself.
  #[inline]
  pub const fn locality_gid(&self) -> Self {
    Self::from_locality(self.locality_id())
  }

  /// Returns `true` if this GID names a locality.
  #[inline]
  pub fn is_locality(&self) -> bool {
    self.locality_gid() == *self
  }

  // ---------------------------------------------------------------------------
  // Canonical Form
  // ---------------------------------------------------------------------------

  /// Returns the high word with all internal bits cleared.
  #[inline]
  pub(crate) const fn stripped_msb(&self) -> u64 {
    self.msb & !Self::INTERNAL_BITS_MASK
  }

  /// Returns the canonical form of this GID.
  ///
  /// The stripped form clears the credit cluster and the lock, caching, and
  /// migration flags. It is the identity used for hashing, resolver
  /// lookups, and owner-side accounting.
  #[inline]
  pub const fn stripped(&self) -> Self {
    Self {
      msb: self.stripped_msb(),
      lsb: self.lsb,
    }
  }
}

impl Debug for Gid {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(self, f)
  }
}

impl Display for Gid {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "{{{:016x}, {:016x}}}", self.msb, self.lsb)
  }
}

impl Default for Gid {
  #[inline]
  fn default() -> Self {
    Self::INVALID
  }
}

impl PartialEq for Gid {
  #[inline]
  fn eq(&self, other: &Self) -> bool {
    self.stripped_msb() == other.stripped_msb() && self.lsb == other.lsb
  }
}

impl Eq for Gid {}

impl PartialOrd for Gid {
  #[inline]
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Gid {
  #[inline]
  fn cmp(&self, other: &Self) -> Ordering {
    (self.stripped_msb(), self.lsb).cmp(&(other.stripped_msb(), other.lsb))
  }
}

impl Hash for Gid {
  #[inline]
  fn hash<H>(&self, state: &mut H)
  where
    H: Hasher,
  {
    // Internal bits never reach the hasher, so two GIDs naming the same
    // object hash identically regardless of credit or lock state.
    self.stripped_msb().hash(state);
    self.lsb.hash(state);
  }
}

// -----------------------------------------------------------------------------
// Arithmetic
// -----------------------------------------------------------------------------

/// Packs the non-special bits of a high word into a dense integer.
///
/// Only bits 0 and 21 of the high word take part in arithmetic; packing
/// them next to each other lets a carry out of bit 0 cross the component
/// type region instead of vanishing into it.
#[inline]
const fn pack_arith(msb: u64) -> u64 {
  (msb & Gid::DYNAMICALLY_ASSIGNED_MASK)
    | ((msb & Gid::RESERVED_MASK) >> (Gid::RESERVED_SHIFT - 1))
}

/// Spreads a dense arithmetic value back onto the non-special bits.
///
/// Excess bits are discarded, so the addressable high portion wraps.
#[inline]
const fn spread_arith(value: u64) -> u64 {
  (value & Gid::DYNAMICALLY_ASSIGNED_MASK)
    | ((value << (Gid::RESERVED_SHIFT - 1)) & Gid::RESERVED_MASK)
}

impl Add for Gid {
  type Output = Gid;

  #[inline]
  fn add(self, rhs: Gid) -> Self::Output {
    let lsb: u64 = self.lsb.wrapping_add(rhs.lsb);
    let carry: u64 = u64::from(lsb < self.lsb);

    let total: u64 = pack_arith(self.msb) + pack_arith(rhs.msb) + carry;
    let msb_low: u64 = spread_arith(total);

    Self {
      msb: (self.msb & Self::SPECIAL_BITS_MASK) | msb_low,
      lsb,
    }
  }
}

impl Add<u64> for Gid {
  type Output = Gid;

  #[inline]
  fn add(self, rhs: u64) -> Self::Output {
    self + Gid::from_lsb(rhs)
  }
}

impl AddAssign for Gid {
  #[inline]
  fn add_assign(&mut self, rhs: Gid) {
    *self = *self + rhs;
  }
}

impl AddAssign<u64> for Gid {
  #[inline]
  fn add_assign(&mut self, rhs: u64) {
    *self = *self + rhs;
  }
}

impl Sub for Gid {
  type Output = Gid;

  #[inline]
  fn sub(self, rhs: Gid) -> Self::Output {
    let lsb: u64 = self.lsb.wrapping_sub(rhs.lsb);
    let borrow: u64 = u64::from(rhs.lsb > self.lsb);

    let diff: u64 = pack_arith(self.msb)
      .wrapping_sub(pack_arith(rhs.msb))
      .wrapping_sub(borrow);
    let msb_low: u64 = spread_arith(diff);

    Self {
      msb: (self.msb & Self::SPECIAL_BITS_MASK) | msb_low,
      lsb,
    }
  }
}

impl Sub<u64> for Gid {
  type Output = Gid;

  #[inline]
  fn sub(self, rhs: u64) -> Self::Output {
    self - Gid::from_lsb(rhs)
  }
}

impl SubAssign for Gid {
  #[inline]
  fn sub_assign(&mut self, rhs: Gid) {
    *self = *self - rhs;
  }
}

impl SubAssign<u64> for Gid {
  #[inline]
  fn sub_assign(&mut self, rhs: u64) {
    *self = *self - rhs;
  }
}

impl BitAnd<u64> for Gid {
  type Output = Gid;

  /// Masks the low word only; the high word passes through unchanged.
  #[inline]
  fn bitand(self, rhs: u64) -> Self::Output {
    Self {
      msb: self.msb,
      lsb: self.lsb & rhs,
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;
  use std::hash::BuildHasher;
  use std::hash::RandomState;

  use super::*;

  #[test]
  fn test_new_strips_lock() {
    let gid: Gid = Gid::new(Gid::IS_LOCKED_MASK | 0xFF, 42);

    assert!(!gid.is_locked());
    assert_eq!(gid.msb(), 0xFF & !Gid::IS_LOCKED_MASK);
    assert_eq!(gid.lsb(), 42);
  }

  #[test]
  fn test_invalid_is_not_valid() {
    assert!(!Gid::INVALID.is_valid());
    assert!(!Gid::default().is_valid());
    assert!(Gid::from_lsb(1).is_valid());
    assert!(Gid::new(1, 0).is_valid());
  }

  #[test]
  fn test_locality_encoding() {
    let gid: Gid = Gid::from_locality(0);

    assert_eq!(gid.msb(), 0x0000_0001_0000_0000);
    assert_eq!(gid.lsb(), 0);
    assert_eq!(gid.locality_id(), 0);
  }

  #[test]
  fn test_locality_roundtrip() {
    for locality_id in [0, 1, 7, 0xFFFF, u32::MAX - 1] {
      let gid: Gid = Gid::from_locality(locality_id);

      assert_eq!(gid.locality_id(), locality_id);
      assert!(gid.is_locality());
    }
  }

  #[test]
  fn test_locality_sentinel() {
    let gid: Gid = Gid::from_lsb(99);

    assert_eq!(gid.locality_id(), crate::consts::INVALID_LOCALITY_ID);
    assert!(!gid.is_locality());
  }

  #[test]
  fn test_with_locality_id() {
    let gid: Gid = Gid::new(0xFF, 42).with_locality_id(3);

    assert_eq!(gid.locality_id(), 3);
    assert_eq!(gid.lsb(), 42);
    assert_eq!(gid.msb() & 0xFF, 0xFF);
  }

  #[test]
  fn test_component_type_roundtrip() {
    let gid: Gid = Gid::from_lsb(42).with_component_type(0x7);

    assert_eq!(gid.msb(), 0x7 << 1);
    assert_eq!(gid.component_type(), 0x7);
  }

  #[test]
  fn test_component_type_replace() {
    let gid: Gid = Gid::from_lsb(42).with_component_type(0xF_FFFF);

    assert_eq!(gid.component_type(), 0xF_FFFF);
    assert_eq!(gid.with_component_type(0x1).component_type(), 0x1);
  }

  #[test]
  fn test_equality_ignores_internal_bits() {
    let gid1: Gid = Gid::from_lsb(5);
    let mut gid2: Gid = gid1;

    gid2.set_msb(gid2.msb() | Gid::HAS_CREDITS_MASK | (10 << Gid::CREDIT_SHIFT));
    gid2.mark_split();
    gid2.set_dont_cache();
    gid2.set_migratable();

    assert_eq!(gid1, gid2);
    assert_eq!(gid1.cmp(&gid2), Ordering::Equal);

    let state: RandomState = RandomState::new();
    assert_eq!(state.hash_one(gid1), state.hash_one(gid2));
  }

  #[test]
  fn test_equality_respects_identity_bits() {
    assert_ne!(Gid::from_lsb(5), Gid::from_lsb(6));
    assert_ne!(Gid::from_locality(1), Gid::from_locality(2));
    assert_ne!(
      Gid::from_lsb(5).with_component_type(1),
      Gid::from_lsb(5).with_component_type(2),
    );
  }

  #[test]
  fn test_hash_matches_stripped() {
    let mut gid: Gid = Gid::new(0xDEAD_0000_0000_0000, 0xBEEF);

    gid.set_msb(gid.msb() | Gid::INTERNAL_BITS_MASK & !Gid::IS_LOCKED_MASK);

    let state: RandomState = RandomState::new();
    assert_eq!(state.hash_one(gid), state.hash_one(gid.stripped()));
    assert_eq!(gid, gid.stripped());
  }

  #[test]
  fn test_ordered_container_lookup() {
    let gid1: Gid = Gid::from_lsb(5);
    let mut gid2: Gid = gid1;

    gid2.set_msb(gid2.msb() | Gid::HAS_CREDITS_MASK | (10 << Gid::CREDIT_SHIFT));

    let mut set: BTreeSet<Gid> = BTreeSet::new();

    set.insert(gid1);

    assert!(set.contains(&gid2));
  }

  #[test]
  fn test_ordering_is_lexicographic() {
    let low: Gid = Gid::new(1, u64::MAX);
    let high: Gid = Gid::new(2, 0);

    assert!(low < high);
    assert!(Gid::from_lsb(1) < Gid::from_lsb(2));
  }

  #[test]
  fn test_addition_carries_into_msb() {
    let gid: Gid = Gid::new(0, u64::MAX) + 1;

    assert_eq!(gid.lsb(), 0);
    assert_eq!(gid.msb(), 1);
  }

  #[test]
  fn test_addition_preserves_special_bits() {
    let mut lhs: Gid = Gid::from_locality(3);

    lhs.set_msb(lhs.msb() | Gid::HAS_CREDITS_MASK | (2 << Gid::CREDIT_SHIFT));
    lhs += Gid::from_lsb(100);

    let sum: Gid = lhs + Gid::from_lsb(200);

    assert_eq!(sum.lsb(), 300);
    assert_eq!(sum.locality_id(), 3);
    assert_eq!(sum.msb() & Gid::CREDIT_MASK, 2 << Gid::CREDIT_SHIFT);
    assert!(sum.has_credits());
  }

  #[test]
  fn test_addition_carry_skips_special_bits() {
    let mut lhs: Gid = Gid::new(0, u64::MAX);

    lhs.set_msb(lhs.msb() | Gid::HAS_CREDITS_MASK);

    let sum: Gid = lhs + 1;

    // The carry lands in the non-special portion of the high word.
    assert_eq!(sum.lsb(), 0);
    assert_eq!(sum.msb() & !Gid::SPECIAL_BITS_MASK, 1);
    assert!(sum.has_credits());
  }

  #[test]
  fn test_addition_msb_carry_crosses_component_type() {
    let sum: Gid = Gid::new(1, 0) + Gid::new(1, 0);

    // Bit 0 plus bit 0 carries over the component type region into the
    // reserved bit instead of being absorbed by the special bits.
    assert_eq!(sum.msb(), Gid::RESERVED_MASK);
    assert_eq!(sum.lsb(), 0);
    assert!(!sum.is_dynamically_assigned());
  }

  #[test]
  fn test_addition_msb_wraps_at_addressable_width() {
    // Both arithmetic high bits set: one more increment wraps to zero.
    let gid: Gid = Gid::new(Gid::RESERVED_MASK | 1, u64::MAX) + 1;

    assert_eq!(gid.msb(), 0);
    assert_eq!(gid.lsb(), 0);
  }

  #[test]
  fn test_subtraction_borrows_from_msb() {
    let gid: Gid = Gid::new(1, 0) - 1;

    assert_eq!(gid.lsb(), u64::MAX);
    assert_eq!(gid.msb(), 0);
  }

  #[test]
  fn test_subtraction_msb_borrow_crosses_component_type() {
    let gid: Gid = Gid::new(Gid::RESERVED_MASK, 0) - Gid::new(1, 0);

    assert_eq!(gid.msb(), 1);
    assert_eq!(gid.lsb(), 0);
  }

  #[test]
  fn test_subtraction_msb_wraps_at_addressable_width() {
    let gid: Gid = Gid::new(0, 0) - 1;

    // Two's complement over the two arithmetic high bits.
    assert_eq!(gid.msb(), Gid::RESERVED_MASK | 1);
    assert_eq!(gid.lsb(), u64::MAX);
  }

  #[test]
  fn test_subtraction_inverts_addition() {
    let base: Gid = Gid::new(7, 1000);

    assert_eq!((base + 250) - 250, base);
    assert_eq!((base + Gid::new(1, 1)) - Gid::new(1, 1), base);
  }

  #[test]
  fn test_bitand_masks_lsb_only() {
    let gid: Gid = Gid::new(0xFF, 0b1111) & 0b0101;

    assert_eq!(gid.lsb(), 0b0101);
    assert_eq!(gid.msb(), 0xFF);
  }

  #[test]
  fn test_virtual_memory_region() {
    assert!(Gid::from_locality(3).refers_to_virtual_memory());
    assert!(!Gid::new(0x1, 0).refers_to_virtual_memory());
  }

  #[test]
  fn test_local_lva() {
    let gid: Gid = Gid::from_lsb(0xABCD);

    assert!(gid.refers_to_local_lva());

    let mut gid: Gid = gid;

    gid.set_dynamically_assigned();

    assert!(!gid.refers_to_local_lva());
  }

  #[test]
  fn test_display() {
    let gid: Gid = Gid::new(0x0000_0001_0000_0000, 0x2A);
    let fmt: String = format!("{gid}");

    assert_eq!(fmt, "{0000000100000000, 000000000000002a}");
    assert_eq!(fmt, format!("{gid:?}"));
  }
}
