//! Wire encoding of names and handles.
//!
//! Serialized names travel as fixed-size frames: a one-byte version tag
//! followed by the body. The body of a handle frame is:
//!
//! ```text
//! bytes 0..7   : msb   (little-endian u64, lock token always clear)
//! bytes 8..15  : lsb   (little-endian u64)
//! byte  16     : management mode tag
//! ```
//!
//! A raw GID frame is the same without the trailing mode byte. The high
//! nibble of the version tag is the major version; readers reject frames
//! whose major does not match theirs.
//!
//! Encoding a handle is a lifecycle event, not a plain copy: the held
//! credit splits (or transfers wholesale) into the wire image as part of
//! writing the bytes. Decoding performs no network interaction.

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use crate::consts;
use crate::core::Gid;
use crate::core::Handle;
use crate::core::Management;
use crate::locality::ReplenishError;

/// Size in bytes of an encoded raw GID frame.
pub const GID_FRAME_LEN: usize = 17;

/// Size in bytes of an encoded handle frame.
pub const HANDLE_FRAME_LEN: usize = 18;

// -----------------------------------------------------------------------------
// Decode Error
// -----------------------------------------------------------------------------

/// The error type returned when a wire frame cannot be decoded.
///
/// Decode failures are fatal for the message that carried the frame; the
/// transport decides whether to drop the connection.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum DecodeError {
  /// The frame is shorter than the fixed frame size.
  Truncated {
    /// The required frame size.
    expected: usize,
    /// The received byte count.
    actual: usize,
  },
  /// The version tag belongs to a different major version.
  Version {
    /// The version tag this reader emits.
    expected: u8,
    /// The version tag found on the wire.
    actual: u8,
  },
  /// The management mode tag is not a known mode.
  Mode(u8),
}

impl Display for DecodeError {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::Truncated { expected, actual } => {
        write!(f, "truncated frame - expected {expected} bytes, found {actual}")
      }
      Self::Version { expected, actual } => {
        write!(
          f,
          "unsupported version tag {actual:#04x} - expected major {expected:#04x}",
        )
      }
      Self::Mode(tag) => {
        write!(f, "unknown management mode tag {tag:#04x}")
      }
    }
  }
}

impl Error for DecodeError {}

// -----------------------------------------------------------------------------
// Raw GID Frames
// -----------------------------------------------------------------------------

/// Encodes a raw GID into its wire frame.
///
/// The lock token is always clear on the wire.
pub fn encode_gid(gid: Gid) -> [u8; GID_FRAME_LEN] {
  let mut frame: [u8; GID_FRAME_LEN] = [0; GID_FRAME_LEN];

  frame[0] = consts::GID_VERSION;
  frame[1..9].copy_from_slice(&(gid.msb() & !Gid::IS_LOCKED_MASK).to_le_bytes());
  frame[9..17].copy_from_slice(&gid.lsb().to_le_bytes());

  frame
}

/// Decodes a raw GID from its wire frame.
///
/// # Errors
///
/// Returns [`DecodeError`] when the frame is truncated or carries a
/// mismatched major version.
pub fn decode_gid(frame: &[u8]) -> Result<Gid, DecodeError> {
  if frame.len() < GID_FRAME_LEN {
    return Err(DecodeError::Truncated {
      expected: GID_FRAME_LEN,
      actual: frame.len(),
    });
  }

  check_version(consts::GID_VERSION, frame[0])?;

  Ok(decode_words(&frame[1..17]))
}

// -----------------------------------------------------------------------------
// Handle Frames
// -----------------------------------------------------------------------------

/// Encodes a handle into its wire frame, moving credit into the image.
///
/// This is the serialization half of the distributed reference-counting
/// protocol: the handle's credit is split or transferred under the GID lock
/// before the bytes are produced (see [`Handle`] for the exact rules).
///
/// # Errors
///
/// Returns [`ReplenishError`] when the credit split required a
/// replenishment that failed; the handle is left unchanged.
pub fn encode_handle(handle: &Handle) -> Result<[u8; HANDLE_FRAME_LEN], ReplenishError> {
  let (gid, mode): (Gid, Management) = handle.preprocess()?;
  let mut frame: [u8; HANDLE_FRAME_LEN] = [0; HANDLE_FRAME_LEN];

  frame[0] = consts::ID_VERSION;
  frame[1..9].copy_from_slice(&(gid.msb() & !Gid::IS_LOCKED_MASK).to_le_bytes());
  frame[9..17].copy_from_slice(&gid.lsb().to_le_bytes());
  frame[17] = mode.tag();

  Ok(frame)
}

/// Decodes a handle from its wire frame.
///
/// The lock token is stripped defensively. The resulting mode follows the
/// credit actually carried by the image: a managed tag yields a managed
/// handle only when credits are present, while an unmanaged tag is always
/// preserved. No network interaction is performed.
///
/// # Errors
///
/// Returns [`DecodeError`] when the frame is truncated, carries a
/// mismatched major version, or names an unknown management mode.
pub fn decode_handle(frame: &[u8]) -> Result<Handle, DecodeError> {
  if frame.len() < HANDLE_FRAME_LEN {
    let error: DecodeError = DecodeError::Truncated {
      expected: HANDLE_FRAME_LEN,
      actual: frame.len(),
    };

    tracing::error!(%error, "handle frame rejected");

    return Err(error);
  }

  check_version(consts::ID_VERSION, frame[0])?;

  let gid: Gid = decode_words(&frame[1..17]);

  let Some(mode) = Management::from_tag(frame[17]) else {
    let error: DecodeError = DecodeError::Mode(frame[17]);

    tracing::error!(%error, "handle frame rejected");

    return Err(error);
  };

  let mode: Management = match mode {
    Management::Unmanaged => Management::Unmanaged,
    _ if gid.has_credits() => Management::Managed,
    _ => Management::Unmanaged,
  };

  Ok(Handle::new(gid, mode))
}

/// Reassembles a GID from sixteen body bytes, stripping the lock token.
fn decode_words(body: &[u8]) -> Gid {
  let mut msb: [u8; 8] = [0; 8];
  let mut lsb: [u8; 8] = [0; 8];

  msb.copy_from_slice(&body[0..8]);
  lsb.copy_from_slice(&body[8..16]);

  Gid::new(u64::from_le_bytes(msb), u64::from_le_bytes(lsb))
}

/// Rejects a version tag whose major does not match `expected`.
fn check_version(expected: u8, actual: u8) -> Result<(), DecodeError> {
  if actual & consts::VERSION_MAJOR_MASK != expected & consts::VERSION_MAJOR_MASK {
    let error: DecodeError = DecodeError::Version { expected, actual };

    tracing::error!(%error, "frame rejected");

    return Err(error);
  }

  Ok(())
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_gid_roundtrip() {
    let mut gid: Gid = Gid::new(0xABCD, 0x1234_5678).with_locality_id(3);

    gid.set_credit(8);

    let frame: [u8; GID_FRAME_LEN] = encode_gid(gid);
    let out: Gid = decode_gid(&frame).unwrap();

    assert_eq!(out.stripped(), gid.stripped());
    assert_eq!(out.msb(), gid.msb());
    assert_eq!(out.lsb(), gid.lsb());
    assert!(!out.is_locked());
  }

  #[test]
  fn test_gid_frame_layout() {
    let frame: [u8; GID_FRAME_LEN] = encode_gid(Gid::new(0x0102, 0x0A0B));

    assert_eq!(frame[0], consts::GID_VERSION);
    assert_eq!(frame[1], 0x02);
    assert_eq!(frame[2], 0x01);
    assert_eq!(frame[9], 0x0B);
    assert_eq!(frame[10], 0x0A);
  }

  #[test]
  fn test_gid_truncated() {
    let frame: [u8; GID_FRAME_LEN] = encode_gid(Gid::from_lsb(1));

    assert_eq!(
      decode_gid(&frame[..5]),
      Err(DecodeError::Truncated {
        expected: GID_FRAME_LEN,
        actual: 5,
      }),
    );
  }

  #[test]
  fn test_gid_version_minor_accepted() {
    let mut frame: [u8; GID_FRAME_LEN] = encode_gid(Gid::from_lsb(1));

    frame[0] = consts::GID_VERSION | 0x3;

    assert_eq!(decode_gid(&frame), Ok(Gid::from_lsb(1)));
  }

  #[test]
  fn test_gid_version_major_rejected() {
    let mut frame: [u8; GID_FRAME_LEN] = encode_gid(Gid::from_lsb(1));

    frame[0] = 0x30;

    assert_eq!(
      decode_gid(&frame),
      Err(DecodeError::Version {
        expected: consts::GID_VERSION,
        actual: 0x30,
      }),
    );
  }

  #[test]
  fn test_handle_roundtrip_unmanaged() {
    let handle: Handle = Handle::new(Gid::from_lsb(42), Management::Unmanaged);
    let frame: [u8; HANDLE_FRAME_LEN] = encode_handle(&handle).unwrap();

    assert_eq!(frame[0], consts::ID_VERSION);
    assert_eq!(frame[17], Management::Unmanaged.tag());

    let out: Handle = decode_handle(&frame).unwrap();

    assert_eq!(out.gid(), handle.gid());
    assert_eq!(out.mode(), Management::Unmanaged);
    assert!(!out.gid().is_locked());
  }

  #[test]
  fn test_handle_roundtrip_managed() {
    let mut gid: Gid = Gid::from_lsb(42).with_locality_id(1);

    gid.set_credit(16);

    let local: Handle = Handle::new(gid, Management::Managed);
    let copy: Handle = local.clone();
    let frame: [u8; HANDLE_FRAME_LEN] = encode_handle(&local).unwrap();
    let remote: Handle = decode_handle(&frame).unwrap();

    assert_eq!(remote.mode(), Management::Managed);
    assert_eq!(remote.gid().stripped(), gid.stripped());
    assert_eq!(remote.gid().credit() + local.gid().credit(), 16);

    drop(copy);
  }

  #[test]
  fn test_handle_mode_tag_rejected() {
    let handle: Handle = Handle::new(Gid::from_lsb(1), Management::Unmanaged);
    let mut frame: [u8; HANDLE_FRAME_LEN] = encode_handle(&handle).unwrap();

    frame[17] = 9;

    assert_eq!(decode_handle(&frame), Err(DecodeError::Mode(9)));
  }

  #[test]
  fn test_handle_managed_tag_without_credits_is_unmanaged() {
    let mut frame: [u8; HANDLE_FRAME_LEN] = [0; HANDLE_FRAME_LEN];

    frame[0] = consts::ID_VERSION;
    frame[1..9].copy_from_slice(&7_u64.to_le_bytes());
    frame[17] = Management::Managed.tag();

    let out: Handle = decode_handle(&frame).unwrap();

    assert_eq!(out.mode(), Management::Unmanaged);
  }

  #[test]
  fn test_handle_lock_bit_stripped_on_decode() {
    let mut frame: [u8; HANDLE_FRAME_LEN] = [0; HANDLE_FRAME_LEN];

    frame[0] = consts::ID_VERSION;
    frame[1..9].copy_from_slice(&(Gid::IS_LOCKED_MASK | 0x2).to_le_bytes());
    frame[9..17].copy_from_slice(&5_u64.to_le_bytes());
    frame[17] = Management::Unmanaged.tag();

    let out: Handle = decode_handle(&frame).unwrap();

    assert!(!out.gid().is_locked());
    assert_eq!(out.gid().msb(), 0x2);
  }

  #[test]
  fn test_decode_handle_needs_error() {
    let out: Result<Handle, DecodeError> = decode_handle(&[consts::ID_VERSION]);

    assert_eq!(
      out.unwrap_err(),
      DecodeError::Truncated {
        expected: HANDLE_FRAME_LEN,
        actual: 1,
      },
    );
  }
}
