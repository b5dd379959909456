//! Alkaid - A PGAS-inspired distributed naming layer

mod core;
mod loom;

pub mod consts;
pub mod locality;

pub mod error {
  //! Alkaid errors.

  pub use crate::core::DecodeError;
  pub use crate::locality::ReplenishError;
}

pub mod types {
  //! Core types of the Alkaid naming layer.

  pub use crate::core::Gid;
  pub use crate::core::GidCell;
  pub use crate::core::GidGuard;

  pub use crate::core::Handle;
  pub use crate::core::Management;

  pub use crate::core::IssueTable;
}

pub mod codec {
  //! Wire encoding of names and handles.

  pub use crate::core::GID_FRAME_LEN;
  pub use crate::core::HANDLE_FRAME_LEN;

  pub use crate::core::decode_gid;
  pub use crate::core::decode_handle;
  pub use crate::core::encode_gid;
  pub use crate::core::encode_handle;
}
