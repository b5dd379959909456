mod alloc;
mod codec;
mod error;
mod table;
mod types;

pub(crate) use self::alloc::SlotPool;
pub(crate) use self::error::fatal;
pub(crate) use self::error::raise;

pub use self::codec::DecodeError;
pub use self::codec::GID_FRAME_LEN;
pub use self::codec::HANDLE_FRAME_LEN;
pub use self::codec::decode_gid;
pub use self::codec::decode_handle;
pub use self::codec::encode_gid;
pub use self::codec::encode_handle;

pub use self::table::IssueTable;

pub use self::types::Gid;
pub use self::types::GidCell;
pub use self::types::GidGuard;
pub use self::types::Handle;
pub use self::types::Management;
