//! Wire protocol
//!
//! Bidirectional JSON frames over the persistent connection, each tagged
//! by a string `type` field.

mod frames;

pub use frames::{ClientFrame, ErrorCode, ServerFrame};
