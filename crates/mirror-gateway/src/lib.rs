//! # mirror-gateway
//!
//! The gateway session engine: persistent-connection transport, keep-alive
//! scheduling, event reconciliation against the entity cache, and ordered
//! listener dispatch.

pub mod bus;
pub mod error;
pub mod events;
pub mod keepalive;
pub mod protocol;
pub mod reconcile;
pub mod session;
pub mod transport;

pub use bus::{EventBus, Subscription};
pub use error::{GatewayError, GatewayResult, ProtocolError};
pub use events::{Event, EventKind, Reconciled};
pub use keepalive::KeepAlive;
pub use protocol::{ClientFrame, ErrorCode, ServerFrame};
pub use reconcile::Reconciler;
pub use session::Session;
pub use transport::GatewayTransport;
