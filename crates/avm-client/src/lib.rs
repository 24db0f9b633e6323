//! avm-client: session orchestration over an agent runtime transport
//!
//! The conversation semantics live in [`avm_engine`]; this crate supplies
//! the I/O around them. A [`Session`] binds one conversation thread to a
//! [`Transport`], replays persisted history on open, and applies live event
//! [`Envelope`]s as they arrive.

pub mod error;
pub mod events;
pub mod session;
pub mod transport;

pub use error::{Error, Result};
pub use events::{AgentEvent, Envelope, EventContext};
pub use session::Session;
pub use transport::{EventStream, RetryConfig, SendReceipt, Transport};
