//! Connection sessions
//!
//! One [`IngestSession`] per publisher connection: it owns the framer and the
//! recording, and ends the hub session when the connection goes away. One
//! [`ViewerSession`] per HTTP viewer: it owns the hub subscription.

pub mod context;
pub mod ingest;
pub mod viewer;

pub use context::{SessionContext, SessionPhase};
pub use ingest::IngestSession;
pub use viewer::{BodySender, ViewerSession, BODY_CHANNEL_CAPACITY};
