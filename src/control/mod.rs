//! Control protocol handling for the automation server
//!
//! See [`protocol`] for the wire format and request correlation.

pub mod protocol;

pub use protocol::{
    BoxedWriter, CloseReason, IncomingMessage, OutgoingRequest, RemoteError, RequestCorrelator,
    ResponseOutcome, ServerRequest,
};
