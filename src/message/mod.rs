//! Framing and parsing of messages read from the automation server

pub mod framer;
pub mod parser;

pub use framer::MessageFramer;
pub use parser::{parse_line, parse_message};
