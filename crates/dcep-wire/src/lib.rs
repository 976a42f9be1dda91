//! DCEP (Data Channel Establishment Protocol) wire format.
//!
//! The control exchange is two messages: a fixed-layout OPEN carrying the
//! channel parameters (label, sub-protocol, ordering, reliability policy)
//! and a single-byte ACK. Field offsets and widths are a strict
//! interoperability contract.
//!
//! This is the lowest layer of dcep. The channel wrapper in `dcep-channel`
//! builds on top of it.

pub mod codec;
pub mod error;
pub mod types;

pub use codec::{
    decode_open, encode_ack, encode_open, OpenMessage, MESSAGE_TYPE_ACK, MESSAGE_TYPE_OPEN,
    OPEN_HEADER_SIZE,
};
pub use error::{Result, WireError};
pub use types::{reliability_value, resolve_channel_type, ChannelType};
