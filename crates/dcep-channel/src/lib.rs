//! WebRTC-style data channel over an already-established reliable transport.
//!
//! One [`Channel`] multiplexes nothing: it is a single bidirectional,
//! message-oriented logical channel. At construction it runs the DCEP
//! OPEN/ACK handshake to agree on channel parameters, then switches to
//! transparent payload forwarding. User writes issued before the handshake
//! completes are parked and flushed in order once the channel opens.
//!
//! The channel is poll-driven and single-threaded: the caller drains
//! [`ChannelEvent`]s with [`Channel::poll_event`], which consumes arrivals
//! from the inbound source one at a time.

pub mod channel;
pub mod error;
pub mod event;
pub mod handshake;

pub use channel::{Channel, ChannelConfig};
pub use error::{ChannelError, Result};
pub use event::ChannelEvent;
pub use handshake::{HandshakeInput, HandshakeMachine, HandshakeSignal, HandshakeState};
