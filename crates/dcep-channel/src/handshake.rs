use dcep_wire::{decode_open, OpenMessage, MESSAGE_TYPE_ACK, MESSAGE_TYPE_OPEN, OPEN_HEADER_SIZE};
use tracing::{debug, trace};

use crate::error::{ChannelError, Result};

/// Handshake progress for one data channel.
///
/// `Finished` is terminal; no transition leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No handshake activity yet.
    Init,
    /// The local side has signaled intent to send its OPEN message.
    /// Only reached for the non-negotiated role.
    Opening,
    /// Handshake complete; all further input is payload.
    Finished,
}

/// An action the owning channel must take in response to handshake
/// progress, in the order yielded.
#[derive(Debug)]
pub enum HandshakeSignal {
    /// Emit the local OPEN message now, before any other outbound traffic.
    SendOpen,
    /// Emit the single ACK byte now.
    SendAck,
    /// The peer's OPEN message; its parameters replace the local defaults.
    RemoteOpen(OpenMessage),
    /// Handshake complete; payload may flow.
    Established,
}

/// What [`HandshakeMachine::process`] decided about one arrival.
#[derive(Debug)]
pub enum HandshakeInput {
    /// The handshake already finished; forward the arrival as payload,
    /// unchanged.
    Payload,
    /// Control traffic consumed by the handshake.
    Signals(Vec<HandshakeSignal>),
}

/// Role-aware DCEP handshake state machine.
///
/// A negotiated machine waits for the peer's OPEN and answers with ACK.
/// A non-negotiated machine sends OPEN (via [`begin_opening`]) and waits
/// for the peer's ACK.
///
/// [`begin_opening`]: HandshakeMachine::begin_opening
#[derive(Debug)]
pub struct HandshakeMachine {
    negotiated: bool,
    state: HandshakeState,
}

impl HandshakeMachine {
    pub fn new(negotiated: bool) -> Self {
        Self {
            negotiated,
            state: HandshakeState::Init,
        }
    }

    /// The current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Whether the handshake has finished.
    pub fn ready(&self) -> bool {
        self.state == HandshakeState::Finished
    }

    /// Switch a non-negotiated machine to `Opening` and request OPEN
    /// emission.
    ///
    /// For a negotiated machine, a repeat call, or a finished machine this
    /// is a no-op returning `None`.
    pub fn begin_opening(&mut self) -> Option<HandshakeSignal> {
        if self.negotiated || self.state != HandshakeState::Init {
            return None;
        }

        trace!("handshake opening, OPEN emission requested");
        self.state = HandshakeState::Opening;
        Some(HandshakeSignal::SendOpen)
    }

    /// Consume one arrival of bytes.
    ///
    /// Any error is terminal for the machine: the state is not reverted
    /// and the handshake does not resume.
    pub fn process(&mut self, chunk: &[u8]) -> Result<HandshakeInput> {
        if self.ready() {
            return Ok(HandshakeInput::Payload);
        }

        if self.negotiated {
            self.accept_open(chunk)
        } else {
            self.accept_ack(chunk)
        }
    }

    /// Negotiated role: the arrival must be the peer's OPEN message.
    fn accept_open(&mut self, chunk: &[u8]) -> Result<HandshakeInput> {
        if chunk.len() < OPEN_HEADER_SIZE {
            return Err(ChannelError::HandshakeFailed(format!(
                "invalid handshake: {} bytes, need at least {OPEN_HEADER_SIZE}",
                chunk.len()
            )));
        }

        if chunk[0] != MESSAGE_TYPE_OPEN {
            return Err(ChannelError::HandshakeFailed(format!(
                "unexpected message type 0x{:02x}, want OPEN",
                chunk[0]
            )));
        }

        let open = decode_open(chunk)
            .map_err(|err| ChannelError::HandshakeFailed(format!("malformed OPEN: {err}")))?;

        debug!(
            channel_type = ?open.channel_type,
            label_len = open.label.len(),
            "accepted peer OPEN, handshake finished"
        );
        self.state = HandshakeState::Finished;

        Ok(HandshakeInput::Signals(vec![
            HandshakeSignal::RemoteOpen(open),
            HandshakeSignal::SendAck,
            HandshakeSignal::Established,
        ]))
    }

    /// Non-negotiated role: the arrival must be exactly one ACK byte, and
    /// only after the local OPEN was requested.
    fn accept_ack(&mut self, chunk: &[u8]) -> Result<HandshakeInput> {
        if self.state != HandshakeState::Opening {
            return Err(ChannelError::HandshakeFailed(
                "protocol violation: peer spoke before local OPEN".to_string(),
            ));
        }

        let is_ack = chunk.len() == 1 && chunk[0] == MESSAGE_TYPE_ACK;
        if !is_ack {
            return Err(ChannelError::HandshakeFailed(format!(
                "expected single ACK byte, got {} bytes",
                chunk.len()
            )));
        }

        debug!("received ACK, handshake finished");
        self.state = HandshakeState::Finished;

        Ok(HandshakeInput::Signals(vec![HandshakeSignal::Established]))
    }
}
