use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};
use dcep_wire::{
    encode_ack, encode_open, reliability_value, resolve_channel_type, ChannelType, OpenMessage,
    OPEN_HEADER_SIZE,
};
use tracing::{debug, trace, warn};

use crate::error::{ChannelError, Result};
use crate::event::ChannelEvent;
use crate::handshake::{HandshakeInput, HandshakeMachine, HandshakeSignal};

const MAX_NAME_LEN: usize = u16::MAX as usize;

/// Holds any single arrival, including a maximal OPEN carrying full-length
/// label and protocol names.
const READ_BUF_SIZE: usize = OPEN_HEADER_SIZE + 2 * MAX_NAME_LEN;

/// Legal channel priorities. Anything else falls back to the default.
const PRIORITIES: [u16; 5] = [0, 128, 256, 512, 1024];

/// Construction options for a data channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Channel name, at most 65535 bytes. Transmitted in OPEN for the
    /// non-negotiated role; a default for the negotiated role.
    pub label: Bytes,
    /// Sub-protocol name, at most 65535 bytes.
    pub protocol: Bytes,
    /// One of 0, 128, 256, 512, 1024. Out-of-range values fall back to 0.
    pub priority: u16,
    /// A negotiated channel never sends OPEN; it waits for the peer's and
    /// answers with ACK.
    pub negotiated: bool,
    /// Delivery ordering.
    pub ordered: bool,
    /// Retransmission limit. Mutually exclusive with `lifetime`.
    pub retries: Option<u32>,
    /// Lifetime limit in milliseconds. Mutually exclusive with `retries`.
    pub lifetime: Option<u32>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            label: Bytes::new(),
            protocol: Bytes::new(),
            priority: 0,
            negotiated: false,
            ordered: true,
            retries: None,
            lifetime: None,
        }
    }
}

/// A single bidirectional data channel over an inbound byte source and an
/// outbound byte sink.
///
/// The source must preserve arrival boundaries (SCTP-style message
/// semantics): each successful read is treated as one arrival. The channel
/// observes completion of both collaborators independently; when both have
/// completed it closes itself.
///
/// For a negotiated channel, once the handshake finishes the peer's OPEN
/// parameters overwrite the local label/protocol/priority/type/reliability
/// defaults.
#[derive(Debug)]
pub struct Channel<R, W> {
    input: R,
    output: W,
    handshake: HandshakeMachine,

    label: Bytes,
    protocol: Bytes,
    priority: u16,
    reliability: u32,
    channel_type: ChannelType,
    negotiated: bool,

    closed: bool,
    started: bool,
    input_done: bool,
    output_done: bool,

    parked: VecDeque<Bytes>,
    events: VecDeque<ChannelEvent>,
    read_buf: Vec<u8>,
}

impl<R: Read, W: Write> Channel<R, W> {
    /// Create a channel over the given inbound source and outbound sink.
    ///
    /// `ordered`/`retries`/`lifetime` resolve to the channel type and the
    /// reliability value. Fails on an oversized label or protocol name, or
    /// on conflicting reliability policies.
    pub fn new(input: R, output: W, config: ChannelConfig) -> Result<Self> {
        if config.label.len() > MAX_NAME_LEN {
            return Err(ChannelError::LabelTooLong(config.label.len()));
        }
        if config.protocol.len() > MAX_NAME_LEN {
            return Err(ChannelError::ProtocolTooLong(config.protocol.len()));
        }

        let channel_type = resolve_channel_type(config.ordered, config.retries, config.lifetime)?;
        let reliability = reliability_value(config.retries, config.lifetime);
        let priority = if PRIORITIES.contains(&config.priority) {
            config.priority
        } else {
            trace!(priority = config.priority, "unknown priority, using default");
            0
        };

        Ok(Self {
            input,
            output,
            handshake: HandshakeMachine::new(config.negotiated),
            label: config.label,
            protocol: config.protocol,
            priority,
            reliability,
            channel_type,
            negotiated: config.negotiated,
            closed: false,
            started: false,
            input_done: false,
            output_done: false,
            parked: VecDeque::new(),
            events: VecDeque::new(),
            read_buf: vec![0; READ_BUF_SIZE],
        })
    }

    /// The name of the data channel.
    pub fn label(&self) -> &[u8] {
        &self.label
    }

    /// The sub-protocol name.
    pub fn protocol(&self) -> &[u8] {
        &self.protocol
    }

    /// The channel priority.
    pub fn priority(&self) -> u16 {
        self.priority
    }

    /// Retransmission count or lifetime in milliseconds, depending on the
    /// channel type; 0 for fully reliable channels.
    pub fn reliability(&self) -> u32 {
        self.reliability
    }

    /// Delivery ordering and reliability policy.
    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    /// Whether the channel parameters were agreed out-of-band.
    pub fn negotiated(&self) -> bool {
        self.negotiated
    }

    /// Whether delivered payload preserves the sender's transmission order.
    pub fn ordered(&self) -> bool {
        self.channel_type.is_ordered()
    }

    /// Whether the handshake has finished.
    pub fn is_ready(&self) -> bool {
        self.handshake.ready()
    }

    /// Whether the channel is closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Drive the channel: drain the next queued notification, consuming
    /// arrivals from the inbound source as needed.
    ///
    /// The first call on a non-negotiated channel emits the local OPEN
    /// message, so a caller always observes every signal the channel
    /// produces. Returns `None` when nothing is queued and the inbound
    /// source has completed (or the channel is closed).
    pub fn poll_event(&mut self) -> Option<ChannelEvent> {
        loop {
            if let Some(event) = self.events.pop_front() {
                return Some(event);
            }

            if !self.started {
                self.started = true;
                if let Some(signal) = self.handshake.begin_opening() {
                    self.apply_signal(signal);
                }
                continue;
            }

            if self.closed || self.input_done {
                return None;
            }

            match self.input.read(&mut self.read_buf) {
                Ok(0) => {
                    trace!("inbound source finished");
                    self.input_done = true;
                    self.maybe_close();
                }
                Ok(read) => {
                    let arrival = Bytes::copy_from_slice(&self.read_buf[..read]);
                    self.feed(arrival);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.input_done = true;
                    self.events.push_back(ChannelEvent::Error(err.into()));
                    self.maybe_close();
                }
            }
        }
    }

    /// Send a payload chunk.
    ///
    /// Forwarded immediately once the handshake has finished; parked
    /// otherwise and flushed, in order, when the channel opens. Writing on
    /// a closed channel is an error.
    pub fn write(&mut self, chunk: impl Into<Bytes>) -> Result<()> {
        if self.closed {
            return Err(ChannelError::Closed);
        }

        let chunk = chunk.into();
        if self.handshake.ready() {
            if let Err(err) = self.sink_write(&chunk) {
                self.output_done = true;
                self.maybe_close();
                return Err(err.into());
            }
            Ok(())
        } else {
            trace!(len = chunk.len(), "parking write until handshake completes");
            self.parked.push_back(chunk);
            Ok(())
        }
    }

    /// Report that the outbound sink has completed.
    ///
    /// A sync `Write` has no spontaneous completion signal; the driver
    /// reports it. A failed sink write latches completion on its own.
    pub fn sink_closed(&mut self) {
        if !self.output_done {
            trace!("outbound sink finished");
            self.output_done = true;
            self.maybe_close();
        }
    }

    /// Close the channel. Idempotent: the first call queues a single
    /// `Close` notification, later calls are no-ops. No further outbound
    /// writes are initiated after closing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }

        debug!("channel closed");
        self.closed = true;
        self.events.push_back(ChannelEvent::Close);
    }

    /// Consume the channel and return the inbound source and outbound sink.
    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Process one arrival through the handshake machine.
    fn feed(&mut self, arrival: Bytes) {
        match self.handshake.process(&arrival) {
            Ok(HandshakeInput::Payload) => {
                self.events.push_back(ChannelEvent::Data(arrival));
            }
            Ok(HandshakeInput::Signals(signals)) => {
                for signal in signals {
                    self.apply_signal(signal);
                }
            }
            Err(err) => {
                // A broken handshake tears down the inbound pipeline.
                self.input_done = true;
                self.events.push_back(ChannelEvent::Error(err));
                self.maybe_close();
            }
        }
    }

    fn apply_signal(&mut self, signal: HandshakeSignal) {
        match signal {
            HandshakeSignal::SendOpen => {
                let open = OpenMessage {
                    channel_type: self.channel_type,
                    priority: self.priority,
                    reliability: self.reliability,
                    label: self.label.clone(),
                    protocol: self.protocol.clone(),
                };

                let mut buf = BytesMut::with_capacity(
                    OPEN_HEADER_SIZE + open.label.len() + open.protocol.len(),
                );
                if let Err(err) = encode_open(&open, &mut buf) {
                    self.events.push_back(ChannelEvent::Error(err.into()));
                    return;
                }

                debug!(channel_type = ?self.channel_type, "sending OPEN");
                if let Err(err) = self.sink_write(&buf) {
                    self.fail_output(err);
                }
            }
            HandshakeSignal::SendAck => {
                debug!("sending ACK");
                let ack = encode_ack();
                if let Err(err) = self.sink_write(&ack) {
                    self.fail_output(err);
                }
            }
            HandshakeSignal::RemoteOpen(open) => {
                debug!(
                    channel_type = ?open.channel_type,
                    priority = open.priority,
                    "applying peer OPEN parameters"
                );
                self.label = open.label;
                self.protocol = open.protocol;
                self.priority = open.priority;
                self.channel_type = open.channel_type;
                self.reliability = open.reliability;
            }
            HandshakeSignal::Established => {
                debug!(parked = self.parked.len(), "channel open");
                while let Some(chunk) = self.parked.pop_front() {
                    if let Err(err) = self.sink_write(&chunk) {
                        self.fail_output(err);
                        break;
                    }
                }
                self.events.push_back(ChannelEvent::Open);
            }
        }
    }

    /// Write a whole chunk to the outbound sink and flush it.
    ///
    /// The sink is expected to block; `WouldBlock` from a non-blocking
    /// collaborator surfaces as an error.
    fn sink_write(&mut self, data: &[u8]) -> std::io::Result<()> {
        let mut offset = 0usize;
        while offset < data.len() {
            match self.output.write(&data[offset..]) {
                Ok(0) => {
                    return Err(std::io::Error::new(
                        ErrorKind::WriteZero,
                        "outbound sink accepted no bytes",
                    ));
                }
                Ok(written) => offset += written,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        loop {
            match self.output.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn fail_output(&mut self, err: std::io::Error) {
        warn!(%err, "outbound sink failed");
        self.output_done = true;
        self.events.push_back(ChannelEvent::Error(err.into()));
        self.maybe_close();
    }

    fn maybe_close(&mut self) {
        if self.input_done && self.output_done && !self.closed {
            self.close();
        }
    }
}
