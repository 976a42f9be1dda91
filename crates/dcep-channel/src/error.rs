use dcep_wire::WireError;

/// Errors that can occur in data-channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The label does not fit the 16-bit wire length field.
    #[error("label too long ({0} bytes, max 65535)")]
    LabelTooLong(usize),

    /// The sub-protocol name does not fit the 16-bit wire length field.
    #[error("protocol name too long ({0} bytes, max 65535)")]
    ProtocolTooLong(usize),

    /// Wire-level error: bad construction parameters or a malformed
    /// control message.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Handshake failed. Fatal for the channel; the handshake does not
    /// retry and does not resume.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// An I/O error from the inbound source or the outbound sink.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel is closed.
    #[error("channel closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ChannelError>;
