/// Errors that can occur while encoding/decoding DCEP control messages.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The buffer is shorter than the fixed OPEN header.
    #[error("truncated OPEN message ({len} bytes, need at least {need})")]
    Truncated { len: usize, need: usize },

    /// The leading byte is not the expected control message type.
    #[error("unexpected message type 0x{0:02x}")]
    UnexpectedMessageType(u8),

    /// The channel-type byte is not one of the six registered codes.
    #[error("unknown channel type 0x{0:02x}")]
    UnknownChannelType(u8),

    /// A declared label/protocol length exceeds the remaining buffer.
    #[error("{field} length {declared} exceeds remaining {available} bytes")]
    FieldOverrun {
        field: &'static str,
        declared: usize,
        available: usize,
    },

    /// A label/protocol value does not fit its 16-bit wire length field.
    #[error("{field} too long ({len} bytes, max 65535)")]
    FieldTooLong { field: &'static str, len: usize },

    /// `retries` and `lifetime` are mutually exclusive reliability policies.
    #[error("cannot set both retries and lifetime")]
    ConflictingReliability,
}

pub type Result<T> = std::result::Result<T, WireError>;
