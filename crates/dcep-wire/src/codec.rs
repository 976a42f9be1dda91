use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use crate::types::ChannelType;

/// Control message type: ACK.
pub const MESSAGE_TYPE_ACK: u8 = 0x02;

/// Control message type: OPEN.
pub const MESSAGE_TYPE_OPEN: u8 = 0x03;

/// Fixed OPEN header: type (1) + channel type (1) + priority (2) +
/// reliability (4) + label length (2) + protocol length (2) = 12 bytes.
pub const OPEN_HEADER_SIZE: usize = 12;

const MAX_NAME_LEN: usize = u16::MAX as usize;

/// A decoded OPEN control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMessage {
    /// Delivery ordering and reliability policy.
    pub channel_type: ChannelType,
    /// Channel priority.
    pub priority: u16,
    /// Retransmission count or lifetime in milliseconds, depending on
    /// `channel_type`; 0 for fully reliable types.
    pub reliability: u32,
    /// Channel name.
    pub label: Bytes,
    /// Sub-protocol name.
    pub protocol: Bytes,
}

/// Encode an OPEN message into the wire format.
///
/// Wire format (network byte order):
/// ```text
/// ┌──────────┬─────────────┬──────────┬─────────────┬───────────┬──────────────┬───────┬──────────┐
/// │ Type     │ ChannelType │ Priority │ Reliability │ LabelLen  │ ProtocolLen  │ Label │ Protocol │
/// │ (1B)     │ (1B)        │ (2B BE)  │ (4B BE)     │ (2B BE)   │ (2B BE)      │       │          │
/// │ 0x03     │             │          │             │           │              │       │          │
/// └──────────┴─────────────┴──────────┴─────────────┴───────────┴──────────────┴───────┴──────────┘
/// ```
pub fn encode_open(msg: &OpenMessage, dst: &mut BytesMut) -> Result<()> {
    if msg.label.len() > MAX_NAME_LEN {
        return Err(WireError::FieldTooLong {
            field: "label",
            len: msg.label.len(),
        });
    }
    if msg.protocol.len() > MAX_NAME_LEN {
        return Err(WireError::FieldTooLong {
            field: "protocol",
            len: msg.protocol.len(),
        });
    }

    dst.reserve(OPEN_HEADER_SIZE + msg.label.len() + msg.protocol.len());
    dst.put_u8(MESSAGE_TYPE_OPEN);
    dst.put_u8(msg.channel_type.as_u8());
    dst.put_u16(msg.priority);
    dst.put_u32(msg.reliability);
    dst.put_u16(msg.label.len() as u16);
    dst.put_u16(msg.protocol.len() as u16);
    dst.put_slice(&msg.label);
    dst.put_slice(&msg.protocol);
    Ok(())
}

/// Decode an OPEN message from a single arrival.
///
/// Fails if the buffer is shorter than the fixed header, the leading byte
/// is not the OPEN code, the channel-type code is unregistered, or the
/// declared label/protocol lengths overrun the remaining buffer. Trailing
/// bytes beyond the declared fields are ignored.
pub fn decode_open(src: &[u8]) -> Result<OpenMessage> {
    if src.len() < OPEN_HEADER_SIZE {
        return Err(WireError::Truncated {
            len: src.len(),
            need: OPEN_HEADER_SIZE,
        });
    }

    if src[0] != MESSAGE_TYPE_OPEN {
        return Err(WireError::UnexpectedMessageType(src[0]));
    }

    let channel_type = ChannelType::try_from(src[1])?;
    let priority = u16::from_be_bytes(src[2..4].try_into().unwrap());
    let reliability = u32::from_be_bytes(src[4..8].try_into().unwrap());
    let label_len = u16::from_be_bytes(src[8..10].try_into().unwrap()) as usize;
    let protocol_len = u16::from_be_bytes(src[10..12].try_into().unwrap()) as usize;

    let tail = &src[OPEN_HEADER_SIZE..];
    if label_len > tail.len() {
        return Err(WireError::FieldOverrun {
            field: "label",
            declared: label_len,
            available: tail.len(),
        });
    }

    let rest = &tail[label_len..];
    if protocol_len > rest.len() {
        return Err(WireError::FieldOverrun {
            field: "protocol",
            declared: protocol_len,
            available: rest.len(),
        });
    }

    Ok(OpenMessage {
        channel_type,
        priority,
        reliability,
        label: Bytes::copy_from_slice(&tail[..label_len]),
        protocol: Bytes::copy_from_slice(&rest[..protocol_len]),
    })
}

/// Encode the single-byte ACK control message.
pub fn encode_ack() -> [u8; 1] {
    [MESSAGE_TYPE_ACK]
}

#[cfg(test)]
mod tests {
    use super::*;

    // OPEN for label "console", reliable ordered, priority 0.
    const OPEN_CONSOLE: &[u8] = &[
        0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07, 0x00, 0x00, b'c', b'o', b'n',
        b's', b'o', b'l', b'e',
    ];

    #[test]
    fn encode_decode_roundtrip() {
        let msg = OpenMessage {
            channel_type: ChannelType::PartialReliableRexmit,
            priority: 256,
            reliability: 5,
            label: Bytes::from_static(b"chat"),
            protocol: Bytes::from_static(b"irc"),
        };

        let mut buf = BytesMut::new();
        encode_open(&msg, &mut buf).unwrap();
        assert_eq!(buf.len(), OPEN_HEADER_SIZE + 4 + 3);

        let decoded = decode_open(&buf).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn known_vector_decodes() {
        let msg = decode_open(OPEN_CONSOLE).unwrap();
        assert_eq!(msg.channel_type, ChannelType::Reliable);
        assert_eq!(msg.priority, 0);
        assert_eq!(msg.reliability, 0);
        assert_eq!(msg.label.as_ref(), b"console");
        assert!(msg.protocol.is_empty());
    }

    #[test]
    fn known_vector_encodes() {
        let msg = OpenMessage {
            channel_type: ChannelType::Reliable,
            priority: 0,
            reliability: 0,
            label: Bytes::from_static(b"console"),
            protocol: Bytes::new(),
        };

        let mut buf = BytesMut::new();
        encode_open(&msg, &mut buf).unwrap();
        assert_eq!(buf.as_ref(), OPEN_CONSOLE);
    }

    #[test]
    fn big_endian_field_layout() {
        let msg = OpenMessage {
            channel_type: ChannelType::PartialReliableTimed,
            priority: 0x0102,
            reliability: 0x0A0B0C0D,
            label: Bytes::from_static(b"x"),
            protocol: Bytes::new(),
        };

        let mut buf = BytesMut::new();
        encode_open(&msg, &mut buf).unwrap();

        assert_eq!(buf[0], MESSAGE_TYPE_OPEN);
        assert_eq!(buf[1], 0x02);
        assert_eq!(&buf[2..4], &[0x01, 0x02]);
        assert_eq!(&buf[4..8], &[0x0A, 0x0B, 0x0C, 0x0D]);
        assert_eq!(&buf[8..10], &[0x00, 0x01]);
        assert_eq!(&buf[10..12], &[0x00, 0x00]);
        assert_eq!(&buf[12..], b"x");
    }

    #[test]
    fn rejects_short_buffer() {
        let err = decode_open(&OPEN_CONSOLE[..11]).unwrap_err();
        assert!(matches!(err, WireError::Truncated { len: 11, need: 12 }));
    }

    #[test]
    fn rejects_wrong_leading_byte() {
        let mut bytes = OPEN_CONSOLE.to_vec();
        bytes[0] = MESSAGE_TYPE_ACK;
        let err = decode_open(&bytes).unwrap_err();
        assert!(matches!(err, WireError::UnexpectedMessageType(0x02)));
    }

    #[test]
    fn rejects_unknown_channel_type() {
        let mut bytes = OPEN_CONSOLE.to_vec();
        bytes[1] = 0x55;
        let err = decode_open(&bytes).unwrap_err();
        assert!(matches!(err, WireError::UnknownChannelType(0x55)));
    }

    #[test]
    fn rejects_label_overrun() {
        let mut bytes = OPEN_CONSOLE.to_vec();
        bytes[9] = 0x08; // declares 8 label bytes, only 7 remain
        let err = decode_open(&bytes).unwrap_err();
        assert!(matches!(
            err,
            WireError::FieldOverrun {
                field: "label",
                declared: 8,
                available: 7,
            }
        ));
    }

    #[test]
    fn rejects_protocol_overrun() {
        let mut bytes = OPEN_CONSOLE.to_vec();
        bytes[11] = 0x01; // declares 1 protocol byte past the end
        let err = decode_open(&bytes).unwrap_err();
        assert!(matches!(
            err,
            WireError::FieldOverrun {
                field: "protocol",
                ..
            }
        ));
    }

    #[test]
    fn ignores_trailing_bytes() {
        let mut bytes = OPEN_CONSOLE.to_vec();
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let msg = decode_open(&bytes).unwrap();
        assert_eq!(msg.label.as_ref(), b"console");
    }

    #[test]
    fn rejects_oversized_label_on_encode() {
        let msg = OpenMessage {
            channel_type: ChannelType::Reliable,
            priority: 0,
            reliability: 0,
            label: Bytes::from(vec![b'a'; MAX_NAME_LEN + 1]),
            protocol: Bytes::new(),
        };

        let mut buf = BytesMut::new();
        let err = encode_open(&msg, &mut buf).unwrap_err();
        assert!(matches!(err, WireError::FieldTooLong { field: "label", .. }));
    }

    #[test]
    fn ack_is_single_byte() {
        assert_eq!(encode_ack(), [0x02]);
    }
}
