//! Channel-type registry.
//!
//! The channel type is an 8-bit code combining delivery ordering with the
//! reliability policy. The high bit marks unordered delivery; the low bits
//! select full reliability, a retransmission limit, or a lifetime limit.

use crate::error::{Result, WireError};

/// Registered DCEP channel types (wire codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChannelType {
    /// Ordered, fully reliable.
    Reliable = 0x00,
    /// Ordered, limited number of retransmissions.
    PartialReliableRexmit = 0x01,
    /// Ordered, limited lifetime in milliseconds.
    PartialReliableTimed = 0x02,
    /// Unordered, fully reliable.
    ReliableUnordered = 0x80,
    /// Unordered, limited number of retransmissions.
    PartialReliableRexmitUnordered = 0x81,
    /// Unordered, limited lifetime in milliseconds.
    PartialReliableTimedUnordered = 0x82,
}

impl ChannelType {
    /// The wire code for this channel type.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether delivered payload must preserve the sender's transmission order.
    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            ChannelType::Reliable
                | ChannelType::PartialReliableRexmit
                | ChannelType::PartialReliableTimed
        )
    }
}

impl TryFrom<u8> for ChannelType {
    type Error = WireError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0x00 => Ok(ChannelType::Reliable),
            0x01 => Ok(ChannelType::PartialReliableRexmit),
            0x02 => Ok(ChannelType::PartialReliableTimed),
            0x80 => Ok(ChannelType::ReliableUnordered),
            0x81 => Ok(ChannelType::PartialReliableRexmitUnordered),
            0x82 => Ok(ChannelType::PartialReliableTimedUnordered),
            other => Err(WireError::UnknownChannelType(other)),
        }
    }
}

/// Resolve a `(ordered, retries, lifetime)` triple to a channel type.
///
/// Setting both `retries` and `lifetime` is an error.
pub fn resolve_channel_type(
    ordered: bool,
    retries: Option<u32>,
    lifetime: Option<u32>,
) -> Result<ChannelType> {
    if retries.is_some() && lifetime.is_some() {
        return Err(WireError::ConflictingReliability);
    }

    let channel_type = match (ordered, retries, lifetime) {
        (true, Some(_), None) => ChannelType::PartialReliableRexmit,
        (true, None, Some(_)) => ChannelType::PartialReliableTimed,
        (true, None, None) => ChannelType::Reliable,
        (false, Some(_), None) => ChannelType::PartialReliableRexmitUnordered,
        (false, None, Some(_)) => ChannelType::PartialReliableTimedUnordered,
        (false, None, None) => ChannelType::ReliableUnordered,
        (_, Some(_), Some(_)) => unreachable!("checked above"),
    };

    Ok(channel_type)
}

/// The 32-bit `reliability` field value for a retries/lifetime pair.
///
/// The field is overloaded: a retransmission count, a lifetime in
/// milliseconds, or 0 for fully reliable types.
pub fn reliability_value(retries: Option<u32>, lifetime: Option<u32>) -> u32 {
    retries.or(lifetime).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_all_six_types() {
        let cases = [
            (true, None, None, ChannelType::Reliable),
            (true, Some(5), None, ChannelType::PartialReliableRexmit),
            (true, None, Some(100), ChannelType::PartialReliableTimed),
            (false, None, None, ChannelType::ReliableUnordered),
            (
                false,
                Some(5),
                None,
                ChannelType::PartialReliableRexmitUnordered,
            ),
            (
                false,
                None,
                Some(100),
                ChannelType::PartialReliableTimedUnordered,
            ),
        ];

        for (ordered, retries, lifetime, expected) in cases {
            let resolved = resolve_channel_type(ordered, retries, lifetime).unwrap();
            assert_eq!(resolved, expected);
            assert_eq!(resolved.is_ordered(), ordered);
        }
    }

    #[test]
    fn rejects_retries_and_lifetime_together() {
        for ordered in [true, false] {
            let err = resolve_channel_type(ordered, Some(100), Some(200)).unwrap_err();
            assert!(matches!(err, WireError::ConflictingReliability));
        }
    }

    #[test]
    fn wire_codes_roundtrip() {
        for code in [0x00u8, 0x01, 0x02, 0x80, 0x81, 0x82] {
            let channel_type = ChannelType::try_from(code).unwrap();
            assert_eq!(channel_type.as_u8(), code);
        }
    }

    #[test]
    fn unordered_exactly_for_high_bit_codes() {
        assert!(ChannelType::Reliable.is_ordered());
        assert!(ChannelType::PartialReliableRexmit.is_ordered());
        assert!(ChannelType::PartialReliableTimed.is_ordered());
        assert!(!ChannelType::ReliableUnordered.is_ordered());
        assert!(!ChannelType::PartialReliableRexmitUnordered.is_ordered());
        assert!(!ChannelType::PartialReliableTimedUnordered.is_ordered());
    }

    #[test]
    fn rejects_unknown_code() {
        let err = ChannelType::try_from(0x7f).unwrap_err();
        assert!(matches!(err, WireError::UnknownChannelType(0x7f)));
    }

    #[test]
    fn reliability_prefers_retries() {
        assert_eq!(reliability_value(Some(7), None), 7);
        assert_eq!(reliability_value(None, Some(250)), 250);
        assert_eq!(reliability_value(None, None), 0);
    }
}
