use bytes::Bytes;

use crate::error::ChannelError;

/// Notifications surfaced by [`Channel::poll_event`].
///
/// [`Channel::poll_event`]: crate::channel::Channel::poll_event
#[derive(Debug)]
pub enum ChannelEvent {
    /// The handshake finished and the channel is usable. Fires once.
    Open,
    /// A post-handshake payload arrival, surfaced in arrival order,
    /// unmodified.
    Data(Bytes),
    /// A fatal condition. May fire more than once; an error alone does
    /// not close the channel.
    Error(ChannelError),
    /// The channel is fully closed. Fires once.
    Close,
}
