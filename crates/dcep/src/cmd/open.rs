use dcep_channel::{Channel, ChannelConfig, ChannelEvent};
use tracing::{info, warn};

use crate::cmd::{print_raw, OpenArgs};
use crate::exit::{CliResult, SUCCESS};

#[cfg(not(unix))]
pub fn run(_args: OpenArgs) -> CliResult<i32> {
    Err(crate::exit::CliError::new(
        crate::exit::INTERNAL,
        "open requires unix domain sockets",
    ))
}

#[cfg(unix)]
pub fn run(args: OpenArgs) -> CliResult<i32> {
    use std::os::unix::net::UnixStream;

    use bytes::Bytes;

    use crate::exit::{channel_error, io_error};

    let stream = UnixStream::connect(&args.path).map_err(|err| io_error("connect failed", err))?;
    let input = stream
        .try_clone()
        .map_err(|err| io_error("stream clone failed", err))?;

    let mut channel = Channel::new(
        input,
        stream,
        ChannelConfig {
            label: Bytes::from(args.label.into_bytes()),
            protocol: Bytes::from(args.protocol.into_bytes()),
            priority: args.priority,
            ordered: !args.unordered,
            retries: args.retries,
            lifetime: args.lifetime,
            ..ChannelConfig::default()
        },
    )
    .map_err(|err| channel_error("channel setup failed", err))?;

    // Parked until the handshake completes, then flushed first.
    if let Some(data) = &args.data {
        channel
            .write(Bytes::from(data.clone().into_bytes()))
            .map_err(|err| channel_error("write failed", err))?;
    }

    loop {
        match channel.poll_event() {
            Some(ChannelEvent::Open) => {
                info!(
                    label = %String::from_utf8_lossy(channel.label()),
                    ordered = channel.ordered(),
                    "channel open"
                );
                if !args.wait {
                    break;
                }
            }
            Some(ChannelEvent::Data(data)) => print_raw(&data),
            Some(ChannelEvent::Error(err)) => {
                return Err(channel_error("channel failed", err));
            }
            Some(ChannelEvent::Close) => break,
            None => {
                if channel.is_closed() {
                    break;
                }
                channel.sink_closed();
            }
        }
    }

    if !channel.is_ready() {
        warn!("peer never completed the handshake");
    }

    Ok(SUCCESS)
}
