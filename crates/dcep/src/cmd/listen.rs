use dcep_channel::{Channel, ChannelConfig, ChannelEvent};
use tracing::{info, warn};

use crate::cmd::{print_raw, ListenArgs};
use crate::exit::{CliResult, SUCCESS};

#[cfg(not(unix))]
pub fn run(_args: ListenArgs) -> CliResult<i32> {
    Err(crate::exit::CliError::new(
        crate::exit::INTERNAL,
        "listen requires unix domain sockets",
    ))
}

#[cfg(unix)]
pub fn run(args: ListenArgs) -> CliResult<i32> {
    use std::os::unix::net::UnixListener;

    use crate::exit::{channel_error, io_error};

    // Stale socket from a previous run.
    let _ = std::fs::remove_file(&args.path);

    let listener = UnixListener::bind(&args.path).map_err(|err| io_error("bind failed", err))?;
    info!(path = %args.path.display(), "listening");

    let (stream, _addr) = listener
        .accept()
        .map_err(|err| io_error("accept failed", err))?;
    let input = stream
        .try_clone()
        .map_err(|err| io_error("stream clone failed", err))?;

    // The listening side is the negotiated role: it waits for the peer's
    // OPEN and answers with ACK.
    let mut channel = Channel::new(
        input,
        stream,
        ChannelConfig {
            negotiated: true,
            ..ChannelConfig::default()
        },
    )
    .map_err(|err| channel_error("channel setup failed", err))?;

    loop {
        match channel.poll_event() {
            Some(ChannelEvent::Open) => {
                info!(
                    label = %String::from_utf8_lossy(channel.label()),
                    ordered = channel.ordered(),
                    "channel open"
                );
            }
            Some(ChannelEvent::Data(data)) => {
                print_raw(&data);
                if args.echo {
                    if let Err(err) = channel.write(data) {
                        warn!(%err, "echo failed");
                    }
                }
            }
            Some(ChannelEvent::Error(err)) => warn!(%err, "channel error"),
            Some(ChannelEvent::Close) => break,
            None => {
                if channel.is_closed() {
                    break;
                }
                // Inbound side is done; our sink is the same socket.
                channel.sink_closed();
            }
        }
    }

    info!("channel closed");
    Ok(SUCCESS)
}
