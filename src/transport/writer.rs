//! Transport writer task.
//!
//! Drains the session's outbound channel and writes each message through a
//! [`FramedWrite`] in `Content-Length` framing. Each message is flushed
//! before the next is taken, so a frame always reaches the stream whole.

use futures_util::SinkExt;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::protocol::messages::ProtocolMessage;
use crate::protocol::session::ProtocolSession;
use crate::transport::codec::DapCodec;
use crate::Result;

/// Write outbound messages to `stream` until the channel closes or `cancel`
/// fires.
///
/// A failed write is reported through the session error event and stops the
/// task; messages still queued are dropped with it.
///
/// # Errors
///
/// Returns `Ok(())` in all cases; failures are reported through the session
/// error event rather than the return value.
pub async fn run_writer<W>(
    stream: W,
    mut rx: mpsc::Receiver<ProtocolMessage>,
    session: ProtocolSession,
    cancel: CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut framed = FramedWrite::new(stream, DapCodec::new());

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("dap writer: cancellation received, stopping");
                break;
            }

            message = rx.recv() => {
                match message {
                    None => {
                        debug!("dap writer: outbound channel closed, stopping");
                        break;
                    }
                    Some(message) => {
                        if let Err(err) = framed.send(message).await {
                            warn!(error = %err, "dap writer: write failed, stopping");
                            session.report_error(err).await;
                            break;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
