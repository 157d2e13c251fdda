//! Transport reader task.
//!
//! Drives a [`FramedRead`] over the adapter's output stream and feeds each
//! parsed [`ProtocolMessage`] into
//! [`ProtocolSession::accept_message`](crate::protocol::ProtocolSession::accept_message).
//!
//! Framing and JSON errors are reported through the session's error event
//! and do not stop the task — the offending frame is skipped and the next
//! one processed. Only EOF, a fatal stream error, or cancellation end the
//! task.

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::protocol::messages::ProtocolMessage;
use crate::protocol::session::ProtocolSession;
use crate::transport::codec::DapCodec;
use crate::{DapError, Result};

/// Pump framed messages from `stream` into `session` until EOF or
/// cancellation.
///
/// Every complete frame already buffered is dispatched before the task
/// waits for more input, so batched frames are never delayed behind the
/// next read.
///
/// # Errors
///
/// Returns `Ok(())` on EOF, fatal stream error, or cancellation; failures
/// are reported through the session error event rather than the return
/// value.
pub async fn run_reader<R>(
    stream: R,
    session: ProtocolSession,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(stream, DapCodec::new());

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("dap reader: cancellation received, stopping");
                break;
            }

            item = framed.next() => {
                match item {
                    None => {
                        debug!("dap reader: EOF on adapter stream");
                        break;
                    }

                    Some(Err(err @ DapError::Protocol(_))) => {
                        // Recoverable framing error; the codec has already
                        // discarded the offending bytes.
                        warn!(error = %err, "dap reader: framing error, skipping frame");
                        session.report_error(err).await;
                    }

                    Some(Err(err)) => {
                        warn!(error = %err, "dap reader: stream error, stopping");
                        session.report_error(err).await;
                        break;
                    }

                    Some(Ok(raw)) => match serde_json::from_str::<ProtocolMessage>(&raw) {
                        Ok(message) => session.accept_message(message).await,
                        Err(err) => {
                            warn!(
                                error = %err,
                                raw = raw.as_str(),
                                "dap reader: unparsable message, skipping"
                            );
                            session
                                .report_error(DapError::Protocol(format!(
                                    "unparsable message '{raw}': {err}"
                                )))
                                .await;
                        }
                    },
                }
            }
        }
    }

    Ok(())
}
