//! The protocol adapter: binds the handshake and the message stream around
//! an application-supplied per-connection routine, the way a
//! `websocket_protocol` decorator would bind them.

use crate::bytestream::Connection;
use crate::config::ServerConfig;
use crate::error::Error;
use crate::handshake::perform_handshake;
use crate::stream::MessageStream;
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{timeout, Duration};

/// Wall-clock budget for the opening handshake, per §6.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// A boxed, borrowing future: the per-connection routine's return type.
///
/// Plain `FnOnce(&mut MessageStream<S>) -> Fut` can't express "the future
/// borrows its argument" without a fixed `Fut` losing track of the borrow's
/// lifetime, so the routine returns this instead, the same boxed-future
/// shape the `futures` crate's `BoxFuture` uses, minus the dependency.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Runs the handshake under a 5-second timeout, then hands the resulting
/// [`MessageStream`] to `app`. Regardless of how `app` exits (normal
/// return, error, or the handshake itself timing out after the session
/// opened), the close handshake is best-effort-run before this function
/// returns.
///
/// A handshake timeout or rejection returns silently (`Ok(())`): the
/// session never opened, so there is no WebSocket CLOSE to send; the caller
/// is expected to drop/shut down the raw connection.
pub async fn serve_connection<S, F>(
    conn: Connection<S>,
    config: &ServerConfig,
    app: F,
) -> Result<(), Error>
where
    S: AsyncReadExt + AsyncWriteExt + Unpin,
    F: for<'a> FnOnce(&'a mut MessageStream<S>) -> BoxFuture<'a, Result<(), Error>>,
{
    let mut conn = conn;
    let peer_addr = conn.peer_addr();

    let headers = match timeout(HANDSHAKE_TIMEOUT, perform_handshake(&mut conn, config)).await {
        Ok(Ok(headers)) => headers,
        Ok(Err(err)) => {
            log::warn!("websocket handshake rejected for {peer_addr:?}: {err}");
            return Ok(());
        }
        Err(_elapsed) => {
            log::warn!("websocket handshake timed out for {peer_addr:?}");
            return Ok(());
        }
    };

    let origin = headers.get("origin").cloned();
    log::info!("websocket connected: {origin:?} ({peer_addr:?})");

    let mut message_stream = MessageStream::new(conn, headers);
    let result = app(&mut message_stream).await;

    log::info!("websocket disconnected: {origin:?} ({peer_addr:?})");
    let _ = message_stream.close_default().await;

    result
}
