//! A minimal TCP listener loop: owns the accept loop and hands each
//! accepted socket to [`crate::adapter::serve_connection`]. Not part of the
//! protocol core, just here so the crate is runnable standalone.

use crate::adapter::{serve_connection, BoxFuture};
use crate::bytestream::Connection;
use crate::config::ServerConfig;
use crate::error::Error;
use crate::stream::MessageStream;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Binds `addr` and runs forever, spawning one task per accepted connection
/// that runs the handshake, then `app`, then the guaranteed close.
///
/// `app` must be `Clone` (typically a cheap handle like an `Arc<...>` or a
/// function pointer) since a fresh invocation is needed per connection.
pub async fn serve<F>(addr: &str, config: ServerConfig, app: F) -> Result<(), Error>
where
    F: for<'a> Fn(&'a mut MessageStream<tokio::net::TcpStream>) -> BoxFuture<'a, Result<(), Error>>
        + Clone
        + Send
        + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    let config = Arc::new(config);
    log::info!("websocket server listening on {addr}");

    loop {
        let (socket, peer) = listener.accept().await?;
        let config = config.clone();
        let app = app.clone();

        tokio::spawn(async move {
            let conn = Connection::from_tcp(socket);
            if let Err(err) = serve_connection(conn, &config, app).await {
                log::debug!("connection from {peer} ended with an error: {err}");
            }
        });
    }
}
