//! A single-threaded, cooperative server-side implementation of the
//! WebSocket protocol (RFC 6455, version 13).
//!
//! This crate covers the HTTP/1.1 Upgrade handshake and a text-message
//! stream abstraction above the resulting session, with transparent
//! handling of PING/PONG/CLOSE control frames. It is designed to be
//! embedded in a host that owns the event loop and the socket (here, a
//! `tokio` runtime), rather than to run one itself; [`server::serve`] is a
//! thin, optional convenience loop for running it standalone.
//!
//! Out of scope: TLS termination, permessage-deflate and other extensions,
//! fragmentation of application messages, binary messages, client-role
//! behavior, subprotocol negotiation, and large-message streaming beyond a
//! single frame.

pub mod adapter;
pub mod bytestream;
pub mod config;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod origin;
pub mod request;
pub mod server;
pub mod stream;
mod util;

pub use adapter::serve_connection;
pub use bytestream::Connection;
pub use config::ServerConfig;
pub use error::Error;
pub use stream::MessageStream;
