use coop_ws::bytestream::Connection;
use coop_ws::config::ServerConfig;
use coop_ws::serve_connection;
use log::*;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

async fn handle_connection(peer: SocketAddr, stream: TcpStream) {
    let conn = Connection::from_tcp(stream);
    let config = ServerConfig::default();

    let result = serve_connection(conn, &config, |ms| {
        Box::pin(async move {
            loop {
                let message = ms.receive_message().await?;
                info!("echoing message from {peer}: {message}");
                ms.send_message(&message).await?;
            }
        })
    })
    .await;

    if let Err(err) = result {
        error!("connection with {peer} ended with an error: {err}");
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let addr = "127.0.0.1:9000";
    let listener = TcpListener::bind(addr).await.expect("can't listen");
    info!("listening on: {addr}");

    while let Ok((stream, peer)) = listener.accept().await {
        info!("peer address: {peer}");
        tokio::spawn(handle_connection(peer, stream));
    }
}
