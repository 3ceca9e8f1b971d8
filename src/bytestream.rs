use crate::error::Error;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub struct Connection<S> {
    inner: S,
    local_addr: Option<SocketAddr>,
    peer_addr: Option<SocketAddr>,
}

impl<S> Connection<S>
where
    S: AsyncReadExt + AsyncWriteExt + Unpin,
{
    pub fn new(inner: S, local_addr: Option<SocketAddr>, peer_addr: Option<SocketAddr>) -> Self {
        Self { inner, local_addr, peer_addr }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub async fn receive(&mut self, max: usize) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0u8; max];
        let n = self.inner.read(&mut buf).await?;
        if n == 0 {
            return Err(Error::StreamClosed);
        }
        buf.truncate(n);
        Ok(buf)
    }

    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        match self.inner.write_all(bytes).await {
            Ok(()) => Ok(()),
            Err(e) if is_closed(&e) => Err(Error::StreamClosed),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn close(&mut self) {
        let _ = self.inner.shutdown().await;
    }
}

fn is_closed(err: &std::io::Error) -> bool {
    use std::io::ErrorKind::*;
    matches!(err.kind(), BrokenPipe | ConnectionReset | ConnectionAborted | NotConnected)
}

impl Connection<TcpStream> {
    pub fn from_tcp(stream: TcpStream) -> Self {
        let local_addr = stream.local_addr().ok();
        let peer_addr = stream.peer_addr().ok();
        Self::new(stream, local_addr, peer_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    fn pair(max_buf: usize) -> (Connection<DuplexStream>, DuplexStream) {
        let (a, b) = tokio::io::duplex(max_buf);
        (Connection::new(a, None, None), b)
    }

    #[tokio::test]
    async fn receive_returns_available_bytes_up_to_max() {
        let (mut conn, mut peer) = pair(64);
        peer.write_all(b"hello").await.unwrap();
        let data = conn.receive(512).await.unwrap();
        assert_eq!(data, b"hello");
    }

    #[tokio::test]
    async fn receive_fails_when_peer_closes() {
        let (mut conn, peer) = pair(64);
        drop(peer);
        assert!(matches!(conn.receive(8).await, Err(Error::StreamClosed)));
    }

    #[tokio::test]
    async fn send_writes_all_bytes() {
        let (mut conn, mut peer) = pair(64);
        conn.send(b"abc").await.unwrap();
        let mut buf = [0u8; 3];
        peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"abc");
    }
}
