use crate::bytestream::Connection;
use crate::error::Error;
use crate::frame::{Frame, MultiFrameParser, OpCode};
use std::collections::{HashMap, VecDeque};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const READ_CHUNK_SIZE: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Open,
    Closing,
    Closed,
}

pub struct MessageStream<S> {
    conn: Connection<S>,
    parser: MultiFrameParser,
    inbound: VecDeque<String>,
    handshake_headers: HashMap<String, String>,
    state: State,
}

impl<S> MessageStream<S>
where
    S: AsyncReadExt + AsyncWriteExt + Unpin,
{
    pub fn new(conn: Connection<S>, handshake_headers: HashMap<String, String>) -> Self {
        Self {
            conn,
            parser: MultiFrameParser::new(),
            inbound: VecDeque::new(),
            handshake_headers,
            state: State::Open,
        }
    }

    pub fn handshake_headers(&self) -> &HashMap<String, String> {
        &self.handshake_headers
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn peer_addr(&self) -> Option<std::net::SocketAddr> {
        self.conn.peer_addr()
    }

    pub async fn receive_message(&mut self) -> Result<String, Error> {
        loop {
            if let Some(message) = self.inbound.pop_front() {
                return Ok(message);
            }
            if self.state == State::Closed {
                return Err(Error::StreamClosed);
            }
            let chunk = self.conn.receive(READ_CHUNK_SIZE).await?;
            let frames = self.parser.feed(&chunk)?;
            for frame in frames {
                self.handle_frame(frame).await?;
            }
        }
    }

    pub async fn send_message(&mut self, payload: &str) -> Result<(), Error> {
        let frame = Frame::unmasked(OpCode::Text, payload.as_bytes().to_vec());
        self.send_frame(frame).await
    }

    pub async fn close(&mut self, code: u16, reason: &str) -> Result<(), Error> {
        let mut payload = code.to_be_bytes().to_vec();
        payload.extend_from_slice(reason.as_bytes());

        let result = match Frame::control(OpCode::Close, payload) {
            Ok(frame) => self.send_frame(frame).await,
            Err(e) => Err(e),
        };
        self.state = State::Closed;
        self.conn.close().await;

        match result {
            Err(Error::StreamClosed) => Ok(()),
            other => other,
        }
    }

    pub async fn close_default(&mut self) -> Result<(), Error> {
        self.close(1000, "").await
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Error> {
        self.conn.send(&frame.serialize()).await
    }

    async fn handle_frame(&mut self, frame: Frame) -> Result<(), Error> {
        if !frame.fin {
            return Err(Error::FragmentationUnsupported);
        }

        match frame.opcode {
            OpCode::Text => {
                let text = String::from_utf8(frame.payload)?;
                self.inbound.push_back(text);
            }
            OpCode::Binary => return Err(Error::BinaryUnsupported),
            OpCode::Continuation => return Err(Error::FragmentationUnsupported),
            OpCode::Ping => {
                let pong = Frame::control(OpCode::Pong, frame.payload)?;
                self.send_frame(pong).await?;
            }
            OpCode::Pong => {
                // Unsolicited or keepalive pong; nothing to do.
            }
            OpCode::Close => {
                self.state = State::Closing;
                if frame.payload.len() >= 2 {
                    let code = u16::from_be_bytes([frame.payload[0], frame.payload[1]]);
                    let reason = String::from_utf8(frame.payload[2..].to_vec())?;
                    self.close(code, &reason).await?;
                } else {
                    self.close_default().await?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::MaskingKey;

    fn client_masked(opcode: OpCode, payload: &[u8], key: [u8; 4]) -> Vec<u8> {
        let mut bytes = payload.to_vec();
        MaskingKey(key).apply(&mut bytes);
        let mut wire = vec![0x80 | opcode.as_u8(), 0x80 | payload.len() as u8];
        wire.extend_from_slice(&key);
        wire.extend_from_slice(&bytes);
        wire
    }

    fn new_stream(peer: tokio::io::DuplexStream) -> MessageStream<tokio::io::DuplexStream> {
        MessageStream::new(Connection::new(peer, None, None), HashMap::new())
    }

    #[tokio::test]
    async fn echoes_a_text_message() {
        let (server_side, mut client_side) = tokio::io::duplex(4096);
        let mut stream = new_stream(server_side);

        client_side
            .write_all(&client_masked(OpCode::Text, b"hello", [1, 2, 3, 4]))
            .await
            .unwrap();

        let message = stream.receive_message().await.unwrap();
        assert_eq!(message, "hello");

        stream.send_message("hello").await.unwrap();
        let mut buf = [0u8; 7];
        client_side.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"\x81\x05hello");
    }

    #[tokio::test]
    async fn answers_ping_with_pong_before_receive_returns() {
        let (server_side, mut client_side) = tokio::io::duplex(4096);
        let mut stream = new_stream(server_side);

        let mut wire = client_masked(OpCode::Ping, b"ping", [9, 9, 9, 9]);
        wire.extend_from_slice(&client_masked(OpCode::Text, b"next", [1, 1, 1, 1]));
        client_side.write_all(&wire).await.unwrap();

        let message = stream.receive_message().await.unwrap();
        assert_eq!(message, "next");

        let mut pong = [0u8; 6];
        client_side.read_exact(&mut pong).await.unwrap();
        assert_eq!(&pong, b"\x8A\x04ping");
    }

    #[tokio::test]
    async fn peer_close_emits_close_and_shuts_down() {
        let (server_side, mut client_side) = tokio::io::duplex(4096);
        let mut stream = new_stream(server_side);

        let payload = [0x03, 0xE8];
        client_side
            .write_all(&client_masked(OpCode::Close, &payload, [4, 4, 4, 4]))
            .await
            .unwrap();

        let err = stream.receive_message().await.unwrap_err();
        assert!(matches!(err, Error::StreamClosed));

        let mut close_wire = [0u8; 4];
        client_side.read_exact(&mut close_wire).await.unwrap();
        assert_eq!(close_wire, [0x88, 0x02, 0x03, 0xE8]);

        assert_eq!(stream.state(), State::Closed);
    }

    #[tokio::test]
    async fn fragmented_frame_is_rejected() {
        let (server_side, mut client_side) = tokio::io::duplex(4096);
        let mut stream = new_stream(server_side);

        let mut wire = client_masked(OpCode::Text, b"partial", [5, 5, 5, 5]);
        wire[0] &= 0b0111_1111; // clear FIN
        client_side.write_all(&wire).await.unwrap();

        let err = stream.receive_message().await.unwrap_err();
        assert!(matches!(err, Error::FragmentationUnsupported));
    }

    #[tokio::test]
    async fn binary_frame_is_rejected() {
        let (server_side, mut client_side) = tokio::io::duplex(4096);
        let mut stream = new_stream(server_side);

        client_side
            .write_all(&client_masked(OpCode::Binary, b"\x01\x02", [6, 6, 6, 6]))
            .await
            .unwrap();

        let err = stream.receive_message().await.unwrap_err();
        assert!(matches!(err, Error::BinaryUnsupported));
    }
}
