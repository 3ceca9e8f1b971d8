use crate::error::Error;
use bytes::BytesMut;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl OpCode {
    pub fn is_control(&self) -> bool {
        matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Error> {
        match byte {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            other => Err(Error::InvalidOpcode(other)),
        }
    }
}

// XOR is involutive, so apply() both masks and unmasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskingKey(pub [u8; 4]);

impl MaskingKey {
    pub fn apply(&self, payload: &mut [u8]) {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= self.0[i % 4];
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: OpCode,
    pub masking_key: Option<MaskingKey>,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(fin: bool, opcode: OpCode, masking_key: Option<MaskingKey>, payload: Vec<u8>) -> Self {
        Self { fin, opcode, masking_key, payload }
    }

    pub fn unmasked(opcode: OpCode, payload: Vec<u8>) -> Self {
        Self { fin: true, opcode, masking_key: None, payload }
    }

    pub fn control(opcode: OpCode, payload: Vec<u8>) -> Result<Self, Error> {
        debug_assert!(opcode.is_control());
        if payload.len() > 125 {
            return Err(Error::ControlFramePayloadTooLarge);
        }
        Ok(Self { fin: true, opcode, masking_key: None, payload })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 14);

        let first_byte = ((self.fin as u8) << 7) | self.opcode.as_u8();
        out.push(first_byte);

        let masked_bit = if self.masking_key.is_some() { 0b1000_0000 } else { 0 };
        let len = self.payload.len();

        if len <= 125 {
            out.push(masked_bit | len as u8);
        } else if len < 1 << 16 {
            out.push(masked_bit | 126);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            out.push(masked_bit | 127);
            out.extend_from_slice(&(len as u64).to_be_bytes());
        }

        let mut payload = self.payload.clone();
        if let Some(key) = &self.masking_key {
            out.extend_from_slice(&key.0);
            key.apply(&mut payload);
        }
        out.extend_from_slice(&payload);

        out
    }
}

#[derive(Debug)]
enum ParserState {
    Header,
    ExtendedLen { fin: bool, opcode: OpCode, masked: bool, extra: usize },
    MaskKey { fin: bool, opcode: OpCode, len: usize },
    Payload { fin: bool, opcode: OpCode, masking_key: Option<MaskingKey>, len: usize },
}

pub struct FrameParser {
    state: ParserState,
    buf: BytesMut,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self { state: ParserState::Header, buf: BytesMut::new() }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<(Option<Frame>, usize), Error> {
        let mut offset = 0;

        loop {
            match &self.state {
                ParserState::Header => {
                    let need = 2usize.saturating_sub(self.buf.len());
                    let take = need.min(chunk.len() - offset);
                    self.buf.extend_from_slice(&chunk[offset..offset + take]);
                    offset += take;
                    if self.buf.len() < 2 {
                        return Ok((None, offset));
                    }

                    let b0 = self.buf[0];
                    let b1 = self.buf[1];

                    let fin = (b0 & 0b1000_0000) != 0;
                    let rsv = b0 & 0b0111_0000;
                    if rsv != 0 {
                        return Err(Error::UnsupportedExtension);
                    }
                    let opcode = OpCode::try_from(b0 & 0b0000_1111)?;

                    let masked = (b1 & 0b1000_0000) != 0;
                    let len_indicator = (b1 & 0b0111_1111) as usize;

                    self.buf.clear();

                    match len_indicator {
                        126 => {
                            self.state = ParserState::ExtendedLen { fin, opcode, masked, extra: 2 };
                        }
                        127 => {
                            self.state = ParserState::ExtendedLen { fin, opcode, masked, extra: 8 };
                        }
                        len => {
                            if opcode.is_control() && len > 125 {
                                return Err(Error::ControlFramePayloadTooLarge);
                            }
                            self.state = if masked {
                                ParserState::MaskKey { fin, opcode, len }
                            } else {
                                ParserState::Payload { fin, opcode, masking_key: None, len }
                            };
                        }
                    }
                }

                ParserState::ExtendedLen { fin, opcode, masked, extra } => {
                    let (fin, opcode, masked, extra) = (*fin, *opcode, *masked, *extra);
                    let need = extra.saturating_sub(self.buf.len());
                    let take = need.min(chunk.len() - offset);
                    self.buf.extend_from_slice(&chunk[offset..offset + take]);
                    offset += take;
                    if self.buf.len() < extra {
                        return Ok((None, offset));
                    }

                    let len = if extra == 2 {
                        u16::from_be_bytes([self.buf[0], self.buf[1]]) as usize
                    } else {
                        u64::from_be_bytes(self.buf[0..8].try_into().unwrap()) as usize
                    };

                    if opcode.is_control() && len > 125 {
                        return Err(Error::ControlFramePayloadTooLarge);
                    }

                    self.buf.clear();
                    self.state = if masked {
                        ParserState::MaskKey { fin, opcode, len }
                    } else {
                        ParserState::Payload { fin, opcode, masking_key: None, len }
                    };
                }

                ParserState::MaskKey { fin, opcode, len } => {
                    let (fin, opcode, len) = (*fin, *opcode, *len);
                    let need = 4usize.saturating_sub(self.buf.len());
                    let take = need.min(chunk.len() - offset);
                    self.buf.extend_from_slice(&chunk[offset..offset + take]);
                    offset += take;
                    if self.buf.len() < 4 {
                        return Ok((None, offset));
                    }

                    let key = MaskingKey(self.buf[0..4].try_into().unwrap());
                    self.buf.clear();
                    self.state = ParserState::Payload { fin, opcode, masking_key: Some(key), len };
                }

                ParserState::Payload { fin, opcode, masking_key, len } => {
                    let (fin, opcode, masking_key, len) = (*fin, *opcode, *masking_key, *len);
                    let need = len.saturating_sub(self.buf.len());
                    let take = need.min(chunk.len() - offset);
                    self.buf.extend_from_slice(&chunk[offset..offset + take]);
                    offset += take;
                    if self.buf.len() < len {
                        return Ok((None, offset));
                    }

                    let mut payload = self.buf.split_to(len).to_vec();
                    if let Some(key) = masking_key {
                        key.apply(&mut payload);
                    }

                    self.buf.clear();
                    self.state = ParserState::Header;

                    let frame = Frame { fin, opcode, masking_key, payload };
                    return Ok((Some(frame), offset));
                }
            }
        }
    }
}

#[derive(Default)]
pub struct MultiFrameParser {
    parser: FrameParser,
}

impl MultiFrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Frame>, Error> {
        let mut frames = Vec::new();
        let mut rest = chunk;

        loop {
            let (frame, consumed) = self.parser.feed(rest)?;
            rest = &rest[consumed..];
            match frame {
                Some(frame) => frames.push(frame),
                None => break,
            }
            if rest.is_empty() {
                break;
            }
        }

        Ok(frames)
    }
}
