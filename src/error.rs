use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // --- Protocol violations (frame codec / message stream) ---
    #[error("reserved bit set with no negotiated extension")]
    UnsupportedExtension,

    #[error("invalid opcode `{0:#x}`")]
    InvalidOpcode(u8),

    #[error("message fragmentation is not supported")]
    FragmentationUnsupported,

    #[error("binary frames are not supported")]
    BinaryUnsupported,

    #[error("control frame payload exceeds 125 bytes")]
    ControlFramePayloadTooLarge,

    // --- Handshake failures ---
    #[error("request method must be GET")]
    MethodNotGet,

    #[error("HTTP version must be at least 1.1")]
    HttpVersionTooOld,

    #[error("Upgrade header must include \"websocket\"")]
    UpgradeHeaderMissing,

    #[error("Connection header must include \"upgrade\"")]
    ConnectionHeaderMissing,

    #[error("unsupported Sec-WebSocket-Version")]
    UnsupportedWebsocketVersion,

    #[error("missing required header `{0}`")]
    MissingHeader(String),

    #[error("origin `{0}` is not allowed")]
    OriginNotAllowed(String),

    #[error("handshake request too large")]
    RequestTooLarge,

    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("malformed header line: `{0}`")]
    MalformedHeaderLine(String),

    // --- Transport conditions ---
    #[error("the byte stream was closed")]
    StreamClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    // --- Timeouts ---
    #[error("operation timed out: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    // --- Configuration ---
    #[error("invalid origin pattern `{0}`: {1}")]
    InvalidOriginPattern(String, regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
