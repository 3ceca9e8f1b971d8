use crate::bytestream::Connection;
use crate::config::ServerConfig;
use crate::error::Error;
use crate::origin;
use crate::request::{Request, RequestParser};
use crate::util::accept_key;
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const HANDSHAKE_CHUNK_SIZE: usize = 512;
const MAX_HANDSHAKE_CHUNKS: usize = 8;

pub async fn perform_handshake<S>(
    conn: &mut Connection<S>,
    config: &ServerConfig,
) -> Result<HashMap<String, String>, Error>
where
    S: AsyncReadExt + AsyncWriteExt + Unpin,
{
    let request = read_request(conn).await?;
    validate_request(&request, config)?;

    let key = request
        .headers
        .get("sec-websocket-key")
        .ok_or_else(|| Error::MissingHeader("Sec-WebSocket-Key".to_string()))?;
    let accept = accept_key(key);

    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: WebSocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept}\r\n\r\n"
    );
    conn.send(response.as_bytes()).await?;

    Ok(request.headers)
}

async fn read_request<S>(conn: &mut Connection<S>) -> Result<Request, Error>
where
    S: AsyncReadExt + AsyncWriteExt + Unpin,
{
    let mut parser = RequestParser::new();
    for _ in 0..MAX_HANDSHAKE_CHUNKS {
        let chunk = conn.receive(HANDSHAKE_CHUNK_SIZE).await?;
        if let Some(request) = parser.feed(&chunk)? {
            return Ok(request);
        }
    }
    Err(Error::RequestTooLarge)
}

fn validate_request(request: &Request, config: &ServerConfig) -> Result<(), Error> {
    if !request.method.eq_ignore_ascii_case("GET") {
        return Err(Error::MethodNotGet);
    }

    let version: f64 = request
        .protocol_version
        .parse()
        .map_err(|_| Error::HttpVersionTooOld)?;
    if version < 1.1 {
        return Err(Error::HttpVersionTooOld);
    }

    let upgrade = header(request, "upgrade")?;
    if !upgrade.to_lowercase().contains("websocket") {
        return Err(Error::UpgradeHeaderMissing);
    }

    let connection = header(request, "connection")?;
    if !connection.to_lowercase().contains("upgrade") {
        return Err(Error::ConnectionHeaderMissing);
    }

    let version_header = header(request, "sec-websocket-version")?;
    if version_header != "13" {
        return Err(Error::UnsupportedWebsocketVersion);
    }

    if let Some(requested_origin) = request.headers.get("origin") {
        if !origin::allowed(&config.allowed_origins, Some(requested_origin)) {
            return Err(Error::OriginNotAllowed(requested_origin.clone()));
        }
    }

    Ok(())
}

fn header<'a>(request: &'a Request, name: &str) -> Result<&'a str, Error> {
    request
        .headers
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::MissingHeader(name.to_string()))
}
