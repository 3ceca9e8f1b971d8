use crate::error::Error;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub protocol: String,
    pub protocol_version: String,
    pub headers: HashMap<String, String>,
}

#[derive(Default)]
pub struct HeaderLineSplitter {
    buf: String,
}

impl HeaderLineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, Error> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        let mut parts: Vec<&str> = self.buf.split("\r\n").collect();
        let tail = parts.pop().unwrap_or("").to_string();
        let lines = parts.into_iter().map(str::to_string).collect();
        self.buf = tail;
        Ok(lines)
    }
}

#[derive(Default)]
pub struct RequestParser {
    splitter: HeaderLineSplitter,
    lines: Vec<String>,
}

impl RequestParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<Request>, Error> {
        self.lines.extend(self.splitter.feed(chunk)?);

        if self.lines.is_empty() || !self.lines.contains(&String::new()) {
            return Ok(None);
        }

        let request_line = self.lines.first().ok_or(Error::MalformedRequestLine)?;
        let mut parts = request_line.split(' ');
        let method = parts.next().ok_or(Error::MalformedRequestLine)?.to_string();
        let url = parts.next().ok_or(Error::MalformedRequestLine)?.to_string();
        let protocol_str = parts.next().ok_or(Error::MalformedRequestLine)?;
        let (protocol, protocol_version) = protocol_str
            .split_once('/')
            .ok_or(Error::MalformedRequestLine)?;

        let end = self.lines.iter().position(|l| l.is_empty()).unwrap();
        let mut headers = HashMap::new();
        for line in &self.lines[1..end] {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::MalformedHeaderLine(line.clone()))?;
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }

        Ok(Some(Request {
            method,
            url,
            protocol: protocol.to_string(),
            protocol_version: protocol_version.to_string(),
            headers,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "GET /chat HTTP/1.1\r\n\
        Host: example.com\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Sec-WebSocket-Version: 13\r\n\
        \r\n";

    #[test]
    fn parses_request_in_one_chunk() {
        let mut parser = RequestParser::new();
        let request = parser.feed(EXAMPLE.as_bytes()).unwrap().unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.url, "/chat");
        assert_eq!(request.protocol, "HTTP");
        assert_eq!(request.protocol_version, "1.1");
        assert_eq!(request.headers.get("upgrade").unwrap(), "websocket");
        assert_eq!(
            request.headers.get("sec-websocket-key").unwrap(),
            "dGhlIHNhbXBsZSBub25jZQ=="
        );
    }

    #[test]
    fn parses_request_split_across_two_chunks() {
        let mid = EXAMPLE.len() / 2;
        let (first, second) = EXAMPLE.split_at(mid);

        let mut parser = RequestParser::new();
        assert!(parser.feed(first.as_bytes()).unwrap().is_none());
        let request = parser.feed(second.as_bytes()).unwrap().unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.headers.get("connection").unwrap(), "Upgrade");
    }

    #[test]
    fn header_line_split_across_chunks_matches_single_chunk() {
        let mut a = HeaderLineSplitter::new();
        let mut lines = a.feed(b"GET / HTTP/1.1\r\nHost: ex").unwrap();
        lines.extend(a.feed(b"ample.com\r\n\r\n").unwrap());
        assert_eq!(lines, vec!["GET / HTTP/1.1", "Host: example.com", ""]);
    }

    #[test]
    fn incomplete_request_yields_none() {
        let mut parser = RequestParser::new();
        assert!(parser.feed(b"GET / HTTP/1.1\r\nHost: x\r\n").unwrap().is_none());
    }
}
