use std::collections::HashMap;

const LINE_SEP: &str = "\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Trace,
    Connect,
    Patch,
    Unknown,
}

impl HttpMethod {
    pub fn parse(s: &str) -> HttpMethod {
        match s {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            "TRACE" => HttpMethod::Trace,
            "CONNECT" => HttpMethod::Connect,
            "PATCH" => HttpMethod::Patch,
            _ => HttpMethod::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
    Http20,
    Unknown,
}

impl HttpVersion {
    pub fn parse(s: &str) -> HttpVersion {
        match s {
            "HTTP/1.0" => HttpVersion::Http10,
            "HTTP/1.1" => HttpVersion::Http11,
            "HTTP/2.0" => HttpVersion::Http20,
            _ => HttpVersion::Unknown,
        }
    }

    /// Unknown serializes as HTTP/1.1.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVersion::Http10 => "HTTP/1.0",
            HttpVersion::Http20 => "HTTP/2.0",
            HttpVersion::Http11 | HttpVersion::Unknown => "HTTP/1.1",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpParseError {
    #[error("missing start line")]
    MissingStartLine,
    #[error("malformed start line")]
    MalformedStartLine,
    #[error("missing header terminator")]
    MissingHeaderEnd,
}

/// An HTTP/1 request-shaped message: start line, headers, body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMessage {
    method: HttpMethod,
    version: HttpVersion,
    url: String,
    headers: HashMap<String, String>,
    body: String,
}

impl HttpMessage {
    pub fn new() -> HttpMessage {
        HttpMessage {
            method: HttpMethod::Get,
            version: HttpVersion::Http11,
            url: String::from("/"),
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn set_method(&mut self, method: HttpMethod) {
        self.method = method;
    }

    pub fn set_version(&mut self, version: HttpVersion) {
        self.version = version;
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    /// Renders the message: start line, one `key: value` line per header,
    /// a blank separator line, then the body.
    pub fn serialize_to_string(&self) -> String {
        let mut out = String::new();

        out.push_str(self.method.as_str());
        out.push(' ');
        out.push_str(&self.url);
        out.push(' ');
        out.push_str(self.version.as_str());
        out.push_str(LINE_SEP);

        for (key, value) in &self.headers {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push_str(LINE_SEP);
        }

        out.push_str(LINE_SEP);
        out.push_str(&self.body);
        out
    }

    /// Parses a complete message. Header lines without a colon are skipped;
    /// everything after the blank line is the body, verbatim.
    pub fn parse(input: &str) -> Result<HttpMessage, HttpParseError> {
        let line_end = input.find(LINE_SEP).ok_or(HttpParseError::MissingStartLine)?;
        let mut parts = input[..line_end].split_whitespace();

        let method = parts.next().ok_or(HttpParseError::MalformedStartLine)?;
        let url = parts.next().ok_or(HttpParseError::MalformedStartLine)?;
        let version = parts.next().ok_or(HttpParseError::MalformedStartLine)?;

        let header_start = line_end + LINE_SEP.len();
        let header_end = input
            .find("\r\n\r\n")
            .ok_or(HttpParseError::MissingHeaderEnd)?;

        let mut headers = HashMap::new();
        if header_end > header_start {
            for line in input[header_start..header_end].split(LINE_SEP) {
                let Some(colon) = line.find(':') else { continue };
                let key = line[..colon].to_string();
                let value = line[colon + 1..].trim_start_matches(' ').to_string();
                headers.insert(key, value);
            }
        }

        Ok(HttpMessage {
            method: HttpMethod::parse(method),
            version: HttpVersion::parse(version),
            url: url.to_string(),
            headers,
            body: input[header_end + 2 * LINE_SEP.len()..].to_string(),
        })
    }
}

impl Default for HttpMessage {
    fn default() -> HttpMessage {
        HttpMessage::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_with_headers_and_body() {
        let raw = "POST /submit HTTP/1.1\r\nHost: localhost\r\nContent-Type: text/plain\r\n\r\npayload";
        let msg = HttpMessage::parse(raw).unwrap();

        assert_eq!(msg.method(), HttpMethod::Post);
        assert_eq!(msg.version(), HttpVersion::Http11);
        assert_eq!(msg.url(), "/submit");
        assert_eq!(msg.header("Host"), Some("localhost"));
        assert_eq!(msg.header("Content-Type"), Some("text/plain"));
        assert_eq!(msg.body(), "payload");
    }

    #[test]
    fn parses_request_without_headers() {
        let msg = HttpMessage::parse("GET / HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(msg.method(), HttpMethod::Get);
        assert_eq!(msg.version(), HttpVersion::Http10);
        assert!(msg.headers().is_empty());
        assert_eq!(msg.body(), "");
    }

    #[test]
    fn serialize_parse_round_trip() {
        let mut msg = HttpMessage::new();
        msg.set_method(HttpMethod::Put);
        msg.set_url("/things/7");
        msg.add_header("Content-Length", "2");
        msg.set_body("hi");

        let reparsed = HttpMessage::parse(&msg.serialize_to_string()).unwrap();
        assert_eq!(reparsed.method(), HttpMethod::Put);
        assert_eq!(reparsed.url(), "/things/7");
        assert_eq!(reparsed.header("Content-Length"), Some("2"));
        assert_eq!(reparsed.body(), "hi");
    }

    #[test]
    fn rejects_truncated_input() {
        assert_eq!(
            HttpMessage::parse("GET / HTTP/1.1"),
            Err(HttpParseError::MissingStartLine)
        );
        assert_eq!(
            HttpMessage::parse("GET / HTTP/1.1\r\nHost: x\r\n"),
            Err(HttpParseError::MissingHeaderEnd)
        );
    }

    #[test]
    fn unknown_method_is_preserved_as_unknown() {
        let msg = HttpMessage::parse("BREW /pot HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(msg.method(), HttpMethod::Unknown);
    }
}
