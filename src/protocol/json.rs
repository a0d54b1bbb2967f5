use std::fmt;

/// A parsed JSON document.
///
/// Object members keep their insertion order, so serializing a freshly
/// parsed value reproduces the member order of the input.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<JsonValue>),
    Object(Vec<(String, JsonValue)>),
}

impl JsonValue {
    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsonValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[JsonValue]> {
        match self {
            JsonValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, JsonValue)]> {
        match self {
            JsonValue::Object(members) => Some(members),
            _ => None,
        }
    }

    /// Member lookup on an object; `None` on anything else.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Element lookup on an array; `None` on anything else.
    pub fn index(&self, idx: usize) -> Option<&JsonValue> {
        self.as_array()?.get(idx)
    }

    /// Compact serialization.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Pretty-printed serialization with `indent` spaces per level.
    pub fn dump(&self, indent: usize) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, indent, 0);
        out
    }

    fn dump_into(&self, out: &mut String, indent: usize, depth: usize) {
        match self {
            JsonValue::Object(members) if !members.is_empty() => {
                let pad = " ".repeat(depth * indent);
                let inner = " ".repeat((depth + 1) * indent);
                out.push_str("{\n");
                for (i, (key, value)) in members.iter().enumerate() {
                    out.push_str(&inner);
                    out.push('"');
                    escape_into(out, key);
                    out.push_str("\": ");
                    value.dump_into(out, indent, depth + 1);
                    if i + 1 < members.len() {
                        out.push(',');
                    }
                    out.push('\n');
                }
                out.push_str(&pad);
                out.push('}');
            }
            JsonValue::Array(items) if !items.is_empty() => {
                let pad = " ".repeat(depth * indent);
                let inner = " ".repeat((depth + 1) * indent);
                out.push_str("[\n");
                for (i, item) in items.iter().enumerate() {
                    out.push_str(&inner);
                    item.dump_into(out, indent, depth + 1);
                    if i + 1 < items.len() {
                        out.push(',');
                    }
                    out.push('\n');
                }
                out.push_str(&pad);
                out.push(']');
            }
            other => {
                out.push_str(&other.to_string());
            }
        }
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonValue::Null => f.write_str("null"),
            JsonValue::Boolean(true) => f.write_str("true"),
            JsonValue::Boolean(false) => f.write_str("false"),
            JsonValue::Number(n) => write!(f, "{n}"),
            JsonValue::String(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('"');
                escape_into(&mut out, s);
                out.push('"');
                f.write_str(&out)
            }
            JsonValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            JsonValue::Object(members) => {
                f.write_str("{")?;
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    let mut quoted = String::with_capacity(key.len() + 2);
                    quoted.push('"');
                    escape_into(&mut quoted, key);
                    quoted.push('"');
                    write!(f, "{quoted}:{value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
}

/// What went wrong while parsing, with the byte position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character at byte {0}")]
    UnexpectedChar(usize),
    #[error("invalid number at byte {0}")]
    InvalidNumber(usize),
    #[error("trailing characters at byte {0}")]
    TrailingCharacters(usize),
}

/// Recursive-descent parser over a complete JSON document.
pub struct JsonParser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> JsonParser<'a> {
    /// Parses `input` as a single document; anything but whitespace after
    /// the top-level value is an error.
    pub fn parse(input: &str) -> Result<JsonValue, JsonError> {
        let mut parser = JsonParser {
            input: input.as_bytes(),
            pos: 0,
        };

        parser.skip_spaces();
        let value = parser.parse_value()?;
        parser.skip_spaces();
        if parser.pos != parser.input.len() {
            return Err(JsonError::TrailingCharacters(parser.pos));
        }
        Ok(value)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self) -> Result<JsonValue, JsonError> {
        self.skip_spaces();
        match self.peek().ok_or(JsonError::UnexpectedEnd)? {
            b'{' => self.parse_object(),
            b'[' => self.parse_array(),
            b'"' => Ok(JsonValue::String(self.parse_string()?)),
            b't' | b'f' => self.parse_boolean(),
            b'n' => self.parse_null(),
            b'-' => self.parse_number(),
            c if c.is_ascii_digit() => self.parse_number(),
            _ => Err(JsonError::UnexpectedChar(self.pos)),
        }
    }

    fn parse_object(&mut self) -> Result<JsonValue, JsonError> {
        self.pos += 1; // '{'
        self.skip_spaces();

        let mut members = Vec::new();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(JsonValue::Object(members));
        }

        loop {
            self.skip_spaces();
            if self.peek() != Some(b'"') {
                return Err(match self.peek() {
                    Some(_) => JsonError::UnexpectedChar(self.pos),
                    None => JsonError::UnexpectedEnd,
                });
            }
            let key = self.parse_string()?;

            self.skip_spaces();
            match self.peek() {
                Some(b':') => self.pos += 1,
                Some(_) => return Err(JsonError::UnexpectedChar(self.pos)),
                None => return Err(JsonError::UnexpectedEnd),
            }

            let value = self.parse_value()?;
            members.push((key, value));

            self.skip_spaces();
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(JsonValue::Object(members));
                }
                Some(b',') => self.pos += 1,
                Some(_) => return Err(JsonError::UnexpectedChar(self.pos)),
                None => return Err(JsonError::UnexpectedEnd),
            }
        }
    }

    fn parse_array(&mut self) -> Result<JsonValue, JsonError> {
        self.pos += 1; // '['
        self.skip_spaces();

        let mut items = Vec::new();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(JsonValue::Array(items));
        }

        loop {
            let value = self.parse_value()?;
            items.push(value);

            self.skip_spaces();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Ok(JsonValue::Array(items));
                }
                Some(b',') => self.pos += 1,
                Some(_) => return Err(JsonError::UnexpectedChar(self.pos)),
                None => return Err(JsonError::UnexpectedEnd),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, JsonError> {
        self.pos += 1; // opening '"'
        let mut out = Vec::new();

        loop {
            let c = self.peek().ok_or(JsonError::UnexpectedEnd)?;
            self.pos += 1;
            match c {
                b'"' => break,
                b'\\' => {
                    let esc = self.peek().ok_or(JsonError::UnexpectedEnd)?;
                    self.pos += 1;
                    match esc {
                        b'"' => out.push(b'"'),
                        b'\\' => out.push(b'\\'),
                        b'/' => out.push(b'/'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0c),
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }

        // The input was a &str, so plain byte runs stay valid UTF-8.
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn parse_number(&mut self) -> Result<JsonValue, JsonError> {
        let start = self.pos;

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }

        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| JsonError::InvalidNumber(start))?;
        let value = text
            .parse::<f64>()
            .map_err(|_| JsonError::InvalidNumber(start))?;
        Ok(JsonValue::Number(value))
    }

    fn parse_boolean(&mut self) -> Result<JsonValue, JsonError> {
        if self.input[self.pos..].starts_with(b"true") {
            self.pos += 4;
            return Ok(JsonValue::Boolean(true));
        }
        if self.input[self.pos..].starts_with(b"false") {
            self.pos += 5;
            return Ok(JsonValue::Boolean(false));
        }
        Err(JsonError::UnexpectedChar(self.pos))
    }

    fn parse_null(&mut self) -> Result<JsonValue, JsonError> {
        if self.input[self.pos..].starts_with(b"null") {
            self.pos += 4;
            return Ok(JsonValue::Null);
        }
        Err(JsonError::UnexpectedChar(self.pos))
    }
}
