use thiserror::Error;

/// RESP (REdis Serialization Protocol) data types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  /// Simple strings, used for simple responses like "OK"
  SimpleString(String),
  /// Errors
  Error(String),
  /// Integers
  Integer(i64),
  /// Bulk strings, used for binary-safe strings (can be null)
  BulkString(Option<Vec<u8>>),
  /// Arrays of other values (can be null)
  Array(Option<Vec<Value>>),
}

/// Input that can never become a valid frame, however much more arrives
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
  #[error("invalid type byte {0:#04x}")]
  InvalidType(u8),
  #[error("invalid length '{0}'")]
  InvalidLength(String),
  #[error("invalid integer '{0}'")]
  InvalidInteger(String),
  #[error("bulk string not terminated by CRLF")]
  MissingTerminator,
  #[error("arrays nested deeper than {} levels", MAX_NESTING_DEPTH)]
  TooDeep,
}

impl Value {
  /// Create a simple OK response
  pub fn ok() -> Self {
    Value::SimpleString("OK".to_string())
  }

  /// Create an error response
  pub fn error(msg: impl Into<String>) -> Self {
    Value::Error(msg.into())
  }

  /// Bulk string holding `s`, or the null bulk string for `None`
  pub fn bulk(s: Option<String>) -> Self {
    Value::BulkString(s.map(String::into_bytes))
  }

  /// Encode Value to RESP bytes
  pub fn encode(&self) -> Vec<u8> {
    let mut buf = Vec::new();
    self.encode_to(&mut buf);
    buf
  }

  fn encode_to(&self, buf: &mut Vec<u8>) {
    match self {
      Value::SimpleString(s) => {
        buf.push(b'+');
        buf.extend_from_slice(s.as_bytes());
        buf.extend_from_slice(b"\r\n");
      }
      Value::Error(e) => {
        buf.push(b'-');
        buf.extend_from_slice(e.as_bytes());
        buf.extend_from_slice(b"\r\n");
      }
      Value::Integer(i) => {
        buf.push(b':');
        buf.extend_from_slice(i.to_string().as_bytes());
        buf.extend_from_slice(b"\r\n");
      }
      Value::BulkString(None) => {
        buf.extend_from_slice(b"$-1\r\n");
      }
      Value::BulkString(Some(data)) => {
        buf.push(b'$');
        buf.extend_from_slice(data.len().to_string().as_bytes());
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(data);
        buf.extend_from_slice(b"\r\n");
      }
      Value::Array(None) => {
        buf.extend_from_slice(b"*-1\r\n");
      }
      Value::Array(Some(items)) => {
        buf.push(b'*');
        buf.extend_from_slice(items.len().to_string().as_bytes());
        buf.extend_from_slice(b"\r\n");
        for item in items {
          item.encode_to(buf);
        }
      }
    }
  }
}

type ParseResult<T> = Result<Option<T>, ProtocolError>;

/// Deepest array nesting accepted in a single frame
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parser for RESP protocol
pub struct Parser;

impl Parser {
  /// Parse one frame from the front of `buffer`.
  ///
  /// Returns `Ok(Some((value, consumed)))` for a complete frame and
  /// `Ok(None)` when more bytes are needed. Nothing is consumed in the
  /// latter case.
  pub fn parse(buffer: &[u8]) -> ParseResult<(Value, usize)> {
    if buffer.is_empty() {
      return Ok(None);
    }

    let mut pos = 0;
    Ok(Self::parse_value(buffer, &mut pos, 0)?.map(|value| (value, pos)))
  }

  fn parse_value(buffer: &[u8], pos: &mut usize, depth: usize) -> ParseResult<Value> {
    if *pos >= buffer.len() {
      return Ok(None);
    }

    let type_byte = buffer[*pos];
    *pos += 1;

    match type_byte {
      b'+' => Self::parse_simple_string(buffer, pos),
      b'-' => Self::parse_error(buffer, pos),
      b':' => Self::parse_integer(buffer, pos),
      b'$' => Self::parse_bulk_string(buffer, pos),
      b'*' => Self::parse_array(buffer, pos, depth),
      other => Err(ProtocolError::InvalidType(other)),
    }
  }

  fn parse_simple_string(buffer: &[u8], pos: &mut usize) -> ParseResult<Value> {
    Ok(Self::read_line(buffer, pos).map(|line| {
      Value::SimpleString(String::from_utf8_lossy(line).to_string())
    }))
  }

  fn parse_error(buffer: &[u8], pos: &mut usize) -> ParseResult<Value> {
    Ok(Self::read_line(buffer, pos).map(|line| Value::Error(String::from_utf8_lossy(line).to_string())))
  }

  fn parse_integer(buffer: &[u8], pos: &mut usize) -> ParseResult<Value> {
    let Some(line) = Self::read_line(buffer, pos) else {
      return Ok(None);
    };
    let text = String::from_utf8_lossy(line);
    let num = text
      .parse::<i64>()
      .map_err(|_| ProtocolError::InvalidInteger(text.to_string()))?;
    Ok(Some(Value::Integer(num)))
  }

  /// Read a length header; `None` stands for the null marker `-1`
  fn parse_length(line: &[u8]) -> Result<Option<usize>, ProtocolError> {
    let text = String::from_utf8_lossy(line);
    match text.parse::<i64>() {
      Ok(-1) => Ok(None),
      Ok(len) if len >= 0 => Ok(Some(len as usize)),
      _ => Err(ProtocolError::InvalidLength(text.to_string())),
    }
  }

  fn parse_bulk_string(buffer: &[u8], pos: &mut usize) -> ParseResult<Value> {
    let Some(line) = Self::read_line(buffer, pos) else {
      return Ok(None);
    };
    let Some(len) = Self::parse_length(line)? else {
      return Ok(Some(Value::BulkString(None)));
    };

    // Check if we have enough data (len + \r\n)
    if *pos + len + 2 > buffer.len() {
      return Ok(None);
    }
    if &buffer[*pos + len..*pos + len + 2] != b"\r\n" {
      return Err(ProtocolError::MissingTerminator);
    }

    let data = buffer[*pos..*pos + len].to_vec();
    *pos += len + 2;

    Ok(Some(Value::BulkString(Some(data))))
  }

  /// `depth` counts the arrays enclosing this one. It is checked before
  /// anything else so an endless `*1\r\n` prefix fails early.
  fn parse_array(buffer: &[u8], pos: &mut usize, depth: usize) -> ParseResult<Value> {
    if depth >= MAX_NESTING_DEPTH {
      return Err(ProtocolError::TooDeep);
    }

    let Some(line) = Self::read_line(buffer, pos) else {
      return Ok(None);
    };
    let Some(count) = Self::parse_length(line)? else {
      return Ok(Some(Value::Array(None)));
    };

    // The count comes off the wire; don't trust it for preallocation.
    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
      match Self::parse_value(buffer, pos, depth + 1)? {
        Some(item) => items.push(item),
        None => return Ok(None),
      }
    }

    Ok(Some(Value::Array(Some(items))))
  }

  fn read_line<'a>(buffer: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let start = *pos;
    let offset = buffer[start..].windows(2).position(|w| w == b"\r\n")?;
    *pos = start + offset + 2;
    Some(&buffer[start..start + offset])
  }
}
