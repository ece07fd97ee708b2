use std::str::FromStr;

use enum_map::Enum;
use memchr::memmem;
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

use crate::infrastructure::server_impl::request::Request;

const CRLF: &str = "\r\n";
const BLANK_LINE: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
    #[error("request is not valid utf-8")]
    InvalidEncoding,
}

#[allow(clippy::upper_case_acronyms, non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, IntoStaticStr, EnumIter)]
#[non_exhaustive]
pub enum Header {
    #[strum(serialize = "accept")]
    ACCEPT,
    #[strum(serialize = "accept-encoding")]
    ACCEPT_ENCODING,
    #[strum(serialize = "content-length")]
    CONTENT_LENGTH,
    #[strum(serialize = "content-type")]
    CONTENT_TYPE,
    #[strum(serialize = "connection")]
    CONNECTION,
    #[strum(serialize = "host")]
    HOST,
    #[strum(serialize = "user-agent")]
    USER_AGENT,
}

impl FromStr for Header {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::iter().find(|c| unicase::eq(c.into(), s)).ok_or(())
    }
}

/// Methods the route table keeps a sequence for.
#[allow(clippy::upper_case_acronyms, non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Enum, EnumString)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
}

/// Splits raw request bytes into a [Request].
///
/// Head and body are separated at the first blank line; without one the body is empty.
/// Header lines are kept as received. The request line must carry at least three
/// space-separated tokens, anything past the third is ignored.
pub fn parse_http(raw: &[u8]) -> Result<Request<'_>, ParseError> {
    let raw = std::str::from_utf8(raw).map_err(|_| ParseError::InvalidEncoding)?;

    let (head, body) = match memmem::find(raw.as_bytes(), BLANK_LINE) {
        Some(idx) => (&raw[..idx], &raw[idx + BLANK_LINE.len()..]),
        None => (raw, ""),
    };

    let (request_line, headers) = head.split_once(CRLF).unwrap_or((head, ""));

    let mut tokens = request_line.split(' ');
    let (Some(method), Some(path), Some(version)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(ParseError::MalformedRequestLine(request_line.to_string()));
    };

    Ok(Request::new(method, path, version, headers, body))
}
