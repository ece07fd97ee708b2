use crate::infrastructure::server_impl::server::Header;
use compact_str::CompactString;
use fnv::FnvHashMap;
use std::str::FromStr;

pub type Params = FnvHashMap<CompactString, CompactString>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: &'a str,
    /// Request target as sent, `?query` suffix included.
    pub path: &'a str,
    pub version: &'a str,
    /// Header lines exactly as received, joined by CRLF.
    pub headers: &'a str,
    pub body: &'a str,
    /// Filled by the router once a pattern matched.
    pub path_variables: Params,
    /// Filled by the router once a pattern matched.
    pub query: Params,
}

impl<'a> Request<'a> {
    pub fn new(
        method: &'a str,
        path: &'a str,
        version: &'a str,
        headers: &'a str,
        body: &'a str,
    ) -> Self {
        Self {
            method,
            path,
            version,
            headers,
            body,
            path_variables: Params::default(),
            query: Params::default(),
        }
    }

    /// Case-insensitive lookup of a well-known header in the raw header text.
    pub fn header(&self, header: Header) -> Option<&'a str> {
        self.headers
            .split("\r\n")
            .filter_map(|line| line.split_once(':'))
            .find(|(key, _)| Header::from_str(key.trim()) == Ok(header))
            .map(|(_, value)| value.trim())
    }

    pub fn path_variable(&self, key: &str) -> Option<&str> {
        self.path_variables.get(key).map(CompactString::as_str)
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(CompactString::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let request = Request::new(
            "POST",
            "/users/create",
            "HTTP/1.1",
            "Host: localhost:4221\r\ncontent-type: application/json\r\nX-Custom: yes",
            "",
        );

        assert_eq!(request.header(Header::HOST), Some("localhost:4221"));
        assert_eq!(request.header(Header::CONTENT_TYPE), Some("application/json"));
        assert_eq!(request.header(Header::USER_AGENT), None);
    }

    #[test]
    fn header_lookup_skips_unknown_and_malformed_lines() {
        let request = Request::new(
            "GET",
            "/",
            "HTTP/1.1",
            "X-Host: spoofed\r\nno colon here\r\n  HOST :  example.org ",
            "",
        );

        assert_eq!(request.header(Header::HOST), Some("example.org"));
    }

    #[test]
    fn header_lookup_on_empty_headers() {
        let request = Request::new("GET", "/", "HTTP/1.1", "", "");
        assert_eq!(request.header(Header::HOST), None);
    }
}
