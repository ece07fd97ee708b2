use bytes::Bytes;
use derive_more::Deref;
use serde::Serialize;
use strum::{EnumIter, EnumMessage, EnumString, IntoStaticStr};

/// Body served whenever no route accepts the request.
pub const METHOD_NOT_ALLOWED_PAGE: &str =
    "<html><body><h1>405 METHOD NOT ALLOWED</h1></body></html>";

const CRLF: &str = "\r\n";

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, IntoStaticStr, EnumString, EnumMessage, EnumIter,
)]
pub enum StatusCode {
    #[strum(serialize = "200", message = "OK")]
    Ok,
    #[strum(serialize = "201", message = "Created")]
    Created,
    #[strum(serialize = "204", message = "No Content")]
    NoContent,
    #[strum(serialize = "301", message = "Moved Permanently")]
    MovedPermanently,
    #[strum(serialize = "302", message = "Found")]
    Found,
    #[strum(serialize = "400", message = "Bad Request")]
    BadRequest,
    #[strum(serialize = "401", message = "Unauthorized")]
    Unauthorized,
    #[strum(serialize = "403", message = "Forbidden")]
    Forbidden,
    #[strum(serialize = "404", message = "Not Found")]
    NotFound,
    #[strum(serialize = "405", message = "Method Not Allowed")]
    MethodNotAllowed,
    #[strum(serialize = "500", message = "Internal Server Error")]
    InternalServerError,
    #[strum(serialize = "502", message = "Bad Gateway")]
    BadGateway,
    #[strum(serialize = "503", message = "Service Unavailable")]
    ServiceUnavailable,
}

impl StatusCode {
    /// Full status line, CRLF included.
    pub const fn status_line(self) -> &'static str {
        match self {
            Self::Ok => "HTTP/1.1 200 OK\r\n",
            Self::Created => "HTTP/1.1 201 Created\r\n",
            Self::NoContent => "HTTP/1.1 204 No Content\r\n",
            Self::MovedPermanently => "HTTP/1.1 301 Moved Permanently\r\n",
            Self::Found => "HTTP/1.1 302 Found\r\n",
            Self::BadRequest => "HTTP/1.1 400 Bad Request\r\n",
            Self::Unauthorized => "HTTP/1.1 401 Unauthorized\r\n",
            Self::Forbidden => "HTTP/1.1 403 Forbidden\r\n",
            Self::NotFound => "HTTP/1.1 404 Not Found\r\n",
            Self::MethodNotAllowed => "HTTP/1.1 405 Method Not Allowed\r\n",
            Self::InternalServerError => "HTTP/1.1 500 Internal Server Error\r\n",
            Self::BadGateway => "HTTP/1.1 502 Bad Gateway\r\n",
            Self::ServiceUnavailable => "HTTP/1.1 503 Service Unavailable\r\n",
        }
    }

    pub fn code(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status_code: StatusCode,
    pub body: Option<String>,
}

impl From<StatusCode> for Response {
    fn from(value: StatusCode) -> Self {
        Self {
            status_code: value,
            body: None,
        }
    }
}

impl Response {
    pub fn from_status_code(value: StatusCode, body: impl Into<Option<String>>) -> Self {
        Self {
            status_code: value,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::from_status_code(StatusCode::Ok, body.into())
    }

    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::from_status_code(StatusCode::BadRequest, body.into())
    }

    pub fn method_not_allowed() -> Self {
        Self::from_status_code(
            StatusCode::MethodNotAllowed,
            METHOD_NOT_ALLOWED_PAGE.to_string(),
        )
    }

    /// Wire form: the status line, then a blank line and the body when there is one.
    /// No headers are written and the peer reads until the connection closes.
    pub fn into_http(self) -> Bytes {
        let status_line = self.status_code.status_line();

        let Some(body) = self.body else {
            return Bytes::from_static(status_line.as_bytes());
        };

        let mut buf = String::with_capacity(status_line.len() + CRLF.len() + body.len());
        buf.push_str(status_line);
        buf.push_str(CRLF);
        buf.push_str(&body);
        buf.into()
    }
}

#[derive(Debug, Deref)]
pub struct JsonResponse(pub Response);

impl JsonResponse {
    /// A 200 response carrying `body` serialised as JSON. Serialisation failures
    /// degrade to a 500 with no body.
    pub fn from<T>(body: T) -> Self
    where
        T: Serialize,
    {
        match simd_json::to_string(&body) {
            Ok(json) => Self(Response::ok(json)),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialise json response");
                Self(StatusCode::InternalServerError.into())
            }
        }
    }

    pub fn into_inner(self) -> Response {
        self.0
    }
}
