/// HTTP status codes produced by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use postbox::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// A complete HTTP response ready to be sent to a client.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Headers in the order they are written
    pub headers: Vec<(String, String)>,
    /// Response body as bytes
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .content_type("text/html")
///     .body(b"<h1>hi</h1>".to_vec())
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    content_type: String,
    body: Vec<u8>,
}

/// Content-Type header value for a MIME type.
///
/// Text types are declared as UTF-8.
pub fn content_type_value(mime: &str) -> String {
    if mime.starts_with("text/") {
        format!("{}; charset=utf-8", mime)
    } else {
        mime.to_string()
    }
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: "text/html".to_string(),
            body: Vec::new(),
        }
    }

    /// Sets the MIME type of the body.
    pub fn content_type(mut self, mime: impl Into<String>) -> Self {
        self.content_type = mime.into();
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the final Response.
    ///
    /// Content-Length is always the exact body size and every response asks
    /// the client to close the connection.
    pub fn build(self) -> Response {
        let headers = vec![
            ("Content-Type".to_string(), content_type_value(&self.content_type)),
            ("Content-Length".to_string(), self.body.len().to_string()),
            ("Connection".to_string(), "close".to_string()),
        ];

        Response {
            status: self.status,
            headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates a 200 OK response with the given MIME type and body.
    pub fn ok(mime: &str, body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .content_type(mime)
            .body(body)
            .build()
    }

    /// Creates an HTML response with the given status.
    pub fn html(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(status)
            .content_type("text/html")
            .body(body)
            .build()
    }

    /// Looks up a header by exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
