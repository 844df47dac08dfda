//! The fixed response vocabulary.

use std::fmt;

/// One of the four lines the server ever sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Response {
    Exists,
    NotFound,
    TooLarge,
    InvalidEncoding,
}

impl Response {
    pub const ALL: [Response; 4] = [
        Response::Exists,
        Response::NotFound,
        Response::TooLarge,
        Response::InvalidEncoding,
    ];

    /// Wire form, newline included.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Response::Exists => "STRING EXISTS\n",
            Response::NotFound => "STRING NOT FOUND\n",
            Response::TooLarge => "QUERY TOO LARGE\n",
            Response::InvalidEncoding => "INVALID ENCODING\n",
        }
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// Metric label.
    pub const fn label(&self) -> &'static str {
        match self {
            Response::Exists => "exists",
            Response::NotFound => "not_found",
            Response::TooLarge => "too_large",
            Response::InvalidEncoding => "invalid_encoding",
        }
    }

    /// Recognize a response line, with or without its trailing newline.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        Self::ALL
            .into_iter()
            .find(|response| response.as_str().trim_end_matches('\n') == line)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().trim_end_matches('\n'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_lines_are_exact() {
        assert_eq!(Response::Exists.as_bytes(), b"STRING EXISTS\n");
        assert_eq!(Response::NotFound.as_bytes(), b"STRING NOT FOUND\n");
        assert_eq!(Response::TooLarge.as_bytes(), b"QUERY TOO LARGE\n");
        assert_eq!(Response::InvalidEncoding.as_bytes(), b"INVALID ENCODING\n");
    }

    #[test]
    fn parse_accepts_wire_and_display_forms() {
        for response in Response::ALL {
            assert_eq!(Response::parse(response.as_str()), Some(response));
            assert_eq!(Response::parse(&response.to_string()), Some(response));
        }
        assert_eq!(Response::parse("STRING EXISTS\r\n"), Some(Response::Exists));
        assert_eq!(Response::parse("STRING"), None);
    }
}
