use std::borrow::Cow;

/// Undecoded contents of one (row, column) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCell {
    /// SQL NULL
    Null,
    /// Driver bytes in text protocol form
    Bytes(Vec<u8>),
}

impl RawCell {
    pub fn is_null(&self) -> bool {
        matches!(self, RawCell::Null)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RawCell::Null => None,
            RawCell::Bytes(bytes) => Some(bytes),
        }
    }

    /// Cell contents as text, replacing invalid UTF-8 sequences.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        self.as_bytes().map(String::from_utf8_lossy)
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            RawCell::Null => None,
            RawCell::Bytes(bytes) => Some(bytes),
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Bytes(value.as_bytes().to_vec())
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        RawCell::Bytes(value.into_bytes())
    }
}

impl From<Vec<u8>> for RawCell {
    fn from(value: Vec<u8>) -> Self {
        RawCell::Bytes(value)
    }
}

impl<T: Into<RawCell>> From<Option<T>> for RawCell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawCell::Null)
    }
}
