//! Validated identifier and text types shared across the receipt workspace.
//!
//! Receipt identifiers end up in blob names, URLs and (for the local backend) file paths, so they
//! are restricted at construction time to characters that are valid in all three unescaped.

/// Errors that can occur when creating validated types.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input was empty or contained only whitespace
    #[error("value cannot be empty")]
    Empty,

    /// The input was longer than [`MAX_RECEIPT_ID_LEN`]
    #[error("receipt id is longer than {MAX_RECEIPT_ID_LEN} characters")]
    TooLong,

    /// The input contained a character outside [`RECEIPT_ID_PUNCTUATION`] and ASCII
    /// alphanumerics
    #[error("receipt id contains invalid character {0:?}")]
    InvalidCharacter(char),

    /// The input started with `.` or contained `..`
    #[error("receipt id cannot start with '.' or contain '..'")]
    DotSegment,
}

/// Punctuation allowed in receipt ids besides ASCII letters and digits. These need no
/// percent-encoding in a URL path segment and are valid in file names.
pub const RECEIPT_ID_PUNCTUATION: &str = "-_.~!$&'()+,;=@";

/// Longest receipt id accepted. Azure blob names allow 1024 characters; the extension needs room.
pub const MAX_RECEIPT_ID_LEN: usize = 128;

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, returning [`IdError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, IdError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque receipt identifier.
///
/// The client generates these (usually a hyphenated UUID), the server only checks that the value
/// is safe to use as a blob-name stem: 1 to [`MAX_RECEIPT_ID_LEN`] ASCII alphanumerics or
/// [`RECEIPT_ID_PUNCTUATION`] characters, not starting with `.` and without `..`. No case
/// normalisation is applied, so the id round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptId(String);

impl ReceiptId {
    /// Validates an externally supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] if `input` is empty, too long, contains a character outside the
    /// allowed set, or could be read as a relative path segment.
    pub fn parse(input: &str) -> Result<Self, IdError> {
        if input.is_empty() {
            return Err(IdError::Empty);
        }
        if input.len() > MAX_RECEIPT_ID_LEN {
            return Err(IdError::TooLong);
        }
        if let Some(bad) = input
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || RECEIPT_ID_PUNCTUATION.contains(*c)))
        {
            return Err(IdError::InvalidCharacter(bad));
        }
        if input.starts_with('.') || input.contains("..") {
            return Err(IdError::DotSegment);
        }
        Ok(Self(input.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ReceiptId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for ReceiptId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for ReceiptId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ReceiptId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ReceiptId::parse(&s).map_err(serde::de::Error::custom)
    }
}
