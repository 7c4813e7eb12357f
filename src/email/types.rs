//! Email-specific types produced by the parser.

use serde::{Deserialize, Serialize};

/// Stand-in for a header the message does not carry.
pub const MISSING_HEADER: &str = "None";

/// Header-level facts about one message.
///
/// Values are the header text as found in the message; the timestamp is not
/// interpreted as a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMetadata {
    /// From header.
    pub sender: String,
    /// Subject header.
    pub subject: String,
    /// Date header, free-form.
    pub timestamp: String,
    /// Filenames of parts carrying one, in traversal order.
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// A decoded message: metadata plus the body selected for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEmail {
    pub metadata: EmailMetadata,
    /// `None` when a multipart message has no text/plain part.
    pub body: Option<String>,
}
