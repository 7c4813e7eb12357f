//! Inbound mail: where messages come from and how they are decoded.
//!
//! A [`MessageSource`] yields [`RawMessage`]s; [`parse_email`] turns each into
//! [`ParsedEmail`] metadata plus a body, which [`clean_content`] prepares for
//! analysis.

pub mod normalize;
pub mod parser;
pub mod sample;
pub mod source;
pub mod types;

pub use normalize::clean_content;
pub use parser::parse_email;
pub use sample::{sample_email, sample_expected_entities};
pub use source::{DirectorySource, MessageSource, RawMessage};
pub use types::{EmailMetadata, MISSING_HEADER, ParsedEmail};
