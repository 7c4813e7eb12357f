//! Fixed label vocabularies for classification, intent, sentiment and entities.
//!
//! The completion capability answers in free text. Responses are parsed into
//! tagged variants; anything outside the vocabulary becomes `Unrecognized`
//! carrying the trimmed response, which still renders as that string.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How strictly a capability response must match a vocabulary label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelMatching {
    /// The trimmed response must equal a label exactly.
    #[default]
    Exact,
    /// Case-insensitive, ignoring quotes, emphasis, trailing periods and a
    /// leading `Label:` prefix.
    Relaxed,
}

impl std::str::FromStr for LabelMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "relaxed" => Ok(Self::Relaxed),
            other => Err(format!("unknown label matching '{other}' (expected exact or relaxed)")),
        }
    }
}

/// Find the vocabulary label a response refers to.
fn match_label(raw: &str, labels: &[&'static str], matching: LabelMatching) -> Option<&'static str> {
    let trimmed = raw.trim();
    if let Some(label) = labels.iter().find(|l| **l == trimmed) {
        return Some(*label);
    }
    if matching == LabelMatching::Exact {
        return None;
    }

    let candidate = trimmed.rsplit(':').next().unwrap_or(trimmed);
    let candidate = candidate
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`' | '.') || c.is_whitespace());
    labels
        .iter()
        .find(|l| l.eq_ignore_ascii_case(candidate))
        .copied()
}

macro_rules! label_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            /// A response outside the vocabulary, kept verbatim (trimmed).
            Unrecognized(String),
        }

        impl $name {
            /// Every label of the vocabulary, in prompt order.
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            /// The label text, or the raw response for `Unrecognized`.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Unrecognized(raw) => raw,
                }
            }

            /// Look up a label exactly.
            pub fn from_label(label: &str) -> Option<Self> {
                match label {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Parse a capability response.
            pub fn parse(raw: &str, matching: LabelMatching) -> Self {
                match match_label(raw, Self::LABELS, matching).and_then(Self::from_label) {
                    Some(value) => value,
                    None => Self::Unrecognized(raw.trim().to_string()),
                }
            }

            pub fn is_recognized(&self) -> bool {
                !matches!(self, Self::Unrecognized(_))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::parse(&raw, LabelMatching::Exact))
            }
        }
    };
}

label_enum! {
    /// What the email is about; drives the routing table.
    Category {
        AccountInquiry => "Account Inquiry",
        TransactionDispute => "Transaction Dispute",
        LoanApplication => "Loan Application",
        MortgageInquiry => "Mortgage Inquiry",
        FraudReport => "Fraud Report",
        ServiceRequest => "Service Request",
        Complaint => "Complaint",
        Feedback => "Feedback",
        GeneralInquiry => "General Inquiry",
    }
}

label_enum! {
    /// The sender's primary purpose.
    Intent {
        RequestInformation => "Request Information",
        ReportProblem => "Report a Problem",
        ApplyForService => "Apply for a Service",
        ProvideFeedback => "Provide Feedback",
        SeekHelp => "Seek Help",
    }
}

label_enum! {
    /// Tone of the email.
    Sentiment {
        Positive => "Positive",
        Negative => "Negative",
        Neutral => "Neutral",
    }
}

impl Category {
    /// Used when classification fails.
    pub fn fallback() -> Self {
        Self::GeneralInquiry
    }
}

impl Intent {
    /// Used when intent recognition fails.
    ///
    /// This is the category label "General Inquiry", not an intent label.
    /// Downstream consumers have always received this value on failure, so it
    /// is kept as is.
    pub fn fallback() -> Self {
        Self::Unrecognized("General Inquiry".to_string())
    }
}

impl Sentiment {
    /// Used when sentiment analysis fails.
    pub fn fallback() -> Self {
        Self::Neutral
    }
}

/// Data points the extraction prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    AccountNumber,
    TransactionId,
    CustomerName,
    PhoneNumber,
    EmailAddress,
    Date,
    Amount,
    ProductType,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        Self::AccountNumber,
        Self::TransactionId,
        Self::CustomerName,
        Self::PhoneNumber,
        Self::EmailAddress,
        Self::Date,
        Self::Amount,
        Self::ProductType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountNumber => "Account Number",
            Self::TransactionId => "Transaction ID",
            Self::CustomerName => "Customer Name",
            Self::PhoneNumber => "Phone Number",
            Self::EmailAddress => "Email Address",
            Self::Date => "Date",
            Self::Amount => "Amount",
            Self::ProductType => "Product Type",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
