//! Built-in demo message and the entities a correct extraction should find.

use std::time::{Duration, SystemTime};

use lettre::Message;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};

use crate::analysis::types::{Entities, NOT_FOUND};
use crate::error::SampleError;

const SENDER: &str = "customer@example.com";
const RECIPIENT: &str = "bank@example.com";
const SUBJECT: &str = "Urgent: Unauthorized Transaction";

/// 2024-07-24T10:00:00Z.
const SENT_AT_UNIX: u64 = 1_721_815_200;
/// Date header value as written to the sample file.
const SENT_AT: &str = "2024-07-24T10:00:00";

const BODY: &str = "\
Dear Bank Support,

I am writing to report an unauthorized transaction on my account.  \
The transaction was for $1000 on July 23, 2024, and I do not recognize it. \
My account number is 1234567890. Please investigate this issue immediately.

Sincerely,
John Smith
Phone: 555-123-4567
";

pub const ATTACHMENT_NAME: &str = "document.txt";
const ATTACHMENT_BODY: &[u8] = b"This is a dummy attachment.";

/// A fraud report with a plain-text body and one text attachment.
pub fn sample_email() -> Result<Vec<u8>, SampleError> {
    let message = Message::builder()
        .from(mailbox(SENDER)?)
        .to(mailbox(RECIPIENT)?)
        .subject(SUBJECT)
        .date(SystemTime::UNIX_EPOCH + Duration::from_secs(SENT_AT_UNIX))
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(BODY.to_string()))
                .singlepart(
                    Attachment::new(ATTACHMENT_NAME.to_string())
                        .body(ATTACHMENT_BODY.to_vec(), ContentType::TEXT_PLAIN),
                ),
        )
        .map_err(|e| SampleError::Build(e.to_string()))?;

    replace_date_header(&message.formatted(), SENT_AT)
}

/// Swap the value of the `Date` header, which the builder only writes in
/// RFC 2822 form.
fn replace_date_header(formatted: &[u8], value: &str) -> Result<Vec<u8>, SampleError> {
    let header_end = formatted
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| SampleError::Build("message has no header block".into()))?;
    let (headers, rest) = formatted.split_at(header_end);

    let mut out = Vec::with_capacity(formatted.len());
    let mut replaced = false;
    let mut in_date = false;
    for line in headers.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let continuation = line.starts_with(b" ") || line.starts_with(b"\t");
        if in_date && continuation {
            continue;
        }
        in_date = line.starts_with(b"Date:");
        if in_date {
            out.extend_from_slice(b"Date: ");
            out.extend_from_slice(value.as_bytes());
            replaced = true;
        } else {
            out.extend_from_slice(line);
        }
        out.extend_from_slice(b"\r\n");
    }
    if !replaced {
        return Err(SampleError::Build("message has no Date header".into()));
    }
    // `rest` starts with the CRLF pair that closes the header block.
    out.extend_from_slice(&rest[2..]);
    Ok(out)
}

/// What an accurate extractor returns for [`sample_email`].
pub fn sample_expected_entities() -> Entities {
    [
        ("Account Number", "1234567890"),
        ("Transaction ID", NOT_FOUND),
        ("Customer Name", "John Smith"),
        ("Phone Number", "555-123-4567"),
        ("Email Address", SENDER),
        ("Date", SENT_AT),
        ("Amount", "1000"),
        ("Product Type", NOT_FOUND),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn mailbox(address: &str) -> Result<Mailbox, SampleError> {
    address.parse().map_err(|e: lettre::address::AddressError| SampleError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}
