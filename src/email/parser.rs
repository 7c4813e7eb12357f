//! Raw message decoding: metadata, attachment names and the text body.
//!
//! Body selection:
//! - multipart: the first `text/plain` part in depth-first order (embedded
//!   `message/rfc822` messages are descended into); none → no body
//! - single part: the payload, whatever its type
//!
//! Payloads are decoded as UTF-8 with invalid sequences replaced. Input whose
//! first line is not a header line has no header block at all: every header
//! reads as missing and the whole input is the body.

use mail_parser::{
    Addr, Address, HeaderName, Message, MessageParser, MessagePart, MimeHeaders, PartType,
};

use crate::email::types::{EmailMetadata, MISSING_HEADER, ParsedEmail};
use crate::error::ParseError;

/// Decode a raw RFC 5322 message.
pub fn parse_email(raw: &[u8]) -> Result<ParsedEmail, ParseError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::Empty);
    }
    if !starts_with_header_block(raw) {
        return Ok(headerless(raw));
    }
    let message = MessageParser::default()
        .parse(raw)
        .ok_or(ParseError::Malformed)?;
    if message.parts.is_empty() {
        return Err(ParseError::Malformed);
    }

    let parts = walk(&message);
    let multipart = is_multipart(&message);

    let attachments = if multipart {
        parts
            .iter()
            .filter_map(|part| MimeHeaders::attachment_name(*part))
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    let body = if multipart {
        parts
            .iter()
            .find(|part| is_plain_text(part))
            .map(|part| decode(part))
    } else {
        message.parts.first().map(decode)
    };

    let metadata = EmailMetadata {
        sender: sender(&message),
        subject: message
            .subject()
            .map(str::to_string)
            .unwrap_or_else(|| MISSING_HEADER.to_string()),
        timestamp: raw_header(&message, HeaderName::Date),
        attachments,
    };

    Ok(ParsedEmail { metadata, body })
}

/// Whether the first line opens a header block: a `name:` field, a folded
/// continuation, an mbox `From ` line, or the blank separator itself.
fn starts_with_header_block(raw: &[u8]) -> bool {
    let first = raw.split(|&b| b == b'\n').next().unwrap_or_default();
    let first = first.strip_suffix(b"\r").unwrap_or(first);
    if first.is_empty()
        || first.starts_with(b"From ")
        || first.starts_with(b" ")
        || first.starts_with(b"\t")
    {
        return true;
    }
    let name_len = first
        .iter()
        .take_while(|&&b| b.is_ascii_graphic() && b != b':')
        .count();
    first.get(name_len) == Some(&b':')
}

fn headerless(raw: &[u8]) -> ParsedEmail {
    ParsedEmail {
        metadata: EmailMetadata {
            sender: MISSING_HEADER.to_string(),
            subject: MISSING_HEADER.to_string(),
            timestamp: MISSING_HEADER.to_string(),
            attachments: Vec::new(),
        },
        body: Some(String::from_utf8_lossy(raw).into_owned()),
    }
}

/// Every part in depth-first order, including parts of embedded messages.
fn walk<'a, 'x>(message: &'a Message<'x>) -> Vec<&'a MessagePart<'x>> {
    let mut out = Vec::with_capacity(message.parts.len());
    collect_parts(message, &mut out);
    out
}

fn collect_parts<'a, 'x>(message: &'a Message<'x>, out: &mut Vec<&'a MessagePart<'x>>) {
    for part in &message.parts {
        out.push(part);
        if let PartType::Message(inner) = &part.body {
            collect_parts(inner, out);
        }
    }
}

fn is_multipart(message: &Message<'_>) -> bool {
    matches!(
        message.parts.first().map(|p| &p.body),
        Some(PartType::Multipart(_))
    )
}

/// A leaf part declared as (or defaulting to) text/plain.
fn is_plain_text(part: &MessagePart<'_>) -> bool {
    if matches!(part.body, PartType::Multipart(_) | PartType::Message(_)) {
        return false;
    }
    match MimeHeaders::content_type(part) {
        None => true,
        Some(ct) => {
            ct.ctype().eq_ignore_ascii_case("text")
                && ct.subtype().is_some_and(|s| s.eq_ignore_ascii_case("plain"))
        }
    }
}

fn decode(part: &MessagePart<'_>) -> String {
    String::from_utf8_lossy(part.contents()).into_owned()
}

/// The From header rendered as `Name <address>` entries joined by ", ".
fn sender(message: &Message<'_>) -> String {
    let rendered = message.from().map(render_address).unwrap_or_default();
    if rendered.is_empty() {
        raw_header(message, HeaderName::From)
    } else {
        rendered
    }
}

fn render_address(address: &Address<'_>) -> String {
    let addrs: Vec<&Addr<'_>> = match address {
        Address::List(list) => list.iter().collect(),
        Address::Group(groups) => groups.iter().flat_map(|g| g.addresses.iter()).collect(),
    };
    addrs
        .into_iter()
        .filter_map(render_addr)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_addr(addr: &Addr<'_>) -> Option<String> {
    match (addr.name.as_deref(), addr.address.as_deref()) {
        (Some(name), Some(address)) if !name.is_empty() => Some(format!("{name} <{address}>")),
        (_, Some(address)) => Some(address.to_string()),
        (Some(name), None) if !name.is_empty() => Some(name.to_string()),
        _ => None,
    }
}

/// Unfolded header text, or [`MISSING_HEADER`].
fn raw_header(message: &Message<'_>, name: HeaderName<'static>) -> String {
    match message.header_raw(name) {
        Some(value) => value.replace("\r\n", "").replace('\n', "").trim().to_string(),
        None => MISSING_HEADER.to_string(),
    }
}
