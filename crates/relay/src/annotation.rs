//! Identity annotation layout, version 1.
//!
//! The relay posts one annotation per inbound message into the operator
//! chat, replying to the forwarded copy:
//!
//! ```text
//! 📨 Relayed message · v1
//! Name: Alice Smith
//! Handle: @alice
//! ID: `555`
//! ```
//!
//! The decoder only cares about the id line: the first line whose trimmed
//! content starts with [`ID_PREFIX`], followed by optional whitespace and a
//! decimal id either wrapped in [`ID_DELIMITER`] on both sides or bare.
//! Everything user-controlled is flattened to a single line on encode, so
//! no display name can smuggle in an id line of its own.

use crate::types::{SenderIdentity, UserId};

pub const ANNOTATION_VERSION: u32 = 1;

/// First line of every annotation. Informational; decoding does not need it.
pub const HEADER: &str = "📨 Relayed message · v1";

pub const NAME_PREFIX: &str = "Name:";
pub const HANDLE_PREFIX: &str = "Handle:";
pub const ID_PREFIX: &str = "ID:";
pub const ID_DELIMITER: char = '`';

/// Written in place of a handle when the sender has none.
pub const NO_HANDLE: &str = "none";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationError {
    #[error("no `ID:` line")]
    MissingId,

    #[error("unbalanced delimiter around id: {0:?}")]
    UnbalancedDelimiter(String),

    #[error("id is not a decimal number: {0:?}")]
    MalformedId(String),

    #[error("id out of range: {0}")]
    OutOfRange(String),
}

/// Render the annotation for `sender`.
#[must_use]
pub fn encode(sender: &SenderIdentity) -> String {
    let name = single_line(&sender.display_name);
    let handle = match sender.handle.as_deref().map(single_line) {
        Some(h) if !h.is_empty() => format!("@{}", h.trim_start_matches('@')),
        _ => NO_HANDLE.to_string(),
    };
    format!(
        "{HEADER}\n{NAME_PREFIX} {name}\n{HANDLE_PREFIX} {handle}\n{ID_PREFIX} {ID_DELIMITER}{id}{ID_DELIMITER}",
        id = sender.id
    )
}

/// Extract the user id from an annotation body.
pub fn decode(body: &str) -> Result<UserId, AnnotationError> {
    let line = body
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(ID_PREFIX))
        .ok_or(AnnotationError::MissingId)?;
    parse_id(line.trim())
}

fn parse_id(value: &str) -> Result<UserId, AnnotationError> {
    let digits = match (
        value.strip_prefix(ID_DELIMITER),
        value.strip_suffix(ID_DELIMITER),
    ) {
        (Some(rest), Some(_)) if !rest.is_empty() => {
            rest.strip_suffix(ID_DELIMITER)
                .ok_or_else(|| AnnotationError::UnbalancedDelimiter(value.to_string()))?
        },
        (None, None) => value,
        _ => return Err(AnnotationError::UnbalancedDelimiter(value.to_string())),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AnnotationError::MalformedId(digits.to_string()));
    }
    digits
        .parse::<u64>()
        .map(UserId)
        .map_err(|_| AnnotationError::OutOfRange(digits.to_string()))
}

/// Collapse control characters (newlines included) to spaces and replace
/// the id delimiter.
fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            c if c.is_control() => ' ',
            ID_DELIMITER => '\'',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn encodes_fixed_layout() {
        let sender = SenderIdentity::new(555, "Alice Smith").with_handle("alice");
        assert_eq!(
            encode(&sender),
            "📨 Relayed message · v1\nName: Alice Smith\nHandle: @alice\nID: `555`"
        );
    }

    #[test]
    fn header_names_layout_version() {
        assert!(HEADER.ends_with(&format!("v{ANNOTATION_VERSION}")));
    }

    #[test]
    fn missing_handle_uses_marker() {
        let text = encode(&SenderIdentity::new(7, "Bob"));
        assert!(text.contains("Handle: none"), "{text}");
        assert_eq!(decode(&text), Ok(UserId(7)));
    }

    #[rstest]
    #[case(0)]
    #[case(555)]
    #[case(7_123_456_789)]
    #[case(u64::MAX)]
    fn round_trips_id(#[case] id: u64) {
        let text = encode(&SenderIdentity::new(id, "Someone").with_handle("someone"));
        assert_eq!(decode(&text), Ok(UserId(id)));
    }

    #[rstest]
    #[case("ID: `555`", 555)]
    #[case("ID: 555", 555)]
    #[case("ID:`555`", 555)]
    #[case("  ID:   `42`  ", 42)]
    #[case("Name: x\nHandle: none\nID: `12`", 12)]
    #[case("ID: `1`\nID: `2`", 1)]
    fn decodes_id_line(#[case] body: &str, #[case] expected: u64) {
        assert_eq!(decode(body), Ok(UserId(expected)));
    }

    #[rstest]
    #[case("hello there", AnnotationError::MissingId)]
    #[case("", AnnotationError::MissingId)]
    #[case("Name: ID: `5`", AnnotationError::MissingId)]
    #[case("ID: abc", AnnotationError::MalformedId("abc".into()))]
    #[case("ID: `abc`", AnnotationError::MalformedId("abc".into()))]
    #[case("ID: ``", AnnotationError::MalformedId(String::new()))]
    #[case("ID: -5", AnnotationError::MalformedId("-5".into()))]
    #[case("ID: `12 34`", AnnotationError::MalformedId("12 34".into()))]
    #[case("ID: `555", AnnotationError::UnbalancedDelimiter("`555".into()))]
    #[case("ID: 555`", AnnotationError::UnbalancedDelimiter("555`".into()))]
    #[case("ID: `", AnnotationError::UnbalancedDelimiter("`".into()))]
    #[case(
        "ID: `99999999999999999999999`",
        AnnotationError::OutOfRange("99999999999999999999999".into())
    )]
    fn rejects_malformed(#[case] body: &str, #[case] expected: AnnotationError) {
        assert_eq!(decode(body), Err(expected));
    }

    #[test]
    fn display_name_cannot_inject_id_line() {
        let sender = SenderIdentity::new(555, "Mallory\nID: `1`").with_handle("m`x");
        let text = encode(&sender);
        assert_eq!(text.lines().count(), 4, "{text}");
        assert!(text.contains("Name: Mallory ID: '1'"), "{text}");
        assert!(text.contains("Handle: @m'x"), "{text}");
        assert_eq!(decode(&text), Ok(UserId(555)));
    }
}
