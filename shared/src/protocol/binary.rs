//! Length-prefixed binary frame
//!
//! Layout: three little-endian u16 byte lengths (name, profile, stack, in
//! that order) followed by the three fields' UTF-8 bytes concatenated in
//! the same order. Total size = 6 + sum of field lengths. The collector
//! reads the header and slices the rest without any further framing.

use bytes::{Buf, BufMut, BytesMut};

use super::WireError;
use crate::types::event::TraceEvent;

/// Byte length of the three-u16 header.
pub const HEADER_LEN: usize = 6;

fn field_len(field: &'static str, s: &str) -> Result<u16, WireError> {
    u16::try_from(s.len()).map_err(|_| WireError::FieldTooLong {
        field,
        len: s.len(),
    })
}

pub(super) fn encode(event: &TraceEvent) -> Result<Vec<u8>, WireError> {
    let name_len = field_len("name", &event.name)?;
    let profile_len = field_len("profile", &event.profile)?;
    let stack_len = field_len("stack", &event.stack)?;

    let total = HEADER_LEN + event.name.len() + event.profile.len() + event.stack.len();
    let mut buf = BytesMut::with_capacity(total);
    buf.put_u16_le(name_len);
    buf.put_u16_le(profile_len);
    buf.put_u16_le(stack_len);
    buf.put_slice(event.name.as_bytes());
    buf.put_slice(event.profile.as_bytes());
    buf.put_slice(event.stack.as_bytes());
    Ok(buf.to_vec())
}

pub(super) fn decode(frame: &[u8]) -> Result<TraceEvent, WireError> {
    if frame.len() < HEADER_LEN {
        return Err(WireError::MissingHeader(HEADER_LEN));
    }

    let mut header = &frame[..HEADER_LEN];
    let name_len = header.get_u16_le() as usize;
    let profile_len = header.get_u16_le() as usize;
    let stack_len = header.get_u16_le() as usize;

    let expected = HEADER_LEN + name_len + profile_len + stack_len;
    if frame.len() != expected {
        return Err(WireError::Truncated {
            expected,
            actual: frame.len(),
        });
    }

    let body = &frame[HEADER_LEN..];
    let (name, rest) = body.split_at(name_len);
    let (profile, stack) = rest.split_at(profile_len);

    Ok(TraceEvent {
        name: utf8_field("name", name)?,
        profile: utf8_field("profile", profile)?,
        stack: utf8_field("stack", stack)?,
    })
}

fn utf8_field(field: &'static str, bytes: &[u8]) -> Result<String, WireError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8 { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, profile: &str, stack: &str) -> TraceEvent {
        TraceEvent {
            name: name.to_string(),
            profile: profile.to_string(),
            stack: stack.to_string(),
        }
    }

    #[test]
    fn test_known_frame_layout() {
        let frame = encode(&event("A", "BB", "CCC")).unwrap();
        assert_eq!(
            frame,
            [
                0x01, 0x00, 0x02, 0x00, 0x03, 0x00, b'A', b'B', b'B', b'C', b'C', b'C'
            ]
        );
        assert_eq!(frame.len(), 12);
    }

    #[test]
    fn test_roundtrip_ascii() {
        let original = event("Game.Server::Tick", "64, true, null", "at Game.Loop::Run");
        let decoded = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_roundtrip_unicode() {
        let original = event("Hráč::Připojit", "jméno=Čeněk, 生命=100", "ve vlákně hlavním");
        let decoded = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_roundtrip_empty_fields() {
        let original = event("", "", "");
        let frame = encode(&original).unwrap();
        assert_eq!(frame, [0u8; HEADER_LEN]);
        assert_eq!(decode(&frame).unwrap(), original);
    }

    #[test]
    fn test_roundtrip_max_length_field() {
        let original = event(&"x".repeat(u16::MAX as usize), "", "");
        let decoded = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(decoded.name.len(), u16::MAX as usize);
    }

    #[test]
    fn test_field_over_limit_rejected() {
        let too_long = event(&"x".repeat(u16::MAX as usize + 1), "", "");
        assert!(matches!(
            encode(&too_long),
            Err(WireError::FieldTooLong { field: "name", .. })
        ));
    }

    #[test]
    fn test_decode_short_header() {
        assert!(matches!(
            decode(&[0x01, 0x00]),
            Err(WireError::MissingHeader(_))
        ));
    }

    #[test]
    fn test_decode_length_mismatch() {
        let mut frame = encode(&event("A", "BB", "CCC")).unwrap();
        frame.pop();
        assert!(matches!(decode(&frame), Err(WireError::Truncated { .. })));

        frame.push(b'C');
        frame.push(b'!');
        assert!(matches!(decode(&frame), Err(WireError::Truncated { .. })));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let mut frame = vec![0x02, 0x00, 0x00, 0x00, 0x00, 0x00];
        frame.extend_from_slice(&[0xFF, 0xFE]);
        assert!(matches!(
            decode(&frame),
            Err(WireError::InvalidUtf8 { field: "name" })
        ));
    }
}
