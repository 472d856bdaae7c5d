use std::fmt::Write;
use std::str::FromStr;

use thiserror::Error;

/// Header prepended to every wrapped (TCP) frame.
pub const WRAP_HEADER: [u8; 2] = [0xEB, 0x90];

/// Offset of the length byte inside a stored payload; the baked trailer covers
/// everything from here up to (not including) the last byte.
const TRAILER_START: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("payload too large for wrapped frame: {0} bytes (max 255)")]
    PayloadTooLarge(usize),
    // replies are opaque today; kept for devices with a strict ack schema
    #[allow(dead_code)]
    #[error("malformed reply: {0}")]
    MalformedReply(String),
    #[error("payload too short to carry a trailer: {0} bytes")]
    Truncated(usize),
    #[error("trailer mismatch: expected {expected:02X}, found {found:02X}")]
    BadTrailer { expected: u8, found: u8 },
}

/// How a stored payload goes on the wire. Fixed per link, never inferred from bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Payload bytes as stored (serial).
    Raw,
    /// `EB 90 <len>` + payload + `sum(payload) & 0xFF` (TCP).
    Wrapped,
}

impl Framing {
    pub fn as_str(self) -> &'static str {
        match self {
            Framing::Raw => "raw",
            Framing::Wrapped => "wrapped",
        }
    }
}

impl FromStr for Framing {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Framing::Raw),
            "wrapped" => Ok(Framing::Wrapped),
            _ => Err(format!("framing must be 'raw' or 'wrapped', got '{s}'")),
        }
    }
}

/// Low byte of the sum of `bytes`.
pub fn sum8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

pub fn encode(payload: &[u8], framing: Framing) -> Result<Vec<u8>, FrameError> {
    match framing {
        Framing::Raw => Ok(payload.to_vec()),
        Framing::Wrapped => {
            let len = u8::try_from(payload.len())
                .map_err(|_| FrameError::PayloadTooLarge(payload.len()))?;
            let mut out = Vec::with_capacity(payload.len() + 4);
            out.extend_from_slice(&WRAP_HEADER);
            out.push(len);
            out.extend_from_slice(payload);
            out.push(sum8(payload));
            Ok(out)
        }
    }
}

/// Replies are opaque device acks. An empty reply is fine; whatever came back
/// is handed through untouched.
pub fn validate_reply(bytes: Vec<u8>) -> Result<Vec<u8>, FrameError> {
    Ok(bytes)
}

/// XOR of the bytes from the length byte to the one before the trailer.
pub fn trailer_checksum(payload: &[u8]) -> Result<u8, FrameError> {
    if payload.len() <= TRAILER_START {
        return Err(FrameError::Truncated(payload.len()));
    }
    Ok(payload[TRAILER_START..payload.len() - 1]
        .iter()
        .fold(0u8, |acc, b| acc ^ b))
}

/// Checks the pre-baked trailer byte of a stored payload.
pub fn verify_trailer(payload: &[u8]) -> Result<(), FrameError> {
    let expected = trailer_checksum(payload)?;
    let found = payload[payload.len() - 1];
    if expected != found {
        return Err(FrameError::BadTrailer { expected, found });
    }
    Ok(())
}

/// Upper-case hex, space separated. Empty input renders as `-`.
pub fn to_hex(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "-".to_string();
    }
    let mut s = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            s.push(' ');
        }
        let _ = write!(s, "{:02X}", b);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT_BODY: [u8; 19] = [
        0x55, 0xAA, 0xDC, 0x11, 0x30, 0x01, 0xF8, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn raw_is_passthrough() {
        let out = encode(&LEFT_BODY, Framing::Raw).unwrap();
        assert_eq!(out, LEFT_BODY.to_vec());
    }

    #[test]
    fn wrapped_left_body() {
        let out = encode(&LEFT_BODY, Framing::Wrapped).unwrap();
        assert_eq!(out.len(), 19 + 4);
        assert_eq!(&out[..3], &[0xEB, 0x90, 0x13]);
        assert_eq!(&out[3..22], &LEFT_BODY);
        assert_eq!(out[22], 0x45);
    }

    #[test]
    fn wrapped_shape_holds_across_lengths() {
        for len in [0usize, 1, 7, 20, 128, 255] {
            let payload: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
            let out = encode(&payload, Framing::Wrapped).unwrap();
            assert_eq!(out.len(), len + 4);
            assert_eq!(out[0], 0xEB);
            assert_eq!(out[1], 0x90);
            assert_eq!(out[2] as usize, len);
            let expected = (payload.iter().map(|b| *b as u32).sum::<u32>() % 256) as u8;
            assert_eq!(*out.last().unwrap(), expected);
        }
    }

    #[test]
    fn checksum_ignores_header() {
        let out = encode(&[0x01, 0x02], Framing::Wrapped).unwrap();
        assert_eq!(out, vec![0xEB, 0x90, 0x02, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn wrapped_rejects_oversized_payload() {
        let payload = vec![0u8; 256];
        assert_eq!(
            encode(&payload, Framing::Wrapped),
            Err(FrameError::PayloadTooLarge(256))
        );
        // raw framing has no length byte to overflow
        assert_eq!(encode(&payload, Framing::Raw).unwrap().len(), 256);
    }

    #[test]
    fn empty_reply_is_not_an_error() {
        assert_eq!(validate_reply(Vec::new()).unwrap(), Vec::<u8>::new());
        assert_eq!(validate_reply(vec![0xAB, 0xCD]).unwrap(), vec![0xAB, 0xCD]);
    }

    #[test]
    fn trailer_check() {
        let mut left = LEFT_BODY.to_vec();
        left.push(0xE8);
        assert_eq!(trailer_checksum(&left).unwrap(), 0xE8);
        assert!(verify_trailer(&left).is_ok());

        *left.last_mut().unwrap() = 0x00;
        assert_eq!(
            verify_trailer(&left),
            Err(FrameError::BadTrailer {
                expected: 0xE8,
                found: 0x00
            })
        );
        assert_eq!(verify_trailer(&[0x55, 0xAA]), Err(FrameError::Truncated(2)));
    }

    #[test]
    fn framing_from_str() {
        assert_eq!("RAW".parse::<Framing>().unwrap(), Framing::Raw);
        assert_eq!("wrapped".parse::<Framing>().unwrap(), Framing::Wrapped);
        assert!("tcp".parse::<Framing>().is_err());
    }

    #[test]
    fn hex_rendering() {
        assert_eq!(to_hex(&[]), "-");
        assert_eq!(to_hex(&[0x0A, 0xFF, 0x00]), "0A FF 00");
    }
}
