//! Chain Event Decoders (C15, spec §4.15/§6).
//!
//! Solana program logs are a different wire format from the teacher's
//! `parity-scale-codec` (a length-prefixed, type-aware SCALE encoding);
//! this is a flat, fixed-width little-endian layout, so it's decoded with
//! plain manual reads rather than a derive macro, the way every
//! Solana-log decoder in the pack (e.g. `chainflip-backend`'s
//! `sol_deposits`) handles raw account/log bytes.

use hub_types::EventType;

pub const OUTBOUND_LAYOUT_LEN: usize = 4 + 4 + 32 + 32 + 32 + 32 + 8 + 8 + 32;
pub const OVERRIDE_OUTBOUND_LAYOUT_LEN: usize = 32 + 8 + 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundPayload {
    pub network_in: u32,
    pub network_out: u32,
    pub token_in: [u8; 32],
    pub token_out: [u8; 32],
    pub from: [u8; 32],
    pub to: [u8; 32],
    pub amount: u64,
    pub relayer_fee: u64,
    pub nonce: [u8; 32],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverrideOutboundPayload {
    pub to: [u8; 32],
    pub relayer_fee: u64,
    pub nonce: [u8; 32],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedEvent {
    Inbound(OutboundPayload),
    Outbound(OutboundPayload),
    OverrideOutbound(OverrideOutboundPayload),
}

impl DecodedEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            DecodedEvent::Inbound(_) => EventType::Inbound,
            DecodedEvent::Outbound(_) => EventType::Outbound,
            DecodedEvent::OverrideOutbound(_) => EventType::OverrideOutbound,
        }
    }

    /// The 32-byte nonce, surfaced externally as lowercase hex32 (spec §6).
    pub fn nonce_hex(&self) -> String {
        match self {
            DecodedEvent::Inbound(p) | DecodedEvent::Outbound(p) => hex::encode(p.nonce),
            DecodedEvent::OverrideOutbound(p) => hex::encode(p.nonce),
        }
    }
}

/// Strips a `Program data: <base64>` log line prefix and decodes the
/// remaining bytes. Returns `None` on an unknown discriminator or a
/// buffer too short for its declared layout — both are silent skips
/// (spec §4.15 step 4), never errors.
pub fn decode_program_data_line(line: &str) -> Option<DecodedEvent> {
    let encoded = line.strip_prefix("Program data: ")?;
    let bytes = base64_decode(encoded)?;
    decode_bytes(&bytes)
}

pub fn decode_bytes(bytes: &[u8]) -> Option<DecodedEvent> {
    let (&discriminator, rest) = bytes.split_first()?;
    match discriminator {
        0 => decode_outbound_layout(rest).map(DecodedEvent::Inbound),
        1 => decode_outbound_layout(rest).map(DecodedEvent::Outbound),
        2 => decode_override_outbound_layout(rest).map(DecodedEvent::OverrideOutbound),
        _ => None,
    }
}

fn decode_outbound_layout(bytes: &[u8]) -> Option<OutboundPayload> {
    if bytes.len() < OUTBOUND_LAYOUT_LEN {
        return None;
    }
    let mut cursor = Cursor::new(bytes);
    Some(OutboundPayload {
        network_in: cursor.read_u32()?,
        network_out: cursor.read_u32()?,
        token_in: cursor.read_bytes32()?,
        token_out: cursor.read_bytes32()?,
        from: cursor.read_bytes32()?,
        to: cursor.read_bytes32()?,
        amount: cursor.read_u64()?,
        relayer_fee: cursor.read_u64()?,
        nonce: cursor.read_bytes32()?,
    })
}

fn decode_override_outbound_layout(bytes: &[u8]) -> Option<OverrideOutboundPayload> {
    if bytes.len() < OVERRIDE_OUTBOUND_LAYOUT_LEN {
        return None;
    }
    let mut cursor = Cursor::new(bytes);
    Some(OverrideOutboundPayload {
        to: cursor.read_bytes32()?,
        relayer_fee: cursor.read_u64()?,
        nonce: cursor.read_bytes32()?,
    })
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_u32(&mut self) -> Option<u32> {
        let slice: [u8; 4] = self.bytes.get(self.pos..self.pos + 4)?.try_into().ok()?;
        self.pos += 4;
        Some(u32::from_le_bytes(slice))
    }

    fn read_u64(&mut self) -> Option<u64> {
        let slice: [u8; 8] = self.bytes.get(self.pos..self.pos + 8)?.try_into().ok()?;
        self.pos += 8;
        Some(u64::from_le_bytes(slice))
    }

    fn read_bytes32(&mut self) -> Option<[u8; 32]> {
        let slice: [u8; 32] = self.bytes.get(self.pos..self.pos + 32)?.try_into().ok()?;
        self.pos += 32;
        Some(slice)
    }
}

fn base64_decode(s: &str) -> Option<Vec<u8>> {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    STANDARD.decode(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_outbound_bytes(discriminator: u8) -> Vec<u8> {
        let mut bytes = vec![discriminator];
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&9u32.to_le_bytes());
        bytes.extend_from_slice(&[1u8; 32]);
        bytes.extend_from_slice(&[2u8; 32]);
        bytes.extend_from_slice(&[3u8; 32]);
        bytes.extend_from_slice(&[4u8; 32]);
        bytes.extend_from_slice(&1_000u64.to_le_bytes());
        bytes.extend_from_slice(&5u64.to_le_bytes());
        bytes.extend_from_slice(&[9u8; 32]);
        bytes
    }

    #[test]
    fn decodes_outbound_discriminator_one() {
        let bytes = sample_outbound_bytes(1);
        let decoded = decode_bytes(&bytes).unwrap();
        match decoded {
            DecodedEvent::Outbound(p) => {
                assert_eq!(p.network_in, 7);
                assert_eq!(p.network_out, 9);
                assert_eq!(p.amount, 1_000);
                assert_eq!(p.relayer_fee, 5);
            }
            other => panic!("expected Outbound, got {other:?}"),
        }
    }

    #[test]
    fn decodes_inbound_discriminator_zero_with_same_layout() {
        let bytes = sample_outbound_bytes(0);
        assert!(matches!(decode_bytes(&bytes), Some(DecodedEvent::Inbound(_))));
    }

    #[test]
    fn decodes_override_outbound_discriminator_two() {
        let mut bytes = vec![2u8];
        bytes.extend_from_slice(&[7u8; 32]);
        bytes.extend_from_slice(&42u64.to_le_bytes());
        bytes.extend_from_slice(&[8u8; 32]);
        let decoded = decode_bytes(&bytes).unwrap();
        match decoded {
            DecodedEvent::OverrideOutbound(p) => assert_eq!(p.relayer_fee, 42),
            other => panic!("expected OverrideOutbound, got {other:?}"),
        }
    }

    #[test]
    fn unknown_discriminator_returns_none() {
        let bytes = vec![99u8; 200];
        assert!(decode_bytes(&bytes).is_none());
    }

    #[test]
    fn short_buffer_returns_none_instead_of_panicking() {
        let bytes = vec![1u8; 10];
        assert!(decode_bytes(&bytes).is_none());
    }

    #[test]
    fn nonce_surfaces_as_lowercase_hex32() {
        let bytes = sample_outbound_bytes(1);
        let decoded = decode_bytes(&bytes).unwrap();
        let nonce = decoded.nonce_hex();
        assert_eq!(nonce.len(), 64);
        assert_eq!(nonce, nonce.to_lowercase());
    }

    #[test]
    fn strips_program_data_prefix_and_base64_decodes() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};
        let bytes = sample_outbound_bytes(1);
        let line = format!("Program data: {}", STANDARD.encode(&bytes));
        assert!(decode_program_data_line(&line).is_some());
        assert!(decode_program_data_line("not a program data line").is_none());
    }
}
