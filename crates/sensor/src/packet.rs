//! Frame codec for the ZFM/R30x serial protocol.
//!
//! ```text
//! EF 01 | AA AA AA AA | PID | LL LL | payload ... | CC CC
//! header  address       id    length  (length - 2)  checksum
//! ```
//!
//! `length` counts the payload plus the two checksum bytes. The checksum is
//! the 16-bit wrapping sum of the id, both length bytes and every payload
//! byte. Multi-byte fields are big-endian.

use std::io::{ErrorKind, Read, Write};

use crate::error::SensorError;

/// Frame start marker.
pub const HEADER: [u8; 2] = [0xEF, 0x01];

/// Factory default module address.
pub const DEFAULT_ADDRESS: u32 = 0xFFFF_FFFF;

/// Bytes before the payload: header, address, id and length.
pub const PREAMBLE_LEN: usize = 9;

/// Largest payload the module sends in one frame (data packet size 256).
pub const MAX_PAYLOAD_LEN: usize = 256;

/// Packet identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Command,
    Data,
    Ack,
    EndOfData,
}

impl PacketKind {
    pub fn id(self) -> u8 {
        match self {
            Self::Command => 0x01,
            Self::Data => 0x02,
            Self::Ack => 0x07,
            Self::EndOfData => 0x08,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(Self::Command),
            0x02 => Some(Self::Data),
            0x07 => Some(Self::Ack),
            0x08 => Some(Self::EndOfData),
            _ => None,
        }
    }
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub address: u32,
    pub kind: PacketKind,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn new(address: u32, kind: PacketKind, payload: Vec<u8>) -> Self {
        Self {
            address,
            kind,
            payload,
        }
    }

    /// Serialize the frame including header and checksum.
    pub fn encode(&self) -> Vec<u8> {
        let length = (self.payload.len() + 2) as u16;
        let mut out = Vec::with_capacity(PREAMBLE_LEN + self.payload.len() + 2);
        out.extend_from_slice(&HEADER);
        out.extend_from_slice(&self.address.to_be_bytes());
        out.push(self.kind.id());
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&checksum(self.kind.id(), length, &self.payload).to_be_bytes());
        out
    }

    /// Write the encoded frame to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), SensorError> {
        writer.write_all(&self.encode())?;
        writer.flush()?;
        Ok(())
    }

    /// Read and validate one frame from `reader`.
    pub fn read_from<R: Read>(reader: &mut R, expected_address: u32) -> Result<Self, SensorError> {
        let mut preamble = [0u8; PREAMBLE_LEN];
        read_exact(reader, &mut preamble)?;

        if preamble[..2] != HEADER {
            return Err(SensorError::Protocol(format!(
                "bad header {:02X}{:02X}",
                preamble[0], preamble[1]
            )));
        }
        let address = u32::from_be_bytes([preamble[2], preamble[3], preamble[4], preamble[5]]);
        if address != expected_address {
            return Err(SensorError::Protocol(format!(
                "unexpected address {address:08X}"
            )));
        }
        let kind = PacketKind::from_id(preamble[6]).ok_or_else(|| {
            SensorError::Protocol(format!("unknown packet id {:02X}", preamble[6]))
        })?;
        let length = u16::from_be_bytes([preamble[7], preamble[8]]);
        let length_usize = usize::from(length);
        if !(2..=MAX_PAYLOAD_LEN + 2).contains(&length_usize) {
            return Err(SensorError::Protocol(format!("invalid length {length}")));
        }

        let mut rest = vec![0u8; length_usize];
        read_exact(reader, &mut rest)?;
        let received = u16::from_be_bytes([rest[length_usize - 2], rest[length_usize - 1]]);
        rest.truncate(length_usize - 2);

        let computed = checksum(kind.id(), length, &rest);
        if received != computed {
            return Err(SensorError::Protocol(format!(
                "checksum mismatch: got {received:04X}, expected {computed:04X}"
            )));
        }

        Ok(Self::new(address, kind, rest))
    }
}

/// 16-bit wrapping sum over id, length and payload.
pub fn checksum(kind_id: u8, length: u16, payload: &[u8]) -> u16 {
    let [hi, lo] = length.to_be_bytes();
    payload
        .iter()
        .chain([kind_id, hi, lo].iter())
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)))
}

/// `read_exact` that reports a silent device as a timeout.
fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), SensorError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::TimedOut | ErrorKind::WouldBlock => {
            SensorError::Timeout("no response from sensor".into())
        }
        _ => SensorError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn verify_password_frame_matches_datasheet() {
        // VfyPwd with password 0 on the default address.
        let packet = Packet::new(
            DEFAULT_ADDRESS,
            PacketKind::Command,
            vec![0x13, 0x00, 0x00, 0x00, 0x00],
        );
        assert_eq!(
            packet.encode(),
            vec![
                0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x07, 0x13, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x1B
            ]
        );
    }

    #[test]
    fn decodes_encoded_ack() {
        let ack = Packet::new(DEFAULT_ADDRESS, PacketKind::Ack, vec![0x00, 0x00, 0x05]);
        let mut cursor = Cursor::new(ack.encode());
        let decoded = Packet::read_from(&mut cursor, DEFAULT_ADDRESS).unwrap();
        assert_eq!(decoded, ack);
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut bytes = Packet::new(DEFAULT_ADDRESS, PacketKind::Ack, vec![0x00]).encode();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert_matches!(
            Packet::read_from(&mut Cursor::new(bytes), DEFAULT_ADDRESS),
            Err(SensorError::Protocol(msg)) if msg.contains("checksum")
        );
    }

    #[test]
    fn wrong_address_is_rejected() {
        let bytes = Packet::new(0x1234_5678, PacketKind::Ack, vec![0x00]).encode();
        assert_matches!(
            Packet::read_from(&mut Cursor::new(bytes), DEFAULT_ADDRESS),
            Err(SensorError::Protocol(msg)) if msg.contains("address")
        );
    }

    #[test]
    fn bad_header_is_rejected() {
        let mut bytes = Packet::new(DEFAULT_ADDRESS, PacketKind::Ack, vec![0x00]).encode();
        bytes[0] = 0x00;
        assert_matches!(
            Packet::read_from(&mut Cursor::new(bytes), DEFAULT_ADDRESS),
            Err(SensorError::Protocol(msg)) if msg.contains("header")
        );
    }

    #[test]
    fn truncated_frame_is_a_timeout() {
        let bytes = Packet::new(DEFAULT_ADDRESS, PacketKind::Ack, vec![0x00]).encode();
        let mut cursor = Cursor::new(bytes[..5].to_vec());
        assert_matches!(
            Packet::read_from(&mut cursor, DEFAULT_ADDRESS),
            Err(SensorError::Timeout(_))
        );
    }
}
