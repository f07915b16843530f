//! In-memory transport that replays scripted sensor replies.

use std::io::{Cursor, Read, Write};

use crate::packet::{Packet, PacketKind, DEFAULT_ADDRESS};

/// Replays `replies` on read and records everything written.
pub struct ScriptedTransport {
    input: Cursor<Vec<u8>>,
    pub written: Vec<u8>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Packet>) -> Self {
        let bytes = replies.iter().flat_map(Packet::encode).collect();
        Self {
            input: Cursor::new(bytes),
            written: Vec::new(),
        }
    }

    /// Command bytes (instruction codes) of every frame written so far.
    pub fn instructions(&self) -> Vec<u8> {
        let mut cursor = Cursor::new(self.written.clone());
        let mut out = Vec::new();
        while let Ok(packet) = Packet::read_from(&mut cursor, DEFAULT_ADDRESS) {
            out.push(packet.payload[0]);
        }
        out
    }
}

impl Read for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn ack(payload: &[u8]) -> Packet {
    Packet::new(DEFAULT_ADDRESS, PacketKind::Ack, payload.to_vec())
}

pub fn ok() -> Packet {
    ack(&[0x00])
}

pub fn no_finger() -> Packet {
    ack(&[0x02])
}

/// Replies for `verify_password`, `system_parameters` and `template_count`.
pub fn handshake(template_count: u16) -> Vec<Packet> {
    let mut params = vec![0x00];
    params.extend_from_slice(&[
        0x00, 0x00, 0x00, 0x09, 0x03, 0xE8, 0x00, 0x03, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x02, 0x00,
        0x06,
    ]);
    let [hi, lo] = template_count.to_be_bytes();
    vec![ok(), ack(&params), ack(&[0x00, hi, lo])]
}

/// Replies for one full `enroll_template` run uploading `template`.
pub fn enrollment(template: &[u8]) -> Vec<Packet> {
    let (first, second) = template.split_at(template.len() / 2);
    vec![
        ok(),        // GenImg: finger present
        ok(),        // Img2Tz buffer 1
        no_finger(), // GenImg: finger removed
        ok(),        // GenImg: finger present again
        ok(),        // Img2Tz buffer 2
        ok(),        // RegModel
        ok(),        // UpChar
        Packet::new(DEFAULT_ADDRESS, PacketKind::Data, first.to_vec()),
        Packet::new(DEFAULT_ADDRESS, PacketKind::EndOfData, second.to_vec()),
    ]
}

/// Port opener whose ports replay scripts, one script per `open` call.
pub struct MockOpener {
    scripts: std::sync::Mutex<std::collections::HashMap<String, Vec<Vec<Packet>>>>,
    candidates: Vec<String>,
}

impl MockOpener {
    pub fn new(candidates: &[&str]) -> Self {
        Self {
            scripts: Default::default(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Queue the replies served by the next successful `open` of `port`.
    pub fn script(self, port: &str, replies: Vec<Packet>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(port.to_string())
            .or_default()
            .push(replies);
        self
    }
}

impl crate::transport::PortOpener for MockOpener {
    fn open(
        &self,
        port: &str,
        _baudrate: u32,
    ) -> Result<Box<dyn crate::transport::SerialIo>, crate::error::SensorError> {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(port).filter(|s| !s.is_empty()) {
            Some(queue) => Ok(Box::new(ScriptedTransport::new(queue.remove(0)))),
            None => Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such port").into()),
        }
    }

    fn candidates(&self) -> Vec<String> {
        self.candidates.clone()
    }
}
