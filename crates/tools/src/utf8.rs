//! Incremental UTF-8 decoding for byte sources that deliver arbitrary chunks.
//!
//! A multi-byte sequence split across two reads is carried over to the next
//! call; invalid bytes are replaced with U+FFFD so decoding always makes
//! forward progress.

/// Stateful decoder. Holds at most one incomplete UTF-8 sequence (≤ 3 bytes)
/// between calls.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` and append the complete characters to `out`.
    pub fn push(&mut self, bytes: &[u8], out: &mut String) {
        if bytes.is_empty() {
            return;
        }
        if self.carry.is_empty() {
            decode_into(out, &mut self.carry, bytes);
            return;
        }

        // Complete the carried sequence with just enough leading bytes, then
        // decode the rest of the chunk in place.
        let mut rest = bytes;
        while !self.carry.is_empty() && !rest.is_empty() {
            let want = sequence_len(self.carry[0]);
            if want == 0 {
                out.push(char::REPLACEMENT_CHARACTER);
                self.carry.clear();
                break;
            }
            let missing = want.saturating_sub(self.carry.len());
            if missing == 0 {
                let pending = std::mem::take(&mut self.carry);
                decode_into(out, &mut self.carry, &pending);
                continue;
            }
            if rest.len() < missing {
                self.carry.extend_from_slice(rest);
                return;
            }

            let mut joined = [0u8; 8];
            let have = self.carry.len();
            joined[..have].copy_from_slice(&self.carry);
            joined[have..have + missing].copy_from_slice(&rest[..missing]);
            self.carry.clear();
            decode_into(out, &mut self.carry, &joined[..have + missing]);
            rest = &rest[missing..];
        }

        if !rest.is_empty() {
            decode_into(out, &mut self.carry, rest);
        }
    }

    /// Convenience wrapper around [`Utf8Decoder::push`] returning a fresh string.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        self.push(bytes, &mut out);
        out
    }

    /// Flush a trailing incomplete sequence (lossily) at end of stream.
    pub fn finish(&mut self, out: &mut String) {
        if self.carry.is_empty() {
            return;
        }
        out.push_str(&String::from_utf8_lossy(&self.carry));
        self.carry.clear();
    }

    /// Number of bytes waiting for the rest of their sequence.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

fn sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn decode_into(out: &mut String, carry: &mut Vec<u8>, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                out.push_str(text);
                return;
            }
            Err(err) => {
                let (valid, after) = bytes.split_at(err.valid_up_to());
                if let Ok(text) = std::str::from_utf8(valid) {
                    out.push_str(text);
                }
                match err.error_len() {
                    Some(bad) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        bytes = &after[bad..];
                    }
                    None => {
                        carry.extend_from_slice(after);
                        return;
                    }
                }
            }
        }
    }
}
