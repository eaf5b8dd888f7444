use std::borrow::Cow;

#[rustfmt::skip]
pub trait Deserializer {
    fn size(&mut self) -> usize;
    fn advance_by(&mut self, amount: usize);
    fn jump_to(&mut self, pos: usize);
    fn read_bytes(&mut self, length: usize) -> Cow<'_, [u8]>;

    /// Reads exactly `LENGTH` bytes, zero filling anything past the end of
    /// the input.
    fn read_array<const LENGTH: usize>(&mut self) -> [u8; LENGTH] {
        let mut out = [0; LENGTH];
        let bytes = self.read_bytes(LENGTH);
        out[..bytes.len()].copy_from_slice(&bytes);
        out
    }

    fn read_u32_le(&mut self) -> u32 { u32::from_le_bytes(self.read_array()) }
    fn read_f32_le(&mut self) -> f32 { f32::from_le_bytes(self.read_array()) }
}

pub struct SliceDeserializer<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> SliceDeserializer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: data,
            offset: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }
}

impl Deserializer for SliceDeserializer<'_> {
    fn size(&mut self) -> usize {
        self.buffer.len()
    }

    fn advance_by(&mut self, amount: usize) {
        self.offset += amount;
    }

    fn jump_to(&mut self, pos: usize) {
        self.offset = pos;
    }

    fn read_bytes(&mut self, length: usize) -> Cow<'_, [u8]> {
        let length = length.min(self.remaining());
        let start = self.offset.min(self.buffer.len());
        self.offset += length;
        Cow::Borrowed(&self.buffer[start..start + length])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let data = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x3f];
        let mut des = SliceDeserializer::new(&data);
        assert_eq!(des.read_u32_le(), 1);
        assert_eq!(des.read_f32_le(), 1.0);
        assert!(des.read_bytes(1).is_empty());
    }

    #[test]
    fn short_reads_are_zero_filled() {
        let mut des = SliceDeserializer::new(&[0xff, 0xff]);
        assert_eq!(des.read_u32_le(), 0xffff);
        assert!(des.read_bytes(8).is_empty());
    }

    #[test]
    fn jump_back() {
        let mut des = SliceDeserializer::new(b"solid cube");
        assert_eq!(&*des.read_bytes(5), b"solid");
        des.jump_to(0);
        des.advance_by(6);
        assert_eq!(&*des.read_bytes(4), b"cube");
    }
}
