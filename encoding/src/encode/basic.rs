//! Encoding of fixed-width binary numbers in little endian byte order.

use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmkit_core::Tag;
use std::io::{Result, Write};

/// A writer of fixed-width little endian binary numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct LittleEndianBasicEncoder;

impl LittleEndianBasicEncoder {
    /// Encode an unsigned 16-bit number.
    pub fn encode_us<W>(&self, mut to: W, value: u16) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        to.write_all(&buf)
    }

    /// Encode a signed 16-bit number.
    pub fn encode_ss<W>(&self, mut to: W, value: i16) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 2];
        LittleEndian::write_i16(&mut buf, value);
        to.write_all(&buf)
    }

    /// Encode an unsigned 32-bit number.
    pub fn encode_ul<W>(&self, mut to: W, value: u32) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        to.write_all(&buf)
    }

    /// Encode a signed 32-bit number.
    pub fn encode_sl<W>(&self, mut to: W, value: i32) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, value);
        to.write_all(&buf)
    }

    /// Encode a 32-bit floating point number.
    pub fn encode_fl<W>(&self, mut to: W, value: f32) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 4];
        LittleEndian::write_f32(&mut buf, value);
        to.write_all(&buf)
    }

    /// Encode a 64-bit floating point number.
    pub fn encode_fd<W>(&self, mut to: W, value: f64) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, value);
        to.write_all(&buf)
    }

    /// Encode an attribute tag.
    pub fn encode_tag<W>(&self, mut to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 4];
        LittleEndian::write_u16(&mut buf[0..2], tag.group());
        LittleEndian::write_u16(&mut buf[2..4], tag.element());
        to.write_all(&buf)
    }
}
