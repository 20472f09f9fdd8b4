//! Decoding of fixed-width binary numbers in little endian byte order.

use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmkit_core::Tag;
use std::io::{Read, Result};

/// A reader of fixed-width little endian binary numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct LittleEndianBasicDecoder;

impl LittleEndianBasicDecoder {
    /// Decode an unsigned 16-bit number.
    pub fn decode_us<S>(&self, mut source: S) -> Result<u16>
    where
        S: Read,
    {
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    /// Decode a signed 16-bit number.
    pub fn decode_ss<S>(&self, mut source: S) -> Result<i16>
    where
        S: Read,
    {
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf)?;
        Ok(LittleEndian::read_i16(&buf))
    }

    /// Decode an unsigned 32-bit number.
    pub fn decode_ul<S>(&self, mut source: S) -> Result<u32>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    /// Decode a signed 32-bit number.
    pub fn decode_sl<S>(&self, mut source: S) -> Result<i32>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf)?;
        Ok(LittleEndian::read_i32(&buf))
    }

    /// Decode a 32-bit floating point number.
    pub fn decode_fl<S>(&self, mut source: S) -> Result<f32>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf)?;
        Ok(LittleEndian::read_f32(&buf))
    }

    /// Decode a 64-bit floating point number.
    pub fn decode_fd<S>(&self, mut source: S) -> Result<f64>
    where
        S: Read,
    {
        let mut buf = [0u8; 8];
        source.read_exact(&mut buf)?;
        Ok(LittleEndian::read_f64(&buf))
    }

    /// Decode an attribute tag.
    pub fn decode_tag<S>(&self, mut source: S) -> Result<Tag>
    where
        S: Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf)?;
        Ok(Tag(
            LittleEndian::read_u16(&buf[0..2]),
            LittleEndian::read_u16(&buf[2..4]),
        ))
    }
}
