#![forbid(unsafe_code)]
//! Fixed-width field encoding shared by the link codec and the flower file.

pub mod fixed {
    //! Little-endian fixed-width integers over [`ByteSink`]/[`ByteSource`].
    //!
    //! Readers take the name of the field they decode so that a truncated
    //! stream reports which field was cut short.

    use crate::primitives::io::{ByteSink, ByteSource};
    use crate::types::Result;

    /// Writes a u64 in little-endian order.
    pub fn put_u64<S: ByteSink + ?Sized>(sink: &mut S, v: u64) -> Result<()> {
        sink.write_bytes(&v.to_le_bytes())
    }

    /// Writes a u32 in little-endian order.
    pub fn put_u32<S: ByteSink + ?Sized>(sink: &mut S, v: u32) -> Result<()> {
        sink.write_bytes(&v.to_le_bytes())
    }

    /// Writes a u16 in little-endian order.
    pub fn put_u16<S: ByteSink + ?Sized>(sink: &mut S, v: u16) -> Result<()> {
        sink.write_bytes(&v.to_le_bytes())
    }

    /// Writes an i32 in little-endian order.
    pub fn put_i32<S: ByteSink + ?Sized>(sink: &mut S, v: i32) -> Result<()> {
        sink.write_bytes(&v.to_le_bytes())
    }

    /// Reads a little-endian u64.
    pub fn get_u64<S: ByteSource + ?Sized>(src: &mut S, field: &str) -> Result<u64> {
        let mut arr = [0u8; 8];
        src.read_bytes(&mut arr).map_err(|err| err.in_field(field))?;
        Ok(u64::from_le_bytes(arr))
    }

    /// Reads a little-endian u32.
    pub fn get_u32<S: ByteSource + ?Sized>(src: &mut S, field: &str) -> Result<u32> {
        let mut arr = [0u8; 4];
        src.read_bytes(&mut arr).map_err(|err| err.in_field(field))?;
        Ok(u32::from_le_bytes(arr))
    }

    /// Reads a little-endian u16.
    pub fn get_u16<S: ByteSource + ?Sized>(src: &mut S, field: &str) -> Result<u16> {
        let mut arr = [0u8; 2];
        src.read_bytes(&mut arr).map_err(|err| err.in_field(field))?;
        Ok(u16::from_le_bytes(arr))
    }

    /// Reads a little-endian i32.
    pub fn get_i32<S: ByteSource + ?Sized>(src: &mut S, field: &str) -> Result<i32> {
        let mut arr = [0u8; 4];
        src.read_bytes(&mut arr).map_err(|err| err.in_field(field))?;
        Ok(i32::from_le_bytes(arr))
    }
}
