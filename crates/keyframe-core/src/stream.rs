//! Little-endian byte stream used by the snapshot archivers.
//!
//! [`SaveBuffer`] only ever appends; [`LoadCursor`] walks a captured byte
//! sequence front to back. There is no alignment or padding: every field is
//! written at exactly its natural width, so the capture and restore passes
//! must agree field-for-field.

use crate::fixed::Fixed;
use crate::serialize::{CaptureError, RestoreError};

// ---------------------------------------------------------------------------
// Wire enums
// ---------------------------------------------------------------------------

/// A fieldless enum with a fixed one-byte wire encoding.
pub trait WireEnum: Copy + Sized {
    /// Type name used in diagnostics.
    const NAME: &'static str;

    fn to_wire(self) -> u8;

    fn from_wire(value: u8) -> Option<Self>;
}

/// Declare a `#[repr(u8)]` enum and its [`WireEnum`] impl in one go.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(u8)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant = $value,
            )+
        }

        impl $crate::stream::WireEnum for $name {
            const NAME: &'static str = stringify!($name);

            fn to_wire(self) -> u8 {
                self as u8
            }

            fn from_wire(value: u8) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

pub(crate) use wire_enum;

// ---------------------------------------------------------------------------
// SaveBuffer
// ---------------------------------------------------------------------------

/// Growable write buffer.
#[derive(Debug, Clone, Default)]
pub struct SaveBuffer {
    data: Vec<u8>,
}

impl SaveBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn write8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write16(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write32(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.write16(v as u16);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write32(v as u32);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write8(u8::from(v));
    }

    pub fn write_fixed(&mut self, v: Fixed) {
        self.write_i32(v.to_bits());
    }

    pub fn write_enum<E: WireEnum>(&mut self, v: E) {
        self.write8(v.to_wire());
    }

    /// Write a list length. Fails if it does not fit the 32-bit count field.
    pub fn write_count(&mut self, what: &'static str, count: usize) -> Result<(), CaptureError> {
        let n = u32::try_from(count).map_err(|_| CaptureError::CountOverflow { what, count })?;
        self.write32(n);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LoadCursor
// ---------------------------------------------------------------------------

/// Read cursor over a captured snapshot.
///
/// Every read past the end fails with [`RestoreError::Truncated`]; nothing is
/// ever padded or defaulted.
#[derive(Debug, Clone)]
pub struct LoadCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> LoadCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], RestoreError> {
        let end = self
            .pos
            .checked_add(N)
            .filter(|&end| end <= self.data.len())
            .ok_or(RestoreError::Truncated {
                offset: self.pos,
                needed: N,
                len: self.data.len(),
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(out)
    }

    pub fn read8(&mut self) -> Result<u8, RestoreError> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read16(&mut self) -> Result<u16, RestoreError> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn read32(&mut self) -> Result<u32, RestoreError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, RestoreError> {
        Ok(self.read16()? as i16)
    }

    pub fn read_i32(&mut self) -> Result<i32, RestoreError> {
        Ok(self.read32()? as i32)
    }

    pub fn read_bool(&mut self) -> Result<bool, RestoreError> {
        match self.read8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(RestoreError::InvalidEnum {
                what: "bool",
                value,
            }),
        }
    }

    pub fn read_fixed(&mut self) -> Result<Fixed, RestoreError> {
        Ok(Fixed::from_bits(self.read_i32()?))
    }

    pub fn read_enum<E: WireEnum>(&mut self) -> Result<E, RestoreError> {
        let value = self.read8()?;
        E::from_wire(value).ok_or(RestoreError::InvalidEnum {
            what: E::NAME,
            value,
        })
    }

    pub fn read_count(&mut self) -> Result<usize, RestoreError> {
        Ok(self.read32()? as usize)
    }

    /// Read a list length whose items occupy at least `item_size` bytes
    /// each further on. Fails before anything is allocated if the rest of
    /// the stream is too short to hold them.
    pub fn read_len(&mut self, item_size: usize) -> Result<usize, RestoreError> {
        let count = self.read_count()?;
        let needed = count.saturating_mul(item_size);
        if needed > self.remaining() {
            return Err(RestoreError::Truncated {
                offset: self.pos,
                needed,
                len: self.data.len(),
            });
        }
        Ok(count)
    }

    /// Consume the cursor, failing if any bytes were left unread.
    pub fn finish(self) -> Result<(), RestoreError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(RestoreError::TrailingBytes(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    wire_enum! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        enum Color {
            Red = 0,
            Green = 1,
            Blue = 7,
        }
    }

    #[test]
    fn integers_are_little_endian() {
        let mut buf = SaveBuffer::new();
        buf.write16(0x0102);
        buf.write32(0x0304_0506);
        assert_eq!(buf.as_bytes(), &[0x02, 0x01, 0x06, 0x05, 0x04, 0x03]);
    }

    #[test]
    fn no_padding_between_fields() {
        let mut buf = SaveBuffer::new();
        buf.write8(1);
        buf.write32(2);
        buf.write16(3);
        assert_eq!(buf.len(), 7);
    }

    #[test]
    fn signed_values_read_back() {
        let mut buf = SaveBuffer::new();
        buf.write_i32(-7);
        buf.write_i16(-2);
        buf.write_fixed(Fixed::from_bits(-65536));
        let bytes = buf.into_bytes();
        let mut cur = LoadCursor::new(&bytes);
        assert_eq!(cur.read_i32().unwrap(), -7);
        assert_eq!(cur.read_i16().unwrap(), -2);
        assert_eq!(cur.read_fixed().unwrap().to_bits(), -65536);
        cur.finish().unwrap();
    }

    #[test]
    fn enum_encoding_uses_declared_values() {
        let mut buf = SaveBuffer::new();
        buf.write_enum(Color::Blue);
        assert_eq!(buf.as_bytes(), &[7]);
        let bytes = buf.into_bytes();
        let mut cur = LoadCursor::new(&bytes);
        assert_eq!(cur.read_enum::<Color>().unwrap(), Color::Blue);
    }

    #[test]
    fn unknown_enum_value_is_rejected() {
        let bytes = [3u8];
        let mut cur = LoadCursor::new(&bytes);
        match cur.read_enum::<Color>() {
            Err(RestoreError::InvalidEnum { what, value }) => {
                assert_eq!(what, "Color");
                assert_eq!(value, 3);
            }
            other => panic!("expected InvalidEnum, got {other:?}"),
        }
    }

    #[test]
    fn read_past_end_is_truncated() {
        let bytes = [1u8, 2, 3];
        let mut cur = LoadCursor::new(&bytes);
        assert_eq!(cur.read16().unwrap(), 0x0201);
        match cur.read32() {
            Err(RestoreError::Truncated {
                offset,
                needed,
                len,
            }) => {
                assert_eq!((offset, needed, len), (2, 4, 3));
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn read_len_rejects_impossible_counts() {
        let mut buf = SaveBuffer::new();
        buf.write32(1000);
        buf.write32(0);
        let bytes = buf.into_bytes();
        let mut cur = LoadCursor::new(&bytes);
        assert!(matches!(
            cur.read_len(4),
            Err(RestoreError::Truncated { needed: 4000, .. })
        ));
    }

    #[test]
    fn bool_rejects_other_bytes() {
        let bytes = [2u8];
        let mut cur = LoadCursor::new(&bytes);
        assert!(cur.read_bool().is_err());
    }

    #[test]
    fn finish_reports_trailing_bytes() {
        let bytes = [0u8; 5];
        let mut cur = LoadCursor::new(&bytes);
        cur.read32().unwrap();
        match cur.finish() {
            Err(RestoreError::TrailingBytes(1)) => {}
            other => panic!("expected TrailingBytes(1), got {other:?}"),
        }
    }
}
