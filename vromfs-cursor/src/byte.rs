use crate::error::{CursorError, Result};
use crate::uleb128::decode_uleb128_with;

/// A forward-only cursor over an immutable byte buffer.
///
/// Mirrors the `DataHandler` class the VROMFS/BLK parsers are built around:
/// every read both returns data and advances the cursor, there is no seeking
/// backwards, and running past the end of the buffer is always an error.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Wrap `data`, positioned at its start.
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, pos: 0 }
    }

    /// Wrap `data`, starting at byte `offset`.
    pub fn with_offset(data: &'a [u8], offset: usize) -> Self {
        ByteCursor { data, pos: offset }
    }

    /// Current byte offset into the underlying buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// `true` once every byte of the buffer has been consumed.
    pub fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the next `n` bytes and advances the cursor past them.
    pub fn fetch(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos + n;
        if end > self.data.len() {
            return Err(CursorError::UnexpectedEof {
                wanted: n,
                available: self.data.len() - self.pos,
            });
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Equivalent to `fetch(n)` but discards the bytes.
    pub fn advance(&mut self, n: usize) -> Result<()> {
        self.fetch(n).map(|_| ())
    }

    /// Returns every remaining byte and advances the cursor to the end.
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    /// Reads a little-endian `u32`.
    pub fn u32_le(&mut self) -> Result<u32> {
        let bytes = self.fetch(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Reads a little-endian `u64`.
    pub fn u64_le(&mut self) -> Result<u64> {
        let bytes = self.fetch(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    /// Decodes a ULEB128-encoded unsigned integer, capping accumulation at 64
    /// bits (a 10th continuation byte is an [`CursorError::Overflow`]).
    pub fn uleb128(&mut self) -> Result<u64> {
        decode_uleb128_with(|| {
            let byte = self.fetch(1)?[0];
            Ok(byte)
        })
    }

    /// Reads bytes up to (and consuming) a NUL terminator. The terminator
    /// itself is excluded from the returned slice.
    pub fn read_cstr(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        loop {
            let byte = self.fetch(1)?[0];
            if byte == 0 {
                return Ok(&self.data[start..self.pos - 1]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_advances_and_reports_position() {
        let mut c = ByteCursor::new(b"hello world");
        assert_eq!(c.fetch(5).unwrap(), b"hello");
        assert_eq!(c.position(), 5);
        c.advance(1).unwrap();
        assert_eq!(c.position(), 6);
        assert_eq!(c.rest(), b"world");
        assert!(c.eof());
    }

    #[test]
    fn fetch_zero_after_fetch_is_empty() {
        let mut c = ByteCursor::new(b"abc");
        c.fetch(3).unwrap();
        assert_eq!(c.fetch(0).unwrap(), b"");
    }

    #[test]
    fn fetch_past_end_is_unexpected_eof() {
        let mut c = ByteCursor::new(b"ab");
        assert!(matches!(
            c.fetch(3),
            Err(CursorError::UnexpectedEof {
                wanted: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn little_endian_integers() {
        let mut c = ByteCursor::new(&[0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]);
        assert_eq!(c.u32_le().unwrap(), 1);
        assert_eq!(c.u32_le().unwrap(), 2);

        let mut c = ByteCursor::new(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(c.u64_le().unwrap(), 1);
    }

    #[test]
    fn read_cstr_excludes_terminator() {
        let mut c = ByteCursor::new(b"foo\x00bar");
        assert_eq!(c.read_cstr().unwrap(), b"foo");
        assert_eq!(c.rest(), b"bar");
    }

    #[test]
    fn uleb128_seed_cases() {
        assert_eq!(ByteCursor::new(&[0xE5, 0x8E, 0x26]).uleb128().unwrap(), 624485);
        assert_eq!(ByteCursor::new(&[0x00]).uleb128().unwrap(), 0);
        assert_eq!(ByteCursor::new(&[0x7F]).uleb128().unwrap(), 127);
    }
}
