//! Wire Primitives
//!
//! Shared low-level helpers for the hand-coded binary formats (type
//! definition records and snapshot files): a bounds-checked read cursor and
//! the matching write helpers. Everything is little-endian; strings are
//! `u16` length + UTF-8; optional values carry a leading presence byte.

/// Structural decode failure with the offset it occurred at. Mapped into
/// the owning codec's error type via `From`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WireError {
    pub offset: usize,
    pub context: &'static str,
}

/// Bounds-checked reader over a byte slice.
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn fail(&self, context: &'static str) -> WireError {
        WireError {
            offset: self.pos,
            context,
        }
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.buf.len() - self.pos < n {
            return Err(self.fail("unexpected end of input"));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i64(&mut self) -> Result<i64, WireError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(i64::from_le_bytes(raw))
    }

    /// Presence byte: 0 = absent, 1 = present, anything else is corrupt.
    pub fn read_presence(&mut self) -> Result<bool, WireError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(WireError {
                offset: self.pos - 1,
                context: "invalid presence byte",
            }),
        }
    }

    pub fn read_str(&mut self) -> Result<String, WireError> {
        let len = self.read_u16()? as usize;
        let start = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| WireError {
                offset: start,
                context: "invalid utf-8 in string",
            })
    }

    pub fn read_opt_str(&mut self) -> Result<Option<String>, WireError> {
        if self.read_presence()? {
            Ok(Some(self.read_str()?))
        } else {
            Ok(None)
        }
    }

    /// Optional string list: presence byte, then `u16` count + strings.
    pub fn read_opt_list(&mut self) -> Result<Option<Vec<String>>, WireError> {
        if !self.read_presence()? {
            return Ok(None);
        }
        let count = self.read_u16()? as usize;
        let mut items = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            items.push(self.read_str()?);
        }
        Ok(Some(items))
    }
}

pub(crate) fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_i64(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_str(out: &mut Vec<u8>, value: &str) {
    debug_assert!(value.len() <= u16::MAX as usize);
    put_u16(out, value.len() as u16);
    out.extend_from_slice(value.as_bytes());
}

pub(crate) fn put_opt_str(out: &mut Vec<u8>, value: Option<&str>) {
    match value {
        Some(s) => {
            out.push(1);
            put_str(out, s);
        }
        None => out.push(0),
    }
}

pub(crate) fn put_opt_list(out: &mut Vec<u8>, value: Option<&[String]>) {
    match value {
        Some(items) => {
            out.push(1);
            debug_assert!(items.len() <= u16::MAX as usize);
            put_u16(out, items.len() as u16);
            for item in items {
                put_str(out, item);
            }
        }
        None => out.push(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_roundtrip() {
        let mut out = Vec::new();
        put_u16(&mut out, 0xBEEF);
        put_u32(&mut out, 7);
        put_i64(&mut out, -42);

        let mut cur = Cursor::new(&out);
        assert_eq!(cur.read_u16().unwrap(), 0xBEEF);
        assert_eq!(cur.read_u32().unwrap(), 7);
        assert_eq!(cur.read_i64().unwrap(), -42);
        assert!(cur.is_empty());
    }

    #[test]
    fn test_opt_roundtrip_preserves_absence() {
        let mut out = Vec::new();
        put_opt_str(&mut out, None);
        put_opt_str(&mut out, Some("x"));
        put_opt_list(&mut out, None);
        put_opt_list(&mut out, Some(&[]));
        put_opt_list(&mut out, Some(&["a".to_string(), "b".to_string()]));

        let mut cur = Cursor::new(&out);
        assert_eq!(cur.read_opt_str().unwrap(), None);
        assert_eq!(cur.read_opt_str().unwrap(), Some("x".to_string()));
        assert_eq!(cur.read_opt_list().unwrap(), None);
        assert_eq!(cur.read_opt_list().unwrap(), Some(vec![]));
        assert_eq!(
            cur.read_opt_list().unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert!(cur.is_empty());
    }

    #[test]
    fn test_truncated_read_fails_with_offset() {
        let mut cur = Cursor::new(&[1, 0]);
        let err = cur.read_u32().unwrap_err();
        assert_eq!(err.offset, 0);
        assert_eq!(err.context, "unexpected end of input");
    }

    #[test]
    fn test_invalid_presence_byte() {
        let mut cur = Cursor::new(&[9]);
        let err = cur.read_presence().unwrap_err();
        assert_eq!(err.context, "invalid presence byte");
    }

    #[test]
    fn test_invalid_utf8() {
        let mut out = Vec::new();
        put_u16(&mut out, 2);
        out.extend_from_slice(&[0xFF, 0xFE]);

        let mut cur = Cursor::new(&out);
        let err = cur.read_str().unwrap_err();
        assert_eq!(err.context, "invalid utf-8 in string");
    }
}
