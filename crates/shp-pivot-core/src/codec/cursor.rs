// crates/shp-pivot-core/src/codec/cursor.rs

/// Bounds-checked reader over an in-memory buffer.
///
/// Errors are plain strings; callers attach the file path when converting
/// to [`LoadError::InvalidData`](crate::LoadError::InvalidData).
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

pub(crate) type CursorResult<T> = std::result::Result<T, String>;

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> CursorResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(format!(
                "unexpected end of data at offset {} (wanted {n} bytes, {} left)",
                self.pos,
                self.remaining()
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> CursorResult<()> {
        self.take(n).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> CursorResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn i32_be(&mut self) -> CursorResult<i32> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    pub fn i32_le(&mut self) -> CursorResult<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub fn f64_le(&mut self) -> CursorResult<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// A non-negative little-endian count, rejected if `count * unit`
    /// would overrun what is left in the buffer.
    pub fn count_le(&mut self, unit: usize, what: &str) -> CursorResult<usize> {
        let raw = self.i32_le()?;
        let n = usize::try_from(raw).map_err(|_| format!("negative {what}: {raw}"))?;
        if n.saturating_mul(unit) > self.remaining() {
            return Err(format!("{what} {n} exceeds record size"));
        }
        Ok(n)
    }
}
