use crate::error::{Error, Result};

/// Little-endian reader over a borrowed buffer.
///
/// The position never moves past the end of the buffer: a read that needs
/// more bytes than remain fails with [`Error::UnexpectedEnd`] and leaves the
/// position untouched.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::UnexpectedEnd {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.take_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let offset = self.pos;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => {
                self.pos = offset;
                Err(Error::invalid(offset, format!("boolean byte {other:#04x}")))
            }
        }
    }

    /// Three-byte signed integer.
    pub fn read_i24(&mut self) -> Result<i32> {
        let [a, b, c] = self.take_array()?;
        Ok(i32::from_le_bytes([0, a, b, c]) >> 8)
    }

    /// Indicator byte: above 4 it is the value itself, otherwise that many
    /// signed little-endian bytes follow.
    pub fn read_flexible_int(&mut self) -> Result<i32> {
        let indicator = self.read_u8()?;
        if indicator > 4 {
            return Ok(i32::from(indicator));
        }
        let n = usize::from(indicator);
        if n == 0 {
            return Ok(0);
        }
        let mut buf = [0u8; 4];
        buf[4 - n..].copy_from_slice(self.take(n)?);
        Ok(i32::from_le_bytes(buf) >> (8 * (4 - n)))
    }

    /// .NET `BinaryReader.Read7BitEncodedInt`: low groups first, at most five bytes.
    pub fn read_var_u32(&mut self) -> Result<u32> {
        let start = self.pos;
        let mut value = 0u32;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            if shift == 28 && byte > 0x0F {
                self.pos = start;
                return Err(Error::invalid(start, "7-bit encoded length overflows u32"));
            }
            value |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        self.pos = start;
        Err(Error::invalid(start, "7-bit encoded length longer than five bytes"))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    pub fn read_utf8(&mut self, n: usize) -> Result<String> {
        let offset = self.pos;
        let bytes = self.take(n)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            self.pos = offset;
            Error::invalid(offset, format!("string is not UTF-8: {e}"))
        })
    }

    pub fn read_rest(&mut self) -> Vec<u8> {
        let rest = self.data[self.pos..].to_vec();
        self.pos = self.data.len();
        rest
    }
}

/// Destination for encoded bytes.
pub trait ByteSink {
    fn put(&mut self, bytes: &[u8]);

    fn written(&self) -> usize;
}

impl ByteSink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    fn written(&self) -> usize {
        self.len()
    }
}

/// Sink that only counts, used to size an encode without buffering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LengthCounter {
    count: usize,
}

impl LengthCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ByteSink for LengthCounter {
    fn put(&mut self, bytes: &[u8]) {
        self.count += bytes.len();
    }

    fn written(&self) -> usize {
        self.count
    }
}

/// Little-endian writer, the exact inverse of [`Cursor`].
#[derive(Debug)]
pub struct Writer<S> {
    sink: S,
}

impl<S: ByteSink> Writer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn position(&self) -> usize {
        self.sink.written()
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    pub fn write_u8(&mut self, v: u8) {
        self.sink.put(&[v]);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.sink.put(&v.to_le_bytes());
    }

    pub fn write_u16(&mut self, v: u16) {
        self.sink.put(&v.to_le_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.sink.put(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.sink.put(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.sink.put(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.sink.put(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.sink.put(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.sink.put(&v.to_le_bytes());
    }

    pub fn write_f64(&mut self, v: f64) {
        self.sink.put(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    /// Low three bytes of `v`.
    pub fn write_i24(&mut self, v: i32) {
        self.sink.put(&v.to_le_bytes()[..3]);
    }

    /// Shortest form [`Cursor::read_flexible_int`] reads back as `v`.
    pub fn write_flexible_int(&mut self, v: i32) {
        if let Ok(direct @ 5..=u8::MAX) = u8::try_from(v) {
            self.write_u8(direct);
            return;
        }
        let width: u8 = match v {
            0 => 0,
            -0x80..=0x7F => 1,
            -0x8000..=0x7FFF => 2,
            -0x80_0000..=0x7F_FFFF => 3,
            _ => 4,
        };
        self.write_u8(width);
        self.sink.put(&v.to_le_bytes()[..usize::from(width)]);
    }

    pub fn write_var_u32(&mut self, mut v: u32) {
        while v >= 0x80 {
            self.write_u8((v as u8 & 0x7F) | 0x80);
            v >>= 7;
        }
        self.write_u8(v as u8);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.sink.put(bytes);
    }
}
