use std::io::{self, Read};

/// Sequential reader over an obfuscated savefile stream.
///
/// Every byte pulled through [`ChecksumReader::read_u8`] is deciphered against
/// the previous raw byte, and both running sums are updated. Wider integers
/// are little-endian compositions of those reads, so they participate in the
/// checksums byte by byte.
pub struct ChecksumReader<R> {
    inner: R,
    xor_byte: u8,
    v_check: u32,
    x_check: u32,
    position: u64,
}

impl<R: Read> ChecksumReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            xor_byte: 0,
            v_check: 0,
            x_check: 0,
            position: 0,
        }
    }

    /// Read bytes verbatim, bypassing the cipher and the checksums.
    pub fn read_raw<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        self.position += N as u64;
        Ok(buf)
    }

    /// Seed the cipher and clear both running sums.
    pub fn reset(&mut self, xor_byte: u8) {
        self.xor_byte = xor_byte;
        self.v_check = 0;
        self.x_check = 0;
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        self.position += 1;

        let raw = buf[0];
        let decoded = raw ^ self.xor_byte;
        self.xor_byte = raw;
        self.v_check = self.v_check.wrapping_add(u32::from(decoded));
        self.x_check = self.x_check.wrapping_add(u32::from(raw));
        Ok(decoded)
    }

    pub fn read_u16(&mut self) -> io::Result<u16> {
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    pub fn read_i16(&mut self) -> io::Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    pub fn read_u32(&mut self) -> io::Result<u32> {
        let mut bytes = [0u8; 4];
        for byte in &mut bytes {
            *byte = self.read_u8()?;
        }
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_i32(&mut self) -> io::Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u8_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut result = [0u8; N];
        for item in &mut result {
            *item = self.read_u8()?;
        }
        Ok(result)
    }

    pub fn read_i16_array<const N: usize>(&mut self) -> io::Result<[i16; N]> {
        let mut result = [0i16; N];
        for item in &mut result {
            *item = self.read_i16()?;
        }
        Ok(result)
    }

    pub fn read_u32_array<const N: usize>(&mut self) -> io::Result<[u32; N]> {
        let mut result = [0u32; N];
        for item in &mut result {
            *item = self.read_u32()?;
        }
        Ok(result)
    }

    /// Read a NUL-terminated string into a buffer of `max` bytes.
    ///
    /// The whole string is consumed up to and including the terminator, but
    /// only the first `max - 1` bytes are kept. Bytes are decoded lossily.
    pub fn read_string(&mut self, max: usize) -> io::Result<String> {
        let keep = max.saturating_sub(1);
        let mut bytes = Vec::new();
        loop {
            let b = self.read_u8()?;
            if b == 0 {
                break;
            }
            if bytes.len() < keep {
                bytes.push(b);
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Discard `n` bytes. They still pass through the cipher and the sums.
    pub fn skip(&mut self, n: usize) -> io::Result<()> {
        for _ in 0..n {
            self.read_u8()?;
        }
        Ok(())
    }

    pub fn v_check(&self) -> u32 {
        self.v_check
    }

    pub fn x_check(&self) -> u32 {
        self.x_check
    }

    pub fn position(&self) -> u64 {
        self.position
    }
}
