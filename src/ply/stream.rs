//! Body streams: typed value reads and writes in any PLY encoding.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use super::format::{Encoding, ScalarType};
use crate::util::{Error, Result};

/// Input stream over a PLY body.
pub struct IStream<R = BufReader<File>> {
    reader: R,
    encoding: Encoding,
    pos: u64,
    token: String,
}

impl<R: BufRead> IStream<R> {
    /// Wrap a reader positioned at the first body byte.
    pub fn new(reader: R, encoding: Encoding) -> Self {
        Self {
            reader,
            encoding,
            pos: 0,
            token: String::new(),
        }
    }

    /// Body bytes consumed so far.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Read one value of the given type.
    pub fn read_scalar(&mut self, ty: ScalarType) -> Result<f64> {
        match self.encoding {
            Encoding::Ascii => self.read_ascii(ty),
            Encoding::BinaryLittleEndian => self.read_binary::<LittleEndian>(ty),
            Encoding::BinaryBigEndian => self.read_binary::<BigEndian>(ty),
        }
    }

    fn read_binary<B: ByteOrder>(&mut self, ty: ScalarType) -> Result<f64> {
        let r = &mut self.reader;
        let value = match ty {
            ScalarType::Int8 => r.read_i8().map(f64::from),
            ScalarType::Uint8 => r.read_u8().map(f64::from),
            ScalarType::Int16 => r.read_i16::<B>().map(f64::from),
            ScalarType::Uint16 => r.read_u16::<B>().map(f64::from),
            ScalarType::Int32 => r.read_i32::<B>().map(f64::from),
            ScalarType::Uint32 => r.read_u32::<B>().map(f64::from),
            ScalarType::Float32 => r.read_f32::<B>().map(f64::from),
            ScalarType::Float64 => r.read_f64::<B>(),
        };
        match value {
            Ok(v) => {
                self.pos += ty.num_bytes() as u64;
                Ok(v)
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(Error::UnexpectedEof(self.pos)),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn read_ascii(&mut self, ty: ScalarType) -> Result<f64> {
        self.next_token()?;
        let token = self.token.as_str();
        let invalid = || Error::backend(format!("invalid {ty} value '{token}'"));
        match ty {
            ScalarType::Int8 => token.parse::<i8>().map(f64::from).map_err(|_| invalid()),
            ScalarType::Uint8 => token.parse::<u8>().map(f64::from).map_err(|_| invalid()),
            ScalarType::Int16 => token.parse::<i16>().map(f64::from).map_err(|_| invalid()),
            ScalarType::Uint16 => token.parse::<u16>().map(f64::from).map_err(|_| invalid()),
            ScalarType::Int32 => token.parse::<i32>().map(f64::from).map_err(|_| invalid()),
            ScalarType::Uint32 => token.parse::<u32>().map(f64::from).map_err(|_| invalid()),
            ScalarType::Float32 => token.parse::<f32>().map(f64::from).map_err(|_| invalid()),
            ScalarType::Float64 => token.parse::<f64>().map_err(|_| invalid()),
        }
    }

    /// Load the next whitespace-delimited token into `self.token`.
    fn next_token(&mut self) -> Result<()> {
        self.token.clear();
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                if self.token.is_empty() {
                    return Err(Error::UnexpectedEof(self.pos));
                }
                return Ok(());
            }

            let mut used = 0;
            let mut done = false;
            for &b in buf {
                if b.is_ascii_whitespace() {
                    used += 1;
                    if !self.token.is_empty() {
                        done = true;
                        break;
                    }
                } else {
                    self.token.push(b as char);
                    used += 1;
                }
            }
            self.reader.consume(used);
            self.pos += used as u64;
            if done {
                return Ok(());
            }
        }
    }
}

/// Output stream for a PLY body over any writer.
pub struct OStream<W: Write> {
    writer: W,
    encoding: Encoding,
    pos: u64,
    line_open: bool,
}

impl<W: Write> OStream<W> {
    pub fn new(writer: W, encoding: Encoding) -> Self {
        Self {
            writer,
            encoding,
            pos: 0,
            line_open: false,
        }
    }

    /// Bytes written so far.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Write raw bytes and advance position.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Write one value encoded as `ty`.
    pub fn write_scalar(&mut self, ty: ScalarType, value: f64) -> Result<()> {
        match self.encoding {
            Encoding::Ascii => self.write_ascii(ty, value),
            Encoding::BinaryLittleEndian => self.write_binary::<LittleEndian>(ty, value),
            Encoding::BinaryBigEndian => self.write_binary::<BigEndian>(ty, value),
        }
    }

    fn write_binary<B: ByteOrder>(&mut self, ty: ScalarType, value: f64) -> Result<()> {
        let w = &mut self.writer;
        match ty {
            ScalarType::Int8 => w.write_i8(value as i8)?,
            ScalarType::Uint8 => w.write_u8(value as u8)?,
            ScalarType::Int16 => w.write_i16::<B>(value as i16)?,
            ScalarType::Uint16 => w.write_u16::<B>(value as u16)?,
            ScalarType::Int32 => w.write_i32::<B>(value as i32)?,
            ScalarType::Uint32 => w.write_u32::<B>(value as u32)?,
            ScalarType::Float32 => w.write_f32::<B>(value as f32)?,
            ScalarType::Float64 => w.write_f64::<B>(value)?,
        }
        self.pos += ty.num_bytes() as u64;
        Ok(())
    }

    fn write_ascii(&mut self, ty: ScalarType, value: f64) -> Result<()> {
        let text = match ty {
            ScalarType::Int8 => (value as i8).to_string(),
            ScalarType::Uint8 => (value as u8).to_string(),
            ScalarType::Int16 => (value as i16).to_string(),
            ScalarType::Uint16 => (value as u16).to_string(),
            ScalarType::Int32 => (value as i32).to_string(),
            ScalarType::Uint32 => (value as u32).to_string(),
            ScalarType::Float32 => (value as f32).to_string(),
            ScalarType::Float64 => value.to_string(),
        };
        if self.line_open {
            self.write_bytes(b" ")?;
        }
        self.write_bytes(text.as_bytes())?;
        self.line_open = true;
        Ok(())
    }

    /// Terminate the current instance. Only ASCII bodies use separators.
    pub fn end_instance(&mut self) -> Result<()> {
        if self.encoding == Encoding::Ascii {
            self.write_bytes(b"\n")?;
            self.line_open = false;
        }
        Ok(())
    }

    /// Flush buffered output to the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Mutable access to the underlying writer for header emission.
    pub(crate) fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub(crate) fn advance(&mut self, bytes: u64) {
        self.pos += bytes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_binary_byte_orders() -> Result<()> {
        let mut le = OStream::new(Vec::new(), Encoding::BinaryLittleEndian);
        le.write_scalar(ScalarType::Uint16, 258.0)?;
        assert_eq!(le.writer, vec![2, 1]);

        let mut be = OStream::new(Vec::new(), Encoding::BinaryBigEndian);
        be.write_scalar(ScalarType::Uint16, 258.0)?;
        be.write_scalar(ScalarType::Float64, -0.5)?;
        assert_eq!(be.pos(), 10);

        let mut input = IStream::new(Cursor::new(be.writer), Encoding::BinaryBigEndian);
        assert_eq!(input.read_scalar(ScalarType::Uint16)?, 258.0);
        assert_eq!(input.read_scalar(ScalarType::Float64)?, -0.5);
        assert!(matches!(
            input.read_scalar(ScalarType::Uint8),
            Err(Error::UnexpectedEof(10))
        ));
        Ok(())
    }

    #[test]
    fn test_ascii_tokens() -> Result<()> {
        let mut out = OStream::new(Vec::new(), Encoding::Ascii);
        out.write_scalar(ScalarType::Uint8, 3.0)?;
        out.write_scalar(ScalarType::Float32, 0.1f32 as f64)?;
        out.end_instance()?;
        out.write_scalar(ScalarType::Int32, -7.0)?;
        out.end_instance()?;
        assert_eq!(String::from_utf8_lossy(&out.writer), "3 0.1\n-7\n");

        let mut input = IStream::new(Cursor::new(out.writer), Encoding::Ascii);
        assert_eq!(input.read_scalar(ScalarType::Uint8)?, 3.0);
        assert_eq!(input.read_scalar(ScalarType::Float32)?, 0.1f32 as f64);
        assert_eq!(input.read_scalar(ScalarType::Int32)?, -7.0);
        assert!(matches!(
            input.read_scalar(ScalarType::Int32),
            Err(Error::UnexpectedEof(_))
        ));
        Ok(())
    }

    #[test]
    fn test_ascii_rejects_out_of_range() {
        let mut input = IStream::new(Cursor::new(b"300".to_vec()), Encoding::Ascii);
        assert!(matches!(
            input.read_scalar(ScalarType::Uint8),
            Err(Error::Backend(_))
        ));
    }
}
