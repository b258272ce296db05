// Copyright 2024 Vincent Chan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io;
use std::io::{Read, Write};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crate::{Error, Result};

/// A growable byte buffer with a read/write position.
///
/// Writing at the end extends the buffer, writing in the middle
/// overwrites the bytes in place. The position always stays in `[0, len]`.
#[derive(Debug, Default, Clone)]
pub struct BinaryCursor {
    buf: Vec<u8>,
    position: usize,
}

impl BinaryCursor {

    pub fn new() -> BinaryCursor {
        BinaryCursor {
            buf: Vec::new(),
            position: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> BinaryCursor {
        BinaryCursor {
            buf: Vec::with_capacity(capacity),
            position: 0,
        }
    }

    /// Wraps existing bytes, positioned at the start.
    pub fn from_bytes(buf: Vec<u8>) -> BinaryCursor {
        BinaryCursor {
            buf,
            position: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.position
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.buf.len() {
            return Err(Error::OutOfRange {
                position,
                length: self.buf.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    #[inline]
    pub fn seek_to_end(&mut self) {
        self.position = self.buf.len();
    }

    /// Discards every byte at or after `position`.
    pub fn truncate(&mut self, position: usize) -> Result<()> {
        if position > self.buf.len() {
            return Err(Error::OutOfRange {
                position,
                length: self.buf.len(),
            });
        }
        self.buf.truncate(position);
        if self.position > position {
            self.position = position;
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        let end = self.position + data.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.position..end].copy_from_slice(data);
        self.position = end;
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.ensure_remaining(n)?;
        let start = self.position;
        self.position += n;
        Ok(&self.buf[start..self.position])
    }

    pub fn peek_u8(&self) -> Result<u8> {
        self.ensure_remaining(1)?;
        Ok(self.buf[self.position])
    }

    /// Overwrites four bytes at `at` without moving the position.
    pub fn patch_i32(&mut self, at: usize, value: i32) -> Result<()> {
        if at + 4 > self.buf.len() {
            return Err(Error::OutOfRange {
                position: at + 4,
                length: self.buf.len(),
            });
        }
        self.buf[at..(at + 4)].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        WriteBytesExt::write_u8(self, value)?;
        Ok(())
    }

    #[inline]
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        WriteBytesExt::write_i32::<LittleEndian>(self, value)?;
        Ok(())
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        WriteBytesExt::write_u32::<LittleEndian>(self, value)?;
        Ok(())
    }

    #[inline]
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        WriteBytesExt::write_i64::<LittleEndian>(self, value)?;
        Ok(())
    }

    #[inline]
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        WriteBytesExt::write_f64::<LittleEndian>(self, value)?;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure_remaining(1)?;
        Ok(ReadBytesExt::read_u8(self)?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure_remaining(4)?;
        Ok(ReadBytesExt::read_i32::<LittleEndian>(self)?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure_remaining(4)?;
        Ok(ReadBytesExt::read_u32::<LittleEndian>(self)?)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure_remaining(8)?;
        Ok(ReadBytesExt::read_i64::<LittleEndian>(self)?)
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.ensure_remaining(8)?;
        Ok(ReadBytesExt::read_f64::<LittleEndian>(self)?)
    }

    /// UTF-8 bytes followed by a single zero byte, no length prefix.
    pub fn write_cstring(&mut self, value: &str) -> Result<()> {
        if value.as_bytes().contains(&0) {
            return Err(Error::InvalidCString);
        }
        self.write_bytes(value.as_bytes());
        self.write_u8(0)
    }

    pub fn read_cstring(&mut self) -> Result<String> {
        let start = self.position;
        let zero = match self.buf[start..].iter().position(|b| *b == 0) {
            Some(offset) => start + offset,
            None => {
                return Err(Error::UnexpectedEnd {
                    needed: self.remaining() + 1,
                    remaining: self.remaining(),
                })
            }
        };
        let value = std::str::from_utf8(&self.buf[start..zero])?.to_string();
        self.position = zero + 1;
        Ok(value)
    }

    /// Length-prefixed form: the int32 length counts the trailing zero.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        self.write_i32((bytes.len() + 1) as i32)?;
        self.write_bytes(bytes);
        self.write_u8(0)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let start = self.position;
        let result = self.read_string_inner();
        if result.is_err() {
            self.position = start;
        }
        result
    }

    fn read_string_inner(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len < 1 {
            return Err(Error::InvalidLength(len));
        }
        let bytes = self.read_bytes(len as usize)?;
        let (content, terminator) = bytes.split_at(bytes.len() - 1);
        if terminator[0] != 0 {
            return Err(Error::InvalidLength(len));
        }
        let value = String::from_utf8(content.to_vec())?;
        Ok(value)
    }

    fn ensure_remaining(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(Error::UnexpectedEnd {
                needed,
                remaining,
            });
        }
        Ok(())
    }

}

impl Write for BinaryCursor {

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.write_bytes(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

}

impl Read for BinaryCursor {

    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = std::cmp::min(out.len(), self.remaining());
        out[..n].copy_from_slice(&self.buf[self.position..(self.position + n)]);
        self.position += n;
        Ok(n)
    }

}
