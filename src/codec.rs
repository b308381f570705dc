//! Wire codec for reply frames.
//!
//! [`ReplyCodec`] is the seam between the reply reader and the wire encoding:
//! it decodes the envelope (status code, secondary code, variant discriminant)
//! and one payload per variant. [`decode_reply`](ReplyCodec::decode_reply)
//! performs the dispatch, so a decode failure at any depth aborts the whole
//! read — partially decoded payloads are owned by the failing routine and are
//! dropped before the error surfaces.
//!
//! [`BinaryReplyCodec`] is the default implementation. Its byte layout is its
//! own contract and opaque to the rest of the crate: big-endian integers,
//! length-prefixed UTF-8 strings, count-prefixed sequences, and a presence
//! byte in front of every optional field. Length and count fields are
//! validated against configured limits before any allocation, and payload
//! buffers are reserved fallibly so an absurd (but within-limit) claim
//! surfaces as resource exhaustion instead of an abort.

use std::io::{self, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::reply::{
    AttrList,
    Attribute,
    Reply,
    ReplyBody,
    ResourceQuery,
    SelectList,
    StatusEntry,
    StatusList,
};

pub mod error;

pub use error::DecodeError;

/// Default limit on one decoded text field.
pub const DEFAULT_MAX_TEXT_LEN: usize = 64 * 1024;

/// Default limit on one decoded list or array.
pub const DEFAULT_MAX_LIST_LEN: usize = 64 * 1024;

/// Reply variant named by the envelope discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyKind {
    Empty,
    Text,
    Select,
    Status,
    ResourceQuery,
}

/// Envelope fields preceding the variant payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Server-reported status code.
    pub code: u32,
    /// Secondary server code.
    pub aux_code: u32,
    /// Variant selecting the payload that follows.
    pub kind: ReplyKind,
}

/// Decoder for one reply frame.
///
/// Implementations own the byte layout; the provided
/// [`decode_reply`](Self::decode_reply) owns the envelope-then-payload
/// dispatch.
pub trait ReplyCodec {
    /// Decode the envelope preceding the payload.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] for truncation, an unknown discriminant, or
    /// a transport failure.
    fn decode_envelope(&self, reader: &mut dyn Read) -> Result<Envelope, DecodeError>;

    /// Decode a text payload; `None` models an absent message.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the payload is malformed or truncated.
    fn decode_text(&self, reader: &mut dyn Read) -> Result<Option<String>, DecodeError>;

    /// Decode a selection payload: an ordered list of job identifiers.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the payload is malformed or truncated.
    fn decode_select(&self, reader: &mut dyn Read) -> Result<SelectList, DecodeError>;

    /// Decode a status payload: entries each owning an attribute list.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the payload is malformed or truncated.
    fn decode_status(&self, reader: &mut dyn Read) -> Result<StatusList, DecodeError>;

    /// Decode a resource query payload: four independently optional arrays.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the payload is malformed or truncated.
    fn decode_resource_query(&self, reader: &mut dyn Read)
    -> Result<ResourceQuery, DecodeError>;

    /// Decode one complete reply: envelope, then the payload its
    /// discriminant selects.
    ///
    /// # Errors
    ///
    /// Returns the first [`DecodeError`] encountered; nothing half-built
    /// remains reachable afterwards.
    fn decode_reply(&self, reader: &mut dyn Read) -> Result<Reply, DecodeError> {
        let envelope = self.decode_envelope(reader)?;
        let body = match envelope.kind {
            ReplyKind::Empty => ReplyBody::Empty,
            ReplyKind::Text => ReplyBody::Text(self.decode_text(reader)?),
            ReplyKind::Select => ReplyBody::Select(self.decode_select(reader)?),
            ReplyKind::Status => ReplyBody::Status(self.decode_status(reader)?),
            ReplyKind::ResourceQuery => {
                ReplyBody::ResourceQuery(self.decode_resource_query(reader)?)
            }
        };
        Ok(Reply::new(envelope.code, envelope.aux_code, body))
    }
}

// Wire discriminants understood by `BinaryReplyCodec`.
const TAG_EMPTY: u8 = 0;
const TAG_TEXT: u8 = 1;
const TAG_SELECT: u8 = 2;
const TAG_STATUS: u8 = 3;
const TAG_RESOURCE_QUERY: u8 = 4;

const FLAG_ABSENT: u8 = 0;
const FLAG_PRESENT: u8 = 1;

/// Default reply codec: big-endian, length-prefixed binary layout.
#[derive(Clone, Copy, Debug)]
pub struct BinaryReplyCodec {
    max_text_len: usize,
    max_list_len: usize,
}

impl Default for BinaryReplyCodec {
    fn default() -> Self { Self::new(DEFAULT_MAX_TEXT_LEN, DEFAULT_MAX_LIST_LEN) }
}

impl BinaryReplyCodec {
    /// Construct a codec with explicit text and list limits.
    #[must_use]
    pub fn new(max_text_len: usize, max_list_len: usize) -> Self {
        Self {
            max_text_len,
            max_list_len,
        }
    }

    /// Limit on one decoded text field.
    #[must_use]
    pub fn max_text_len(&self) -> usize { self.max_text_len }

    /// Limit on one decoded list or array.
    #[must_use]
    pub fn max_list_len(&self) -> usize { self.max_list_len }

    fn read_string(&self, reader: &mut dyn Read) -> Result<String, DecodeError> {
        let len = checked_len(read_u32(reader)?, self.max_text_len)?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| DecodeError::ResourceExhaustion)?;
        buf.resize(len, 0);
        fill(reader, &mut buf)?;
        String::from_utf8(buf).map_err(|_| DecodeError::InvalidText)
    }

    fn read_opt_string(&self, reader: &mut dyn Read) -> Result<Option<String>, DecodeError> {
        if read_presence(reader)? {
            Ok(Some(self.read_string(reader)?))
        } else {
            Ok(None)
        }
    }

    fn read_opt_counts(&self, reader: &mut dyn Read) -> Result<Option<Vec<u64>>, DecodeError> {
        if !read_presence(reader)? {
            return Ok(None);
        }
        let count = checked_len(read_u32(reader)?, self.max_list_len)?;
        let mut counts = Vec::new();
        counts
            .try_reserve_exact(count)
            .map_err(|_| DecodeError::ResourceExhaustion)?;
        for _ in 0..count {
            counts.push(read_u64(reader)?);
        }
        Ok(Some(counts))
    }

    fn read_attribute(&self, reader: &mut dyn Read) -> Result<Attribute, DecodeError> {
        Ok(Attribute {
            name: self.read_opt_string(reader)?,
            resource: self.read_opt_string(reader)?,
            value: self.read_opt_string(reader)?,
        })
    }

    fn read_status_entry(&self, reader: &mut dyn Read) -> Result<StatusEntry, DecodeError> {
        let kind = read_u8(reader)?;
        let name = self.read_string(reader)?;
        let count = checked_len(read_u32(reader)?, self.max_list_len)?;
        let attributes = (0..count)
            .map(|_| self.read_attribute(&mut *reader))
            .collect::<Result<AttrList, _>>()?;
        Ok(StatusEntry {
            kind,
            name,
            attributes,
        })
    }

    /// Encode one reply into a frame this codec decodes.
    ///
    /// This is the server half of the codec pair; the client crate exposes it
    /// for harnesses and fixtures.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::OversizedLength`] if a field exceeds the
    /// codec's limits or the wire's 32-bit length fields.
    pub fn encode_reply(&self, reply: &Reply) -> Result<Bytes, DecodeError> {
        let mut buf = BytesMut::new();
        buf.put_u32(reply.code());
        buf.put_u32(reply.aux_code());
        match reply.body() {
            ReplyBody::Empty => buf.put_u8(TAG_EMPTY),
            ReplyBody::Text(text) => {
                buf.put_u8(TAG_TEXT);
                put_opt_string(&mut buf, text.as_deref())?;
            }
            ReplyBody::Select(jobs) => {
                buf.put_u8(TAG_SELECT);
                put_count(&mut buf, jobs.len())?;
                for job_id in jobs {
                    put_string(&mut buf, job_id)?;
                }
            }
            ReplyBody::Status(entries) => {
                buf.put_u8(TAG_STATUS);
                put_count(&mut buf, entries.len())?;
                for entry in entries {
                    buf.put_u8(entry.kind);
                    put_string(&mut buf, &entry.name)?;
                    put_count(&mut buf, entry.attributes.len())?;
                    for attribute in &entry.attributes {
                        put_opt_string(&mut buf, attribute.name.as_deref())?;
                        put_opt_string(&mut buf, attribute.resource.as_deref())?;
                        put_opt_string(&mut buf, attribute.value.as_deref())?;
                    }
                }
            }
            ReplyBody::ResourceQuery(query) => {
                buf.put_u8(TAG_RESOURCE_QUERY);
                for counts in [
                    query.available.as_deref(),
                    query.allocated.as_deref(),
                    query.reserved.as_deref(),
                    query.down.as_deref(),
                ] {
                    put_opt_counts(&mut buf, counts)?;
                }
            }
        }
        Ok(buf.freeze())
    }
}

impl ReplyCodec for BinaryReplyCodec {
    fn decode_envelope(&self, reader: &mut dyn Read) -> Result<Envelope, DecodeError> {
        let code = read_u32(reader)?;
        let aux_code = read_u32(reader)?;
        let kind = match read_u8(reader)? {
            TAG_EMPTY => ReplyKind::Empty,
            TAG_TEXT => ReplyKind::Text,
            TAG_SELECT => ReplyKind::Select,
            TAG_STATUS => ReplyKind::Status,
            TAG_RESOURCE_QUERY => ReplyKind::ResourceQuery,
            tag => return Err(DecodeError::UnknownDiscriminant { tag }),
        };
        Ok(Envelope {
            code,
            aux_code,
            kind,
        })
    }

    fn decode_text(&self, reader: &mut dyn Read) -> Result<Option<String>, DecodeError> {
        self.read_opt_string(reader)
    }

    fn decode_select(&self, reader: &mut dyn Read) -> Result<SelectList, DecodeError> {
        let count = checked_len(read_u32(reader)?, self.max_list_len)?;
        (0..count).map(|_| self.read_string(&mut *reader)).collect()
    }

    fn decode_status(&self, reader: &mut dyn Read) -> Result<StatusList, DecodeError> {
        let count = checked_len(read_u32(reader)?, self.max_list_len)?;
        (0..count)
            .map(|_| self.read_status_entry(&mut *reader))
            .collect()
    }

    fn decode_resource_query(
        &self,
        reader: &mut dyn Read,
    ) -> Result<ResourceQuery, DecodeError> {
        Ok(ResourceQuery {
            available: self.read_opt_counts(reader)?,
            allocated: self.read_opt_counts(reader)?,
            reserved: self.read_opt_counts(reader)?,
            down: self.read_opt_counts(reader)?,
        })
    }
}

/// Read exactly `buf.len()` bytes, mapping a short stream to `Truncated`.
fn fill(reader: &mut dyn Read, buf: &mut [u8]) -> Result<(), DecodeError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            DecodeError::Truncated { needed: buf.len() }
        } else {
            DecodeError::Io(e)
        }
    })
}

fn read_u8(reader: &mut dyn Read) -> Result<u8, DecodeError> {
    let mut buf = [0u8; 1];
    fill(reader, &mut buf)?;
    Ok(buf[0])
}

fn read_u32(reader: &mut dyn Read) -> Result<u32, DecodeError> {
    let mut buf = [0u8; 4];
    fill(reader, &mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u64(reader: &mut dyn Read) -> Result<u64, DecodeError> {
    let mut buf = [0u8; 8];
    fill(reader, &mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

fn read_presence(reader: &mut dyn Read) -> Result<bool, DecodeError> {
    match read_u8(reader)? {
        FLAG_ABSENT => Ok(false),
        FLAG_PRESENT => Ok(true),
        flag => Err(DecodeError::InvalidFlag { flag }),
    }
}

fn checked_len(len: u32, max: usize) -> Result<usize, DecodeError> {
    let len = len as usize;
    if len > max {
        return Err(DecodeError::OversizedLength { len, max });
    }
    Ok(len)
}

fn wire_len(len: usize) -> Result<u32, DecodeError> {
    u32::try_from(len).map_err(|_| DecodeError::OversizedLength {
        len,
        max: u32::MAX as usize,
    })
}

fn put_string(buf: &mut BytesMut, value: &str) -> Result<(), DecodeError> {
    buf.put_u32(wire_len(value.len())?);
    buf.put_slice(value.as_bytes());
    Ok(())
}

fn put_opt_string(buf: &mut BytesMut, value: Option<&str>) -> Result<(), DecodeError> {
    match value {
        None => buf.put_u8(FLAG_ABSENT),
        Some(value) => {
            buf.put_u8(FLAG_PRESENT);
            put_string(buf, value)?;
        }
    }
    Ok(())
}

fn put_count(buf: &mut BytesMut, count: usize) -> Result<(), DecodeError> {
    buf.put_u32(wire_len(count)?);
    Ok(())
}

fn put_opt_counts(buf: &mut BytesMut, counts: Option<&[u64]>) -> Result<(), DecodeError> {
    match counts {
        None => buf.put_u8(FLAG_ABSENT),
        Some(counts) => {
            buf.put_u8(FLAG_PRESENT);
            put_count(buf, counts.len())?;
            for count in counts {
                buf.put_u64(*count);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
