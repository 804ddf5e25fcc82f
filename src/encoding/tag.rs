//! Tag cursor
//!
//! [`TagParser`] walks a buffer one tag-length-value element at a time. It
//! reports element boundaries (including opening and closing tags of
//! constructed data) but builds no tree: callers that care about nesting track
//! it themselves or use the helpers at the bottom of this module.
//!
//! # Tag octet
//!
//! ```text
//!   7   6   5   4   3   2   1   0
//! | tag number    |cls| length/value/type |
//! ```
//!
//! A tag number of 15 means the real number follows in the next octet. A
//! length of 5 means an extended length follows: one octet below 254, or 254
//! and a 16-bit length, or 255 and a 32-bit length. On context tags 6 and 7
//! mark opening and closing tags.

use std::cell::Cell;

use bytes::Bytes;
use log::{debug, trace};

use super::{ApplicationTag, CodecConfig, EncodingError, Result};
use crate::util::{hex_preview, ByteReader};

/// One decoded element header
///
/// Produced by every successful [`TagParser::parse_next`]; copy out what you
/// need before advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    /// Application tag number or context tag number
    pub number: u8,
    pub context: bool,
    pub opening: bool,
    pub closing: bool,
    /// Octets in the value region; 0 for Null and for opening/closing tags
    pub value_length: u32,
    /// Offset of the value region within the tracked buffer
    pub value_offset: usize,
}

impl Tag {
    pub fn is_opening_or_closing(&self) -> bool {
        self.opening || self.closing
    }

    /// True for an application tag of the given type
    pub fn is_application(&self, tag: ApplicationTag) -> bool {
        !self.context && self.number == tag as u8
    }

    pub fn is_context(&self, number: u8) -> bool {
        self.context && !self.is_opening_or_closing() && self.number == number
    }

    pub fn is_opening(&self, number: u8) -> bool {
        self.opening && self.number == number
    }

    pub fn is_closing(&self, number: u8) -> bool {
        self.closing && self.number == number
    }

    /// Application type, `None` for context tags and reserved numbers
    pub fn application_tag(&self) -> Option<ApplicationTag> {
        if self.context {
            return None;
        }
        ApplicationTag::try_from(self.number).ok()
    }
}

/// Decode the element header at the start of `data`
///
/// Returns the tag, with `value_offset` relative to `data`, and the total
/// number of octets the element occupies. Nothing past `data.len()` is read:
/// a header or value that does not fit is [`EncodingError::BufferOverrun`].
pub fn decode_tag(data: &[u8]) -> Result<(Tag, usize)> {
    let mut reader = ByteReader::new(data);
    let first = reader.read_u8().ok_or(EncodingError::BufferOverrun)?;

    let context = first & 0x08 != 0;
    let mut number = first >> 4;
    if number == 0x0F {
        number = reader.read_u8().ok_or(EncodingError::BufferOverrun)?;
    }
    let lvt = first & 0x07;

    let mut tag = Tag {
        number,
        context,
        ..Tag::default()
    };

    // Null and Boolean carry no length field, Boolean's value is the tag octet
    if !context && number <= ApplicationTag::Boolean as u8 {
        if number == ApplicationTag::Boolean as u8 {
            tag.value_length = 1;
            tag.value_offset = 0;
        } else {
            tag.value_offset = reader.position();
        }
        return Ok((tag, reader.position()));
    }

    let length = match lvt {
        6 if context => {
            tag.opening = true;
            0
        }
        7 if context => {
            tag.closing = true;
            0
        }
        5 => match reader.read_u8().ok_or(EncodingError::BufferOverrun)? {
            254 => reader.read_u16().ok_or(EncodingError::BufferOverrun)? as u32,
            255 => reader.read_u32().ok_or(EncodingError::BufferOverrun)?,
            short => short as u32,
        },
        literal => literal as u32,
    };

    if length as usize > reader.remaining() {
        return Err(EncodingError::BufferOverrun);
    }
    tag.value_offset = reader.position();
    tag.value_length = length;
    Ok((tag, reader.position() + length as usize))
}

#[derive(Debug, Clone)]
enum Tracked<'a> {
    Borrowed(&'a [u8]),
    Owned(Bytes),
}

impl Tracked<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Tracked::Borrowed(data) => data,
            Tracked::Owned(data) => data,
        }
    }
}

/// Cursor over a buffer of tagged elements
///
/// Borrows the caller's buffer until [`copy_data`](Self::copy_data) or
/// [`into_owned`](Self::into_owned) takes a private snapshot. One parser
/// serves one buffer at a time; it is not meant to be shared between threads.
#[derive(Debug, Clone)]
pub struct TagParser<'a> {
    data: Tracked<'a>,
    /// Offset of the current tag's first octet
    cursor: usize,
    /// Offset where the next element starts
    next: usize,
    tag: Option<Tag>,
    last_error: Cell<Option<EncodingError>>,
    /// Set when a declared length ran past the buffer; blocks `parse_next`
    overrun: bool,
    config: CodecConfig,
}

impl<'a> TagParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, CodecConfig::default())
    }

    pub fn with_config(data: &'a [u8], config: CodecConfig) -> Self {
        Self {
            data: Tracked::Borrowed(data),
            cursor: 0,
            next: 0,
            tag: None,
            last_error: Cell::new(None),
            overrun: false,
            config,
        }
    }

    /// Bind to a new buffer, dropping any owned snapshot and the last error
    pub fn set_data(&mut self, data: &'a [u8]) {
        self.data = Tracked::Borrowed(data);
        self.reset();
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.next = 0;
        self.tag = None;
        self.last_error.set(None);
        self.overrun = false;
    }

    /// Decode the next element
    ///
    /// Returns the number of octets consumed, or 0 once the buffer is
    /// exhausted. After a [`EncodingError::BufferOverrun`] the cursor cannot
    /// advance again until [`set_data`](Self::set_data).
    pub fn parse_next(&mut self) -> Result<usize> {
        if self.overrun {
            return Err(EncodingError::BufferOverrun);
        }

        let data = self.data.as_slice();
        let start = self.next;
        if start >= data.len() {
            self.cursor = start;
            self.tag = None;
            return Ok(0);
        }

        match decode_tag(&data[start..]) {
            Ok((mut tag, consumed)) => {
                tag.value_offset += start;
                trace!(
                    "tag {}{} at {}: {} octets [{}]",
                    if tag.context { "ctx " } else { "app " },
                    tag.number,
                    start,
                    consumed,
                    hex_preview(&data[start..start + consumed], 16)
                );
                self.cursor = start;
                self.next = start + consumed;
                self.tag = Some(tag);
                Ok(consumed)
            }
            Err(err) => {
                debug!(
                    "tag decode failed at offset {} of {}: {} [{}]",
                    start,
                    data.len(),
                    err,
                    hex_preview(&data[start..], 16)
                );
                self.cursor = start;
                self.tag = None;
                self.overrun = err == EncodingError::BufferOverrun;
                Err(self.fail(err))
            }
        }
    }

    /// Take a private copy of the tracked buffer; a no-op when already owned
    pub fn copy_data(&mut self) -> Result<()> {
        if let Tracked::Borrowed(data) = self.data {
            self.data = Tracked::Owned(self.snapshot(data)?);
        }
        Ok(())
    }

    /// Detach from the caller's buffer, keeping the cursor position
    pub fn into_owned(self) -> Result<TagParser<'static>> {
        let data = match &self.data {
            Tracked::Borrowed(data) => self.snapshot(data)?,
            Tracked::Owned(data) => data.clone(),
        };
        Ok(TagParser {
            data: Tracked::Owned(data),
            cursor: self.cursor,
            next: self.next,
            tag: self.tag,
            last_error: self.last_error,
            overrun: self.overrun,
            config: self.config,
        })
    }

    fn snapshot(&self, data: &[u8]) -> Result<Bytes> {
        if data.len() > self.config.max_copy_len {
            debug!(
                "refusing to copy {} octets, limit is {}",
                data.len(),
                self.config.max_copy_len
            );
            return Err(self.fail(EncodingError::InappropriateBufferSize));
        }
        Ok(Bytes::copy_from_slice(data))
    }

    pub(crate) fn fail(&self, err: EncodingError) -> EncodingError {
        self.last_error.set(Some(err));
        err
    }

    /// The current tag, `None` before the first element and at the end
    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    /// Value octets of the current tag
    pub fn value(&self) -> &[u8] {
        match self.tag {
            Some(tag) => {
                let end = tag.value_offset + tag.value_length as usize;
                &self.data.as_slice()[tag.value_offset..end]
            }
            None => &[],
        }
    }

    /// Whole tracked buffer
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.data, Tracked::Owned(_))
    }

    /// Offset of the current tag's first octet
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Octets not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.as_slice().len().saturating_sub(self.next)
    }

    /// Unconsumed tail of the buffer
    pub fn rest(&self) -> &[u8] {
        let data = self.data.as_slice();
        &data[self.next.min(data.len())..]
    }

    /// Most recent failure, kept for diagnostics until `set_data`
    pub fn last_error(&self) -> Option<EncodingError> {
        self.last_error.get()
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Header of the next element without consuming it
    pub fn peek_tag(&self) -> Result<Option<Tag>> {
        let rest = self.rest();
        if rest.is_empty() {
            return Ok(None);
        }
        let (mut tag, _) = decode_tag(rest)?;
        tag.value_offset += self.next;
        Ok(Some(tag))
    }

    /// Advance and return the new tag; running out of data is an overrun
    pub fn next_tag(&mut self) -> Result<Tag> {
        if self.parse_next()? == 0 {
            return Err(self.fail(EncodingError::BufferOverrun));
        }
        self.tag
            .ok_or_else(|| self.fail(EncodingError::BufferOverrun))
    }

    /// Consume an opening tag with the given number
    pub fn expect_opening(&mut self, number: u8) -> Result<()> {
        let tag = self.next_tag()?;
        if !tag.is_opening(number) {
            return Err(self.fail(EncodingError::AppTagNotRequestedType));
        }
        Ok(())
    }

    /// Consume a closing tag with the given number
    pub fn expect_closing(&mut self, number: u8) -> Result<()> {
        let tag = self.next_tag()?;
        if !tag.is_closing(number) {
            return Err(self.fail(EncodingError::AppTagNotRequestedType));
        }
        Ok(())
    }

    /// Skip from the current opening tag to its matching closing tag
    ///
    /// Returns the octets skipped after the opening tag, the closing tag
    /// included. Nesting is checked against `max_nesting_depth` and closing
    /// tags must match the innermost open number.
    pub fn skip_constructed(&mut self) -> Result<usize> {
        let opening = match self.tag {
            Some(tag) if tag.opening => tag.number,
            _ => return Err(self.fail(EncodingError::AppTagNotRequestedType)),
        };

        let start = self.next;
        let mut open = vec![opening];
        while let Some(&innermost) = open.last() {
            let tag = self.next_tag()?;
            if tag.opening {
                if open.len() >= self.config.max_nesting_depth {
                    return Err(self.fail(EncodingError::MalformedValue));
                }
                open.push(tag.number);
            } else if tag.closing {
                if tag.number != innermost {
                    return Err(self.fail(EncodingError::MalformedValue));
                }
                open.pop();
            }
        }
        Ok(self.next - start)
    }
}

impl TagParser<'static> {
    /// Parser over an already owned buffer
    pub fn from_bytes(data: Bytes) -> Self {
        Self {
            data: Tracked::Owned(data),
            cursor: 0,
            next: 0,
            tag: None,
            last_error: Cell::new(None),
            overrun: false,
            config: CodecConfig::default(),
        }
    }
}
