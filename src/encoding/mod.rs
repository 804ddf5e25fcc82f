//! BACnet Encoding/Decoding Module
//!
//! Wire codec for the tag-length-value grammar of ASHRAE 135 clause 20.2.
//!
//! # Overview
//!
//! - [`tag`]: the tag cursor, decoding one element header at a time
//! - [`primitive`]: typed interpretation of a tag's value bytes
//! - [`validation`]: structural checks over a whole payload
//! - this module: the shared error type, application tag numbers, codec
//!   limits and the writer side that produces the same framing
//!
//! # Example
//!
//! ```
//! use bacnet_codec::encoding::*;
//!
//! let mut buffer = Vec::new();
//! encode_unsigned(&mut buffer, 256).unwrap();
//! assert_eq!(buffer, [0x22, 0x01, 0x00]);
//!
//! let mut parser = TagParser::new(&buffer);
//! assert_eq!(parser.parse_next().unwrap(), 3);
//! assert_eq!(parser.to_unsigned().unwrap(), 256);
//! ```

pub mod primitive;
pub mod tag;
pub mod validation;

pub use primitive::{CharacterSet, Date, PrimitiveValue, Time};
pub use tag::{decode_tag, Tag, TagParser};
pub use validation::TagValidator;

use crate::app::RejectReason;
use crate::object::ObjectIdentifier;

/// Result type for encoding operations
pub type Result<T> = std::result::Result<T, EncodingError>;

/// Errors that can occur during encoding/decoding operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// Buffer shorter than the minimum header of its PDU type
    #[error("buffer too small for the PDU header")]
    BufferTooSmall,
    /// Buffer size outside the limits accepted for this operation
    #[error("inappropriate buffer size")]
    InappropriateBufferSize,
    /// PDU type nibble with no known meaning
    #[error("unexpected PDU type {0}")]
    UnexpectedType(u8),
    /// Declared length runs past the end of the buffer
    #[error("buffer overrun while decoding tag")]
    BufferOverrun,
    /// Current tag is an application tag of a different type
    #[error("application tag is not of the requested type")]
    AppTagNotRequestedType,
    /// Value length not valid for the requested type
    #[error("value has the wrong length for the requested type")]
    ContextValueWrongLength,
    /// Valid character set this codec does not implement
    #[error("unsupported character set {0}")]
    UnsupportedCharacterSet(u8),
    /// Bytes that are not valid BACnet for the requested type
    #[error("malformed value")]
    MalformedValue,
    /// Value cannot be represented on the wire
    #[error("value out of valid range")]
    ValueOutOfRange,
}

impl EncodingError {
    /// Stable negative integer code for callers that carry errors as numbers
    pub fn code(&self) -> i16 {
        match self {
            EncodingError::BufferTooSmall => -1,
            EncodingError::InappropriateBufferSize => -2,
            EncodingError::UnexpectedType(_) => -3,
            EncodingError::BufferOverrun => -4,
            EncodingError::AppTagNotRequestedType => -5,
            EncodingError::ContextValueWrongLength => -6,
            EncodingError::UnsupportedCharacterSet(_) => -7,
            EncodingError::MalformedValue => -8,
            EncodingError::ValueOutOfRange => -9,
        }
    }

    /// Reject reason to answer a confirmed request whose payload failed to decode
    ///
    /// Header-level failures return `None`: without a decodable header there is
    /// no invoke id to reject.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            EncodingError::BufferOverrun => Some(RejectReason::MissingRequiredParameter),
            EncodingError::AppTagNotRequestedType => Some(RejectReason::InvalidTag),
            EncodingError::ContextValueWrongLength | EncodingError::MalformedValue => {
                Some(RejectReason::InvalidParameterDataType)
            }
            EncodingError::UnsupportedCharacterSet(_) => Some(RejectReason::ParameterOutOfRange),
            EncodingError::ValueOutOfRange => Some(RejectReason::ParameterOutOfRange),
            EncodingError::BufferTooSmall
            | EncodingError::InappropriateBufferSize
            | EncodingError::UnexpectedType(_) => None,
        }
    }
}

/// BACnet application tag numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ApplicationTag {
    Null = 0,
    Boolean = 1,
    UnsignedInt = 2,
    SignedInt = 3,
    Real = 4,
    Double = 5,
    OctetString = 6,
    CharacterString = 7,
    BitString = 8,
    Enumerated = 9,
    Date = 10,
    Time = 11,
    ObjectIdentifier = 12,
}

impl TryFrom<u8> for ApplicationTag {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ApplicationTag::Null),
            1 => Ok(ApplicationTag::Boolean),
            2 => Ok(ApplicationTag::UnsignedInt),
            3 => Ok(ApplicationTag::SignedInt),
            4 => Ok(ApplicationTag::Real),
            5 => Ok(ApplicationTag::Double),
            6 => Ok(ApplicationTag::OctetString),
            7 => Ok(ApplicationTag::CharacterString),
            8 => Ok(ApplicationTag::BitString),
            9 => Ok(ApplicationTag::Enumerated),
            10 => Ok(ApplicationTag::Date),
            11 => Ok(ApplicationTag::Time),
            12 => Ok(ApplicationTag::ObjectIdentifier),
            _ => Err(EncodingError::MalformedValue),
        }
    }
}

impl ApplicationTag {
    /// Exact value length for fixed-width types
    pub fn fixed_length(&self) -> Option<usize> {
        match self {
            ApplicationTag::Null => Some(0),
            ApplicationTag::Boolean => Some(1),
            ApplicationTag::Real
            | ApplicationTag::Date
            | ApplicationTag::Time
            | ApplicationTag::ObjectIdentifier => Some(4),
            ApplicationTag::Double => Some(8),
            _ => None,
        }
    }
}

/// Limits applied by the tag cursor and validator
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodecConfig {
    /// Largest buffer an owned snapshot may copy
    pub max_copy_len: usize,
    /// Deepest opening-tag nesting accepted when walking constructed data
    pub max_nesting_depth: usize,
    /// Largest single primitive value accepted by the validator
    pub max_value_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_copy_len: crate::BACNET_MAX_APDU,
            max_nesting_depth: 16,
            max_value_len: crate::BACNET_MAX_APDU,
        }
    }
}

const EXTENDED_TAG_NUMBER: u8 = 0x0F;
const EXTENDED_LENGTH: u8 = 0x05;
const OPENING_TAG: u8 = 0x06;
const CLOSING_TAG: u8 = 0x07;
const CONTEXT_CLASS: u8 = 0x08;

fn tag_octet(buffer: &mut Vec<u8>, number: u8, context: bool, lvt: u8) -> Result<()> {
    if number == 0xFF {
        return Err(EncodingError::ValueOutOfRange);
    }
    let class = if context { CONTEXT_CLASS } else { 0 };
    if number < EXTENDED_TAG_NUMBER {
        buffer.push((number << 4) | class | lvt);
    } else {
        buffer.push((EXTENDED_TAG_NUMBER << 4) | class | lvt);
        buffer.push(number);
    }
    Ok(())
}

fn encode_tag(buffer: &mut Vec<u8>, number: u8, context: bool, length: usize) -> Result<()> {
    if length < EXTENDED_LENGTH as usize {
        return tag_octet(buffer, number, context, length as u8);
    }

    tag_octet(buffer, number, context, EXTENDED_LENGTH)?;
    if length < 254 {
        buffer.push(length as u8);
    } else if length <= u16::MAX as usize {
        buffer.push(254);
        buffer.extend_from_slice(&(length as u16).to_be_bytes());
    } else {
        let length = u32::try_from(length).map_err(|_| EncodingError::ValueOutOfRange)?;
        buffer.push(255);
        buffer.extend_from_slice(&length.to_be_bytes());
    }
    Ok(())
}

/// Encode a BACnet application tag header
pub fn encode_application_tag(buffer: &mut Vec<u8>, tag: ApplicationTag, length: usize) -> Result<()> {
    encode_tag(buffer, tag as u8, false, length)
}

/// Encode a context-specific tag header; numbers from 15 use the extended form
pub fn encode_context_tag(buffer: &mut Vec<u8>, tag_number: u8, length: usize) -> Result<()> {
    encode_tag(buffer, tag_number, true, length)
}

/// Encode an opening tag
pub fn encode_opening_tag(buffer: &mut Vec<u8>, tag_number: u8) -> Result<()> {
    tag_octet(buffer, tag_number, true, OPENING_TAG)
}

/// Encode a closing tag
pub fn encode_closing_tag(buffer: &mut Vec<u8>, tag_number: u8) -> Result<()> {
    tag_octet(buffer, tag_number, true, CLOSING_TAG)
}

/// Encode a value with its application tag
///
/// Null and Boolean carry no length field; Boolean's value lives in the tag
/// octet itself.
pub fn encode_application_value(buffer: &mut Vec<u8>, value: &PrimitiveValue) -> Result<()> {
    match value {
        PrimitiveValue::Null => buffer.push(0x00),
        PrimitiveValue::Boolean(flag) => buffer.push(0x10 | *flag as u8),
        _ => {
            let content = value.content_bytes()?;
            encode_application_tag(buffer, value.application_tag(), content.len())?;
            buffer.extend_from_slice(&content);
        }
    }
    Ok(())
}

/// Encode a value under a context tag
pub fn encode_context_value(buffer: &mut Vec<u8>, tag_number: u8, value: &PrimitiveValue) -> Result<()> {
    let content = value.content_bytes()?;
    encode_context_tag(buffer, tag_number, content.len())?;
    buffer.extend_from_slice(&content);
    Ok(())
}

/// Encode a BACnet boolean value
pub fn encode_boolean(buffer: &mut Vec<u8>, value: bool) -> Result<()> {
    encode_application_value(buffer, &PrimitiveValue::Boolean(value))
}

/// Encode a BACnet unsigned integer
pub fn encode_unsigned(buffer: &mut Vec<u8>, value: u32) -> Result<()> {
    encode_application_value(buffer, &PrimitiveValue::Unsigned(value))
}

/// Encode a BACnet signed integer
pub fn encode_signed(buffer: &mut Vec<u8>, value: i32) -> Result<()> {
    encode_application_value(buffer, &PrimitiveValue::Signed(value))
}

/// Encode a BACnet real (float) value
pub fn encode_real(buffer: &mut Vec<u8>, value: f32) -> Result<()> {
    encode_application_value(buffer, &PrimitiveValue::Real(value))
}

/// Encode a BACnet double (64-bit float)
pub fn encode_double(buffer: &mut Vec<u8>, value: f64) -> Result<()> {
    encode_application_value(buffer, &PrimitiveValue::Double(value))
}

/// Encode a BACnet octet string
pub fn encode_octet_string(buffer: &mut Vec<u8>, value: &[u8]) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::OctetString, value.len())?;
    buffer.extend_from_slice(value);
    Ok(())
}

/// Encode a BACnet character string in ANSI X3.4 / UTF-8
pub fn encode_character_string(buffer: &mut Vec<u8>, value: &str) -> Result<()> {
    encode_character_string_as(buffer, value, CharacterSet::Utf8)
}

/// Encode a BACnet character string in the given character set
pub fn encode_character_string_as(buffer: &mut Vec<u8>, value: &str, charset: CharacterSet) -> Result<()> {
    let content = primitive::encode_string_content(value, charset)?;
    encode_application_tag(buffer, ApplicationTag::CharacterString, content.len())?;
    buffer.extend_from_slice(&content);
    Ok(())
}

/// Encode a BACnet bit string
pub fn encode_bit_string(buffer: &mut Vec<u8>, bits: &[bool]) -> Result<()> {
    encode_application_value(buffer, &PrimitiveValue::BitString(bits.to_vec()))
}

/// Encode a BACnet enumerated value
pub fn encode_enumerated(buffer: &mut Vec<u8>, value: u32) -> Result<()> {
    encode_application_value(buffer, &PrimitiveValue::Enumerated(value))
}

/// Encode a BACnet date
pub fn encode_date(buffer: &mut Vec<u8>, date: Date) -> Result<()> {
    encode_application_value(buffer, &PrimitiveValue::Date(date))
}

/// Encode a BACnet time
pub fn encode_time(buffer: &mut Vec<u8>, time: Time) -> Result<()> {
    encode_application_value(buffer, &PrimitiveValue::Time(time))
}

/// Encode a BACnet object identifier
pub fn encode_object_identifier(buffer: &mut Vec<u8>, object_id: ObjectIdentifier) -> Result<()> {
    encode_application_value(buffer, &PrimitiveValue::ObjectIdentifier(object_id))
}
