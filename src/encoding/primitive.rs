//! Primitive value decoders
//!
//! Pure functions turning a tag's value bytes into typed values, plus the
//! `to_*` methods on [`TagParser`] that apply them to the current tag after
//! checking its type and length.
//!
//! A context tag carries no type of its own, so its value is accepted by
//! every decoder and the caller's knowledge of the enclosing production
//! decides which one to call. An application tag must match the decoder.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use log::warn;

use super::{ApplicationTag, EncodingError, Result, TagParser};
use crate::object::ObjectIdentifier;
use crate::util::{bacnet_date_to_string, bacnet_time_to_string};

const UNSPECIFIED: u8 = 0xFF;

/// Character set identifiers carried in the first octet of a character string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CharacterSet {
    /// ANSI X3.4, decoded as UTF-8
    Utf8 = 0,
    /// IBM/Microsoft DBCS
    IbmDbcs = 1,
    /// JIS C 6226
    JisC6226 = 2,
    /// ISO 10646 UCS-4
    Ucs4 = 3,
    /// ISO 10646 UCS-2
    Ucs2 = 4,
    /// ISO 8859-1
    Iso8859_1 = 5,
}

impl TryFrom<u8> for CharacterSet {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(CharacterSet::Utf8),
            1 => Ok(CharacterSet::IbmDbcs),
            2 => Ok(CharacterSet::JisC6226),
            3 => Ok(CharacterSet::Ucs4),
            4 => Ok(CharacterSet::Ucs2),
            5 => Ok(CharacterSet::Iso8859_1),
            _ => Err(EncodingError::MalformedValue),
        }
    }
}

/// BACnet date; `None` fields are the 0xFF "unspecified" wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    pub year: Option<u16>,
    pub month: Option<u8>,
    pub day: Option<u8>,
    /// 1 = Monday .. 7 = Sunday
    pub weekday: Option<u8>,
}

impl Date {
    pub fn new(year: Option<u16>, month: Option<u8>, day: Option<u8>, weekday: Option<u8>) -> Self {
        Self {
            year,
            month,
            day,
            weekday,
        }
    }

    /// Calendar date, if every field except the weekday is a concrete value
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            self.year? as i32,
            self.month? as u32,
            self.day? as u32,
        )
    }
}

impl TryFrom<NaiveDate> for Date {
    type Error = EncodingError;

    fn try_from(date: NaiveDate) -> Result<Self> {
        let year = u16::try_from(date.year())
            .ok()
            .filter(|year| (1900..1900 + UNSPECIFIED as u16).contains(year))
            .ok_or(EncodingError::ValueOutOfRange)?;
        Ok(Self::new(
            Some(year),
            Some(date.month() as u8),
            Some(date.day() as u8),
            Some(date.weekday().number_from_monday() as u8),
        ))
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bacnet_date_to_string(self.year, self.month, self.day, self.weekday))
    }
}

/// BACnet time of day at hundredth-of-a-second resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time {
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<u8>,
    pub hundredths: Option<u8>,
}

impl Time {
    pub fn new(hour: Option<u8>, minute: Option<u8>, second: Option<u8>, hundredths: Option<u8>) -> Self {
        Self {
            hour,
            minute,
            second,
            hundredths,
        }
    }

    /// Wall-clock time with hundredths scaled to milliseconds
    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        let hundredths = self.hundredths.filter(|h| *h < 100)?;
        NaiveTime::from_hms_milli_opt(
            self.hour? as u32,
            self.minute? as u32,
            self.second? as u32,
            hundredths as u32 * 10,
        )
    }
}

impl From<NaiveTime> for Time {
    fn from(time: NaiveTime) -> Self {
        // leap seconds report nanoseconds past 1e9
        let hundredths = (time.nanosecond() / 10_000_000).min(99) as u8;
        Self::new(
            Some(time.hour() as u8),
            Some(time.minute() as u8),
            Some(time.second() as u8),
            Some(hundredths),
        )
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bacnet_time_to_string(self.hour, self.minute, self.second, self.hundredths))
    }
}

/// Any primitive application-tagged value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveValue {
    Null,
    Boolean(bool),
    Unsigned(u32),
    Signed(i32),
    Real(f32),
    Double(f64),
    OctetString(Vec<u8>),
    CharacterString(String),
    /// Bits in wire order, most significant bit of the first octet first
    BitString(Vec<bool>),
    Enumerated(u32),
    Date(Date),
    Time(Time),
    ObjectIdentifier(ObjectIdentifier),
}

impl PrimitiveValue {
    pub fn application_tag(&self) -> ApplicationTag {
        match self {
            PrimitiveValue::Null => ApplicationTag::Null,
            PrimitiveValue::Boolean(_) => ApplicationTag::Boolean,
            PrimitiveValue::Unsigned(_) => ApplicationTag::UnsignedInt,
            PrimitiveValue::Signed(_) => ApplicationTag::SignedInt,
            PrimitiveValue::Real(_) => ApplicationTag::Real,
            PrimitiveValue::Double(_) => ApplicationTag::Double,
            PrimitiveValue::OctetString(_) => ApplicationTag::OctetString,
            PrimitiveValue::CharacterString(_) => ApplicationTag::CharacterString,
            PrimitiveValue::BitString(_) => ApplicationTag::BitString,
            PrimitiveValue::Enumerated(_) => ApplicationTag::Enumerated,
            PrimitiveValue::Date(_) => ApplicationTag::Date,
            PrimitiveValue::Time(_) => ApplicationTag::Time,
            PrimitiveValue::ObjectIdentifier(_) => ApplicationTag::ObjectIdentifier,
        }
    }

    /// Value octets as they follow a context tag
    ///
    /// Boolean is a single octet here; under an application tag it is folded
    /// into the tag octet instead.
    pub fn content_bytes(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            PrimitiveValue::Null => Vec::new(),
            PrimitiveValue::Boolean(flag) => vec![*flag as u8],
            PrimitiveValue::Unsigned(value) | PrimitiveValue::Enumerated(value) => {
                let bytes = value.to_be_bytes();
                let skip = bytes.iter().take(3).take_while(|b| **b == 0).count();
                bytes[skip..].to_vec()
            }
            PrimitiveValue::Signed(value) => {
                let bytes = value.to_be_bytes();
                let width = match *value {
                    -0x80..=0x7F => 1,
                    -0x8000..=0x7FFF => 2,
                    -0x80_0000..=0x7F_FFFF => 3,
                    _ => 4,
                };
                bytes[4 - width..].to_vec()
            }
            PrimitiveValue::Real(value) => value.to_be_bytes().to_vec(),
            PrimitiveValue::Double(value) => value.to_be_bytes().to_vec(),
            PrimitiveValue::OctetString(bytes) => bytes.clone(),
            PrimitiveValue::CharacterString(text) => encode_string_content(text, CharacterSet::Utf8)?,
            PrimitiveValue::BitString(bits) => {
                let unused = (8 - bits.len() % 8) % 8;
                let mut bytes = vec![0u8; 1 + bits.len().div_ceil(8)];
                bytes[0] = unused as u8;
                for (i, _) in bits.iter().enumerate().filter(|(_, bit)| **bit) {
                    bytes[1 + i / 8] |= 0x80 >> (i % 8);
                }
                bytes
            }
            PrimitiveValue::Date(date) => {
                let year = match date.year {
                    None => UNSPECIFIED,
                    Some(year) if (1900..1900 + UNSPECIFIED as u16).contains(&year) => (year - 1900) as u8,
                    Some(_) => return Err(EncodingError::ValueOutOfRange),
                };
                vec![
                    year,
                    date.month.unwrap_or(UNSPECIFIED),
                    date.day.unwrap_or(UNSPECIFIED),
                    date.weekday.unwrap_or(UNSPECIFIED),
                ]
            }
            PrimitiveValue::Time(time) => vec![
                time.hour.unwrap_or(UNSPECIFIED),
                time.minute.unwrap_or(UNSPECIFIED),
                time.second.unwrap_or(UNSPECIFIED),
                time.hundredths.unwrap_or(UNSPECIFIED),
            ],
            PrimitiveValue::ObjectIdentifier(id) => {
                if !id.is_valid() {
                    return Err(EncodingError::ValueOutOfRange);
                }
                u32::from(*id).to_be_bytes().to_vec()
            }
        };
        Ok(bytes)
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Null => write!(f, "null"),
            PrimitiveValue::Boolean(v) => write!(f, "{}", v),
            PrimitiveValue::Unsigned(v) | PrimitiveValue::Enumerated(v) => write!(f, "{}", v),
            PrimitiveValue::Signed(v) => write!(f, "{}", v),
            PrimitiveValue::Real(v) => write!(f, "{}", v),
            PrimitiveValue::Double(v) => write!(f, "{}", v),
            PrimitiveValue::OctetString(bytes) => write!(f, "X'{}'", hex::encode_upper(bytes)),
            PrimitiveValue::CharacterString(text) => write!(f, "{:?}", text),
            PrimitiveValue::BitString(bits) => {
                for bit in bits {
                    f.write_str(if *bit { "1" } else { "0" })?;
                }
                Ok(())
            }
            PrimitiveValue::Date(date) => write!(f, "{}", date),
            PrimitiveValue::Time(time) => write!(f, "{}", time),
            PrimitiveValue::ObjectIdentifier(id) => write!(f, "{}", id),
        }
    }
}

/// Character string octets: charset id followed by the encoded text
pub fn encode_string_content(text: &str, charset: CharacterSet) -> Result<Vec<u8>> {
    let mut bytes = vec![charset as u8];
    match charset {
        CharacterSet::Utf8 => bytes.extend_from_slice(text.as_bytes()),
        CharacterSet::Ucs2 => {
            if text.chars().any(|c| c as u32 > 0xFFFF) {
                return Err(EncodingError::ValueOutOfRange);
            }
            bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        }
        CharacterSet::Ucs4 => bytes.extend(text.chars().flat_map(|c| (c as u32).to_be_bytes())),
        CharacterSet::Iso8859_1 => {
            if !encoding_rs::mem::is_str_latin1(text) {
                return Err(EncodingError::ValueOutOfRange);
            }
            bytes.extend_from_slice(&encoding_rs::mem::encode_latin1_lossy(text));
        }
        CharacterSet::IbmDbcs | CharacterSet::JisC6226 => {
            return Err(EncodingError::UnsupportedCharacterSet(charset as u8))
        }
    }
    Ok(bytes)
}

fn fixed<const N: usize>(value: &[u8]) -> Result<[u8; N]> {
    value.try_into().map_err(|_| EncodingError::ContextValueWrongLength)
}

fn integer_octets(value: &[u8]) -> Result<&[u8]> {
    if value.is_empty() || value.len() > 4 {
        return Err(EncodingError::ContextValueWrongLength);
    }
    Ok(value)
}

/// Boolean from the low bit of its single octet
pub fn decode_boolean(value: &[u8]) -> Result<bool> {
    let [octet] = fixed::<1>(value)?;
    Ok(octet & 0x01 != 0)
}

/// Big-endian unsigned integer of 1 to 4 octets
pub fn decode_unsigned(value: &[u8]) -> Result<u32> {
    Ok(integer_octets(value)?
        .iter()
        .fold(0u32, |acc, b| (acc << 8) | *b as u32))
}

/// Big-endian two's complement integer of 1 to 4 octets, sign-extended
pub fn decode_signed(value: &[u8]) -> Result<i32> {
    let octets = integer_octets(value)?;
    let seed: i32 = if octets[0] & 0x80 != 0 { -1 } else { 0 };
    Ok(octets.iter().fold(seed, |acc, b| (acc << 8) | *b as i32))
}

pub fn decode_real(value: &[u8]) -> Result<f32> {
    Ok(f32::from_be_bytes(fixed(value)?))
}

pub fn decode_double(value: &[u8]) -> Result<f64> {
    Ok(f64::from_be_bytes(fixed(value)?))
}

/// Character string in any supported character set
pub fn decode_character_string(value: &[u8]) -> Result<String> {
    let (&charset_id, text) = value
        .split_first()
        .ok_or(EncodingError::ContextValueWrongLength)?;

    match CharacterSet::try_from(charset_id)? {
        CharacterSet::Utf8 => std::str::from_utf8(text)
            .map(str::to_owned)
            .map_err(|_| EncodingError::MalformedValue),
        CharacterSet::Ucs2 => {
            if text.len() % 2 != 0 {
                return Err(EncodingError::MalformedValue);
            }
            // fixed-width code units, no surrogate pairs
            let surrogate = text
                .chunks_exact(2)
                .any(|unit| (0xD8..=0xDF).contains(&unit[0]));
            if surrogate {
                return Err(EncodingError::MalformedValue);
            }
            encoding_rs::UTF_16BE
                .decode_without_bom_handling_and_without_replacement(text)
                .map(|decoded| decoded.into_owned())
                .ok_or(EncodingError::MalformedValue)
        }
        CharacterSet::Ucs4 => {
            if text.len() % 4 != 0 {
                return Err(EncodingError::MalformedValue);
            }
            text.chunks_exact(4)
                .map(|unit| {
                    char::from_u32(u32::from_be_bytes([unit[0], unit[1], unit[2], unit[3]]))
                        .ok_or(EncodingError::MalformedValue)
                })
                .collect()
        }
        CharacterSet::Iso8859_1 => Ok(encoding_rs::mem::decode_latin1(text).into_owned()),
        charset @ (CharacterSet::IbmDbcs | CharacterSet::JisC6226) => {
            warn!("character set {:?} is not supported, string of {} octets not decoded", charset, text.len());
            Err(EncodingError::UnsupportedCharacterSet(charset_id))
        }
    }
}

/// Bit string: unused-bit count, then bits packed most significant first
pub fn decode_bit_string(value: &[u8]) -> Result<Vec<bool>> {
    let (&unused, packed) = value
        .split_first()
        .ok_or(EncodingError::ContextValueWrongLength)?;
    if unused > 7 || (packed.is_empty() && unused != 0) {
        return Err(EncodingError::MalformedValue);
    }

    let count = packed.len() * 8 - unused as usize;
    Ok((0..count)
        .map(|i| packed[i / 8] & (0x80 >> (i % 8)) != 0)
        .collect())
}

fn specified(octet: u8) -> Option<u8> {
    (octet != UNSPECIFIED).then_some(octet)
}

pub fn decode_date(value: &[u8]) -> Result<Date> {
    let [year, month, day, weekday] = fixed(value)?;
    Ok(Date::new(
        specified(year).map(|offset| 1900 + offset as u16),
        specified(month),
        specified(day),
        specified(weekday),
    ))
}

pub fn decode_time(value: &[u8]) -> Result<Time> {
    let [hour, minute, second, hundredths] = fixed(value)?;
    Ok(Time::new(
        specified(hour),
        specified(minute),
        specified(second),
        specified(hundredths),
    ))
}

pub fn decode_object_identifier(value: &[u8]) -> Result<ObjectIdentifier> {
    Ok(ObjectIdentifier::from(u32::from_be_bytes(fixed(value)?)))
}

/// Decode value octets as the given application type
pub fn decode_value(tag: ApplicationTag, value: &[u8]) -> Result<PrimitiveValue> {
    Ok(match tag {
        ApplicationTag::Null => {
            if !value.is_empty() {
                return Err(EncodingError::ContextValueWrongLength);
            }
            PrimitiveValue::Null
        }
        ApplicationTag::Boolean => PrimitiveValue::Boolean(decode_boolean(value)?),
        ApplicationTag::UnsignedInt => PrimitiveValue::Unsigned(decode_unsigned(value)?),
        ApplicationTag::SignedInt => PrimitiveValue::Signed(decode_signed(value)?),
        ApplicationTag::Real => PrimitiveValue::Real(decode_real(value)?),
        ApplicationTag::Double => PrimitiveValue::Double(decode_double(value)?),
        ApplicationTag::OctetString => PrimitiveValue::OctetString(value.to_vec()),
        ApplicationTag::CharacterString => PrimitiveValue::CharacterString(decode_character_string(value)?),
        ApplicationTag::BitString => PrimitiveValue::BitString(decode_bit_string(value)?),
        ApplicationTag::Enumerated => PrimitiveValue::Enumerated(decode_unsigned(value)?),
        ApplicationTag::Date => PrimitiveValue::Date(decode_date(value)?),
        ApplicationTag::Time => PrimitiveValue::Time(decode_time(value)?),
        ApplicationTag::ObjectIdentifier => PrimitiveValue::ObjectIdentifier(decode_object_identifier(value)?),
    })
}

impl<'a> TagParser<'a> {
    /// Value octets of the current tag if it may hold a value of `expected`
    fn typed_value(&self, expected: ApplicationTag) -> Result<&[u8]> {
        match self.tag() {
            Some(tag)
                if !tag.is_opening_or_closing()
                    && (tag.context || tag.number == expected as u8) =>
            {
                Ok(self.value())
            }
            _ => Err(self.fail(EncodingError::AppTagNotRequestedType)),
        }
    }

    fn decode_as<T>(&self, expected: ApplicationTag, decode: fn(&[u8]) -> Result<T>) -> Result<T> {
        let value = self.typed_value(expected)?;
        decode(value).map_err(|err| self.fail(err))
    }

    pub fn to_null(&self) -> Result<()> {
        self.decode_as(ApplicationTag::Null, |value| {
            if value.is_empty() {
                Ok(())
            } else {
                Err(EncodingError::ContextValueWrongLength)
            }
        })
    }

    pub fn to_boolean(&self) -> Result<bool> {
        self.decode_as(ApplicationTag::Boolean, decode_boolean)
    }

    pub fn to_unsigned(&self) -> Result<u32> {
        self.decode_as(ApplicationTag::UnsignedInt, decode_unsigned)
    }

    pub fn to_signed(&self) -> Result<i32> {
        self.decode_as(ApplicationTag::SignedInt, decode_signed)
    }

    pub fn to_enumerated(&self) -> Result<u32> {
        self.decode_as(ApplicationTag::Enumerated, decode_unsigned)
    }

    pub fn to_real(&self) -> Result<f32> {
        self.decode_as(ApplicationTag::Real, decode_real)
    }

    pub fn to_double(&self) -> Result<f64> {
        self.decode_as(ApplicationTag::Double, decode_double)
    }

    /// Octet string borrowed from the tracked buffer
    pub fn to_octet_string(&self) -> Result<&[u8]> {
        self.typed_value(ApplicationTag::OctetString)
    }

    pub fn to_character_string(&self) -> Result<String> {
        self.decode_as(ApplicationTag::CharacterString, decode_character_string)
    }

    pub fn to_bit_string(&self) -> Result<Vec<bool>> {
        self.decode_as(ApplicationTag::BitString, decode_bit_string)
    }

    pub fn to_date(&self) -> Result<Date> {
        self.decode_as(ApplicationTag::Date, decode_date)
    }

    pub fn to_time(&self) -> Result<Time> {
        self.decode_as(ApplicationTag::Time, decode_time)
    }

    pub fn to_object_identifier(&self) -> Result<ObjectIdentifier> {
        self.decode_as(ApplicationTag::ObjectIdentifier, decode_object_identifier)
    }

    /// Decode the current value as `tag`, the usual path for context tags
    pub fn to_value(&self, tag: ApplicationTag) -> Result<PrimitiveValue> {
        let value = self.typed_value(tag)?;
        decode_value(tag, value).map_err(|err| self.fail(err))
    }

    /// Decode the current application-tagged value by its own type
    pub fn to_application_value(&self) -> Result<PrimitiveValue> {
        match self.tag() {
            Some(tag) if !tag.context => {
                let app_tag = ApplicationTag::try_from(tag.number).map_err(|err| self.fail(err))?;
                self.to_value(app_tag)
            }
            _ => Err(self.fail(EncodingError::AppTagNotRequestedType)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectType;

    const TEXT: &[u8] = b"This is a BACnet string!";

    fn parsed(data: &[u8]) -> TagParser<'_> {
        let mut parser = TagParser::new(data);
        assert_eq!(parser.parse_next().unwrap(), data.len());
        parser
    }

    #[test]
    fn test_application_null_and_boolean() {
        let parser = parsed(&[0x00]);
        let tag = parser.tag().unwrap();
        assert!(!tag.context);
        assert_eq!(tag.application_tag(), Some(ApplicationTag::Null));
        assert!(parser.to_null().is_ok());

        let parser = parsed(&[0x10]);
        let tag = parser.tag().unwrap();
        assert_eq!(tag.value_length, 1);
        assert_eq!(tag.application_tag(), Some(ApplicationTag::Boolean));
        assert_eq!(parser.to_boolean(), Ok(false));

        assert_eq!(parsed(&[0x11]).to_boolean(), Ok(true));
    }

    #[test]
    fn test_application_numbers() {
        let parser = parsed(&[0x31, 0x48]);
        assert_eq!(parser.tag().unwrap().application_tag(), Some(ApplicationTag::SignedInt));
        assert_eq!(parser.to_signed(), Ok(72));

        let parser = parsed(&[0x44, 0x42, 0x90, 0x00, 0x00]);
        assert_eq!(parser.to_real(), Ok(72.0));

        let parser = parsed(&[0x55, 0x08, 0x40, 0x52, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(parser.tag().unwrap().value_length, 8);
        assert_eq!(parser.to_double(), Ok(72.0));

        let parser = parsed(&[0x91, 0x00]);
        assert_eq!(parser.to_enumerated(), Ok(0));
    }

    #[test]
    fn test_application_strings() {
        let parser = parsed(&[0x63, 0x12, 0x34, 0xff]);
        assert_eq!(parser.to_octet_string(), Ok(&[0x12, 0x34, 0xff][..]));

        let mut ansi = vec![0x75, 0x19, 0x00];
        ansi.extend_from_slice(TEXT);
        assert_eq!(parsed(&ansi).to_character_string().unwrap(), "This is a BACnet string!");

        let mut dbcs = vec![0x75, 0x1b, 0x01, 0x03, 0x52];
        dbcs.extend_from_slice(TEXT);
        let parser = parsed(&dbcs);
        assert_eq!(
            parser.to_character_string(),
            Err(EncodingError::UnsupportedCharacterSet(1))
        );
        assert_eq!(parser.last_error(), Some(EncodingError::UnsupportedCharacterSet(1)));

        let mut ucs2 = vec![0x75, 0x31, 0x04];
        ucs2.extend(TEXT.iter().flat_map(|c| [0x00, *c]));
        let text = parsed(&ucs2).to_character_string().unwrap();
        assert_eq!(text, "This is a BACnet string!");
        assert_eq!(text.chars().count(), 24);
    }

    #[test]
    fn test_application_bit_string() {
        let parser = parsed(&[0x82, 0x03, 0xa8]);
        assert_eq!(
            parser.to_bit_string().unwrap(),
            vec![true, false, true, false, true]
        );
    }

    #[test]
    fn test_application_date_time_object_id() {
        let date = parsed(&[0xa4, 0x5b, 0x01, 0x18, 0x04]).to_date().unwrap();
        assert_eq!(date, Date::new(Some(1991), Some(1), Some(24), Some(4)));
        assert_eq!(date.to_naive_date(), NaiveDate::from_ymd_opt(1991, 1, 24));

        let time = parsed(&[0xb4, 0x11, 0x23, 0x2d, 0x11]).to_time().unwrap();
        assert_eq!(time, Time::new(Some(17), Some(35), Some(45), Some(17)));
        assert_eq!(time.to_naive_time(), NaiveTime::from_hms_milli_opt(17, 35, 45, 170));

        let id = parsed(&[0xc4, 0x00, 0xc0, 0x00, 0x0f]).to_object_identifier().unwrap();
        assert_eq!(id.object_type, ObjectType::BinaryInput);
        assert_eq!(id.instance, 15);
    }

    #[test]
    fn test_context_primitives() {
        let parser = parsed(&[0x38]);
        let tag = parser.tag().unwrap();
        assert!(tag.context);
        assert_eq!((tag.number, tag.value_length), (3, 0));
        assert!(parser.to_null().is_ok());

        let parser = parsed(&[0x69, 0x00]);
        assert_eq!(parser.tag().unwrap().number, 6);
        assert_eq!(parser.tag().unwrap().value_length, 1);
        assert_eq!(parser.to_boolean(), Ok(false));

        let parser = parsed(&[0x0a, 0x01, 0x00]);
        assert_eq!(parser.tag().unwrap().number, 0);
        assert_eq!(parser.to_unsigned(), Ok(256));

        let parser = parsed(&[0x59, 0xb8]);
        assert_eq!(parser.tag().unwrap().number, 5);
        assert_eq!(parser.to_signed(), Ok(-72));

        let real = parsed(&[0x0c, 0xc2, 0x05, 0x33, 0x33]).to_real().unwrap();
        assert!((real - -33.3).abs() < 0.01);

        let parser = parsed(&[0x1d, 0x08, 0xC0, 0x40, 0xA6, 0x66, 0x66, 0x66, 0x66, 0x66]);
        assert_eq!(parser.tag().unwrap().number, 1);
        assert!((parser.to_double().unwrap() - -33.3).abs() < 0.0001);

        let parser = parsed(&[0x1a, 0x43, 0x21]);
        assert_eq!(parser.to_octet_string(), Ok(&[0x43, 0x21][..]));

        let parser = parsed(&[0x99, 0x00]);
        assert_eq!(parser.tag().unwrap().number, 9);
        assert_eq!(
            ObjectType::from(parser.to_enumerated().unwrap() as u16),
            ObjectType::AnalogInput
        );
    }

    #[test]
    fn test_context_constructed_types() {
        let mut text = vec![0x5d, 0x19, 0x00];
        text.extend_from_slice(TEXT);
        let parser = parsed(&text);
        assert_eq!(parser.tag().unwrap().number, 5);
        assert_eq!(parser.to_character_string().unwrap(), "This is a BACnet string!");

        let parser = parsed(&[0x0a, 0x03, 0xa8]);
        assert_eq!(
            parser.to_bit_string().unwrap(),
            vec![true, false, true, false, true]
        );

        let parser = parsed(&[0x9c, 0x5b, 0x01, 0x18, 0x05]);
        assert_eq!(parser.tag().unwrap().number, 9);
        assert_eq!(
            parser.to_date().unwrap().to_naive_date(),
            NaiveDate::from_ymd_opt(1991, 1, 24)
        );

        let parser = parsed(&[0x4c, 0x11, 0x23, 0x2d, 0x11]);
        assert_eq!(parser.tag().unwrap().number, 4);
        let time = parser.to_time().unwrap().to_naive_time().unwrap();
        assert_eq!((time.hour(), time.minute(), time.second()), (17, 35, 45));

        let parser = parsed(&[0x4c, 0x00, 0xc0, 0x00, 0x0f]);
        assert_eq!(
            parser.to_object_identifier().unwrap(),
            ObjectIdentifier::new(ObjectType::BinaryInput, 15)
        );
    }

    #[test]
    fn test_choice_of_primitive_time() {
        let parser = parsed(&[0x0c, 0x11, 0x23, 0x2D, 0x11]);
        let tag = parser.tag().unwrap();
        assert!(tag.context && tag.number == 0);
        assert_eq!(
            parser.to_time().unwrap().to_naive_time(),
            NaiveTime::from_hms_milli_opt(17, 35, 45, 170)
        );
    }

    #[test]
    fn test_mismatched_application_tag_is_rejected() {
        let parser = parsed(&[0x21, 0x05]);
        assert_eq!(parser.to_signed(), Err(EncodingError::AppTagNotRequestedType));
        assert_eq!(parser.to_real(), Err(EncodingError::AppTagNotRequestedType));
        assert_eq!(parser.last_error(), Some(EncodingError::AppTagNotRequestedType));
        assert_eq!(parser.to_unsigned(), Ok(5));

        let no_tag = TagParser::new(&[0x21, 0x05]);
        assert_eq!(no_tag.to_unsigned(), Err(EncodingError::AppTagNotRequestedType));
    }

    #[test]
    fn test_wrong_lengths_fail_without_value() {
        // real with three octets
        let parser = parsed(&[0x43, 0x42, 0x90, 0x00]);
        assert_eq!(parser.to_real(), Err(EncodingError::ContextValueWrongLength));

        // context tag read as real with two octets
        let parser = parsed(&[0x0a, 0x42, 0x90]);
        assert_eq!(parser.to_real(), Err(EncodingError::ContextValueWrongLength));

        let parser = parsed(&[0x25, 0x05, 1, 2, 3, 4, 5]);
        assert_eq!(parser.to_unsigned(), Err(EncodingError::ContextValueWrongLength));

        let parser = parsed(&[0x20]);
        assert_eq!(parser.to_unsigned(), Err(EncodingError::ContextValueWrongLength));

        let parser = parsed(&[0x70]);
        assert_eq!(parser.to_character_string(), Err(EncodingError::ContextValueWrongLength));
    }

    #[test]
    fn test_signed_sign_extension() {
        assert_eq!(decode_signed(&[0xff]), Ok(-1));
        assert_eq!(decode_signed(&[0x80, 0x00]), Ok(-32768));
        assert_eq!(decode_signed(&[0xff, 0x7f, 0xff]), Ok(-32769));
        assert_eq!(decode_signed(&[0x80, 0x00, 0x00, 0x00]), Ok(i32::MIN));
        assert_eq!(decode_signed(&[0x00, 0xff]), Ok(255));
        assert_eq!(decode_unsigned(&[0xff, 0xff, 0xff, 0xff]), Ok(u32::MAX));
    }

    #[test]
    fn test_malformed_bit_strings() {
        assert_eq!(decode_bit_string(&[0x08, 0xff]), Err(EncodingError::MalformedValue));
        assert_eq!(decode_bit_string(&[0x01]), Err(EncodingError::MalformedValue));
        assert_eq!(decode_bit_string(&[0x00]), Ok(Vec::new()));
        assert_eq!(decode_bit_string(&[0x00, 0x80]).unwrap().len(), 8);
    }

    #[test]
    fn test_other_character_sets() {
        assert_eq!(
            decode_character_string(&[0x05, 0x47, 0x72, 0xfc, 0xdf]).unwrap(),
            "Grüß"
        );
        assert_eq!(
            decode_character_string(&[0x03, 0x00, 0x01, 0xF6, 0x00]).unwrap(),
            "\u{1F600}"
        );
        assert_eq!(
            decode_character_string(&[0x02, 0x30, 0x42]),
            Err(EncodingError::UnsupportedCharacterSet(2))
        );
        assert_eq!(decode_character_string(&[0x04, 0x00]), Err(EncodingError::MalformedValue));
        assert_eq!(
            decode_character_string(&[0x04, 0xD8, 0x3D, 0xDE, 0x00]),
            Err(EncodingError::MalformedValue)
        );
        assert_eq!(decode_character_string(&[0x04, 0xDC, 0x00]), Err(EncodingError::MalformedValue));
        assert_eq!(decode_character_string(&[0x04, 0xFF, 0xFD]).unwrap(), "\u{FFFD}");
        assert_eq!(
            encode_string_content("\u{1F600}", CharacterSet::Ucs2),
            Err(EncodingError::ValueOutOfRange)
        );
        assert_eq!(decode_character_string(&[0x00, 0xc3]), Err(EncodingError::MalformedValue));
        assert_eq!(decode_character_string(&[0x09, 0x41]), Err(EncodingError::MalformedValue));
        assert_eq!(
            decode_character_string(&[0x03, 0x00, 0x11, 0x00, 0x00]),
            Err(EncodingError::MalformedValue)
        );

        for charset in [CharacterSet::Ucs2, CharacterSet::Ucs4, CharacterSet::Iso8859_1] {
            let content = encode_string_content("Grüß", charset).unwrap();
            assert_eq!(content[0], charset as u8);
            assert_eq!(decode_character_string(&content).unwrap(), "Grüß");
        }
        assert_eq!(
            encode_string_content("Ω", CharacterSet::Iso8859_1),
            Err(EncodingError::ValueOutOfRange)
        );
    }

    #[test]
    fn test_unspecified_date_time_fields() {
        let date = decode_date(&[0xff, 0x0c, 0xff, 0xff]).unwrap();
        assert_eq!(date, Date::new(None, Some(12), None, None));
        assert_eq!(date.to_naive_date(), None);
        assert_eq!(date.to_string(), "*/12/* (*)");

        let time = decode_time(&[0x08, 0x00, 0xff, 0xff]).unwrap();
        assert_eq!(time.to_naive_time(), None);

        let value = PrimitiveValue::Date(date);
        assert_eq!(value.content_bytes().unwrap(), vec![0xff, 0x0c, 0xff, 0xff]);
    }

    #[test]
    fn test_chrono_conversions() {
        let naive = NaiveDate::from_ymd_opt(1991, 1, 24).unwrap();
        let date = Date::try_from(naive).unwrap();
        assert_eq!(date.weekday, Some(4));
        assert_eq!(date.to_naive_date(), Some(naive));

        let too_early = NaiveDate::from_ymd_opt(1850, 1, 1).unwrap();
        assert_eq!(Date::try_from(too_early), Err(EncodingError::ValueOutOfRange));

        let time = Time::from(NaiveTime::from_hms_milli_opt(18, 45, 0, 990).unwrap());
        assert_eq!(time, Time::new(Some(18), Some(45), Some(0), Some(99)));
    }

    #[test]
    fn test_application_value_dispatch() {
        assert_eq!(
            parsed(&[0x44, 0x42, 0x90, 0x00, 0x00]).to_application_value(),
            Ok(PrimitiveValue::Real(72.0))
        );
        assert_eq!(parsed(&[0x00]).to_application_value(), Ok(PrimitiveValue::Null));
        assert_eq!(parsed(&[0x11]).to_application_value(), Ok(PrimitiveValue::Boolean(true)));
        assert_eq!(
            parsed(&[0x29, 0x01]).to_application_value(),
            Err(EncodingError::AppTagNotRequestedType)
        );
        assert_eq!(
            parsed(&[0x29, 0x01]).to_value(ApplicationTag::Boolean),
            Ok(PrimitiveValue::Boolean(true))
        );
        assert_eq!(
            parsed(&[0xd1, 0x00]).to_application_value(),
            Err(EncodingError::MalformedValue)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(PrimitiveValue::OctetString(vec![0x12, 0xab]).to_string(), "X'12AB'");
        assert_eq!(PrimitiveValue::BitString(vec![true, false, true]).to_string(), "101");
        assert_eq!(PrimitiveValue::CharacterString("hi".into()).to_string(), "\"hi\"");
        assert_eq!(
            PrimitiveValue::Time(Time::new(Some(17), Some(35), Some(45), Some(17))).to_string(),
            "17:35:45.17"
        );
    }
}
