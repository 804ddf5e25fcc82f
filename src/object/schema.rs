//! Property schema table
//!
//! Maps (object type, property) to the wire type of the property value so a
//! service handler can decode a `propertyValue` region without knowing the
//! property itself. Build the table once with [`PropertySchema::standard`]
//! (or extend it with [`PropertySchema::insert`]) and pass it by reference to
//! whatever decodes property values.
//!
//! Properties missing from the table still decode: application-tagged
//! values are read by their own tag and constructed values are kept as raw
//! octets.

use std::collections::HashMap;

use log::debug;

use super::{ObjectType, PropertyIdentifier};
use crate::encoding::{ApplicationTag, Date, EncodingError, PrimitiveValue, Result, TagParser, Time};

/// Expected wire type of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// A single application-tagged primitive
    Primitive(ApplicationTag),
    /// BACnetDateTime: application Date followed by application Time
    DateTime,
    /// BACnetTimeStamp choice: `[0]` time, `[1]` sequence number, `[2]` date-time
    TimeStamp,
    /// Anything; decoded by its own tags
    Any,
    /// BACnetARRAY; index 0 reads the length as Unsigned
    ArrayOf(&'static DataType),
    /// BACnetLIST
    ListOf(&'static DataType),
}

const BOOLEAN: DataType = DataType::Primitive(ApplicationTag::Boolean);
const UNSIGNED: DataType = DataType::Primitive(ApplicationTag::UnsignedInt);
const SIGNED: DataType = DataType::Primitive(ApplicationTag::SignedInt);
const REAL: DataType = DataType::Primitive(ApplicationTag::Real);
const CHARACTER_STRING: DataType = DataType::Primitive(ApplicationTag::CharacterString);
const BIT_STRING: DataType = DataType::Primitive(ApplicationTag::BitString);
const ENUMERATED: DataType = DataType::Primitive(ApplicationTag::Enumerated);
const DATE: DataType = DataType::Primitive(ApplicationTag::Date);
const TIME: DataType = DataType::Primitive(ApplicationTag::Time);
const OBJECT_IDENTIFIER: DataType = DataType::Primitive(ApplicationTag::ObjectIdentifier);
const TIME_STAMP: DataType = DataType::TimeStamp;
const ANY: DataType = DataType::Any;

/// BACnetTimeStamp
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeStamp {
    Time(Time),
    SequenceNumber(u32),
    DateTime(Date, Time),
}

/// Decoded property value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue {
    Primitive(PrimitiveValue),
    DateTime(Date, Time),
    TimeStamp(TimeStamp),
    /// Elements of an array or list, or several values of an unknown property
    Sequence(Vec<PropertyValue>),
    /// Context-tagged primitive of unknown type
    Context { tag_number: u8, data: Vec<u8> },
    /// Constructed value of unknown type, opening and closing tags included
    Constructed { tag_number: u8, data: Vec<u8> },
}

const COMMON: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::ObjectIdentifier, OBJECT_IDENTIFIER),
    (PropertyIdentifier::ObjectName, CHARACTER_STRING),
    (PropertyIdentifier::ObjectType, ENUMERATED),
    (PropertyIdentifier::Description, CHARACTER_STRING),
    (PropertyIdentifier::ProfileName, CHARACTER_STRING),
];

const EVENT_REPORTING: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::StatusFlags, BIT_STRING),
    (PropertyIdentifier::EventState, ENUMERATED),
    (PropertyIdentifier::Reliability, ENUMERATED),
    (PropertyIdentifier::OutOfService, BOOLEAN),
    (PropertyIdentifier::TimeDelay, UNSIGNED),
    (PropertyIdentifier::NotificationClass, UNSIGNED),
    (PropertyIdentifier::EventEnable, BIT_STRING),
    (PropertyIdentifier::AckedTransitions, BIT_STRING),
    (PropertyIdentifier::NotifyType, ENUMERATED),
    (PropertyIdentifier::EventTimeStamps, DataType::ArrayOf(&TIME_STAMP)),
];

const DEVICE: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::SystemStatus, ENUMERATED),
    (PropertyIdentifier::VendorName, CHARACTER_STRING),
    (PropertyIdentifier::VendorIdentifier, UNSIGNED),
    (PropertyIdentifier::ModelName, CHARACTER_STRING),
    (PropertyIdentifier::FirmwareRevision, CHARACTER_STRING),
    (PropertyIdentifier::ApplicationSoftwareVersion, CHARACTER_STRING),
    (PropertyIdentifier::Location, CHARACTER_STRING),
    (PropertyIdentifier::ProtocolVersion, UNSIGNED),
    (PropertyIdentifier::ProtocolRevision, UNSIGNED),
    (PropertyIdentifier::ProtocolServicesSupported, BIT_STRING),
    (PropertyIdentifier::ProtocolObjectTypesSupported, BIT_STRING),
    (PropertyIdentifier::ObjectList, DataType::ArrayOf(&OBJECT_IDENTIFIER)),
    (PropertyIdentifier::MaxApduLengthAccepted, UNSIGNED),
    (PropertyIdentifier::SegmentationSupported, ENUMERATED),
    (PropertyIdentifier::LocalDate, DATE),
    (PropertyIdentifier::LocalTime, TIME),
    (PropertyIdentifier::UtcOffset, SIGNED),
    (PropertyIdentifier::DaylightSavingsStatus, BOOLEAN),
    (PropertyIdentifier::ApduSegmentTimeout, UNSIGNED),
    (PropertyIdentifier::ApduTimeout, UNSIGNED),
    (PropertyIdentifier::NumberOfApduRetries, UNSIGNED),
    (PropertyIdentifier::MaxMaster, UNSIGNED),
    (PropertyIdentifier::MaxInfoFrames, UNSIGNED),
    (PropertyIdentifier::DeviceAddressBinding, DataType::ListOf(&ANY)),
    (PropertyIdentifier::DatabaseRevision, UNSIGNED),
    (PropertyIdentifier::ActiveCovSubscriptions, DataType::ListOf(&ANY)),
];

const ANALOG: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::PresentValue, REAL),
    (PropertyIdentifier::DeviceType, CHARACTER_STRING),
    (PropertyIdentifier::Units, ENUMERATED),
    (PropertyIdentifier::MinPresValue, REAL),
    (PropertyIdentifier::MaxPresValue, REAL),
    (PropertyIdentifier::Resolution, REAL),
    (PropertyIdentifier::CovIncrement, REAL),
    (PropertyIdentifier::HighLimit, REAL),
    (PropertyIdentifier::LowLimit, REAL),
    (PropertyIdentifier::Deadband, REAL),
    (PropertyIdentifier::LimitEnable, BIT_STRING),
];

const ANALOG_INPUT: &[(PropertyIdentifier, DataType)] = &[(PropertyIdentifier::UpdateInterval, UNSIGNED)];

const ANALOG_COMMANDABLE: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::RelinquishDefault, REAL),
    (PropertyIdentifier::PriorityArray, DataType::ArrayOf(&REAL)),
];

const BINARY: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::PresentValue, ENUMERATED),
    (PropertyIdentifier::InactiveText, CHARACTER_STRING),
    (PropertyIdentifier::ActiveText, CHARACTER_STRING),
    (PropertyIdentifier::ChangeOfStateTime, DataType::DateTime),
    (PropertyIdentifier::ChangeOfStateCount, UNSIGNED),
    (PropertyIdentifier::TimeOfStateCountReset, DataType::DateTime),
    (PropertyIdentifier::ElapsedActiveTime, UNSIGNED),
    (PropertyIdentifier::TimeOfActiveTimeReset, DataType::DateTime),
    (PropertyIdentifier::MinimumOffTime, UNSIGNED),
    (PropertyIdentifier::MinimumOnTime, UNSIGNED),
];

const BINARY_INPUT: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::DeviceType, CHARACTER_STRING),
    (PropertyIdentifier::Polarity, ENUMERATED),
    (PropertyIdentifier::AlarmValue, ENUMERATED),
];

const BINARY_OUTPUT: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::DeviceType, CHARACTER_STRING),
    (PropertyIdentifier::Polarity, ENUMERATED),
    (PropertyIdentifier::RelinquishDefault, ENUMERATED),
    (PropertyIdentifier::PriorityArray, DataType::ArrayOf(&ENUMERATED)),
    (PropertyIdentifier::FeedbackValue, ENUMERATED),
];

const BINARY_VALUE: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::RelinquishDefault, ENUMERATED),
    (PropertyIdentifier::PriorityArray, DataType::ArrayOf(&ENUMERATED)),
    (PropertyIdentifier::AlarmValue, ENUMERATED),
];

const MULTI_STATE: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::PresentValue, UNSIGNED),
    (PropertyIdentifier::DeviceType, CHARACTER_STRING),
    (PropertyIdentifier::NumberOfStates, UNSIGNED),
    (PropertyIdentifier::StateText, DataType::ArrayOf(&CHARACTER_STRING)),
];

const MULTI_STATE_INPUT: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::AlarmValues, DataType::ListOf(&UNSIGNED)),
    (PropertyIdentifier::FaultValues, DataType::ListOf(&UNSIGNED)),
];

const MULTI_STATE_OUTPUT: &[(PropertyIdentifier, DataType)] = &[
    (PropertyIdentifier::RelinquishDefault, UNSIGNED),
    (PropertyIdentifier::PriorityArray, DataType::ArrayOf(&UNSIGNED)),
    (PropertyIdentifier::FeedbackValue, UNSIGNED),
];

/// Lookup table from (object type, property) to [`DataType`]
#[derive(Debug, Clone, Default)]
pub struct PropertySchema {
    entries: HashMap<(ObjectType, PropertyIdentifier), DataType>,
}

impl PropertySchema {
    /// Empty table; every property decodes generically
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for the standard Device, analog, binary and multi-state objects
    pub fn standard() -> Self {
        let mut schema = Self::new();
        let layouts: [(ObjectType, &[&[(PropertyIdentifier, DataType)]]); 9] = [
            (ObjectType::Device, &[COMMON, DEVICE]),
            (ObjectType::AnalogInput, &[COMMON, EVENT_REPORTING, ANALOG, ANALOG_INPUT]),
            (ObjectType::AnalogOutput, &[COMMON, EVENT_REPORTING, ANALOG, ANALOG_COMMANDABLE]),
            (ObjectType::AnalogValue, &[COMMON, EVENT_REPORTING, ANALOG, ANALOG_COMMANDABLE]),
            (ObjectType::BinaryInput, &[COMMON, EVENT_REPORTING, BINARY, BINARY_INPUT]),
            (ObjectType::BinaryOutput, &[COMMON, EVENT_REPORTING, BINARY, BINARY_OUTPUT]),
            (ObjectType::BinaryValue, &[COMMON, EVENT_REPORTING, BINARY, BINARY_VALUE]),
            (ObjectType::MultiStateInput, &[COMMON, EVENT_REPORTING, MULTI_STATE, MULTI_STATE_INPUT]),
            (ObjectType::MultiStateOutput, &[COMMON, EVENT_REPORTING, MULTI_STATE, MULTI_STATE_OUTPUT]),
        ];
        for (object_type, groups) in layouts {
            for &(property, data_type) in groups.iter().flat_map(|group| group.iter()) {
                schema.insert(object_type, property, data_type);
            }
        }
        schema
    }

    /// Add or replace an entry
    pub fn insert(&mut self, object_type: ObjectType, property: PropertyIdentifier, data_type: DataType) {
        self.entries.insert((object_type, property), data_type);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wire type of the value addressed by `array_index`
    ///
    /// With an index, arrays resolve to their element type (index 0 to the
    /// Unsigned length) and lists to their element type.
    pub fn lookup(
        &self,
        object_type: ObjectType,
        property: PropertyIdentifier,
        array_index: Option<u32>,
    ) -> Option<DataType> {
        let data_type = *self.entries.get(&(object_type, property))?;
        Some(match (data_type, array_index) {
            (DataType::ArrayOf(_), Some(0)) => UNSIGNED,
            (DataType::ArrayOf(element) | DataType::ListOf(element), Some(_)) => *element,
            (data_type, _) => data_type,
        })
    }

    /// Decode a property value region up to and including `closing_tag`
    ///
    /// `parser` must sit on the opening tag that starts the region (the
    /// `[3]` of a ReadProperty-ACK, for example). On success it is left on
    /// the matching closing tag.
    pub fn decode_value(
        &self,
        object_type: ObjectType,
        property: PropertyIdentifier,
        array_index: Option<u32>,
        parser: &mut TagParser<'_>,
        closing_tag: u8,
    ) -> Result<PropertyValue> {
        let data_type = self.lookup(object_type, property, array_index).unwrap_or_else(|| {
            debug!("no schema entry for {}.{}, decoding by tag", object_type, property);
            DataType::Any
        });

        let element = match data_type {
            DataType::ArrayOf(element) | DataType::ListOf(element) => *element,
            other => other,
        };

        let mut items = Vec::new();
        loop {
            let tag = parser
                .peek_tag()
                .map_err(|err| parser.fail(err))?
                .ok_or_else(|| parser.fail(EncodingError::BufferOverrun))?;
            if tag.is_closing(closing_tag) {
                parser.next_tag()?;
                break;
            }
            items.push(decode_element(element, parser)?);
        }

        match data_type {
            DataType::ArrayOf(_) | DataType::ListOf(_) => Ok(PropertyValue::Sequence(items)),
            DataType::Any if items.len() != 1 => Ok(PropertyValue::Sequence(items)),
            _ if items.len() == 1 => Ok(items.remove(0)),
            _ => {
                debug!(
                    "{}.{} expects one value, found {}",
                    object_type,
                    property,
                    items.len()
                );
                Err(parser.fail(EncodingError::MalformedValue))
            }
        }
    }
}

fn decode_element(data_type: DataType, parser: &mut TagParser<'_>) -> Result<PropertyValue> {
    match data_type {
        DataType::Primitive(expected) => {
            let tag = parser.next_tag()?;
            // commandable properties accept Null to relinquish a priority
            if tag.is_application(ApplicationTag::Null) {
                parser.to_null()?;
                return Ok(PropertyValue::Primitive(PrimitiveValue::Null));
            }
            Ok(PropertyValue::Primitive(parser.to_value(expected)?))
        }
        DataType::DateTime => {
            parser.next_tag()?;
            let date = parser.to_date()?;
            parser.next_tag()?;
            let time = parser.to_time()?;
            Ok(PropertyValue::DateTime(date, time))
        }
        DataType::TimeStamp => {
            let tag = parser.next_tag()?;
            let stamp = if tag.is_context(0) {
                TimeStamp::Time(parser.to_time()?)
            } else if tag.is_context(1) {
                TimeStamp::SequenceNumber(parser.to_unsigned()?)
            } else if tag.is_opening(2) {
                parser.next_tag()?;
                let date = parser.to_date()?;
                parser.next_tag()?;
                let time = parser.to_time()?;
                parser.expect_closing(2)?;
                TimeStamp::DateTime(date, time)
            } else {
                return Err(parser.fail(EncodingError::AppTagNotRequestedType));
            };
            Ok(PropertyValue::TimeStamp(stamp))
        }
        DataType::Any | DataType::ArrayOf(_) | DataType::ListOf(_) => decode_any(parser),
    }
}

fn decode_any(parser: &mut TagParser<'_>) -> Result<PropertyValue> {
    let tag = parser.next_tag()?;
    if tag.opening {
        let start = parser.position();
        let skipped = parser.skip_constructed()?;
        let end = tag.value_offset + skipped;
        return Ok(PropertyValue::Constructed {
            tag_number: tag.number,
            data: parser.data()[start..end].to_vec(),
        });
    }
    if tag.context {
        return Ok(PropertyValue::Context {
            tag_number: tag.number,
            data: parser.value().to_vec(),
        });
    }
    Ok(PropertyValue::Primitive(parser.to_application_value()?))
}
