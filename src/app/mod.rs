//! Application Layer Module
//!
//! Decodes and encodes the protocol control information at the front of every
//! APDU. The first octet's high nibble selects one of eight PDU types; each
//! type has a small fixed layout of flags, invoke id, segmentation fields and
//! a service or reason code. Whatever follows the header is the service
//! payload, left untouched for the service layer to walk with a
//! [`TagParser`].
//!
//! # Example
//!
//! ```
//! use bacnet_codec::app::{Apdu, ConfirmedServiceChoice, PduHeader};
//!
//! // ReadProperty request for analog-value 1, present-value
//! let data = [0x00, 0x05, 0x01, 0x0C, 0x0C, 0x00, 0x80, 0x00, 0x01, 0x19, 0x55];
//! let apdu = Apdu::parse(&data).unwrap();
//! match apdu.header {
//!     PduHeader::ConfirmedRequest { invoke_id, service_choice, .. } => {
//!         assert_eq!(invoke_id, 1);
//!         assert_eq!(service_choice, ConfirmedServiceChoice::ReadProperty);
//!     }
//!     _ => unreachable!(),
//! }
//! assert_eq!(apdu.payload.len(), 7);
//! ```

use bitflags::bitflags;
use log::{debug, trace};

use crate::bacnet_enum;
use crate::encoding::{EncodingError, Result, TagParser};
use crate::util::{hex_preview, ByteReader};

/// APDU types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PduType {
    ConfirmedRequest = 0,
    UnconfirmedRequest = 1,
    SimpleAck = 2,
    ComplexAck = 3,
    SegmentAck = 4,
    Error = 5,
    Reject = 6,
    Abort = 7,
}

impl PduType {
    /// PDU type from the high nibble of the first APDU octet
    pub fn classify(first_octet: u8) -> Result<Self> {
        match first_octet >> 4 {
            0 => Ok(PduType::ConfirmedRequest),
            1 => Ok(PduType::UnconfirmedRequest),
            2 => Ok(PduType::SimpleAck),
            3 => Ok(PduType::ComplexAck),
            4 => Ok(PduType::SegmentAck),
            5 => Ok(PduType::Error),
            6 => Ok(PduType::Reject),
            7 => Ok(PduType::Abort),
            other => Err(EncodingError::UnexpectedType(other)),
        }
    }

    /// Shortest header this type can have given its first octet
    pub fn min_header_len(&self, first_octet: u8) -> usize {
        let segmented = PduFlags::from_bits_truncate(first_octet).contains(PduFlags::SEGMENTED);
        match self {
            PduType::ConfirmedRequest if segmented => 6,
            PduType::ConfirmedRequest => 4,
            PduType::UnconfirmedRequest => 2,
            PduType::ComplexAck if segmented => 5,
            PduType::SimpleAck
            | PduType::ComplexAck
            | PduType::Error
            | PduType::Reject
            | PduType::Abort => 3,
            PduType::SegmentAck => 4,
        }
    }
}

bitflags! {
    /// Flag bits in the low nibble of the first APDU octet
    ///
    /// The meaning of bit 1 depends on the PDU type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PduFlags: u8 {
        const SEGMENTED = 0x08;
        const MORE_FOLLOWS = 0x04;
        const SEGMENTED_RESPONSE_ACCEPTED = 0x02;
        const NEGATIVE_ACK = 0x02;
        const SERVER = 0x01;
    }
}

/// Maximum segments that can be accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaxSegments {
    Unspecified = 0,
    Two = 1,
    Four = 2,
    Eight = 3,
    Sixteen = 4,
    ThirtyTwo = 5,
    SixtyFour = 6,
    GreaterThan64 = 7,
}

impl MaxSegments {
    /// Segment count, `None` when unspecified or unbounded
    pub fn count(&self) -> Option<usize> {
        match self {
            MaxSegments::Unspecified | MaxSegments::GreaterThan64 => None,
            other => Some(1 << (*other as u8)),
        }
    }
}

impl From<u8> for MaxSegments {
    /// Decode from the three-bit field, higher bits ignored
    fn from(value: u8) -> Self {
        match value & 0x07 {
            0 => MaxSegments::Unspecified,
            1 => MaxSegments::Two,
            2 => MaxSegments::Four,
            3 => MaxSegments::Eight,
            4 => MaxSegments::Sixteen,
            5 => MaxSegments::ThirtyTwo,
            6 => MaxSegments::SixtyFour,
            _ => MaxSegments::GreaterThan64,
        }
    }
}

bacnet_enum! {
    /// Maximum APDU size that can be accepted
    MaxApduSize: u8 {
        Up50 = 0,
        Up128 = 1,
        Up206 = 2,
        Up480 = 3,
        Up1024 = 4,
        Up1476 = 5,
    }
}

impl MaxApduSize {
    /// Get the actual size in bytes, `None` for reserved codes
    pub fn size(&self) -> Option<usize> {
        match self {
            MaxApduSize::Up50 => Some(50),
            MaxApduSize::Up128 => Some(128),
            MaxApduSize::Up206 => Some(206),
            MaxApduSize::Up480 => Some(480),
            MaxApduSize::Up1024 => Some(1024),
            MaxApduSize::Up1476 => Some(1476),
            MaxApduSize::Proprietary(_) | MaxApduSize::Reserved(_) => None,
        }
    }
}

bacnet_enum! {
    /// Confirmed service choices, also used by the acknowledgement PDUs
    ConfirmedServiceChoice: u8 {
        AcknowledgeAlarm = 0,
        ConfirmedCOVNotification = 1,
        ConfirmedEventNotification = 2,
        GetAlarmSummary = 3,
        GetEnrollmentSummary = 4,
        SubscribeCOV = 5,
        AtomicReadFile = 6,
        AtomicWriteFile = 7,
        AddListElement = 8,
        RemoveListElement = 9,
        CreateObject = 10,
        DeleteObject = 11,
        ReadProperty = 12,
        ReadPropertyMultiple = 14,
        WriteProperty = 15,
        WritePropertyMultiple = 16,
        DeviceCommunicationControl = 17,
        ConfirmedPrivateTransfer = 18,
        ConfirmedTextMessage = 19,
        ReinitializeDevice = 20,
        VtOpen = 21,
        VtClose = 22,
        VtData = 23,
        Authenticate = 24,
        RequestKey = 25,
        ReadRange = 26,
        LifeSafetyOperation = 27,
        SubscribeCOVProperty = 28,
        GetEventInformation = 29,
        SubscribeCOVPropertyMultiple = 30,
        ConfirmedCOVNotificationMultiple = 31,
        ConfirmedAuditNotification = 32,
        AuditLogQuery = 33,
        AuthRequest = 34,
    }
}

bacnet_enum! {
    /// Unconfirmed service choices
    UnconfirmedServiceChoice: u8 {
        IAm = 0,
        IHave = 1,
        UnconfirmedCOVNotification = 2,
        UnconfirmedEventNotification = 3,
        UnconfirmedPrivateTransfer = 4,
        UnconfirmedTextMessage = 5,
        TimeSynchronization = 6,
        WhoHas = 7,
        WhoIs = 8,
        UtcTimeSynchronization = 9,
        WriteGroup = 10,
        UnconfirmedCOVNotificationMultiple = 11,
        UnconfirmedAuditNotification = 12,
        WhoAmI = 13,
        YouAre = 14,
    }
}

bacnet_enum! {
    /// Reject reason codes
    RejectReason: u8 {
        Other = 0,
        BufferOverflow = 1,
        InconsistentParameters = 2,
        InvalidParameterDataType = 3,
        InvalidTag = 4,
        MissingRequiredParameter = 5,
        ParameterOutOfRange = 6,
        TooManyArguments = 7,
        UndefinedEnumeration = 8,
        UnrecognizedService = 9,
    }
    proprietary 64..=255
}

bacnet_enum! {
    /// Abort reason codes
    AbortReason: u8 {
        Other = 0,
        BufferOverflow = 1,
        InvalidApduInThisState = 2,
        PreemptedByHigherPriorityTask = 3,
        SegmentationNotSupported = 4,
        SecurityError = 5,
        InsufficientSecurity = 6,
        WindowSizeOutOfRange = 7,
        ApplicationExceededReplyTime = 8,
        OutOfResources = 9,
        TsmTimeout = 10,
        ApduTooLong = 11,
    }
    proprietary 64..=255
}

/// Decoded protocol control information of one APDU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PduHeader {
    /// Confirmed service request
    ConfirmedRequest {
        segmented: bool,
        more_follows: bool,
        segmented_response_accepted: bool,
        max_segments: MaxSegments,
        max_response_size: MaxApduSize,
        invoke_id: u8,
        /// Present exactly when `segmented` is set
        sequence_number: Option<u8>,
        proposed_window_size: Option<u8>,
        service_choice: ConfirmedServiceChoice,
    },

    /// Unconfirmed service request
    UnconfirmedRequest {
        service_choice: UnconfirmedServiceChoice,
    },

    /// Simple acknowledgment
    SimpleAck {
        invoke_id: u8,
        service_choice: ConfirmedServiceChoice,
    },

    /// Complex acknowledgment
    ComplexAck {
        segmented: bool,
        more_follows: bool,
        invoke_id: u8,
        sequence_number: Option<u8>,
        proposed_window_size: Option<u8>,
        service_choice: ConfirmedServiceChoice,
    },

    /// Segment acknowledgment
    SegmentAck {
        negative: bool,
        server: bool,
        invoke_id: u8,
        sequence_number: u8,
        window_size: u8,
    },

    /// Error PDU; error class and code follow in the payload
    Error {
        invoke_id: u8,
        service_choice: ConfirmedServiceChoice,
    },

    /// Reject PDU
    Reject { invoke_id: u8, reason: RejectReason },

    /// Abort PDU
    Abort {
        server: bool,
        invoke_id: u8,
        reason: AbortReason,
    },
}

fn octet(reader: &mut ByteReader<'_>) -> Result<u8> {
    reader.read_u8().ok_or(EncodingError::BufferTooSmall)
}

fn segment_fields(reader: &mut ByteReader<'_>, segmented: bool) -> Result<(Option<u8>, Option<u8>)> {
    if !segmented {
        return Ok((None, None));
    }
    Ok((Some(octet(reader)?), Some(octet(reader)?)))
}

impl PduHeader {
    /// Decode the header at the front of `data`
    ///
    /// Returns the header and its length in octets; everything after it is
    /// service payload.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let first = *data.first().ok_or(EncodingError::BufferTooSmall)?;
        let pdu_type = PduType::classify(first).inspect_err(|err| {
            debug!("rejecting APDU [{}]: {}", hex_preview(data, 8), err);
        })?;

        let min_len = pdu_type.min_header_len(first);
        if data.len() < min_len {
            debug!(
                "{:?} header needs {} octets, got {}",
                pdu_type,
                min_len,
                data.len()
            );
            return Err(EncodingError::BufferTooSmall);
        }

        let flags = PduFlags::from_bits_truncate(first);
        let mut reader = ByteReader::new(&data[1..]);

        let header = match pdu_type {
            PduType::ConfirmedRequest => {
                let segmented = flags.contains(PduFlags::SEGMENTED);
                let max_info = octet(&mut reader)?;
                let invoke_id = octet(&mut reader)?;
                let (sequence_number, proposed_window_size) = segment_fields(&mut reader, segmented)?;
                PduHeader::ConfirmedRequest {
                    segmented,
                    more_follows: flags.contains(PduFlags::MORE_FOLLOWS),
                    segmented_response_accepted: flags.contains(PduFlags::SEGMENTED_RESPONSE_ACCEPTED),
                    max_segments: MaxSegments::from(max_info >> 4),
                    max_response_size: MaxApduSize::from(max_info & 0x0F),
                    invoke_id,
                    sequence_number,
                    proposed_window_size,
                    service_choice: octet(&mut reader)?.into(),
                }
            }
            PduType::UnconfirmedRequest => PduHeader::UnconfirmedRequest {
                service_choice: octet(&mut reader)?.into(),
            },
            PduType::SimpleAck => PduHeader::SimpleAck {
                invoke_id: octet(&mut reader)?,
                service_choice: octet(&mut reader)?.into(),
            },
            PduType::ComplexAck => {
                let segmented = flags.contains(PduFlags::SEGMENTED);
                let invoke_id = octet(&mut reader)?;
                let (sequence_number, proposed_window_size) = segment_fields(&mut reader, segmented)?;
                PduHeader::ComplexAck {
                    segmented,
                    more_follows: flags.contains(PduFlags::MORE_FOLLOWS),
                    invoke_id,
                    sequence_number,
                    proposed_window_size,
                    service_choice: octet(&mut reader)?.into(),
                }
            }
            PduType::SegmentAck => PduHeader::SegmentAck {
                negative: flags.contains(PduFlags::NEGATIVE_ACK),
                server: flags.contains(PduFlags::SERVER),
                invoke_id: octet(&mut reader)?,
                sequence_number: octet(&mut reader)?,
                window_size: octet(&mut reader)?,
            },
            PduType::Error => PduHeader::Error {
                invoke_id: octet(&mut reader)?,
                service_choice: octet(&mut reader)?.into(),
            },
            PduType::Reject => PduHeader::Reject {
                invoke_id: octet(&mut reader)?,
                reason: octet(&mut reader)?.into(),
            },
            PduType::Abort => PduHeader::Abort {
                server: flags.contains(PduFlags::SERVER),
                invoke_id: octet(&mut reader)?,
                reason: octet(&mut reader)?.into(),
            },
        };

        trace!("decoded {:?}", header);
        Ok((header, 1 + reader.position()))
    }

    /// Encode the header, the inverse of [`decode`](Self::decode)
    pub fn encode(&self, buffer: &mut Vec<u8>) -> Result<()> {
        let type_bits = (self.pdu_type() as u8) << 4;
        match *self {
            PduHeader::ConfirmedRequest {
                segmented,
                more_follows,
                segmented_response_accepted,
                max_segments,
                max_response_size,
                invoke_id,
                sequence_number,
                proposed_window_size,
                service_choice,
            } => {
                let mut flags = PduFlags::empty();
                flags.set(PduFlags::SEGMENTED, segmented);
                flags.set(PduFlags::MORE_FOLLOWS, more_follows);
                flags.set(PduFlags::SEGMENTED_RESPONSE_ACCEPTED, segmented_response_accepted);
                let max_apdu = u8::from(max_response_size);
                if max_apdu > 0x0F {
                    return Err(EncodingError::ValueOutOfRange);
                }
                buffer.push(type_bits | flags.bits());
                buffer.push(((max_segments as u8) << 4) | max_apdu);
                buffer.push(invoke_id);
                encode_segment_fields(buffer, segmented, sequence_number, proposed_window_size)?;
                buffer.push(service_choice.into());
            }
            PduHeader::UnconfirmedRequest { service_choice } => {
                buffer.push(type_bits);
                buffer.push(service_choice.into());
            }
            PduHeader::SimpleAck {
                invoke_id,
                service_choice,
            }
            | PduHeader::Error {
                invoke_id,
                service_choice,
            } => {
                buffer.extend_from_slice(&[type_bits, invoke_id, service_choice.into()]);
            }
            PduHeader::ComplexAck {
                segmented,
                more_follows,
                invoke_id,
                sequence_number,
                proposed_window_size,
                service_choice,
            } => {
                let mut flags = PduFlags::empty();
                flags.set(PduFlags::SEGMENTED, segmented);
                flags.set(PduFlags::MORE_FOLLOWS, more_follows);
                buffer.push(type_bits | flags.bits());
                buffer.push(invoke_id);
                encode_segment_fields(buffer, segmented, sequence_number, proposed_window_size)?;
                buffer.push(service_choice.into());
            }
            PduHeader::SegmentAck {
                negative,
                server,
                invoke_id,
                sequence_number,
                window_size,
            } => {
                let mut flags = PduFlags::empty();
                flags.set(PduFlags::NEGATIVE_ACK, negative);
                flags.set(PduFlags::SERVER, server);
                buffer.extend_from_slice(&[type_bits | flags.bits(), invoke_id, sequence_number, window_size]);
            }
            PduHeader::Reject { invoke_id, reason } => {
                buffer.extend_from_slice(&[type_bits, invoke_id, reason.into()]);
            }
            PduHeader::Abort {
                server,
                invoke_id,
                reason,
            } => {
                let flags = if server { PduFlags::SERVER } else { PduFlags::empty() };
                buffer.extend_from_slice(&[type_bits | flags.bits(), invoke_id, reason.into()]);
            }
        }
        Ok(())
    }

    pub fn pdu_type(&self) -> PduType {
        match self {
            PduHeader::ConfirmedRequest { .. } => PduType::ConfirmedRequest,
            PduHeader::UnconfirmedRequest { .. } => PduType::UnconfirmedRequest,
            PduHeader::SimpleAck { .. } => PduType::SimpleAck,
            PduHeader::ComplexAck { .. } => PduType::ComplexAck,
            PduHeader::SegmentAck { .. } => PduType::SegmentAck,
            PduHeader::Error { .. } => PduType::Error,
            PduHeader::Reject { .. } => PduType::Reject,
            PduHeader::Abort { .. } => PduType::Abort,
        }
    }

    /// Invoke id, absent only on unconfirmed requests
    pub fn invoke_id(&self) -> Option<u8> {
        match *self {
            PduHeader::UnconfirmedRequest { .. } => None,
            PduHeader::ConfirmedRequest { invoke_id, .. }
            | PduHeader::SimpleAck { invoke_id, .. }
            | PduHeader::ComplexAck { invoke_id, .. }
            | PduHeader::SegmentAck { invoke_id, .. }
            | PduHeader::Error { invoke_id, .. }
            | PduHeader::Reject { invoke_id, .. }
            | PduHeader::Abort { invoke_id, .. } => Some(invoke_id),
        }
    }

    pub fn is_segmented(&self) -> bool {
        matches!(
            self,
            PduHeader::ConfirmedRequest { segmented: true, .. } | PduHeader::ComplexAck { segmented: true, .. }
        )
    }
}

fn encode_segment_fields(
    buffer: &mut Vec<u8>,
    segmented: bool,
    sequence_number: Option<u8>,
    proposed_window_size: Option<u8>,
) -> Result<()> {
    if !segmented {
        return Ok(());
    }
    match (sequence_number, proposed_window_size) {
        (Some(sequence_number), Some(window_size)) => {
            buffer.extend_from_slice(&[sequence_number, window_size]);
            Ok(())
        }
        _ => Err(EncodingError::ValueOutOfRange),
    }
}

/// Application Protocol Data Unit: decoded header plus borrowed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Apdu<'a> {
    pub header: PduHeader,
    pub payload: &'a [u8],
}

impl<'a> Apdu<'a> {
    /// Split a complete APDU into header and service payload
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let (header, header_len) = PduHeader::decode(data)?;
        let payload = &data[header_len..];
        trace!(
            "{:?} invoke {:?}, payload {} octets [{}]",
            header.pdu_type(),
            header.invoke_id(),
            payload.len(),
            hex_preview(payload, 16)
        );
        Ok(Self { header, payload })
    }

    /// Tag cursor positioned at the start of the payload
    pub fn tags(&self) -> TagParser<'a> {
        TagParser::new(self.payload)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(6 + self.payload.len());
        self.header.encode(&mut buffer)?;
        buffer.extend_from_slice(self.payload);
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjectIdentifier, ObjectType, PropertyIdentifier};
    use proptest::prelude::*;

    #[test]
    fn test_classify() {
        assert_eq!(PduType::classify(0x0E), Ok(PduType::ConfirmedRequest));
        assert_eq!(PduType::classify(0x30), Ok(PduType::ComplexAck));
        assert_eq!(PduType::classify(0x71), Ok(PduType::Abort));
        for nibble in 8u8..=15 {
            assert_eq!(
                PduType::classify(nibble << 4),
                Err(EncodingError::UnexpectedType(nibble))
            );
        }
    }

    #[test]
    fn test_decode_confirmed_request() {
        let data = [0x00, 0x05, 0x01, 0x0C, 0x0C, 0x02, 0x00, 0x00, 0x01, 0x19, 0x4D];
        let (header, len) = PduHeader::decode(&data).unwrap();
        assert_eq!(len, 4);
        assert_eq!(
            header,
            PduHeader::ConfirmedRequest {
                segmented: false,
                more_follows: false,
                segmented_response_accepted: false,
                max_segments: MaxSegments::Unspecified,
                max_response_size: MaxApduSize::Up1476,
                invoke_id: 1,
                sequence_number: None,
                proposed_window_size: None,
                service_choice: ConfirmedServiceChoice::ReadProperty,
            }
        );
        assert_eq!(header.invoke_id(), Some(1));
        assert!(!header.is_segmented());
    }

    #[test]
    fn test_decode_segmented_confirmed_request() {
        let data = [0x0E, 0x75, 0x2A, 0x03, 0x04, 0x0F, 0xAA];
        let apdu = Apdu::parse(&data).unwrap();
        match apdu.header {
            PduHeader::ConfirmedRequest {
                segmented,
                more_follows,
                segmented_response_accepted,
                max_segments,
                max_response_size,
                invoke_id,
                sequence_number,
                proposed_window_size,
                service_choice,
            } => {
                assert!(segmented && more_follows && segmented_response_accepted);
                assert_eq!(max_segments, MaxSegments::GreaterThan64);
                assert_eq!(max_response_size.size(), Some(1476));
                assert_eq!(invoke_id, 0x2A);
                assert_eq!(sequence_number, Some(3));
                assert_eq!(proposed_window_size, Some(4));
                assert_eq!(service_choice, ConfirmedServiceChoice::WriteProperty);
            }
            other => panic!("unexpected header {:?}", other),
        }
        assert_eq!(apdu.payload, &[0xAA]);
        assert!(apdu.header.is_segmented());
    }

    #[test]
    fn test_decode_short_headers() {
        let cases: [(&[u8], PduHeader); 6] = [
            (
                &[0x10, 0x08],
                PduHeader::UnconfirmedRequest {
                    service_choice: UnconfirmedServiceChoice::WhoIs,
                },
            ),
            (
                &[0x20, 0x07, 0x0F],
                PduHeader::SimpleAck {
                    invoke_id: 7,
                    service_choice: ConfirmedServiceChoice::WriteProperty,
                },
            ),
            (
                &[0x43, 0x09, 0x02, 0x10],
                PduHeader::SegmentAck {
                    negative: true,
                    server: true,
                    invoke_id: 9,
                    sequence_number: 2,
                    window_size: 16,
                },
            ),
            (
                &[0x50, 0x03, 0x0F],
                PduHeader::Error {
                    invoke_id: 3,
                    service_choice: ConfirmedServiceChoice::WriteProperty,
                },
            ),
            (
                &[0x60, 0x05, 0x04],
                PduHeader::Reject {
                    invoke_id: 5,
                    reason: RejectReason::InvalidTag,
                },
            ),
            (
                &[0x71, 0x07, 0x04],
                PduHeader::Abort {
                    server: true,
                    invoke_id: 7,
                    reason: AbortReason::SegmentationNotSupported,
                },
            ),
        ];

        for (data, expected) in cases {
            let (header, len) = PduHeader::decode(data).unwrap();
            assert_eq!(header, expected);
            assert_eq!(len, data.len());

            let mut encoded = Vec::new();
            header.encode(&mut encoded).unwrap();
            assert_eq!(encoded, data);
        }
    }

    #[test]
    fn test_buffer_too_small_per_type() {
        let truncated: [&[u8]; 10] = [
            &[],
            &[0x00, 0x05, 0x01],
            &[0x08, 0x05, 0x01, 0x00, 0x01],
            &[0x10],
            &[0x20, 0x01],
            &[0x30, 0x01],
            &[0x38, 0x01, 0x00, 0x01],
            &[0x40, 0x01, 0x00],
            &[0x50, 0x01],
            &[0x70, 0x01],
        ];
        for data in truncated {
            assert_eq!(
                PduHeader::decode(data),
                Err(EncodingError::BufferTooSmall),
                "{:02x?}",
                data
            );
        }
        assert_eq!(PduHeader::decode(&[0x60]), Err(EncodingError::BufferTooSmall));
        assert_eq!(PduHeader::decode(&[0x90, 0x00, 0x00]), Err(EncodingError::UnexpectedType(9)));
    }

    #[test]
    fn test_unknown_codes_are_preserved() {
        let (header, _) = PduHeader::decode(&[0x00, 0x0F, 0x01, 0xC8]).unwrap();
        match header {
            PduHeader::ConfirmedRequest {
                max_response_size,
                service_choice,
                ..
            } => {
                assert!(matches!(max_response_size, MaxApduSize::Reserved(code) if code.value() == 15));
                assert_eq!(max_response_size.size(), None);
                assert!(matches!(service_choice, ConfirmedServiceChoice::Reserved(code) if code.value() == 200));
            }
            other => panic!("unexpected header {:?}", other),
        }

        let (header, _) = PduHeader::decode(&[0x70, 0x01, 0x80]).unwrap();
        assert!(matches!(header, PduHeader::Abort { reason: AbortReason::Proprietary(_), .. }));
    }

    #[test]
    fn test_read_property_ack_walk() {
        let data = [
            0x30, 0x01, 0x0C, 0x0C, 0x00, 0x00, 0x00, 0x01, 0x19, 0x55, 0x3E, 0x44, 0x42, 0x90, 0x00,
            0x00, 0x3F,
        ];
        let apdu = Apdu::parse(&data).unwrap();
        assert_eq!(
            apdu.header,
            PduHeader::ComplexAck {
                segmented: false,
                more_follows: false,
                invoke_id: 1,
                sequence_number: None,
                proposed_window_size: None,
                service_choice: ConfirmedServiceChoice::ReadProperty,
            }
        );

        let mut tags = apdu.tags();
        tags.next_tag().unwrap();
        assert_eq!(
            tags.to_object_identifier(),
            Ok(ObjectIdentifier::new(ObjectType::AnalogInput, 1))
        );
        tags.next_tag().unwrap();
        assert_eq!(
            PropertyIdentifier::from(tags.to_enumerated().unwrap()),
            PropertyIdentifier::PresentValue
        );
        tags.expect_opening(3).unwrap();
        tags.next_tag().unwrap();
        assert_eq!(tags.to_real(), Ok(72.0));
        tags.expect_closing(3).unwrap();
        assert_eq!(tags.parse_next(), Ok(0));

        assert_eq!(apdu.encode().unwrap(), data);
    }

    #[test]
    fn test_encode_rejects_missing_segment_fields() {
        let header = PduHeader::ComplexAck {
            segmented: true,
            more_follows: false,
            invoke_id: 1,
            sequence_number: None,
            proposed_window_size: Some(4),
            service_choice: ConfirmedServiceChoice::ReadRange,
        };
        assert_eq!(header.encode(&mut Vec::new()), Err(EncodingError::ValueOutOfRange));
    }

    #[test]
    fn test_max_segments() {
        assert_eq!(MaxSegments::from(0x75 >> 4), MaxSegments::GreaterThan64);
        assert_eq!(MaxSegments::Four.count(), Some(4));
        assert_eq!(MaxSegments::SixtyFour.count(), Some(64));
        assert_eq!(MaxSegments::Unspecified.count(), None);
    }

    proptest! {
        #[test]
        fn prop_decode_is_total_and_reencodes(data in proptest::collection::vec(any::<u8>(), 0..12)) {
            match PduHeader::decode(&data) {
                Ok((header, len)) => {
                    prop_assert!(len <= data.len());
                    prop_assert_eq!(len, header.pdu_type().min_header_len(data[0]));
                    let mut encoded = Vec::new();
                    header.encode(&mut encoded).unwrap();
                    prop_assert_eq!(encoded.len(), len);
                    prop_assert_eq!(PduHeader::decode(&encoded), Ok((header, len)));
                }
                Err(err) => prop_assert!(matches!(
                    err,
                    EncodingError::BufferTooSmall | EncodingError::UnexpectedType(_)
                )),
            }
        }
    }
}
