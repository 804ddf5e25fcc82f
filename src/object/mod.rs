//! BACnet Object Types and Property Identifiers
//!
//! Identifiers that appear inside service payloads: the object type and
//! property enumerations and the packed 32-bit object identifier. The
//! property schema used to decode values by (object type, property) lives in
//! [`schema`].
//!
//! # Examples
//!
//! ```rust
//! use bacnet_codec::object::{ObjectIdentifier, ObjectType};
//!
//! // Create an object identifier for analog input #1
//! let temp_sensor = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
//! assert_eq!(u32::from(temp_sensor), 0x0000_0001);
//!
//! // Device object (instance 123456)
//! let device = ObjectIdentifier::new(ObjectType::Device, 123456);
//! assert!(device.is_valid());
//! assert_eq!(device.to_string(), "Device:123456");
//! ```

pub mod schema;

use std::fmt;

use crate::bacnet_enum;
use crate::util::{decode_object_id, is_valid_instance_number, MAX_INSTANCE};

pub use schema::{DataType, PropertySchema, PropertyValue};

bacnet_enum! {
    /// BACnet object types
    ObjectType: u16 {
        AnalogInput = 0,
        AnalogOutput = 1,
        AnalogValue = 2,
        BinaryInput = 3,
        BinaryOutput = 4,
        BinaryValue = 5,
        Calendar = 6,
        Command = 7,
        Device = 8,
        EventEnrollment = 9,
        File = 10,
        Group = 11,
        Loop = 12,
        MultiStateInput = 13,
        MultiStateOutput = 14,
        NotificationClass = 15,
        Program = 16,
        Schedule = 17,
        Averaging = 18,
        MultiStateValue = 19,
        TrendLog = 20,
        LifeSafetyPoint = 21,
        LifeSafetyZone = 22,
        Accumulator = 23,
        PulseConverter = 24,
    }
    proprietary 128..=1023
}

bacnet_enum! {
    /// BACnet property identifiers
    PropertyIdentifier: u32 {
        AckedTransitions = 0,
        AckRequired = 1,
        Action = 2,
        ActionText = 3,
        ActiveText = 4,
        ActiveVtSessions = 5,
        AlarmValue = 6,
        AlarmValues = 7,
        All = 8,
        AllWritesSuccessful = 9,
        ApduSegmentTimeout = 10,
        ApduTimeout = 11,
        ApplicationSoftwareVersion = 12,
        Archive = 13,
        Bias = 14,
        ChangeOfStateCount = 15,
        ChangeOfStateTime = 16,
        NotificationClass = 17,
        ControlledVariableReference = 19,
        ControlledVariableUnits = 20,
        ControlledVariableValue = 21,
        CovIncrement = 22,
        DateList = 23,
        DaylightSavingsStatus = 24,
        Deadband = 25,
        DerivativeConstant = 26,
        DerivativeConstantUnits = 27,
        Description = 28,
        DescriptionOfHalt = 29,
        DeviceAddressBinding = 30,
        DeviceType = 31,
        EffectivePeriod = 32,
        ElapsedActiveTime = 33,
        ErrorLimit = 34,
        EventEnable = 35,
        EventState = 36,
        EventType = 37,
        ExceptionSchedule = 38,
        FaultValues = 39,
        FeedbackValue = 40,
        FileAccessMethod = 41,
        FileSize = 42,
        FileType = 43,
        FirmwareRevision = 44,
        HighLimit = 45,
        InactiveText = 46,
        InProcess = 47,
        InstanceOf = 48,
        IntegralConstant = 49,
        IntegralConstantUnits = 50,
        LimitEnable = 52,
        ListOfGroupMembers = 53,
        ListOfObjectPropertyReferences = 54,
        LocalDate = 56,
        LocalTime = 57,
        Location = 58,
        LowLimit = 59,
        ManipulatedVariableReference = 60,
        MaximumOutput = 61,
        MaxApduLengthAccepted = 62,
        MaxInfoFrames = 63,
        MaxMaster = 64,
        MaxPresValue = 65,
        MinimumOffTime = 66,
        MinimumOnTime = 67,
        MinimumOutput = 68,
        MinPresValue = 69,
        ModelName = 70,
        ModificationDate = 71,
        NotifyType = 72,
        NumberOfApduRetries = 73,
        NumberOfStates = 74,
        ObjectIdentifier = 75,
        ObjectList = 76,
        ObjectName = 77,
        ObjectPropertyReference = 78,
        ObjectType = 79,
        Optional = 80,
        OutOfService = 81,
        OutputUnits = 82,
        EventParameters = 83,
        Polarity = 84,
        PresentValue = 85,
        Priority = 86,
        PriorityArray = 87,
        PriorityForWriting = 88,
        ProcessIdentifier = 89,
        ProgramChange = 90,
        ProgramLocation = 91,
        ProgramState = 92,
        ProportionalConstant = 93,
        ProportionalConstantUnits = 94,
        ProtocolObjectTypesSupported = 96,
        ProtocolServicesSupported = 97,
        ProtocolVersion = 98,
        ReadOnly = 99,
        ReasonForHalt = 100,
        RecipientList = 102,
        Reliability = 103,
        RelinquishDefault = 104,
        Required = 105,
        Resolution = 106,
        SegmentationSupported = 107,
        Setpoint = 108,
        SetpointReference = 109,
        StateText = 110,
        StatusFlags = 111,
        SystemStatus = 112,
        TimeDelay = 113,
        TimeOfActiveTimeReset = 114,
        TimeOfStateCountReset = 115,
        TimeSynchronizationRecipients = 116,
        Units = 117,
        UpdateInterval = 118,
        UtcOffset = 119,
        VendorIdentifier = 120,
        VendorName = 121,
        VtClassesSupported = 122,
        WeeklySchedule = 123,
        EventTimeStamps = 130,
        ProtocolRevision = 139,
        ActiveCovSubscriptions = 152,
        BackupFailureTimeout = 153,
        ConfigurationFiles = 154,
        DatabaseRevision = 155,
        ProfileName = 168,
    }
    proprietary 512..=4194303
}

/// Object identifier (type + instance number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectIdentifier {
    pub object_type: ObjectType,
    pub instance: u32,
}

impl ObjectIdentifier {
    pub fn new(object_type: ObjectType, instance: u32) -> Self {
        Self {
            object_type,
            instance,
        }
    }

    /// Both fields fit their packed widths (10-bit type, 22-bit instance)
    pub fn is_valid(&self) -> bool {
        u16::from(self.object_type) <= crate::util::MAX_OBJECT_TYPE
            && is_valid_instance_number(self.instance)
    }
}

impl From<u32> for ObjectIdentifier {
    /// Convert from the packed 32-bit form, clause 20.2.14
    fn from(value: u32) -> Self {
        let (object_type, instance) = decode_object_id(value);
        Self::new(object_type.into(), instance)
    }
}

impl From<ObjectIdentifier> for u32 {
    /// Pack into 32 bits; out-of-range fields are masked
    fn from(value: ObjectIdentifier) -> Self {
        let object_type = u16::from(value.object_type) as u32 & 0x3FF;
        (object_type << 22) | (value.instance & MAX_INSTANCE)
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_identifier_packing() {
        let id = ObjectIdentifier::new(ObjectType::BinaryInput, 17);
        assert_eq!(u32::from(id), 0x00C0_0011);
        assert_eq!(ObjectIdentifier::from(0x00C0_0011), id);

        let max = ObjectIdentifier::from(u32::MAX);
        assert!(matches!(max.object_type, ObjectType::Proprietary(code) if code.value() == 1023));
        assert_eq!(max.instance, MAX_INSTANCE);
        assert!(max.is_valid());
    }

    #[test]
    fn test_object_identifier_validity() {
        assert!(!ObjectIdentifier::new(ObjectType::Device, MAX_INSTANCE + 1).is_valid());
        assert!(!ObjectIdentifier::new(ObjectType::from(1024u16), 0).is_valid());
        assert!(ObjectIdentifier::new(ObjectType::from(200u16), 5).is_valid());
    }

    #[test]
    fn test_enum_ranges() {
        assert!(matches!(ObjectType::from(128u16), ObjectType::Proprietary(_)));
        assert!(matches!(ObjectType::from(60u16), ObjectType::Reserved(_)));
        assert_eq!(PropertyIdentifier::from(85u32), PropertyIdentifier::PresentValue);
        assert!(matches!(PropertyIdentifier::from(512u32), PropertyIdentifier::Proprietary(_)));
        assert_eq!(u32::from(PropertyIdentifier::ProfileName), 168);
    }

    #[test]
    fn test_display() {
        let id = ObjectIdentifier::new(ObjectType::AnalogValue, 3);
        assert_eq!(id.to_string(), "AnalogValue:3");
        let vendor = ObjectIdentifier::new(ObjectType::from(130u16), 1);
        assert_eq!(vendor.to_string(), "Proprietary(130):1");
    }
}
