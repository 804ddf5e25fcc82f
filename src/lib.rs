#![doc = include_str!("../README.md")]

pub mod app;
pub mod encoding;
pub mod object;
pub mod util;

#[doc(hidden)]
pub use pastey as __pastey;

// Re-export main types without glob imports to avoid conflicts
pub use app::{Apdu, ConfirmedServiceChoice, PduHeader, PduType, UnconfirmedServiceChoice};
pub use encoding::{ApplicationTag, CodecConfig, EncodingError, PrimitiveValue, Tag, TagParser};
pub use object::{ObjectIdentifier, ObjectType, PropertyIdentifier, PropertySchema};

pub const BACNET_PROTOCOL_VERSION: u8 = 1;
pub const BACNET_MAX_APDU: usize = 1476;
