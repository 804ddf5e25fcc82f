//! Utility Functions Module
//!
//! Helpers shared by the codec layers: the [`bacnet_enum!`](crate::bacnet_enum)
//! macro, object identifier packing, a bounds-checked byte reader, and
//! formatting helpers for log lines and dumps.
//!
//! # Example
//!
//! ```
//! use bacnet_codec::util::*;
//!
//! let packed = encode_object_id(8, 123).unwrap();
//! assert_eq!(decode_object_id(packed), (8, 123));
//! assert_eq!(hex_preview(&[0x0c, 0x02, 0x00], 8), "0c0200");
//! ```

pub mod enum_macros;

/// Largest object type number representable in an object identifier
pub const MAX_OBJECT_TYPE: u16 = 0x3FF;

/// Largest instance number representable in an object identifier
pub const MAX_INSTANCE: u32 = 0x3F_FFFF;

/// Validate object instance number (must be 0-4194303)
pub fn is_valid_instance_number(instance: u32) -> bool {
    instance <= MAX_INSTANCE
}

/// Convert object type and instance to object identifier (32-bit)
pub fn encode_object_id(object_type: u16, instance: u32) -> Option<u32> {
    if object_type > MAX_OBJECT_TYPE || instance > MAX_INSTANCE {
        return None;
    }
    Some(((object_type as u32) << 22) | instance)
}

/// Decode object identifier to object type and instance
pub fn decode_object_id(object_id: u32) -> (u16, u32) {
    let object_type = (object_id >> 22) as u16;
    let instance = object_id & MAX_INSTANCE;
    (object_type, instance)
}

/// Bounds-checked big-endian reader over a borrowed slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        let value = *self.data.get(self.position)?;
        self.position += 1;
        Some(value)
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        let bytes = self.read_bytes(2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.read_bytes(4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read n bytes
    pub fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if !self.has_remaining(n) {
            return None;
        }
        let bytes = &self.data[self.position..self.position + n];
        self.position += n;
        Some(bytes)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Unread tail of the slice
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }
}

/// Lower-case hex of at most `limit` leading bytes, with a `..` suffix when cut
pub fn hex_preview(data: &[u8], limit: usize) -> String {
    if data.len() <= limit {
        hex::encode(data)
    } else {
        format!("{}..", hex::encode(&data[..limit]))
    }
}

/// Hex dump utility for debugging
pub fn hex_dump(data: &[u8], prefix: &str) -> String {
    let mut result = String::new();

    for (i, chunk) in data.chunks(16).enumerate() {
        result.push_str(prefix);
        result.push_str(&format!("{:04X}: ", i * 16));
        result.push_str(&hex::encode_upper(chunk));
        for _ in chunk.len()..16 {
            result.push_str("  ");
        }

        result.push_str(" |");
        for byte in chunk {
            if byte.is_ascii_graphic() || *byte == b' ' {
                result.push(*byte as char);
            } else {
                result.push('.');
            }
        }
        result.push_str("|\n");
    }

    result
}

/// Convert BACnet date fields to string representation, 255 meaning "*"
pub fn bacnet_date_to_string(year: Option<u16>, month: Option<u8>, day: Option<u8>, weekday: Option<u8>) -> String {
    let year_str = year.map_or_else(|| String::from("*"), |y| y.to_string());
    let month_str = match month {
        Some(13) => String::from("odd"),
        Some(14) => String::from("even"),
        Some(m) => m.to_string(),
        None => String::from("*"),
    };
    let day_str = match day {
        Some(32) => String::from("last"),
        Some(d) => d.to_string(),
        None => String::from("*"),
    };
    let weekday_str = match weekday {
        None => "*",
        Some(1) => "Mon",
        Some(2) => "Tue",
        Some(3) => "Wed",
        Some(4) => "Thu",
        Some(5) => "Fri",
        Some(6) => "Sat",
        Some(7) => "Sun",
        Some(_) => "?",
    };

    format!("{}/{}/{} ({})", year_str, month_str, day_str, weekday_str)
}

/// Convert BACnet time fields to string representation
pub fn bacnet_time_to_string(hour: Option<u8>, minute: Option<u8>, second: Option<u8>, hundredths: Option<u8>) -> String {
    let field = |v: Option<u8>| v.map_or_else(|| String::from("*"), |v| format!("{:02}", v));

    format!(
        "{}:{}:{}.{}",
        field(hour),
        field(minute),
        field(second),
        field(hundredths)
    )
}
