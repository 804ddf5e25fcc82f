//! Structural validation of tagged payloads
//!
//! [`TagValidator`] walks a complete service payload once before any typed
//! decoding and rejects what no schema could accept: truncated elements,
//! unbalanced or mismatched opening/closing tags, nesting deeper than the
//! configured limit, oversized values and malformed fixed-width application
//! values.

use log::debug;

use super::{ApplicationTag, CodecConfig, EncodingError, Result, TagParser};

/// Payload validator driven by [`CodecConfig`] limits
#[derive(Debug, Clone, Default)]
pub struct TagValidator {
    config: CodecConfig,
}

impl TagValidator {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Validate a complete tagged payload, returning its element count
    pub fn validate(&self, data: &[u8]) -> Result<usize> {
        let mut parser = TagParser::with_config(data, self.config.clone());
        let mut open: Vec<u8> = Vec::new();
        let mut elements = 0;

        while parser.parse_next()? > 0 {
            let Some(tag) = parser.tag() else { break };
            elements += 1;

            if tag.opening {
                if open.len() >= self.config.max_nesting_depth {
                    debug!("nesting deeper than {} at offset {}", self.config.max_nesting_depth, parser.position());
                    return Err(EncodingError::MalformedValue);
                }
                open.push(tag.number);
                continue;
            }

            if tag.closing {
                if open.pop() != Some(tag.number) {
                    debug!("unmatched closing tag {} at offset {}", tag.number, parser.position());
                    return Err(EncodingError::MalformedValue);
                }
                continue;
            }

            if tag.value_length as usize > self.config.max_value_len {
                debug!("value of {} octets exceeds limit {}", tag.value_length, self.config.max_value_len);
                return Err(EncodingError::MalformedValue);
            }

            if !tag.context {
                self.check_application(parser.value(), tag.number)?;
            }
        }

        if let Some(unclosed) = open.last() {
            debug!("opening tag {} never closed", unclosed);
            return Err(EncodingError::MalformedValue);
        }
        Ok(elements)
    }

    fn check_application(&self, value: &[u8], number: u8) -> Result<()> {
        let tag = ApplicationTag::try_from(number)?;
        match tag.fixed_length() {
            Some(length) if length != value.len() => Err(EncodingError::ContextValueWrongLength),
            _ => match tag {
                ApplicationTag::UnsignedInt
                | ApplicationTag::SignedInt
                | ApplicationTag::Enumerated
                    if value.is_empty() || value.len() > 4 =>
                {
                    Err(EncodingError::ContextValueWrongLength)
                }
                ApplicationTag::CharacterString | ApplicationTag::BitString if value.is_empty() => {
                    Err(EncodingError::ContextValueWrongLength)
                }
                _ => Ok(()),
            },
        }
    }
}
