//! APDU Decoding Example
//!
//! Decodes an APDU given as a hex string on the command line, prints the
//! header and walks the service payload tag by tag. Without an argument a
//! ReadProperty-ACK for analog-input 1 present-value is used.
//!
//! Run with `RUST_LOG=trace` to see the codec's own log lines.

use bacnet_codec::encoding::{Tag, TagParser, TagValidator};
use bacnet_codec::util::hex_dump;
use bacnet_codec::Apdu;

const DEFAULT_APDU: &str = "30010c0c0000000119553e44429000003f";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let input = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_APDU.to_string());
    let data = hex::decode(input.trim())?;

    println!("=== BACnet APDU Decoder ===\n");
    println!("{}", hex_dump(&data, "  "));

    let apdu = Apdu::parse(&data)?;
    println!("Header:  {:?}", apdu.header);
    println!("Payload: {} octets\n", apdu.payload.len());

    match TagValidator::default().validate(apdu.payload) {
        Ok(count) => println!("Payload is well formed ({} elements)\n", count),
        Err(err) => println!("Payload failed validation: {} (code {})\n", err, err.code()),
    }

    let mut tags = apdu.tags();
    let mut depth = 0usize;
    loop {
        match tags.parse_next() {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                println!("Decode error at offset {}: {}", tags.position(), err);
                if let Some(reason) = err.reject_reason() {
                    println!("A server would reject with {}", reason);
                }
                break;
            }
        }
        let Some(tag) = tags.tag() else { break };
        if tag.closing {
            depth = depth.saturating_sub(1);
        }
        println!("{:indent$}{}", "", describe(&tag, &tags), indent = depth * 2);
        if tag.opening {
            depth += 1;
        }
    }

    println!("\n=== Done ===");
    Ok(())
}

fn describe(tag: &Tag, tags: &TagParser<'_>) -> String {
    if tag.opening {
        return format!("[{}] {{", tag.number);
    }
    if tag.closing {
        return format!("}} [{}]", tag.number);
    }
    if tag.context {
        return format!("[{}] {}", tag.number, hex::encode(tags.value()));
    }
    match (tag.application_tag(), tags.to_application_value()) {
        (Some(kind), Ok(value)) => format!("{:?}: {}", kind, value),
        (_, Err(err)) => format!("application tag {}: {}", tag.number, err),
        (None, Ok(value)) => value.to_string(),
    }
}
