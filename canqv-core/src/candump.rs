//! candump log line parsing
//!
//! Lines look like `(1436509052.249713) can0 123#11223344`. Three hex digits
//! make a standard identifier, eight an extended one; `ID#R` is a remote frame
//! with an optional length digit.

use crate::types::{Frame, MonitorError, Received, Result, EFF_FLAG, MAX_DLC};

/// Parse one non-empty log line into a frame and its timestamp
pub fn parse_line(line: &str, line_no: usize) -> Result<Received> {
    let invalid = |reason: &str| MonitorError::InvalidLogLine {
        line: line_no,
        reason: reason.to_string(),
    };

    let mut fields = line.split_whitespace();
    let stamp = fields.next().ok_or_else(|| invalid("empty line"))?;
    let _interface = fields.next().ok_or_else(|| invalid("missing interface"))?;
    let body = fields.next().ok_or_else(|| invalid("missing frame"))?;

    let timestamp = stamp
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| invalid("malformed timestamp"))?;

    let (id_text, data_text) = body.split_once('#').ok_or_else(|| invalid("missing '#'"))?;
    if data_text.starts_with('#') {
        return Err(invalid("CAN FD frames are not supported"));
    }

    let mut can_id = u32::from_str_radix(id_text, 16).map_err(|_| invalid("malformed identifier"))?;
    match id_text.len() {
        3 => {}
        8 => can_id |= EFF_FLAG,
        _ => return Err(invalid("identifier must have 3 or 8 hex digits")),
    }

    let frame = if let Some(len) = data_text.strip_prefix(['R', 'r']) {
        let dlc = if len.is_empty() {
            0
        } else {
            len.parse::<u8>().map_err(|_| invalid("malformed remote length"))?
        };
        Frame::remote(can_id, dlc)
    } else {
        let payload = parse_hex_bytes(data_text).ok_or_else(|| invalid("malformed payload"))?;
        if payload.len() > MAX_DLC {
            return Err(invalid("payload longer than 8 bytes"));
        }
        Frame::new(can_id, &payload)
    };

    Ok(Received {
        frame,
        timestamp: Some(timestamp),
    })
}

fn parse_hex_bytes(text: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = text.bytes().filter(|&b| b != b'.').collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}
