//! Fixed-offset field extraction from the hex digest
//!
//! Every measurement lives at a fixed character span inside the digest
//! and parses as unsigned base-16. The spans are the protocol contract
//! for this frame type; change them only against a captured frame.

use crate::error::{FrameError, Result};

/// Identifier span, the leading eight digest characters
pub const DEVICE_ID_END: usize = 8;

/// Raw measurement channels carried by the digest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawField {
    Time1,
    Time2,
    DcCurrentRaw,
    DcPower,
    EfficiencyRaw,
    AcFreq,
    AcVolt,
    Temperature,
    Wh,
    Kwh,
}

impl RawField {
    /// Every channel, in digest order
    pub const ALL: [RawField; 10] = [
        RawField::Time1,
        RawField::Time2,
        RawField::DcCurrentRaw,
        RawField::DcPower,
        RawField::EfficiencyRaw,
        RawField::AcFreq,
        RawField::AcVolt,
        RawField::Temperature,
        RawField::Wh,
        RawField::Kwh,
    ];

    /// Half-open character span of this channel within the digest
    pub const fn span(self) -> (usize, usize) {
        match self {
            RawField::Time1 => (18, 22),
            RawField::Time2 => (30, 36),
            RawField::DcCurrentRaw => (46, 50),
            RawField::DcPower => (50, 54),
            RawField::EfficiencyRaw => (54, 58),
            RawField::AcFreq => (58, 60),
            RawField::AcVolt => (60, 64),
            RawField::Temperature => (64, 66),
            RawField::Wh => (66, 70),
            RawField::Kwh => (70, 74),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RawField::Time1 => "time1",
            RawField::Time2 => "time2",
            RawField::DcCurrentRaw => "dccurrentRaw",
            RawField::DcPower => "dcpower",
            RawField::EfficiencyRaw => "efficiencyRaw",
            RawField::AcFreq => "acfreq",
            RawField::AcVolt => "acvolt",
            RawField::Temperature => "temperature",
            RawField::Wh => "wh",
            RawField::Kwh => "kwh",
        }
    }
}

/// Shortest digest that covers the identifier and every channel span
pub const MIN_DIGEST_LEN: usize = max_span_end();

const fn max_span_end() -> usize {
    let mut max = DEVICE_ID_END;
    let mut i = 0;
    while i < RawField::ALL.len() {
        let (_, end) = RawField::ALL[i].span();
        if end > max {
            max = end;
        }
        i += 1;
    }
    max
}

/// All values extracted from one digest
#[derive(Debug, Clone, PartialEq)]
pub struct RawFieldSet {
    pub device_id: String,
    pub time1: f64,
    pub time2: f64,
    pub dccurrent_raw: f64,
    pub dcpower: f64,
    pub efficiency_raw: f64,
    pub acfreq: f64,
    pub acvolt: f64,
    pub temperature: f64,
    pub wh: f64,
    pub kwh: f64,
}

/// Extract the identity and every raw channel from a digest
///
/// The digest is the ASCII hex string produced by
/// [`decode_payload`](crate::digest::decode_payload). Its length is
/// checked once against [`MIN_DIGEST_LEN`] before any span is sliced;
/// a short digest fails as a whole rather than per field. Spans are
/// sliced with character-boundary checks, so a digest that is not
/// ASCII fails as [`FrameError::FieldParse`] instead of panicking.
pub fn extract(digest: &str) -> Result<RawFieldSet> {
    if digest.len() < MIN_DIGEST_LEN {
        return Err(FrameError::DigestTooShort {
            len: digest.len(),
            required: MIN_DIGEST_LEN,
        });
    }

    Ok(RawFieldSet {
        device_id: span_text(digest, "deviceId", 0, DEVICE_ID_END)?.to_string(),
        time1: parse_channel(digest, RawField::Time1)?,
        time2: parse_channel(digest, RawField::Time2)?,
        dccurrent_raw: parse_channel(digest, RawField::DcCurrentRaw)?,
        dcpower: parse_channel(digest, RawField::DcPower)?,
        efficiency_raw: parse_channel(digest, RawField::EfficiencyRaw)?,
        acfreq: parse_channel(digest, RawField::AcFreq)?,
        acvolt: parse_channel(digest, RawField::AcVolt)?,
        temperature: parse_channel(digest, RawField::Temperature)?,
        wh: parse_channel(digest, RawField::Wh)?,
        kwh: parse_channel(digest, RawField::Kwh)?,
    })
}

fn parse_channel(digest: &str, field: RawField) -> Result<f64> {
    let (start, end) = field.span();
    let slice = span_text(digest, field.name(), start, end)?;
    let value = u64::from_str_radix(slice, 16).map_err(|_| FrameError::FieldParse {
        field: field.name(),
        value: slice.to_string(),
    })?;
    Ok(value as f64)
}

// The length check in extract keeps every span in bounds, so only a
// span edge falling inside a multibyte character can fail here.
fn span_text<'a>(
    digest: &'a str,
    field: &'static str,
    start: usize,
    end: usize,
) -> Result<&'a str> {
    digest.get(start..end).ok_or_else(|| FrameError::FieldParse {
        field,
        value: String::from_utf8_lossy(&digest.as_bytes()[start..end]).into_owned(),
    })
}

/// Digest with a known value planted in every channel span, shared by
/// tests across the crate
#[cfg(test)]
pub(crate) const SCENARIO_DIGEST: &str = concat!(
    "deadbeef",   // device id
    "0000000000", // filler to 18
    "04d2",       // time1 = 1234
    "00000000",   // filler to 30
    "01e240",     // time2 = 123456
    "0000000000", // filler to 46
    "0010",       // dccurrentRaw = 16
    "00c8",       // dcpower = 200
    "0032",       // efficiencyRaw = 50
    "32",         // acfreq = 50
    "0064",       // acvolt = 100
    "32",         // temperature = 50
    "0014",       // wh = 20
    "012c",       // kwh = 300
    "0000000000", // trailing filler to 84
);
