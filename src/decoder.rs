//! Text frame decoding.
//!
//! The device prints one reading per line as comma separated base-10 integers,
//! e.g. `"-12,340,-1024\r\n"`. Only the first three fields are meaningful; any
//! extra fields are ignored. No range checking happens here, the gauge range is
//! a display concern (see [`crate::display`]).

use crate::errors::DecodeError;

/// Number of fields a frame must carry.
pub const AXIS_COUNT: usize = 3;

/// One decoded `(x, y, z)` reading in raw sensor counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Axes {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Axes {
    #[inline]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Result of decoding one raw line. Never stored.
pub type DecodedFrame = Result<Axes, DecodeError>;

/// Decode one raw line into an [`Axes`] triple.
///
/// Surrounding whitespace is stripped before the bytes are interpreted as
/// UTF-8. Fields are separated by `,` or `\n`; empty fields left behind by a
/// trailing separator are dropped before counting.
pub fn decode(raw: &[u8]) -> DecodedFrame {
    let text = std::str::from_utf8(raw.trim_ascii())?;

    let mut fields: Vec<&str> = text.split([',', '\n']).map(str::trim).collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }

    if fields.len() < AXIS_COUNT {
        return Err(DecodeError::FieldCount {
            found: fields.len(),
        });
    }

    let mut values = [0i32; AXIS_COUNT];
    for (index, (slot, field)) in values.iter_mut().zip(&fields).enumerate() {
        *slot = field.parse::<i32>().map_err(|_| DecodeError::Parse {
            index,
            field: (*field).to_string(),
        })?;
    }

    Ok(Axes::new(values[0], values[1], values[2]))
}
