//! Leaf data model shared by the photofeed configuration engine.
//!
//! Nothing in here knows about parameters or persistence; it only provides
//! the closed set of value types, the enumerated-choice containers, and the
//! compact integer/checksum primitives the wire format is built from.

mod choices;
mod colors;
mod intcodec;
mod types;

pub use choices::{OptionEntry, OptionList, ValueEntry, ValueList};
pub use colors::{CSS_COLORS, lookup_color};
pub use intcodec::{
    DecodedInt, INVALID_MARKER, SYMBOLS, crc32, crc32_range, decode_int, encode_int,
    encode_int_text, encode_number,
};
pub use types::{ARRAY_MODIFIER, Primitive, ScalarTag, TypeTag};
