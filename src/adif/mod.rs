//! Exchange-format codec.

/// Raw bytes to raw field maps.
pub mod decoder;
/// Records to streamed text.
pub mod encoder;
/// Tag names, raw fields, and the tag scanner.
pub mod tags;

pub use decoder::{Decoder, DecoderOptions};
pub use encoder::{Encoder, EncoderOptions, write_adif};
pub use tags::{RawField, RawRecord};
