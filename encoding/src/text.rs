//! Character repertoire support for textual element values.

use encoding::all::ISO_8859_1;
use encoding::{DecoderTrap, EncoderTrap, Encoding};
use snafu::Snafu;

/// An error raised when text could not be decoded or encoded
/// under a character repertoire.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(display("failed to {} text as {}: {}", operation, charset, message))]
pub struct TextCodecError {
    /// `"decode"` or `"encode"`
    pub operation: &'static str,
    /// the repertoire in use
    pub charset: &'static str,
    /// the underlying codec message
    pub message: String,
}

/// Result alias for text codec operations.
pub type Result<T, E = TextCodecError> = std::result::Result<T, E>;

/// A codec for a specific character repertoire.
pub trait TextCodec {
    /// The name of the repertoire this codec implements.
    fn name(&self) -> &'static str;

    /// Decode the given bytes into a string.
    fn decode(&self, text: &[u8]) -> Result<String>;

    /// Encode the given string into bytes.
    fn encode(&self, text: &str) -> Result<Vec<u8>>;
}

/// The default character repertoire codec (ISO 8859-1), used when a
/// data set does not declare another repertoire.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCharacterSetCodec;

impl TextCodec for DefaultCharacterSetCodec {
    fn name(&self) -> &'static str {
        "ISO-8859-1"
    }

    fn decode(&self, text: &[u8]) -> Result<String> {
        ISO_8859_1
            .decode(text, DecoderTrap::Strict)
            .map_err(|message| TextCodecError {
                operation: "decode",
                charset: self.name(),
                message: message.into_owned(),
            })
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        ISO_8859_1
            .encode(text, EncoderTrap::Strict)
            .map_err(|message| TextCodecError {
                operation: "encode",
                charset: self.name(),
                message: message.into_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_codec_round_trip() {
        let codec = DefaultCharacterSetCodec;
        let bytes = codec.encode("Simões^João").unwrap();
        assert_eq!(bytes.len(), 11);
        assert_eq!(codec.decode(&bytes).unwrap(), "Simões^João");
    }

    #[test]
    fn plain_ascii_is_identity() {
        let codec = DefaultCharacterSetCodec;
        assert_eq!(codec.decode(b"ORIGINAL\\PRIMARY").unwrap(), "ORIGINAL\\PRIMARY");
    }
}
