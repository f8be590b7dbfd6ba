use crate::backup::compress::{Compressor, CompressorBuilder};
use crate::backup::result_error::result::Result;
use bon::Builder;
use getset::Getters;
use liblzma::stream::{Check, MtStreamBuilder};
use liblzma::write::XzEncoder;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::io::Write;
use validator::Validate;

static DEFAULT_PRESET: u32 = 6;

/// XZ settings for the archive stream.
///
/// `thread` above one switches to the multi-threaded liblzma encoder. Output of
/// both encoders is a regular `.xz` stream.
#[skip_serializing_none]
#[derive(Clone, Default, Validate, Serialize, Deserialize, Debug, PartialEq, Eq, Builder, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct XzConfig {
    #[validate(range(min = 0, max = 9))]
    level: Option<u32>,
    #[validate(range(min = 1))]
    thread: Option<u32>,
}

impl<W: Write> CompressorBuilder<W> for XzConfig {
    fn build_compressor(&self, writer: W) -> Result<Compressor<W>> {
        let preset = self.level.unwrap_or(DEFAULT_PRESET);
        let thread = self.thread.unwrap_or(1);
        tracing::debug!("Using xz compression, preset={preset}, threads={thread}");

        if thread <= 1 {
            return Ok(XzEncoder::new(writer, preset).into());
        }

        let stream = MtStreamBuilder::new()
            .preset(preset)
            .check(Check::Crc64)
            .threads(thread)
            .encoder()?;
        Ok(XzEncoder::new_stream(writer, stream).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::finish::Finish;
    use liblzma::read::XzDecoder;
    use std::io::Read;

    fn round_trip(config: &XzConfig) -> Vec<u8> {
        let mut compressor = config.build_compressor(Vec::new()).unwrap();
        compressor.write_all(b"hello xz").unwrap();
        let compressed = compressor.finish().unwrap();

        let mut out = Vec::new();
        XzDecoder::new(compressed.as_slice())
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_default_is_valid() {
        let config = XzConfig::default();
        assert!(config.level().is_none());
        assert!(config.thread().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_level_out_of_range() {
        let config = XzConfig::builder().level(10).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_thread_rejected() {
        let config = XzConfig::builder().thread(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_single_thread_stream_decodes() {
        let config = XzConfig::builder().level(1).thread(1).build();
        assert_eq!(round_trip(&config), b"hello xz");
    }

    #[test]
    fn test_multi_thread_stream_decodes() {
        let config = XzConfig::builder().level(1).thread(2).build();
        assert_eq!(round_trip(&config), b"hello xz");
    }
}
