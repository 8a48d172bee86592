use super::error::DecodeError;
use crate::core::models::frame::FrameData;

/// What the indexer learns about a frame from its leading bytes alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameProbe {
    /// Total frame length in bytes, header included.
    pub size: u64,
    pub time: f64,
    pub atom_count: u32,
}

/// Defines the codec for one trajectory file format.
///
/// Indexing and decoding are independent: [`probe_frame`](Self::probe_frame) only
/// needs the header bytes, while [`decode_frame`](Self::decode_frame) re-parses the header
/// together with the body of exactly one frame.
pub trait TrajectoryFormat {
    /// Human-readable format name used in logs.
    const NAME: &'static str;

    /// Lower-case file extension without the dot.
    const EXTENSION: &'static str;

    /// Number of leading bytes that always suffices for [`probe_frame`](Self::probe_frame).
    ///
    /// Near end-of-file the indexer passes fewer bytes; a probe that needs more must fail with
    /// [`DecodeError::Truncated`].
    const MAX_HEADER_LEN: usize;

    /// Parses the frame header found at the start of `header`.
    ///
    /// # Errors
    ///
    /// Returns an error on a magic-number mismatch, a truncated header or a nonsensical size.
    fn probe_frame(header: &[u8]) -> Result<FrameProbe, DecodeError>;

    /// Decodes one complete frame; coordinates and box are returned in Ångström.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not form a valid frame of this format.
    fn decode_frame(bytes: &[u8], frame_number: u64) -> Result<FrameData, DecodeError>;
}
