//! # Elementary stream packetizers
//!
//! The PES extractor appends raw elementary-stream bytes to a [`Packetizer`] and asks it
//! for discrete units (NAL units, audio frames, ...). Real codec-aware framing lives with
//! the decoder; this module defines the seam and two reference implementations.

use crate::av::CodecType;
use crate::Result;
use bytes::Bytes;

/// Start-code splitter for video elementary streams
pub mod annexb;
/// Pass-through packetizer that returns each appended run as one unit
pub mod queue;

pub use annexb::AnnexBPacketizer;
pub use queue::QueuePacketizer;

/// Sink/source for elementary stream bytes of each codec type.
///
/// [`PesExtractor`](crate::format::ts::PesExtractor) stamps the unit returned right after a
/// `put` with that PES packet's timestamp. The pairing is only exact for packetizers that
/// complete units within the same `put`, such as [`QueuePacketizer`]. One that holds a unit
/// back until the next boundary, such as [`AnnexBPacketizer`], returns it on the following
/// PES packet, stamped with that packet's timestamp.
pub trait Packetizer {
    /// Appends raw elementary stream bytes for `codec_type`.
    fn put(&mut self, codec_type: CodecType, data: &[u8]) -> Result<()>;

    /// Takes one complete unit for `codec_type`, if one is ready.
    fn get_packet(&mut self, codec_type: CodecType) -> Option<Bytes>;

    /// Takes the unit held back for lack of a following boundary. Only called once the
    /// input has ended.
    fn flush(&mut self, _codec_type: CodecType) -> Option<Bytes> {
        None
    }

    /// Discards everything accumulated so far.
    fn clear(&mut self);
}

impl<P: Packetizer + ?Sized> Packetizer for Box<P> {
    fn put(&mut self, codec_type: CodecType, data: &[u8]) -> Result<()> {
        (**self).put(codec_type, data)
    }

    fn get_packet(&mut self, codec_type: CodecType) -> Option<Bytes> {
        (**self).get_packet(codec_type)
    }

    fn flush(&mut self, codec_type: CodecType) -> Option<Bytes> {
        (**self).flush(codec_type)
    }

    fn clear(&mut self) {
        (**self).clear()
    }
}
