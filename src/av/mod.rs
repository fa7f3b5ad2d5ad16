//! Elementary stream types shared by the demuxer and the packetizers.

mod packet;
pub use packet::*;

/// Elementary stream type detected from a PES packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecType {
    /// ISO/IEC 13818-2 (H.262) video
    MPEG2Video,
    H264,
    H265,
    AC3,
    /// MPEG-1/2 audio layer II
    MP2,
}

impl CodecType {
    /// Returns true for the video codecs.
    pub fn is_video(&self) -> bool {
        matches!(self, CodecType::MPEG2Video | CodecType::H264 | CodecType::H265)
    }
}

/// Kind of elementary stream a PID is configured to carry.
///
/// The demuxer does not parse PSI tables, so the caller states what it expects to find
/// on the PID and the PES stream-id is checked against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    H262Video,
    H264Video,
    H265Video,
    Ac3Audio,
    Mp2Audio,
}

impl StreamKind {
    /// The codec type PES payloads of this kind are handed to the packetizer as.
    pub fn codec_type(&self) -> CodecType {
        match self {
            StreamKind::H262Video => CodecType::MPEG2Video,
            StreamKind::H264Video => CodecType::H264,
            StreamKind::H265Video => CodecType::H265,
            StreamKind::Ac3Audio => CodecType::AC3,
            StreamKind::Mp2Audio => CodecType::MP2,
        }
    }

    pub fn is_video(&self) -> bool {
        self.codec_type().is_video()
    }
}

impl std::str::FromStr for StreamKind {
    type Err = crate::DemuxError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h262" | "mpeg2" | "mpeg2video" => Ok(StreamKind::H262Video),
            "h264" | "avc" => Ok(StreamKind::H264Video),
            "h265" | "hevc" => Ok(StreamKind::H265Video),
            "ac3" => Ok(StreamKind::Ac3Audio),
            "mp2" | "mpa" => Ok(StreamKind::Mp2Audio),
            other => Err(crate::DemuxError::Config(format!(
                "unknown stream kind: {}",
                other
            ))),
        }
    }
}
