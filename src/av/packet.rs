use super::CodecType;
use bytes::Bytes;
use std::time::Duration;

/// One elementary stream unit handed to the decoder boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub data: Bytes,
    /// Presentation timestamp in 90 kHz units (33 bits)
    pub pts: Option<u64>,
    pub codec_type: CodecType,
}

impl Packet {
    pub fn new(data: impl Into<Bytes>, codec_type: CodecType) -> Self {
        Self {
            data: data.into(),
            pts: None,
            codec_type,
        }
    }

    pub fn with_pts(mut self, pts: Option<u64>) -> Self {
        self.pts = pts;
        self
    }

    /// Presentation time of the packet, if it carried a timestamp.
    pub fn presentation_time(&self) -> Option<Duration> {
        self.pts.map(crate::format::ts::types::pts_to_time)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
