use super::Packetizer;
use crate::av::CodecType;
use crate::Result;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};

/// Hands every `put` back unchanged as one unit, in order, per codec type.
///
/// Useful when the decoder does its own framing and only needs the PES payloads.
#[derive(Debug, Default)]
pub struct QueuePacketizer {
    queues: HashMap<CodecType, VecDeque<Bytes>>,
}

impl QueuePacketizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Units waiting for `codec_type`.
    pub fn queued(&self, codec_type: CodecType) -> usize {
        self.queues.get(&codec_type).map_or(0, VecDeque::len)
    }
}

impl Packetizer for QueuePacketizer {
    fn put(&mut self, codec_type: CodecType, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.queues
            .entry(codec_type)
            .or_default()
            .push_back(Bytes::copy_from_slice(data));
        Ok(())
    }

    fn get_packet(&mut self, codec_type: CodecType) -> Option<Bytes> {
        self.queues.get_mut(&codec_type)?.pop_front()
    }

    fn clear(&mut self) {
        self.queues.clear();
    }
}
