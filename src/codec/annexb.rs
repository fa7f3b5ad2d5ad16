use super::Packetizer;
use crate::av::CodecType;
use crate::Result;
use bytes::{Buf, Bytes, BytesMut};
use std::collections::HashMap;

/// Splits video elementary streams at `00 00 01` start codes.
///
/// A unit runs from one start code (including a leading zero byte of a 4-byte code)
/// up to the next, so the last unit only comes out once the following start code has
/// arrived. Audio types are passed through: everything buffered is one unit.
#[derive(Debug, Default)]
pub struct AnnexBPacketizer {
    buffers: HashMap<CodecType, BytesMut>,
}

impl AnnexBPacketizer {
    pub fn new() -> Self {
        Self::default()
    }
}

fn find_start_code(data: &[u8], from: usize) -> Option<usize> {
    if data.len() < 3 {
        return None;
    }
    (from..data.len() - 2).find(|&i| data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x01)
}

impl Packetizer for AnnexBPacketizer {
    fn put(&mut self, codec_type: CodecType, data: &[u8]) -> Result<()> {
        self.buffers
            .entry(codec_type)
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    fn get_packet(&mut self, codec_type: CodecType) -> Option<Bytes> {
        if !codec_type.is_video() {
            return self.flush(codec_type);
        }

        let buf = self.buffers.get_mut(&codec_type)?;
        let start = match find_start_code(buf, 0) {
            Some(start) => start,
            None => {
                // Keep a possible partial start code
                let keep = buf.len().min(2);
                buf.advance(buf.len() - keep);
                return None;
            }
        };

        let begin = if start > 0 && buf[start - 1] == 0x00 {
            start - 1
        } else {
            start
        };
        if begin > 0 {
            log::trace!("dropping {} bytes ahead of the first start code", begin);
            buf.advance(begin);
        }
        let start = start - begin;

        let next = find_start_code(buf, start + 3)?;
        let end = if buf[next - 1] == 0x00 && next - 1 > start + 2 {
            next - 1
        } else {
            next
        };
        Some(buf.split_to(end).freeze())
    }

    /// Returns the trailing unit still waiting for a start code behind it.
    fn flush(&mut self, codec_type: CodecType) -> Option<Bytes> {
        let buf = self.buffers.get_mut(&codec_type)?;
        if codec_type.is_video() && find_start_code(buf, 0).is_none() {
            // At most a partial start code is left
            buf.clear();
            return None;
        }
        if buf.is_empty() {
            None
        } else {
            Some(buf.split().freeze())
        }
    }

    fn clear(&mut self) {
        self.buffers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_splits_at_start_codes() {
        let mut p = AnnexBPacketizer::new();
        p.put(
            CodecType::H264,
            &[
                0x00, 0x00, 0x00, 0x01, 0x09, 0xf0, // AUD
                0x00, 0x00, 0x01, 0x67, 0x42, // SPS
                0x00, 0x00, 0x00, 0x01, 0x65, 0x88, // IDR slice, incomplete
            ],
        )
        .unwrap();

        assert_eq!(
            p.get_packet(CodecType::H264).unwrap().as_ref(),
            &[0x00, 0x00, 0x00, 0x01, 0x09, 0xf0]
        );
        assert_eq!(
            p.get_packet(CodecType::H264).unwrap().as_ref(),
            &[0x00, 0x00, 0x01, 0x67, 0x42]
        );
        assert_eq!(p.get_packet(CodecType::H264), None);

        p.put(CodecType::H264, &[0x84, 0x00, 0x00, 0x01, 0x09]).unwrap();
        assert_eq!(
            p.get_packet(CodecType::H264).unwrap().as_ref(),
            &[0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84]
        );
        assert_eq!(
            p.flush(CodecType::H264).unwrap().as_ref(),
            &[0x00, 0x00, 0x01, 0x09]
        );
    }

    #[test]
    fn test_drops_garbage_before_first_start_code() {
        let mut p = AnnexBPacketizer::new();
        p.put(CodecType::MPEG2Video, &[0x12, 0x34, 0x00, 0x00]).unwrap();
        assert_eq!(p.get_packet(CodecType::MPEG2Video), None);

        p.put(CodecType::MPEG2Video, &[0x01, 0xb3, 0x00, 0x00, 0x01, 0xb8])
            .unwrap();
        assert_eq!(
            p.get_packet(CodecType::MPEG2Video).unwrap().as_ref(),
            &[0x00, 0x00, 0x01, 0xb3]
        );
    }

    #[test]
    fn test_audio_is_passed_through() {
        let mut p = AnnexBPacketizer::new();
        p.put(CodecType::AC3, &[0x0b, 0x77, 0x01]).unwrap();
        p.put(CodecType::AC3, &[0x02]).unwrap();
        assert_eq!(
            p.get_packet(CodecType::AC3).unwrap().as_ref(),
            &[0x0b, 0x77, 0x01, 0x02]
        );
        assert_eq!(p.get_packet(CodecType::AC3), None);
    }

    #[test]
    fn test_flush_skips_partial_start_code() {
        let mut p = AnnexBPacketizer::new();
        p.put(CodecType::H265, &[0x55, 0x66, 0x00, 0x00]).unwrap();
        assert_eq!(p.get_packet(CodecType::H265), None);
        assert_eq!(p.flush(CodecType::H265), None);
        assert_eq!(p.flush(CodecType::H264), None);
    }
}
