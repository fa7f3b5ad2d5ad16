use super::types::*;
use crate::av::{CodecType, Packet, StreamKind};
use crate::codec::Packetizer;
use crate::error::{DemuxError, Result};
use crate::utils::BitReader;

/// Packetized Elementary Stream (PES) header structure
///
/// Only the fields the extractor acts on are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PESHeader {
    /// Stream identifier indicating content type (video/audio/etc.)
    pub stream_id: u8,
    /// Bytes following the length field, 0 for unbounded video packets
    pub packet_length: u16,
    /// Whether the `10` marker bits announced the extended header
    pub has_extended_header: bool,
    /// Flags indicating presence of PTS/DTS fields
    pub pts_dts_flags: u8,
    /// Length of the header data following this field
    pub header_data_length: u8,
    /// Presentation Time Stamp (33 bits), only if its marker bits were intact
    pub pts: Option<u64>,
    /// Offset of the elementary stream payload within the packet
    pub payload_offset: usize,
}

impl PESHeader {
    /// Parses the header of a complete PES packet.
    ///
    /// The start code is rejected if any of its three bytes is wrong.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < PES_FIXED_HEADER_SIZE {
            return Err(DemuxError::InvalidData(format!(
                "PES packet too short: {} bytes",
                data.len()
            )));
        }
        if data[..3] != PES_START_CODE {
            return Err(DemuxError::InvalidData(format!(
                "invalid PES start code {:02x} {:02x} {:02x}",
                data[0], data[1], data[2]
            )));
        }

        let stream_id = data[3];
        let packet_length = u16::from_be_bytes([data[4], data[5]]);

        let has_extended_header =
            data.len() >= PES_OPTIONAL_HEADER_SIZE && (data[6] & 0xC0) == 0x80;
        if !has_extended_header {
            return Ok(PESHeader {
                stream_id,
                packet_length,
                has_extended_header,
                pts_dts_flags: 0,
                header_data_length: 0,
                pts: None,
                payload_offset: PES_FIXED_HEADER_SIZE,
            });
        }

        let pts_dts_flags = (data[7] >> 6) & 0x03;
        let header_data_length = data[8];
        let payload_offset = PES_OPTIONAL_HEADER_SIZE + header_data_length as usize;
        if payload_offset > data.len() {
            return Err(DemuxError::InvalidData(format!(
                "PES header data length {} exceeds packet of {} bytes",
                header_data_length,
                data.len()
            )));
        }

        let pts = if pts_dts_flags & 0x02 != 0 && header_data_length >= 5 {
            decode_timestamp(&data[PES_OPTIONAL_HEADER_SIZE..PES_OPTIONAL_HEADER_SIZE + 5])
        } else {
            None
        };

        Ok(PESHeader {
            stream_id,
            packet_length,
            has_extended_header,
            pts_dts_flags,
            header_data_length,
            pts,
            payload_offset,
        })
    }
}

/// Decodes a 33-bit PTS/DTS from its 5-byte split encoding.
///
/// Layout: `[prefix(4) | ts32..30 | 1 | ts29..15 | 1 | ts14..0 | 1]`. If any of the
/// three marker bits is 0 the field is not trusted and `None` is returned.
pub fn decode_timestamp(data: &[u8]) -> Option<u64> {
    let mut reader = BitReader::new(data.get(..5)?);

    reader.skip_bits(4).ok()?;
    let high = reader.read_u64(3).ok()?;
    let marker1 = reader.read_marker().ok()?;
    let mid = reader.read_u64(15).ok()?;
    let marker2 = reader.read_marker().ok()?;
    let low = reader.read_u64(15).ok()?;
    let marker3 = reader.read_marker().ok()?;

    if !(marker1 && marker2 && marker3) {
        return None;
    }
    Some((high << 30) | (mid << 15) | low)
}

/// Result of feeding one PES packet to a [`PesExtractor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// Payload bytes handed to the packetizer
    pub appended: usize,
    pub codec_type: CodecType,
    /// PTS carried by this PES packet
    pub pts: Option<u64>,
    /// Unit the packetizer returned on this call, stamped with `pts`. That unit may
    /// belong to an earlier PES packet if the packetizer completes units late.
    pub packet: Option<Packet>,
}

/// Strips PES framing and feeds the elementary stream payload to a packetizer.
pub struct PesExtractor<P: Packetizer> {
    packetizer: P,
    codec_type: Option<CodecType>,
}

impl<P: Packetizer> PesExtractor<P> {
    pub fn new(packetizer: P) -> Self {
        Self {
            packetizer,
            codec_type: None,
        }
    }

    /// The elementary stream type detected from the last accepted packet.
    pub fn codec_type(&self) -> Option<CodecType> {
        self.codec_type
    }

    pub fn packetizer(&self) -> &P {
        &self.packetizer
    }

    pub fn packetizer_mut(&mut self) -> &mut P {
        &mut self.packetizer
    }

    pub fn into_packetizer(self) -> P {
        self.packetizer
    }

    /// Discards the detected type and everything the packetizer accumulated.
    pub fn clear(&mut self) {
        self.codec_type = None;
        self.packetizer.clear();
    }

    /// Processes one complete PES packet for a stream of the given kind.
    ///
    /// Returns `Ok(None)` when the packet is ignored or rejected. Errors only come from
    /// the packetizer.
    pub fn process(&mut self, kind: StreamKind, pes: &[u8]) -> Result<Option<Extracted>> {
        if pes.len() < PES_FIXED_HEADER_SIZE || pes[..3] != PES_START_CODE {
            log::debug!("dropping PES packet without a valid start code");
            self.clear();
            return Ok(None);
        }

        let stream_id = pes[3];
        if stream_id <= STREAM_ID_PROGRAM_STREAM_MAP {
            log::trace!("ignoring non elementary stream id 0x{:02x}", stream_id);
            return Ok(None);
        }

        let declared = u16::from_be_bytes([pes[4], pes[5]]) as usize;
        let actual = pes.len() - PES_FIXED_HEADER_SIZE;
        if declared != actual && !is_video_stream_id(stream_id) {
            log::debug!(
                "PES length mismatch on stream 0x{:02x}: declared {} actual {}",
                stream_id,
                declared,
                actual
            );
            self.clear();
            return Ok(None);
        }

        let matches = match kind {
            StreamKind::H262Video | StreamKind::H264Video | StreamKind::H265Video => {
                if !is_video_stream_id(stream_id) {
                    return Ok(None);
                }
                true
            }
            StreamKind::Ac3Audio => stream_id == STREAM_ID_PRIVATE_1,
            StreamKind::Mp2Audio => is_audio_stream_id(stream_id),
        };
        if !matches {
            log::debug!("stream id 0x{:02x} does not carry {:?}", stream_id, kind);
            self.clear();
            return Ok(None);
        }
        let codec_type = kind.codec_type();
        self.codec_type = Some(codec_type);

        let header = match PESHeader::parse(pes) {
            Ok(header) => header,
            Err(e) => {
                log::debug!("{}", e);
                self.clear();
                return Ok(None);
            }
        };

        let payload = &pes[header.payload_offset..];
        if !payload.is_empty() {
            self.packetizer.put(codec_type, payload)?;
        }

        let packet = self
            .packetizer
            .get_packet(codec_type)
            .map(|data| Packet::new(data, codec_type).with_pts(header.pts));

        Ok(Some(Extracted {
            appended: payload.len(),
            codec_type,
            pts: header.pts,
            packet,
        }))
    }

    /// Takes the unit the packetizer held back once the input has ended. It carries no
    /// timestamp.
    pub fn flush(&mut self) -> Option<Packet> {
        let codec_type = self.codec_type?;
        self.packetizer
            .flush(codec_type)
            .map(|data| Packet::new(data, codec_type))
    }

    /// Takes a further completed unit without a timestamp, if the packetizer has one.
    pub fn next_packet(&mut self) -> Option<Packet> {
        let codec_type = self.codec_type?;
        self.packetizer
            .get_packet(codec_type)
            .map(|data| Packet::new(data, codec_type))
    }
}
