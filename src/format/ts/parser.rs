use super::types::*;
use crate::error::{DemuxError, Result};
use std::ops::Range;

/// Low-level TS cell decoder.
///
/// Fields are extracted with explicit shifts and masks, big-endian within each byte
/// group, so the result never depends on how a compiler would pack a bit-field struct.
#[derive(Debug, Default, Clone, Copy)]
pub struct TSPacketParser;

impl TSPacketParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_header(&self, data: &[u8]) -> Result<TSHeader> {
        if data.len() < TS_HEADER_SIZE {
            return Err(DemuxError::InvalidData("TS packet too short".into()));
        }

        if data[0] != TS_SYNC_BYTE {
            return Err(DemuxError::InvalidData(format!(
                "invalid sync byte 0x{:02x}",
                data[0]
            )));
        }

        Ok(TSHeader {
            transport_error: (data[1] & 0x80) != 0,
            payload_unit_start: (data[1] & 0x40) != 0,
            transport_priority: (data[1] & 0x20) != 0,
            pid: (((data[1] & 0x1F) as u16) << 8) | data[2] as u16,
            scrambling_control: (data[3] >> 6) & 0x03,
            adaptation_field_control: AdaptationFieldControl::from_bits(data[3] >> 4),
            continuity_counter: data[3] & 0x0F,
        })
    }

    /// Locates the payload inside a full 188-byte cell.
    ///
    /// Returns `Ok(None)` for adaptation-only cells. A reserved adaptation field control
    /// or an adaptation field running past the end of the cell is reported as
    /// `InvalidData`.
    pub fn payload_range(&self, cell: &[u8], header: &TSHeader) -> Result<Option<Range<usize>>> {
        if cell.len() < TS_PACKET_SIZE {
            return Err(DemuxError::InvalidData(format!(
                "TS cell truncated to {} bytes",
                cell.len()
            )));
        }

        let afc = header.adaptation_field_control;
        if afc == AdaptationFieldControl::Reserved {
            return Err(DemuxError::InvalidData(
                "reserved adaptation field control".into(),
            ));
        }
        if !afc.has_payload() {
            return Ok(None);
        }

        let offset = if afc.has_adaptation_field() {
            TS_HEADER_SIZE + 1 + cell[TS_HEADER_SIZE] as usize
        } else {
            TS_HEADER_SIZE
        };

        if offset > TS_PACKET_SIZE {
            return Err(DemuxError::InvalidData(format!(
                "adaptation field length {} exceeds cell",
                cell[TS_HEADER_SIZE]
            )));
        }

        Ok(Some(offset..TS_PACKET_SIZE))
    }
}
