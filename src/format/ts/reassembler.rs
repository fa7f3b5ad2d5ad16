use super::parser::TSPacketParser;
use super::types::*;
use crate::error::{DemuxError, Result};
use bytes::Bytes;

/// Outcome of one [`TsReassembler::process`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassembled {
    /// Bytes of the caller's input that were used up by this call
    pub consumed: usize,
    /// A complete PES packet, owned by the caller
    pub packet: Option<Bytes>,
}

impl Reassembled {
    fn skipped(consumed: usize) -> Self {
        Self {
            consumed,
            packet: None,
        }
    }
}

/// Running counters kept across resets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReassemblyStats {
    /// Cells carrying the target PID
    pub cells: u64,
    pub foreign_cells: u64,
    /// Cells dropped because no payload unit start had been seen yet
    pub unsynchronized_cells: u64,
    pub continuity_errors: u64,
    pub framing_errors: u64,
    pub packets: u64,
}

/// Reassembles PES packets from the TS cells of a single PID.
///
/// Malformed input never produces an error: the in-flight packet is dropped and the
/// reassembler waits for the next payload unit start. Only a failed buffer allocation
/// is reported to the caller.
///
/// Every call consumes at most one cell. When a completed packet leaves bytes of the
/// next one behind, those bytes are re-scanned on the following call before any new
/// input is read, and that call reports zero bytes consumed.
#[derive(Debug, Default)]
pub struct TsReassembler {
    parser: TSPacketParser,
    buffer: Vec<u8>,
    /// Total PES size from the packet-length field, 0 while unknown or unbounded
    expected_length: usize,
    last_continuity_counter: Option<u8>,
    synchronized: bool,
    pending: bool,
    /// Offset in `buffer` where the payload of the latest unit-start cell begins
    unit_start: Option<usize>,
    stats: ReassemblyStats,
}

impl TsReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds input for `target_pid` and returns at most one completed PES packet.
    pub fn process(&mut self, target_pid: u16, input: &[u8]) -> Result<Reassembled> {
        let consumed = if self.pending {
            self.pending = false;
            0
        } else {
            if input.is_empty() {
                return Ok(Reassembled::skipped(0));
            }

            let sync = match input.iter().position(|&b| b == TS_SYNC_BYTE) {
                Some(sync) => sync,
                None => {
                    log::debug!(
                        "pid {}: no sync byte in {} bytes, dropping reassembly state",
                        target_pid,
                        input.len()
                    );
                    self.stats.framing_errors += 1;
                    self.reset();
                    return Ok(Reassembled::skipped(input.len()));
                }
            };

            // Wait for the rest of the cell
            if input.len() - sync < TS_PACKET_SIZE {
                return Ok(Reassembled::skipped(sync));
            }

            let consumed = sync + TS_PACKET_SIZE;
            if !self.accept_cell(target_pid, &input[sync..consumed])? {
                return Ok(Reassembled::skipped(consumed));
            }
            consumed
        };

        let packet = self.take_packet(target_pid);
        Ok(Reassembled { consumed, packet })
    }

    /// Whether leftover bytes must be re-scanned before new input is read.
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Number of bytes of the in-flight packet currently buffered.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> &ReassemblyStats {
        &self.stats
    }

    /// Ends reassembly once the input is exhausted.
    ///
    /// Leftover bytes are scanned first, so call this until it returns `None`. An
    /// unbounded packet has no other way to end and is handed out as it stands. A
    /// bounded packet short of its declared length is dropped. State is reset.
    pub fn flush(&mut self, target_pid: u16) -> Option<Bytes> {
        if self.pending {
            self.pending = false;
            if let Some(packet) = self.take_packet(target_pid) {
                return Some(packet);
            }
        }

        let buffer = std::mem::take(&mut self.buffer);
        let unbounded = buffer.len() >= PES_FIXED_HEADER_SIZE
            && starts_with_pes_start_code(&buffer)
            && buffer[4] == 0
            && buffer[5] == 0;
        self.reset();

        if unbounded {
            log::trace!(
                "pid {}: unbounded PES packet of {} bytes at end of input",
                target_pid,
                buffer.len()
            );
            self.stats.packets += 1;
            return Some(Bytes::from(buffer));
        }
        if !buffer.is_empty() {
            log::debug!(
                "pid {}: dropping {} bytes of an incomplete PES packet at end of input",
                target_pid,
                buffer.len()
            );
        }
        None
    }

    /// Drops the in-flight packet and all sync/continuity state. Statistics survive.
    pub fn reset(&mut self) {
        self.buffer = Vec::new();
        self.expected_length = 0;
        self.last_continuity_counter = None;
        self.synchronized = false;
        self.pending = false;
        self.unit_start = None;
    }

    /// Validates one cell and appends its payload. Returns false if the cell contributed
    /// nothing to the buffer.
    fn accept_cell(&mut self, target_pid: u16, cell: &[u8]) -> Result<bool> {
        let header = match self.parser.parse_header(cell) {
            Ok(header) => header,
            Err(e) => {
                log::debug!("pid {}: {}", target_pid, e);
                self.stats.framing_errors += 1;
                self.reset();
                return Ok(false);
            }
        };

        if header.pid != target_pid {
            log::trace!("pid {}: skipping cell of pid {}", target_pid, header.pid);
            self.stats.foreign_cells += 1;
            return Ok(false);
        }
        self.stats.cells += 1;

        if !header.payload_unit_start && !self.synchronized {
            self.stats.unsynchronized_cells += 1;
            return Ok(false);
        }
        if header.payload_unit_start {
            self.synchronized = true;
        }

        let afc = header.adaptation_field_control;
        let cc = header.continuity_counter;
        if let Some(last) = self.last_continuity_counter {
            // Cells without payload do not advance the counter
            let repeated = !afc.has_payload() && cc == last;
            if cc != next_continuity_counter(last) && !repeated {
                log::warn!(
                    "pid {}: continuity error, expected {} got {}, dropping {} buffered bytes",
                    target_pid,
                    next_continuity_counter(last),
                    cc,
                    self.buffer.len()
                );
                self.stats.continuity_errors += 1;
                self.reset();
                return Ok(false);
            }
        }
        self.last_continuity_counter = Some(cc);

        let range = match self.parser.payload_range(cell, &header) {
            Ok(Some(range)) => range,
            Ok(None) => {
                log::trace!("pid {}: adaptation-only cell", target_pid);
                return Ok(false);
            }
            Err(e) => {
                log::debug!("pid {}: {}, dropping reassembly state", target_pid, e);
                self.stats.framing_errors += 1;
                self.reset();
                return Ok(false);
            }
        };

        if header.payload_unit_start && !self.buffer.is_empty() {
            self.unit_start = Some(self.buffer.len());
        }
        self.append(&cell[range])?;
        Ok(true)
    }

    fn append(&mut self, payload: &[u8]) -> Result<()> {
        self.buffer
            .try_reserve(payload.len())
            .map_err(|_| DemuxError::Allocation(self.buffer.len() + payload.len()))?;
        self.buffer.extend_from_slice(payload);
        Ok(())
    }

    /// Cuts a complete PES packet off the front of the buffer, if one is there.
    fn take_packet(&mut self, target_pid: u16) -> Option<Bytes> {
        if self.buffer.len() < PES_START_CODE.len() + 1 {
            return None;
        }
        if !starts_with_pes_start_code(&self.buffer) {
            log::debug!(
                "pid {}: buffered data does not begin with a PES start code, dropping {} bytes",
                target_pid,
                self.buffer.len()
            );
            self.stats.framing_errors += 1;
            self.reset();
            return None;
        }

        if self.expected_length == 0 && self.buffer.len() >= PES_FIXED_HEADER_SIZE {
            let declared = u16::from_be_bytes([self.buffer[4], self.buffer[5]]) as usize;
            if declared != 0 {
                self.expected_length = PES_FIXED_HEADER_SIZE + declared;
            }
        }

        let end = if self.expected_length > 0 && self.buffer.len() >= self.expected_length {
            self.expected_length
        } else {
            // A payload unit start always ends the packet before it
            self.unit_start.filter(|&start| start > 0)?
        };

        let rest = self.buffer.split_off(end);
        let packet = std::mem::replace(&mut self.buffer, rest);
        self.expected_length = 0;
        self.unit_start = None;
        self.pending = !self.buffer.is_empty();
        self.stats.packets += 1;

        log::trace!("pid {}: PES packet of {} bytes", target_pid, packet.len());
        Some(Bytes::from(packet))
    }
}

/// `00 00 01` followed by a stream-id in the PES range.
fn starts_with_pes_start_code(data: &[u8]) -> bool {
    data.len() > PES_START_CODE.len()
        && data.starts_with(&PES_START_CODE)
        && data[PES_START_CODE.len()] >= STREAM_ID_PROGRAM_STREAM_MAP
}
