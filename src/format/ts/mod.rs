//! # MPEG Transport Stream (TS) demultiplexing
//!
//! Two single-PID state machines form the pipeline:
//!
//! - [`TsReassembler`] collects the payload of 188-byte TS cells into complete PES
//!   packets, dropping the in-flight packet on continuity or framing errors.
//! - [`PesExtractor`] strips the PES header, recovers the presentation timestamp and
//!   hands the elementary stream payload to a [`Packetizer`](crate::codec::Packetizer).
//!
//! [`PidDemuxer`] wires both together for push-style use and [`TSDemuxer`] drives it
//! from any `tokio::io::AsyncRead`.
//!
//! ## Example
//!
//! ```rust
//! use tsdemux::av::StreamKind;
//! use tsdemux::codec::QueuePacketizer;
//! use tsdemux::format::ts::{PidDemuxer, TS_PACKET_SIZE};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut demuxer = PidDemuxer::new(0x100, StreamKind::Mp2Audio, QueuePacketizer::new());
//!
//! // A cell of another PID is skipped without output
//! let mut cell = vec![0xffu8; TS_PACKET_SIZE];
//! cell[..4].copy_from_slice(&[0x47, 0x41, 0x01, 0x10]);
//! assert!(demuxer.push(&cell)?.is_empty());
//! assert_eq!(demuxer.stats().foreign_cells, 1);
//! # Ok(())
//! # }
//! ```

/// Pipeline and async reader
pub mod demuxer;

/// Low-level TS header decoding
pub mod parser;

/// PES header decoding and elementary stream extraction
pub mod pes;

/// TS → PES reassembly
pub mod reassembler;

/// Core TS types and constants
pub mod types;

#[cfg(test)]
mod tests;

pub use demuxer::{DemuxObserver, PidDemuxer, TSDemuxer};
pub use parser::TSPacketParser;
pub use pes::{decode_timestamp, Extracted, PESHeader, PesExtractor};
pub use reassembler::{Reassembled, ReassemblyStats, TsReassembler};
pub use types::{pts_to_time, AdaptationFieldControl, TSHeader, PTS_HZ, TS_PACKET_SIZE};
