#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

//! # tsdemux - MPEG-TS elementary stream extraction
//!
//! `tsdemux` pulls the compressed audio/video elementary streams of a single PID out of
//! a raw MPEG Transport Stream recording, ready for a frame decoder.
//!
//! The work happens in two synchronous stages:
//!
//! - **TS → PES**: 188-byte cells are checked (sync byte, PID, continuity counter,
//!   adaptation field) and their payloads reassembled into complete PES packets.
//! - **PES → ES**: the PES header is validated against the configured stream kind,
//!   the 33-bit PTS is recovered and the payload is handed to a packetizer.
//!
//! Corrupt input never reaches the decoder: any framing error drops the in-flight
//! packet and the pipeline resynchronizes on the next payload unit start.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tsdemux::av::StreamKind;
//! use tsdemux::codec::AnnexBPacketizer;
//! use tsdemux::format::{EsReader, TSDemuxer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = tokio::fs::File::open("recording.ts").await?;
//!     let mut demuxer = TSDemuxer::new(file, 0x100, StreamKind::H264Video, AnnexBPacketizer::new());
//!
//!     while let Some(packet) = demuxer.read_packet().await? {
//!         println!("{:?} {} bytes pts={:?}", packet.codec_type, packet.len(), packet.pts);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - `av`: stream kinds, codec types and the ES [`Packet`](av::Packet)
//! - `codec`: the [`Packetizer`](codec::Packetizer) seam and reference packetizers
//! - `format`: TS reassembly, PES extraction and the async reader adapter
//! - `config`: PID/stream selection loaded from file and environment
//! - `error`: [`DemuxError`] and the crate [`Result`] alias
//! - `utils`: bitstream reading

/// Elementary stream types and packets
pub mod av;

/// Elementary stream packetizers
pub mod codec;

/// Demuxer configuration
pub mod config;

/// Error types and utilities
pub mod error;

/// Transport stream demultiplexing
pub mod format;

/// Common utilities and helper functions
pub mod utils;

pub use error::{DemuxError, Result};
