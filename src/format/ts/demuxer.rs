use super::pes::PesExtractor;
use super::reassembler::{ReassemblyStats, TsReassembler};
use super::types::*;
use crate::av::{Packet, StreamKind};
use crate::codec::Packetizer;
use crate::config::DemuxConfig;
use crate::error::{DemuxError, Result};
use crate::format::EsReader;
use bytes::{Buf, BytesMut};
use futures::Stream;
use std::collections::VecDeque;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Callbacks for instrumentation. Every method defaults to doing nothing.
pub trait DemuxObserver: Send {
    /// A complete PES packet left the reassembler.
    fn on_pes_packet(&mut self, _pid: u16, _len: usize) {}

    /// An elementary stream unit left the packetizer.
    fn on_es_packet(&mut self, _pid: u16, _packet: &Packet) {}

    /// A continuity error made the reassembler drop its in-flight packet.
    fn on_discontinuity(&mut self, _pid: u16) {}
}

/// Synchronous TS → ES pipeline for one PID.
///
/// Owns the reassembler/extractor pair and a small carry buffer so callers can push
/// arbitrarily sized chunks; a cell split across two pushes is completed on the
/// second one.
pub struct PidDemuxer<P: Packetizer> {
    pid: u16,
    kind: StreamKind,
    reassembler: TsReassembler,
    extractor: PesExtractor<P>,
    input: BytesMut,
    observer: Option<Box<dyn DemuxObserver>>,
}

impl<P: Packetizer> PidDemuxer<P> {
    pub fn new(pid: u16, kind: StreamKind, packetizer: P) -> Self {
        Self {
            pid,
            kind,
            reassembler: TsReassembler::new(),
            extractor: PesExtractor::new(packetizer),
            input: BytesMut::new(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: impl DemuxObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn pid(&self) -> u16 {
        self.pid
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn stats(&self) -> &ReassemblyStats {
        self.reassembler.stats()
    }

    pub fn extractor(&self) -> &PesExtractor<P> {
        &self.extractor
    }

    /// Feeds raw TS bytes and returns every ES unit that became available.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Packet>> {
        self.input.extend_from_slice(data);

        let mut packets = Vec::new();
        loop {
            let was_pending = self.reassembler.has_pending();
            let gaps_before = self.reassembler.stats().continuity_errors;

            let out = self.reassembler.process(self.pid, &self.input)?;
            self.input.advance(out.consumed);

            if self.reassembler.stats().continuity_errors != gaps_before {
                if let Some(observer) = self.observer.as_mut() {
                    observer.on_discontinuity(self.pid);
                }
            }
            if let Some(pes) = out.packet {
                self.handle_pes(&pes, &mut packets)?;
            }

            if !was_pending
                && !self.reassembler.has_pending()
                && (out.consumed == 0 || self.input.is_empty())
            {
                break;
            }
        }
        Ok(packets)
    }

    /// Drains what is held back for lack of a following boundary: an unbounded PES
    /// packet still in reassembly and the packetizer's last unit. Call once the input
    /// has ended; a partial trailing cell is discarded.
    pub fn finish(&mut self) -> Result<Vec<Packet>> {
        if !self.input.is_empty() {
            log::debug!(
                "pid {}: dropping {} bytes of a truncated cell",
                self.pid,
                self.input.len()
            );
            self.input.clear();
        }

        let mut packets = Vec::new();
        while let Some(pes) = self.reassembler.flush(self.pid) {
            self.handle_pes(&pes, &mut packets)?;
        }
        if let Some(packet) = self.extractor.flush() {
            if let Some(observer) = self.observer.as_mut() {
                observer.on_es_packet(self.pid, &packet);
            }
            packets.push(packet);
        }
        Ok(packets)
    }

    /// Drops all buffered input, the in-flight PES packet and the packetizer contents.
    pub fn reset(&mut self) {
        self.input.clear();
        self.reassembler.reset();
        self.extractor.clear();
    }

    fn handle_pes(&mut self, pes: &[u8], packets: &mut Vec<Packet>) -> Result<()> {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_pes_packet(self.pid, pes.len());
        }

        let extracted = match self.extractor.process(self.kind, pes)? {
            Some(extracted) => extracted,
            None => return Ok(()),
        };

        let first = extracted.packet;
        let rest = std::iter::from_fn(|| self.extractor.next_packet());
        for packet in first.into_iter().chain(rest) {
            if let Some(observer) = self.observer.as_mut() {
                observer.on_es_packet(self.pid, &packet);
            }
            packets.push(packet);
        }
        Ok(())
    }
}

/// Reads TS cells from an async source and yields elementary stream units of one PID.
pub struct TSDemuxer<R: AsyncRead + Unpin + Send, P: Packetizer + Send> {
    reader: R,
    demuxer: PidDemuxer<P>,
    ready: VecDeque<Packet>,
    read_size: usize,
    eof: bool,
}

impl<R: AsyncRead + Unpin + Send, P: Packetizer + Send> TSDemuxer<R, P> {
    /// Creates a demuxer reading 64 cells at a time.
    pub fn new(reader: R, pid: u16, kind: StreamKind, packetizer: P) -> Self {
        Self::with_demuxer(reader, PidDemuxer::new(pid, kind, packetizer), 64)
    }

    pub fn from_config(reader: R, config: &DemuxConfig, packetizer: P) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_demuxer(
            reader,
            PidDemuxer::new(config.pid, config.stream_kind, packetizer),
            config.read_cells,
        ))
    }

    /// Wraps an already configured pipeline, e.g. one carrying an observer.
    pub fn with_demuxer(reader: R, demuxer: PidDemuxer<P>, read_cells: usize) -> Self {
        Self {
            reader,
            demuxer,
            ready: VecDeque::new(),
            read_size: read_cells.max(1) * TS_PACKET_SIZE,
            eof: false,
        }
    }

    pub fn demuxer(&self) -> &PidDemuxer<P> {
        &self.demuxer
    }

    pub fn into_reader(self) -> R {
        self.reader
    }

    /// Turns the demuxer into a stream that ends at EOF or after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Packet>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut demuxer = state?;
            match demuxer.read_packet().await {
                Ok(Some(packet)) => Some((Ok(packet), Some(demuxer))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    async fn fill(&mut self) -> Result<()> {
        let mut chunk = Vec::new();
        chunk
            .try_reserve_exact(self.read_size)
            .map_err(|_| DemuxError::Allocation(self.read_size))?;
        chunk.resize(self.read_size, 0);

        let n = self.reader.read(&mut chunk).await?;
        if n == 0 {
            log::debug!("pid {}: end of input", self.demuxer.pid());
            self.eof = true;
            let packets = self.demuxer.finish()?;
            self.ready.extend(packets);
            return Ok(());
        }

        let packets = self.demuxer.push(&chunk[..n])?;
        self.ready.extend(packets);
        Ok(())
    }
}

#[async_trait::async_trait]
impl<R: AsyncRead + Unpin + Send, P: Packetizer + Send> EsReader for TSDemuxer<R, P> {
    async fn read_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            if let Some(packet) = self.ready.pop_front() {
                return Ok(Some(packet));
            }
            if self.eof {
                return Ok(None);
            }
            self.fill().await?;
        }
    }
}
