use crate::av::Packet;
use crate::Result;

pub mod ts;

/// Common trait for sources of elementary stream units
#[async_trait::async_trait]
pub trait EsReader: Send {
    /// Read the next unit, or `None` once the input is exhausted
    async fn read_packet(&mut self) -> Result<Option<Packet>>;
}

pub use self::ts::{PidDemuxer, TSDemuxer};
