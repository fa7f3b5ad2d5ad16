use std::time::Duration;

// Stream IDs
pub const STREAM_ID_PROGRAM_STREAM_MAP: u8 = 0xbc;
pub const STREAM_ID_PRIVATE_1: u8 = 0xbd;
pub const STREAM_ID_AUDIO_MIN: u8 = 0xc0;
pub const STREAM_ID_AUDIO_MAX: u8 = 0xdf;
pub const STREAM_ID_VIDEO_MIN: u8 = 0xe0;
pub const STREAM_ID_VIDEO_MAX: u8 = 0xef;

// Constants
pub const TS_SYNC_BYTE: u8 = 0x47;
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_HEADER_SIZE: usize = 4;
pub const PES_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];
/// start code + stream_id + PES_packet_length
pub const PES_FIXED_HEADER_SIZE: usize = 6;
/// fixed header + flag bytes + PES_header_data_length
pub const PES_OPTIONAL_HEADER_SIZE: usize = 9;
pub const PID_MAX: u16 = 0x1fff;
pub const PTS_HZ: u64 = 90_000;
pub const PTS_MASK: u64 = 0x1_ffff_ffff;

/// Adaptation field control, bits 5..4 of the fourth header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptationFieldControl {
    Reserved,
    PayloadOnly,
    AdaptationOnly,
    AdaptationAndPayload,
}

impl AdaptationFieldControl {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => AdaptationFieldControl::Reserved,
            1 => AdaptationFieldControl::PayloadOnly,
            2 => AdaptationFieldControl::AdaptationOnly,
            _ => AdaptationFieldControl::AdaptationAndPayload,
        }
    }

    pub fn has_payload(&self) -> bool {
        matches!(
            self,
            AdaptationFieldControl::PayloadOnly | AdaptationFieldControl::AdaptationAndPayload
        )
    }

    pub fn has_adaptation_field(&self) -> bool {
        matches!(
            self,
            AdaptationFieldControl::AdaptationOnly | AdaptationFieldControl::AdaptationAndPayload
        )
    }
}

/// Decoded 4-byte TS cell header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TSHeader {
    pub transport_error: bool,
    pub payload_unit_start: bool,
    pub transport_priority: bool,
    pub pid: u16,
    pub scrambling_control: u8,
    pub adaptation_field_control: AdaptationFieldControl,
    pub continuity_counter: u8,
}

/// Returns true for stream-ids carrying video elementary streams.
pub fn is_video_stream_id(stream_id: u8) -> bool {
    (STREAM_ID_VIDEO_MIN..=STREAM_ID_VIDEO_MAX).contains(&stream_id)
}

/// Returns true for stream-ids carrying MPEG audio elementary streams.
pub fn is_audio_stream_id(stream_id: u8) -> bool {
    (STREAM_ID_AUDIO_MIN..=STREAM_ID_AUDIO_MAX).contains(&stream_id)
}

/// Continuity counter expected after `previous`.
pub fn next_continuity_counter(previous: u8) -> u8 {
    (previous + 1) & 0x0f
}

// Time conversion utilities
pub fn pts_to_time(pts: u64) -> Duration {
    let pts = pts & PTS_MASK;
    Duration::from_nanos(pts * 1_000_000_000 / PTS_HZ)
}
