use super::*;
use crate::av::{CodecType, StreamKind};
use crate::codec::QueuePacketizer;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use quickcheck_macros::quickcheck;
use types::TS_HEADER_SIZE;

const PID: u16 = 0x1e1;
const PAYLOAD_PER_CELL: usize = TS_PACKET_SIZE - TS_HEADER_SIZE;

/// Cuts PES packets into cells, stuffing the last cell of each packet through the
/// adaptation field the way a multiplexer does.
fn packetize(pes_packets: &[Vec<u8>], first_cc: u8) -> Vec<Vec<u8>> {
    let mut cells = Vec::new();
    let mut cc = first_cc;
    for pes in pes_packets {
        for (i, chunk) in pes.chunks(PAYLOAD_PER_CELL).enumerate() {
            let mut cell = vec![
                0x47,
                ((PID >> 8) as u8) | if i == 0 { 0x40 } else { 0x00 },
                PID as u8,
                0x10 | (cc & 0x0f),
            ];
            let stuffing = PAYLOAD_PER_CELL - chunk.len();
            if stuffing > 0 {
                cell[3] |= 0x20;
                cell.push((stuffing - 1) as u8);
                if stuffing > 1 {
                    cell.push(0x00);
                }
                cell.resize(TS_HEADER_SIZE + stuffing, 0xff);
            }
            cell.extend_from_slice(chunk);
            cells.push(cell);
            cc = (cc + 1) & 0x0f;
        }
    }
    cells
}

fn pes(stream_id: u8, flags: u8, optional: &[u8], payload: &[u8], bounded: bool) -> Vec<u8> {
    let mut data = vec![0x00, 0x00, 0x01, stream_id, 0, 0, 0x80, flags, optional.len() as u8];
    data.extend_from_slice(optional);
    data.extend_from_slice(payload);
    if bounded {
        let len = (data.len() - 6) as u16;
        data[4..6].copy_from_slice(&len.to_be_bytes());
    }
    data
}

fn reassemble(cells: &[Vec<u8>]) -> (TsReassembler, Vec<Bytes>) {
    let mut reassembler = TsReassembler::new();
    let mut out = Vec::new();
    for cell in cells {
        let mut res = reassembler.process(PID, cell).unwrap();
        assert_eq!(res.consumed, TS_PACKET_SIZE);
        loop {
            out.extend(res.packet.take());
            if !reassembler.has_pending() {
                break;
            }
            res = reassembler.process(PID, &[]).unwrap();
            assert_eq!(res.consumed, 0);
        }
    }
    (reassembler, out)
}

#[test]
fn test_two_cell_video_packet_then_new_start() {
    // 9 byte header + 359 payload bytes = exactly two cells
    let first = pes(0xe0, 0x00, &[], &[0xab; 2 * PAYLOAD_PER_CELL - 9], true);
    assert_eq!(first.len(), 2 * PAYLOAD_PER_CELL);
    let second = pes(0xe0, 0x00, &[], &[0xcd; 300], true);

    let mut cells = packetize(&[first.clone()], 0);
    cells.push(packetize(&[second], 2).remove(0));
    assert_eq!(cells.len(), 3);

    let (_, packets) = reassemble(&cells);
    assert_eq!(packets.len(), 1);
    let declared = u16::from_be_bytes([packets[0][4], packets[0][5]]) as usize;
    assert_eq!(packets[0].len(), declared + 6);
    assert_eq!(packets[0].as_ref(), &first[..]);

    let mut extractor = PesExtractor::new(QueuePacketizer::new());
    let extracted = extractor
        .process(StreamKind::H262Video, &packets[0])
        .unwrap()
        .unwrap();
    assert_eq!(extracted.appended, 2 * PAYLOAD_PER_CELL - 9);
    assert_eq!(extracted.codec_type, CodecType::MPEG2Video);
    assert!(extracted.codec_type.is_video());
    assert_eq!(extracted.pts, None);
    assert_eq!(extracted.packet.unwrap().pts, None);
}

#[test]
fn test_unbounded_packet_bounded_by_next_start_code() {
    let first = pes(0xe0, 0x00, &[], &[0x11; 500], false);
    let second = pes(0xe0, 0x00, &[], &[0x22; 10], false);
    let cells = packetize(&[first.clone(), second], 0);

    let (reassembler, packets) = reassemble(&cells);
    assert_eq!(packets, vec![Bytes::from(first)]);
    assert!(reassembler.buffered_len() > 0);
}

#[test]
fn test_gap_drops_only_the_in_flight_packet() {
    let a = pes(0xc0, 0x00, &[], &[0x01; 400], true);
    let b = pes(0xc0, 0x00, &[], &[0x02; 400], true);
    let c = pes(0xc0, 0x00, &[], &[0x03; 100], true);
    let mut cells = packetize(&[a.clone(), b, c.clone()], 0);
    // Lose the second cell of packet b
    cells.remove(4);

    let (reassembler, packets) = reassemble(&cells);
    assert_eq!(packets, vec![Bytes::from(a), Bytes::from(c)]);
    assert_eq!(reassembler.stats().continuity_errors, 1);
}

#[test]
fn test_pts_survives_reassembly() {
    let pts: u64 = 0x1_0000_0001;
    let optional = [
        0x21 | (((pts >> 30) as u8 & 0x07) << 1),
        (pts >> 22) as u8,
        0x01 | (((pts >> 15) as u8 & 0x7f) << 1),
        (pts >> 7) as u8,
        0x01 | ((pts as u8 & 0x7f) << 1),
    ];
    let packet = pes(0xbd, 0x80, &optional, &[0x0b, 0x77, 0x00], true);
    let (_, packets) = reassemble(&packetize(&[packet], 0));

    let mut extractor = PesExtractor::new(QueuePacketizer::new());
    let extracted = extractor
        .process(StreamKind::Ac3Audio, &packets[0])
        .unwrap()
        .unwrap();
    assert_eq!(extracted.pts, Some(pts));
    let es = extracted.packet.unwrap();
    assert_eq!(es.codec_type, CodecType::AC3);
    assert_eq!(es.data.as_ref(), &[0x0b, 0x77, 0x00]);
    assert_eq!(es.pts, Some(pts));
}

#[test]
fn test_pid_demuxer_resynchronizes_after_garbage() {
    let a = pes(0xc0, 0x00, &[], &[0x0a; 50], true);
    let b = pes(0xc0, 0x00, &[], &[0x0b; 50], true);

    let mut stream: Vec<u8> = packetize(&[a], 0).concat();
    stream.extend_from_slice(&[0x00; 37]);
    stream.extend(packetize(&[b], 1).concat());

    let mut demuxer = PidDemuxer::new(PID, StreamKind::Mp2Audio, QueuePacketizer::new());
    let packets = demuxer.push(&stream).unwrap();
    let payloads: Vec<&[u8]> = packets.iter().map(|p| p.data.as_ref()).collect();
    assert_eq!(payloads, vec![&[0x0a; 50][..], &[0x0b; 50][..]]);
}

#[quickcheck]
fn prop_payload_bytes_are_preserved(payloads: Vec<Vec<u8>>, chunk: usize) -> bool {
    let payloads: Vec<Vec<u8>> = payloads
        .into_iter()
        .map(|mut p| {
            p.truncate(1500);
            p
        })
        .collect();
    let pes_packets: Vec<Vec<u8>> = payloads
        .iter()
        .map(|p| pes(0xc0, 0x00, &[], p, true))
        .collect();
    let stream = packetize(&pes_packets, 0).concat();

    // Push in arbitrary chunk sizes
    let chunk = chunk % 500 + 1;
    let mut demuxer = PidDemuxer::new(PID, StreamKind::Mp2Audio, QueuePacketizer::new());
    let mut extracted = Vec::new();
    for piece in stream.chunks(chunk) {
        for packet in demuxer.push(piece).unwrap() {
            extracted.extend_from_slice(&packet.data);
        }
    }

    extracted == payloads.concat()
}
