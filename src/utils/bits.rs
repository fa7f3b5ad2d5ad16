use crate::error::{DemuxError, Result};

/// MSB-first bit cursor over a byte slice.
///
/// Every MPEG-TS and PES header field group is laid out most-significant bit first:
///
/// ```
/// use tsdemux::utils::BitReader;
///
/// let data = [0b10110011];
/// let mut reader = BitReader::new(&data);
///
/// assert_eq!(reader.read_bit().unwrap(), true);   // 1
/// assert_eq!(reader.read_u64(3).unwrap(), 0b011); // 011
/// ```
///
/// A read that would run past the end fails without moving the cursor.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Absolute bit position
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader { data, pos: 0 }
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_u64(1)? == 1)
    }

    /// Reads up to 64 bits as a big-endian number, e.g. a 33-bit timestamp in one go.
    pub fn read_u64(&mut self, n: u32) -> Result<u64> {
        if n > 64 {
            return Err(DemuxError::Parser(format!("cannot read {} bits into u64", n)));
        }
        self.ensure(n as usize)?;

        let mut value = 0u64;
        let mut left = n as usize;
        while left > 0 {
            let byte = self.data[self.pos / 8];
            let used = self.pos % 8;
            let take = (8 - used).min(left);
            let bits = (byte >> (8 - used - take)) & (0xff >> (8 - take));
            value = (value << take) | bits as u64;
            self.pos += take;
            left -= take;
        }
        Ok(value)
    }

    /// Consumes one marker bit and reports whether it was set.
    pub fn read_marker(&mut self) -> Result<bool> {
        self.read_bit()
    }

    pub fn skip_bits(&mut self, n: u32) -> Result<()> {
        self.ensure(n as usize)?;
        self.pos += n as usize;
        Ok(())
    }

    pub fn available_bits(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if n > self.available_bits() {
            return Err(DemuxError::Parser(format!(
                "{} bits requested, {} left",
                n,
                self.available_bits()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_read_bits() {
        let data = [0b10110011, 0b01011010, 0b11110000];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_u64(0).unwrap(), 0);
        assert_eq!(reader.read_u64(3).unwrap(), 0b101);
        // Crosses into the second byte
        assert_eq!(reader.read_u64(8).unwrap(), 0b10011010);
        assert_eq!(reader.read_u64(13).unwrap(), 0b1101011110000);
        assert_eq!(reader.available_bits(), 0);
    }

    #[test]
    fn test_read_33_bits() {
        let data = [0xff, 0x00, 0xff, 0x00, 0x80];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.read_u64(33).unwrap(), 0x1_fe01_fe01);
        assert_eq!(reader.available_bits(), 7);
    }

    #[test]
    fn test_skip_and_markers() {
        let data = [0b10110011, 0b01011010];
        let mut reader = BitReader::new(&data);

        reader.skip_bits(3).unwrap();
        assert_eq!(reader.read_u64(2).unwrap(), 0b10);
        reader.skip_bits(3).unwrap();
        assert!(!reader.read_marker().unwrap());
        assert!(reader.read_marker().unwrap());
    }

    #[test]
    fn test_failed_read_keeps_position() {
        let data = [0b10110011];
        let mut reader = BitReader::new(&data);

        reader.read_u64(6).unwrap();
        assert!(reader.read_u64(8).is_err());
        assert!(reader.skip_bits(3).is_err());
        assert_eq!(reader.read_u64(2).unwrap(), 0b11);

        let long = [0u8; 9];
        let mut reader = BitReader::new(&long);
        assert!(reader.read_u64(65).is_err());
        assert_eq!(reader.read_u64(64).unwrap(), 0);
    }

    #[quickcheck]
    fn prop_matches_big_endian(value: u64, skip: u8) -> bool {
        let skip = (skip % 8) as u32;
        let mut data = vec![0u8];
        data.extend_from_slice(&value.to_be_bytes());
        let mut reader = BitReader::new(&data);
        reader.skip_bits(8).unwrap();
        let high = reader.read_u64(skip).unwrap();
        let low = reader.read_u64(64 - skip).unwrap();
        (high.checked_shl(64 - skip).unwrap_or(0) | low) == value
    }
}
