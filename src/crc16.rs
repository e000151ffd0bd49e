use crc::{Algorithm, Crc};

// Parameters of CRC-16/X25, the frame check sequence expected by the device.
const X25_ALG: Algorithm<u16> = Algorithm {
    width: 16,
    poly: 0x1021,
    init: 0xffff,
    refin: true,
    refout: true,
    xorout: 0xffff,
    check: 0x906e,
    residue: 0xf0b8,
};

// CRC memoise table
pub const CRC16_X25: Crc<u16> = Crc::<u16>::new(&X25_ALG);

/// Plain CRC-16/X25 over `bytes`.
pub fn checksum(bytes: &[u8]) -> u16 {
    CRC16_X25.checksum(bytes)
}

/// CRC over `first` followed by `second`, in the form the middleware folds
/// into its frames: byte-swapped, then `!crc ^ 0xffff` widened to 32 bits.
pub fn compute(first: &[u8], second: &[u8]) -> u32 {
    let mut digest = CRC16_X25.digest();
    digest.update(first);
    digest.update(second);
    let crc = digest.finalize().swap_bytes();
    !u32::from(crc) ^ 0xffff
}
