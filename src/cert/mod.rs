//! X.509 certificates stored in the device's data partition.
//!
//! A certificate record is located by zone and byte offset. Its total size is
//! taken from the DER length field in the first [`HEADER_BYTES`] bytes, then
//! the record is read out in transfers no larger than
//! [`Session::max_read_len`].
//!
//! Both [`cert_size`] and [`retrieve_cert`] report every read failure and
//! every undecodable header as [`Status::EntryNotFound`]; callers cannot tell
//! a malformed record from a failed transfer.
//!
//! ## Modules
//!
//! - [`x509`]: borrowed view over a retrieved certificate

pub mod x509;

pub use x509::DeviceCertificate;

use crate::error::{Error, ErrorKind, Status};
use crate::session::{Session, Zone};
use heapless::Vec;

/// Bytes needed to decode the size of a stored certificate.
pub const HEADER_BYTES: usize = 4;

/// Decodes the record size from the DER length field at byte 1.
///
/// - `0x00..=0x80`: short form, the size is byte 1 itself.
/// - `0x81`: byte 2 plus the 3 header bytes.
/// - `0x82`: the big-endian length in bytes 2..4 plus the 4 header bytes.
///
/// Returns `None` for a zero size, for any other length tag and for sizes
/// past the 16-bit zone address space.
pub fn decode_size(header: &[u8; HEADER_BYTES]) -> Option<u16> {
    let size = match header[1] {
        0x81 => u16::from(header[2]) + 3,
        0x82 => u16::from_be_bytes([header[2], header[3]]).checked_add(4)?,
        length if length <= 0x80 => u16::from(length),
        _ => 0,
    };
    (size != 0).then_some(size)
}

/// Reads the header at `offset` of `zone` and returns the certificate size.
pub fn cert_size<S>(session: &mut S, zone: Zone, offset: u16) -> Result<u16, Error>
where
    S: Session + ?Sized,
{
    let mut header = [0u8; HEADER_BYTES];
    session
        .read(zone, offset, &mut header)
        .map_err(|_e| entry_not_found(zone, offset))?;
    decode_size(&header).ok_or_else(|| entry_not_found(zone, offset))
}

/// Reads the whole certificate at `offset` of `zone` into `out` and returns
/// its size.
///
/// The record is transferred in chunks of `session.max_read_len()` bytes,
/// each landing at its own position in `out`, followed by one shorter read
/// for the remainder if any.
pub fn retrieve_cert<S>(
    session: &mut S,
    zone: Zone,
    offset: u16,
    out: &mut [u8],
) -> Result<usize, Error>
where
    S: Session + ?Sized,
{
    let size = usize::from(cert_size(session, zone, offset)?);
    let chunk = usize::from(session.max_read_len());
    if chunk == 0 {
        return Err(ErrorKind::BadParam.into());
    }
    let out = out.get_mut(..size).ok_or(ErrorKind::SmallBuffer)?;

    debug!(
        "reading certificate: zone={} offset={} size={} chunk={}",
        zone.0,
        offset,
        size,
        chunk
    );
    for (index, piece) in out.chunks_mut(chunk).enumerate() {
        let at = u16::try_from(usize::from(offset) + index * chunk)
            .map_err(|_| Error::from(ErrorKind::InvalidSize))?;
        session
            .read(zone, at, piece)
            .map_err(|_e| entry_not_found(zone, at))?;
    }
    Ok(size)
}

/// Same as [`retrieve_cert`], into an owned buffer of capacity `N`.
pub fn retrieve_cert_vec<S, const N: usize>(
    session: &mut S,
    zone: Zone,
    offset: u16,
) -> Result<Vec<u8, N>, Error>
where
    S: Session + ?Sized,
{
    let mut cert = Vec::new();
    cert.resize(N, 0x00u8)
        .unwrap_or_else(|()| unreachable!("Input length equals to the current capacity."));
    let size = retrieve_cert(session, zone, offset, &mut cert)?;
    cert.truncate(size);
    Ok(cert)
}

fn entry_not_found(zone: Zone, offset: u16) -> Error {
    warn!("no certificate at zone={} offset={}", zone.0, offset);
    Status::EntryNotFound.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::sim::SimulatedDevice;
    use std::vec::Vec as StdVec;

    const ZONE: Zone = Zone(1);

    fn record(size: usize) -> StdVec<u8> {
        let mut data: StdVec<u8> = (0..size).map(|i| (i * 7 + 3) as u8).collect();
        let body = (size - 4) as u16;
        data[0] = 0x30;
        data[1] = 0x82;
        data[2..4].copy_from_slice(&body.to_be_bytes());
        data
    }

    #[test]
    fn short_form() {
        for length in [0x01u8, 0x2c, 0x7f, 0x80] {
            assert_eq!(decode_size(&[0x30, length, 0xff, 0xff]), Some(u16::from(length)));
        }
    }

    #[test]
    fn long_form() {
        assert_eq!(decode_size(&[0x30, 0x81, 0x90, 0x00]), Some(0x90 + 3));
        assert_eq!(decode_size(&[0x30, 0x82, 0x01, 0x2c]), Some(304));
        assert_eq!(decode_size(&[0x30, 0x82, 0x00, 0x00]), Some(4));
    }

    #[test]
    fn undecodable_sizes() {
        assert_eq!(decode_size(&[0x30, 0x00, 0x00, 0x00]), None);
        assert_eq!(decode_size(&[0x30, 0x83, 0x01, 0x00]), None);
        assert_eq!(decode_size(&[0xff, 0xff, 0xff, 0xff]), None);
        assert_eq!(decode_size(&[0x30, 0x82, 0xff, 0xfe]), None);
    }

    #[test]
    fn size_from_device() {
        let mut device = SimulatedDevice::new(record(304));
        assert_eq!(cert_size(&mut device, ZONE, 0), Ok(304));
        assert_eq!(device.calls.reads, [(0, HEADER_BYTES)]);
    }

    #[test]
    fn empty_zone() {
        let mut device = SimulatedDevice::new(std::vec![0x00; 16]);
        let err = cert_size(&mut device, ZONE, 0).unwrap_err();
        assert_eq!(err.status(), Some(Status::EntryNotFound));
    }

    #[test]
    fn failed_header_read() {
        let mut device = SimulatedDevice::new(record(304));
        device.fail_read = Some(0);
        let err = cert_size(&mut device, ZONE, 0).unwrap_err();
        assert_eq!(err.status(), Some(Status::EntryNotFound));
    }

    #[test]
    fn single_read() {
        let data = record(304);
        let mut device = SimulatedDevice::new(data.clone());
        let mut out = [0u8; 512];
        assert_eq!(retrieve_cert(&mut device, ZONE, 0, &mut out), Ok(304));
        assert_eq!(out[..304], data[..]);
        assert_eq!(device.calls.reads, [(0, 4), (0, 304)]);
    }

    #[test]
    fn exact_multiple_of_chunk() {
        let data = record(256);
        let mut device = SimulatedDevice::new(data.clone());
        device.chunk = 64;
        let mut out = [0u8; 256];
        assert_eq!(retrieve_cert(&mut device, ZONE, 0, &mut out), Ok(256));
        assert_eq!(out[..], data[..]);
        assert_eq!(
            device.calls.reads[1..],
            [(0, 64), (64, 64), (128, 64), (192, 64)]
        );
    }

    #[test]
    fn chunks_with_remainder() {
        let mut zone = std::vec![0xee; 10];
        zone.extend(record(150));
        let mut device = SimulatedDevice::new(zone.clone());
        device.chunk = 64;
        let mut out = [0u8; 200];
        assert_eq!(retrieve_cert(&mut device, ZONE, 10, &mut out), Ok(150));
        assert_eq!(out[..150], zone[10..]);
        assert_eq!(device.calls.reads[1..], [(10, 64), (74, 64), (138, 22)]);
    }

    #[test]
    fn read_failure_aborts() {
        let mut device = SimulatedDevice::new(record(256));
        device.chunk = 64;
        device.fail_read = Some(2);
        let err = retrieve_cert(&mut device, ZONE, 0, &mut [0u8; 256]).unwrap_err();
        assert_eq!(err.status(), Some(Status::EntryNotFound));
        assert_eq!(device.calls.reads.len(), 3);
    }

    #[test]
    fn output_too_small() {
        let mut device = SimulatedDevice::new(record(304));
        let err = retrieve_cert(&mut device, ZONE, 0, &mut [0u8; 303]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::SmallBuffer));
        assert_eq!(device.calls.reads.len(), 1);
    }

    #[test]
    fn owned_buffer() {
        let data = record(100);
        let mut device = SimulatedDevice::new(data.clone());
        let cert: Vec<u8, 128> = retrieve_cert_vec(&mut device, ZONE, 0).unwrap();
        assert_eq!(cert.as_slice(), data.as_slice());

        let mut device = SimulatedDevice::new(record(304));
        assert!(retrieve_cert_vec::<_, 128>(&mut device, ZONE, 0).is_err());
    }
}
