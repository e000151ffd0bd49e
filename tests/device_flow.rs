use std::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::{ErrorKind as I2cErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use hex_literal::hex;
use stsafe_a110::session::{
    AttributeTag, EnvelopeKeyInfo, EnvelopeKeySlots, EnvelopeKeyTable, HostKeySlot, KeyLength,
    KeySlot, KeyType,
};
use stsafe_a110::{
    check_host_keys, check_local_envelope_key, retrieve_cert, retrieve_cert_vec, Adapter,
    BusConfig, BusError, DeviceCertificate, Error, HostKeys, HwServices, Preconfigured, Session,
    Status, Zone,
};

const DEVICE_CERT: &[u8] = include_bytes!("data/device-cert.der");
const CERT_ZONE: Zone = Zone(0);
const CERT_OFFSET: u16 = 0;

/// Memory-backed session with a 128-byte read limit.
struct Device {
    zones: [Vec<u8>; 2],
    envelope: [bool; 2],
    host_key: Option<[u8; 32]>,
    reads: usize,
    commands: Vec<&'static str>,
}

impl Device {
    fn provisioned_at_factory() -> Self {
        Self {
            zones: [DEVICE_CERT.to_vec(), vec![0x00; 64]],
            envelope: [false; 2],
            host_key: None,
            reads: 0,
            commands: Vec::new(),
        }
    }
}

impl Session for Device {
    fn read(&mut self, zone: Zone, offset: u16, buffer: &mut [u8]) -> Result<(), Error> {
        assert!(buffer.len() <= usize::from(self.max_read_len()));
        self.reads += 1;
        let start = usize::from(offset);
        let data = self
            .zones
            .get(usize::from(zone.0))
            .and_then(|zone| zone.get(start..start + buffer.len()))
            .ok_or(Status::InconsistentCommandData)?;
        buffer.copy_from_slice(data);
        Ok(())
    }

    fn local_envelope_key_slot_query(&mut self) -> Result<EnvelopeKeySlots, Error> {
        self.commands.push("query envelope");
        let info = |slot: u8| EnvelopeKeyInfo {
            slot_number: slot,
            present: self.envelope[usize::from(slot)],
            key_length: KeyLength::from_flag(slot),
        };
        Ok(EnvelopeKeySlots {
            table: EnvelopeKeyTable { number_of_slots: 2 },
            slot0: info(0),
            slot1: info(1),
        })
    }

    fn generate_local_envelope_key(&mut self, slot: KeySlot, key_type: KeyType) -> Result<(), Error> {
        self.commands.push(match key_type {
            KeyType::Aes128 => "generate aes128",
            KeyType::Aes256 => "generate aes256",
        });
        self.envelope[slot as usize] = true;
        Ok(())
    }

    fn host_key_slot_query(&mut self) -> Result<HostKeySlot, Error> {
        self.commands.push("query host key");
        Ok(HostKeySlot {
            present: self.host_key.is_some(),
            key_length: KeyLength::Bits128,
            cmac_sequence_counter: 0,
        })
    }

    fn put_attribute(&mut self, tag: AttributeTag, data: &[u8]) -> Result<(), Error> {
        assert_eq!(tag, AttributeTag::HostKeySlot);
        self.commands.push("put host key");
        self.host_key = Some(data.try_into().map_err(|_| Status::InconsistentCommandData)?);
        Ok(())
    }

    fn max_read_len(&self) -> u16 {
        128
    }
}

#[test]
fn read_device_certificate() {
    let mut device = Device::provisioned_at_factory();
    let mut buffer = [0u8; 1024];
    let size = retrieve_cert(&mut device, CERT_ZONE, CERT_OFFSET, &mut buffer).unwrap();
    assert_eq!(size, DEVICE_CERT.len());
    assert_eq!(&buffer[..size], DEVICE_CERT);
    // Header, three full chunks and the 87-byte remainder.
    assert_eq!(device.reads, 5);

    let cert = DeviceCertificate::from_der(&buffer[..size]).unwrap();
    assert!(cert.public_key().is_ok());
}

#[test]
fn owned_certificate_copy() {
    let mut device = Device::provisioned_at_factory();
    let cert = retrieve_cert_vec::<_, 512>(&mut device, CERT_ZONE, CERT_OFFSET).unwrap();
    assert_eq!(cert.as_slice(), DEVICE_CERT);
}

#[test]
fn blank_zone_has_no_certificate() {
    let mut device = Device::provisioned_at_factory();
    let err = retrieve_cert(&mut device, Zone(1), 0, &mut [0u8; 64]).unwrap_err();
    assert_eq!(err.status(), Some(Status::EntryNotFound));
}

#[test]
fn first_boot_then_reboot() {
    let keys = HostKeys::new(
        hex!("c0ffee00c0ffee00c0ffee00c0ffee00"),
        hex!("5eed5eed5eed5eed5eed5eed5eed5eed"),
    );
    let mut device = Device::provisioned_at_factory();

    check_local_envelope_key(&mut device).unwrap();
    assert!(check_host_keys(&mut device, &keys).unwrap());
    assert_eq!(
        device.commands,
        [
            "query envelope",
            "generate aes128",
            "generate aes256",
            "query host key",
            "put host key"
        ]
    );
    assert_eq!(device.host_key.unwrap()[..16], keys.mac_key()[..]);

    device.commands.clear();
    check_local_envelope_key(&mut device).unwrap();
    assert!(!check_host_keys(&mut device, &keys).unwrap());
    assert_eq!(device.commands, ["query envelope", "query host key"]);
}

#[derive(Debug)]
struct Nack;

impl embedded_hal::i2c::Error for Nack {
    fn kind(&self) -> I2cErrorKind {
        I2cErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

/// Bus with nothing attached but the secure element at 0x20.
struct Bus;

impl ErrorType for Bus {
    type Error = Nack;
}

impl I2c for Bus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Nack> {
        if address != 0x20 {
            return Err(Nack);
        }
        for op in operations {
            if let Operation::Read(buffer) = op {
                buffer.fill(0x00);
            }
        }
        Ok(())
    }
}

struct Pin;

impl embedded_hal::digital::ErrorType for Pin {
    type Error = Infallible;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

struct Delay(u32);

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.0 += ns / 1_000_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0 += ms;
    }
}

#[test]
fn adapter_boot_sequence() {
    let mut hw = Adapter::probe(
        Preconfigured::new(Bus),
        Pin,
        Delay(0),
        BusConfig::default(),
    )
    .unwrap();
    hw.io_init().unwrap();
    hw.bus_init().unwrap();
    hw.crc_init().unwrap();

    let address = hw.device_address();
    hw.bus_send(address, &[0x14, 0x00, 0x00]).unwrap();
    let mut response = [0xffu8; 4];
    hw.bus_recv(address, &mut response).unwrap();
    assert_eq!(response, [0x00; 4]);
    assert_eq!(hw.bus_send(0x21, &[0x00]), Err(BusError::Nack));

    hw.bus_deinit().unwrap();
    let (_, _, delay) = hw.release();
    assert!(delay.0 >= 41);
}
