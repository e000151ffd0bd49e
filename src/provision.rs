//! One-shot provisioning of the device's symmetric key slots.
//!
//! Both checks query the device first and only act on empty slots, so they
//! can run on every boot. The device is the only source of truth; nothing is
//! cached here. Any command failure is returned with the device's status
//! unchanged and stops the remaining steps.

use crate::error::{Error, ErrorKind};
use crate::session::{AttributeTag, EnvelopeKeyInfo, KeySlot, KeyType, Session};
use core::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

pub const HOST_KEY_LENGTH: usize = 16;

/// Which envelope keys a check generated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnvelopeKeyReport {
    pub slot0_generated: bool,
    pub slot1_generated: bool,
}

/// Generates an AES-128 key in envelope slot 0 and an AES-256 key in slot 1
/// when they are empty.
pub fn check_local_envelope_key<S>(session: &mut S) -> Result<EnvelopeKeyReport, Error>
where
    S: Session + ?Sized,
{
    info!("querying local envelope key slots");
    let slots = session.local_envelope_key_slot_query()?;

    info!("{} envelope key slots found", slots.table.number_of_slots);
    log_envelope_slot(&slots.slot0);
    log_envelope_slot(&slots.slot1);

    let mut report = EnvelopeKeyReport::default();
    if slots.table.number_of_slots == 0 {
        return Ok(report);
    }

    if slots.slot0.is_empty(KeySlot::Slot0) {
        info!("envelope slot 0 is empty, generating a 128-bit key");
        session.generate_local_envelope_key(KeySlot::Slot0, KeyType::Aes128)?;
        report.slot0_generated = true;
    }

    if slots.slot1.is_empty(KeySlot::Slot1) {
        info!("envelope slot 1 is empty, generating a 256-bit key");
        session.generate_local_envelope_key(KeySlot::Slot1, KeyType::Aes256)?;
        report.slot1_generated = true;
    }

    Ok(report)
}

fn log_envelope_slot(slot: &EnvelopeKeyInfo) {
    info!(
        "envelope slot {}: present={} length={}",
        slot.slot_number,
        slot.present,
        slot.key_length.bytes()
    );
}

/// Host MAC and cipher keys shared with the device.
///
/// Key material is supplied by the caller, typically from a secrets store or
/// a per-device provisioning flow, and is wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HostKeys {
    mac: [u8; HOST_KEY_LENGTH],
    cipher: [u8; HOST_KEY_LENGTH],
}

impl HostKeys {
    pub fn new(mac: [u8; HOST_KEY_LENGTH], cipher: [u8; HOST_KEY_LENGTH]) -> Self {
        Self { mac, cipher }
    }

    /// Splits a 32-byte `MAC || cipher` blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != 2 * HOST_KEY_LENGTH {
            return Err(ErrorKind::BadParam.into());
        }
        let (mac, cipher) = bytes.split_at(HOST_KEY_LENGTH);
        let mut keys = Self::new([0; HOST_KEY_LENGTH], [0; HOST_KEY_LENGTH]);
        keys.mac.copy_from_slice(mac);
        keys.cipher.copy_from_slice(cipher);
        Ok(keys)
    }

    /// The published development key pair.
    ///
    /// Anyone can derive the session keys of a device provisioned with it.
    #[cfg(feature = "insecure-placeholder-keys")]
    pub fn insecure_placeholder() -> Self {
        warn!("using the insecure placeholder host keys");
        Self::new(
            hex_literal::hex!("00112233445566778899aabbccddeeff"),
            hex_literal::hex!("11112222333344445555666677778888"),
        )
    }

    pub fn mac_key(&self) -> &[u8; HOST_KEY_LENGTH] {
        &self.mac
    }

    pub fn cipher_key(&self) -> &[u8; HOST_KEY_LENGTH] {
        &self.cipher
    }

    /// Payload of the host key slot attribute: MAC key then cipher key.
    pub fn to_attribute(&self) -> Zeroizing<[u8; 2 * HOST_KEY_LENGTH]> {
        let mut attribute = Zeroizing::new([0u8; 2 * HOST_KEY_LENGTH]);
        attribute[..HOST_KEY_LENGTH].copy_from_slice(&self.mac);
        attribute[HOST_KEY_LENGTH..].copy_from_slice(&self.cipher);
        attribute
    }
}

impl fmt::Debug for HostKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostKeys { .. }")
    }
}

/// Writes `keys` to the host key slot if the device has none yet.
///
/// Returns whether the keys were written.
pub fn check_host_keys<S>(session: &mut S, keys: &HostKeys) -> Result<bool, Error>
where
    S: Session + ?Sized,
{
    info!("querying host MAC and cipher key slot");
    let slot = session.host_key_slot_query()?;
    info!(
        "host key slot: present={} length={} cmac counter={}",
        slot.present,
        slot.key_length.bytes(),
        slot.cmac_sequence_counter
    );

    if slot.present {
        return Ok(false);
    }

    info!("writing host MAC and cipher keys");
    session.put_attribute(AttributeTag::HostKeySlot, &keys.to_attribute()[..])?;
    Ok(true)
}
