//! The middleware session the certificate and provisioning helpers run on.
//!
//! The STSAFE-A middleware owns command framing and the secure channel. The
//! helpers in this crate only need the few entry points collected in
//! [`Session`], called on a handle that is already initialized.

use crate::error::Error;

/// Largest payload the middleware moves in a single read command.
pub const MAX_READ_CHUNK: u16 = 507;

/// Data partition zone index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Zone(pub u8);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeySlot {
    Slot0 = 0x00,
    Slot1 = 0x01,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyType {
    Aes128 = 0x00,
    Aes256 = 0x01,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyLength {
    Bits128,
    Bits256,
}

impl KeyLength {
    /// Decodes the device's key length indicator: zero means 128 bits.
    pub fn from_flag(flag: u8) -> Self {
        match flag {
            0 => KeyLength::Bits128,
            _ => KeyLength::Bits256,
        }
    }

    pub fn bytes(&self) -> usize {
        match self {
            KeyLength::Bits128 => 16,
            KeyLength::Bits256 => 32,
        }
    }
}

/// Attribute tags accepted by `put_attribute`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttributeTag {
    HostKeySlot = 0x11,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnvelopeKeyTable {
    pub number_of_slots: u8,
}

/// Presence record of one local envelope key slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnvelopeKeyInfo {
    pub slot_number: u8,
    pub present: bool,
    pub key_length: KeyLength,
}

impl EnvelopeKeyInfo {
    /// True if this record describes `slot` and no key is stored there.
    pub fn is_empty(&self, slot: KeySlot) -> bool {
        self.slot_number == slot as u8 && !self.present
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnvelopeKeySlots {
    pub table: EnvelopeKeyTable,
    pub slot0: EnvelopeKeyInfo,
    pub slot1: EnvelopeKeyInfo,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostKeySlot {
    pub present: bool,
    pub key_length: KeyLength,
    pub cmac_sequence_counter: u32,
}

/// Entry points of an initialized middleware handle.
///
/// Every method is a complete, blocking command exchange. Errors carry the
/// device response code unchanged.
pub trait Session {
    /// Reads exactly `buffer.len()` bytes of `zone` starting at `offset`.
    fn read(&mut self, zone: Zone, offset: u16, buffer: &mut [u8]) -> Result<(), Error>;

    fn local_envelope_key_slot_query(&mut self) -> Result<EnvelopeKeySlots, Error>;

    fn generate_local_envelope_key(&mut self, slot: KeySlot, key_type: KeyType)
        -> Result<(), Error>;

    fn host_key_slot_query(&mut self) -> Result<HostKeySlot, Error>;

    fn put_attribute(&mut self, tag: AttributeTag, data: &[u8]) -> Result<(), Error>;

    /// Largest length accepted by a single `read`.
    fn max_read_len(&self) -> u16 {
        MAX_READ_CHUNK
    }
}

impl<S: Session + ?Sized> Session for &mut S {
    fn read(&mut self, zone: Zone, offset: u16, buffer: &mut [u8]) -> Result<(), Error> {
        (**self).read(zone, offset, buffer)
    }

    fn local_envelope_key_slot_query(&mut self) -> Result<EnvelopeKeySlots, Error> {
        (**self).local_envelope_key_slot_query()
    }

    fn generate_local_envelope_key(
        &mut self,
        slot: KeySlot,
        key_type: KeyType,
    ) -> Result<(), Error> {
        (**self).generate_local_envelope_key(slot, key_type)
    }

    fn host_key_slot_query(&mut self) -> Result<HostKeySlot, Error> {
        (**self).host_key_slot_query()
    }

    fn put_attribute(&mut self, tag: AttributeTag, data: &[u8]) -> Result<(), Error> {
        (**self).put_attribute(tag, data)
    }

    fn max_read_len(&self) -> u16 {
        (**self).max_read_len()
    }
}
