//! Persistent storage for buzzer thresholds.
//!
//! Uses the RP2040's on-board QSPI flash via the `sequential-storage` crate
//! so user thresholds survive a power cycle.
//!
//! Storage layout:
//!   - One map item under a fixed key.
//!   - Item body: `[version][set-mask][6 x f32 little-endian]`, 26 bytes.
//!     Bit `i` of the set-mask is the "initialized" flag of setting `i`.
//!   - Flash pages are managed by `sequential-storage` (wear levelling, GC).

use crate::alert::{default_settings, BuzzerSettings, SETTING_COUNT};
use crate::error::Error;

/// Layout version written as the first byte.
pub const FORMAT_VERSION: u8 = 1;

/// Encoded size of a full thresholds record.
pub const RECORD_SIZE: usize = 2 + 4 * SETTING_COUNT;

/// Serialize thresholds into `buf`; returns the number of bytes written.
pub fn encode(settings: &BuzzerSettings, buf: &mut [u8]) -> Result<usize, Error> {
    if buf.len() < RECORD_SIZE {
        return Err(Error::BufferOverflow);
    }

    buf[0] = FORMAT_VERSION;
    buf[1] = settings
        .iter()
        .enumerate()
        .filter(|(_, setting)| setting.initialized)
        .fold(0u8, |mask, (i, _)| mask | (1 << i));

    for (i, setting) in settings.iter().enumerate() {
        let offset = 2 + 4 * i;
        buf[offset..offset + 4].copy_from_slice(&setting.threshold.to_le_bytes());
    }

    Ok(RECORD_SIZE)
}

/// Rebuild thresholds from a stored record.
///
/// Metric names and precisions come from the firmware, only thresholds and
/// flags are taken from `data`.
pub fn decode(data: &[u8]) -> Result<BuzzerSettings, Error> {
    if data.len() < RECORD_SIZE || data[0] != FORMAT_VERSION {
        return Err(Error::Storage);
    }

    let mask = data[1];
    let mut settings = default_settings();
    for (i, setting) in settings.iter_mut().enumerate() {
        let offset = 2 + 4 * i;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&data[offset..offset + 4]);
        setting.threshold = f32::from_le_bytes(bytes);
        setting.initialized = mask & (1 << i) != 0;
    }

    Ok(settings)
}

#[cfg(feature = "embedded")]
pub use flash::{load_from_flash, save_to_flash};

#[cfg(feature = "embedded")]
mod flash {
    use super::{decode, encode, RECORD_SIZE};
    use crate::alert::BuzzerSettings;
    use crate::config::{STORAGE_FLASH_END, STORAGE_FLASH_START};
    use crate::error::Error;
    use embedded_storage_async::nor_flash::NorFlash;
    use sequential_storage::cache::NoCache;
    use sequential_storage::map::{fetch_item, store_item};

    /// Key for the thresholds record in the map storage.
    const KEY_THRESHOLDS: u8 = 0x01;

    /// Scratch buffer for sequential-storage (item header + body + slack).
    const SCRATCH_SIZE: usize = 64;

    /// Load thresholds from flash. `Ok(None)` when nothing was stored yet.
    pub async fn load_from_flash(
        flash: &mut impl NorFlash,
    ) -> Result<Option<BuzzerSettings>, Error> {
        let mut buf = [0u8; SCRATCH_SIZE];

        match fetch_item::<u8, &[u8], _>(
            flash,
            STORAGE_FLASH_START..STORAGE_FLASH_END,
            &mut NoCache::new(),
            &mut buf,
            &KEY_THRESHOLDS,
        )
        .await
        {
            Ok(Some(data)) => {
                let settings = decode(data)?;
                info!("Loaded thresholds from flash");
                Ok(Some(settings))
            }
            Ok(None) => {
                info!("No thresholds in flash");
                Ok(None)
            }
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                Err(Error::Storage)
            }
        }
    }

    /// Persist thresholds to flash.
    pub async fn save_to_flash(
        flash: &mut impl NorFlash,
        settings: &BuzzerSettings,
    ) -> Result<(), Error> {
        let mut buf = [0u8; SCRATCH_SIZE];
        let mut record = [0u8; RECORD_SIZE];
        let len = encode(settings, &mut record)?;
        let item = &record[..len];

        match store_item::<u8, &[u8], _>(
            flash,
            STORAGE_FLASH_START..STORAGE_FLASH_END,
            &mut NoCache::new(),
            &mut buf,
            &KEY_THRESHOLDS,
            &item,
        )
        .await
        {
            Ok(()) => {
                info!("Saved thresholds to flash");
                Ok(())
            }
            Err(e) => {
                error!("Flash write error: {:?}", defmt::Debug2Format(&e));
                Err(Error::Storage)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_encode_to_zero_mask() {
        let mut buf = [0xAA; RECORD_SIZE];
        assert_eq!(encode(&default_settings(), &mut buf), Ok(RECORD_SIZE));
        assert_eq!(buf[0], FORMAT_VERSION);
        assert_eq!(buf[1], 0);
        assert!(buf[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn layout_is_little_endian_in_setting_order() {
        let mut settings = default_settings();
        settings[1].commit(2.5);
        settings[5].commit(100.0);

        let mut buf = [0; RECORD_SIZE];
        encode(&settings, &mut buf).unwrap();

        assert_eq!(buf[1], 0b10_0010);
        assert_eq!(buf[6..10], 2.5f32.to_le_bytes());
        assert_eq!(buf[22..26], 100.0f32.to_le_bytes());
    }

    #[test]
    fn stored_record_restores_thresholds_and_flags() {
        let mut settings = default_settings();
        settings[0].commit(30.5);
        settings[3].commit(1020.0);

        let mut buf = [0; RECORD_SIZE];
        encode(&settings, &mut buf).unwrap();
        let restored = decode(&buf).unwrap();

        assert_eq!(restored, settings);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut buf = [0; RECORD_SIZE - 1];
        assert_eq!(encode(&default_settings(), &mut buf), Err(Error::BufferOverflow));
        assert_eq!(decode(&buf), Err(Error::Storage));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut buf = [0; RECORD_SIZE];
        encode(&default_settings(), &mut buf).unwrap();
        buf[0] = FORMAT_VERSION + 1;
        assert_eq!(decode(&buf), Err(Error::Storage));
    }
}
