//! Low-level register map and data decoding for the AP3216C

/// I2C address of the AP3216C
pub const I2C_ADDRESS: u8 = 0x1E;

/// Bus device the sensor is wired to on the reference board
pub const DEVICE_PATH: &str = "/dev/i2c-0";

/// System configuration register (holds the active [`Mode`])
pub const SYSTEM_CONFIG: u8 = 0x00;
/// Interrupt status register
pub const INT_STATUS: u8 = 0x01;
/// Interrupt clear manner register
pub const INT_CLEAR: u8 = 0x02;
/// IR data, low byte (bit 7 is IR_OF)
pub const IR_DATA_LOW: u8 = 0x0A;
/// IR data, high byte
pub const IR_DATA_HIGH: u8 = 0x0B;
/// ALS data, low byte
pub const ALS_DATA_LOW: u8 = 0x0C;
/// ALS data, high byte
pub const ALS_DATA_HIGH: u8 = 0x0D;
/// PS data, low byte (bit 6 is PS_OF)
pub const PS_DATA_LOW: u8 = 0x0E;
/// PS data, high byte
pub const PS_DATA_HIGH: u8 = 0x0F;

/// Number of data registers, IR_DATA_LOW through PS_DATA_HIGH
pub const DATA_LEN: usize = (PS_DATA_HIGH - IR_DATA_LOW + 1) as usize;

const IR_OF: u8 = 0x80;
const PS_OF: u8 = 0x40;
const PS_OBJ: u8 = 0x80;

/// Operating modes written to [`SYSTEM_CONFIG`]
///
/// Only one mode is resident at a time. The `*Once` variants perform a
/// single conversion and return the chip to standby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    /// Power down (default after power-up)
    PowerDown = 0x00,
    /// ALS function active
    AlsActive = 0x01,
    /// PS and IR functions active
    PsIrActive = 0x02,
    /// ALS, PS and IR functions active
    AlsPsIrActive = 0x03,
    /// Software reset
    SwReset = 0x04,
    /// ALS function once
    AlsOnce = 0x05,
    /// PS and IR functions once
    PsIrOnce = 0x06,
    /// ALS, PS and IR functions once
    AlsPsIrOnce = 0x07,
}

impl TryFrom<u8> for Mode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Mode::PowerDown,
            0x01 => Mode::AlsActive,
            0x02 => Mode::PsIrActive,
            0x03 => Mode::AlsPsIrActive,
            0x04 => Mode::SwReset,
            0x05 => Mode::AlsOnce,
            0x06 => Mode::PsIrOnce,
            0x07 => Mode::AlsPsIrOnce,
            other => return Err(other),
        })
    }
}

/// One decoded IR / ALS / PS measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct SensorSample {
    /// IR count (0-1023), zero when the IR_OF flag was set
    pub ir: u16,
    /// Ambient light count (0-65535)
    pub als: u16,
    /// Proximity count (0-1023), zero when the PS_OF flag was set
    pub ps: u16,
}

/// Snapshot of the six data registers, IR_DATA_LOW first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RawRegisters {
    /// Register contents in ascending offset order
    pub bytes: [u8; DATA_LEN],
}

impl RawRegisters {
    /// Wrap a register snapshot
    pub const fn new(bytes: [u8; DATA_LEN]) -> Self {
        Self { bytes }
    }

    /// IR_OF: the IR reading is invalid under strong infrared light
    pub fn ir_overflow(&self) -> bool {
        self.bytes[0] & IR_OF != 0
    }

    /// PS_OF: the proximity reading is invalid under strong infrared light
    pub fn ps_overflow(&self) -> bool {
        self.bytes[4] & PS_OF != 0
    }

    /// Object-detect status bit of PS_DATA_LOW
    pub fn ps_object_near(&self) -> bool {
        self.bytes[4] & PS_OBJ != 0
    }

    /// Decode the snapshot into counts
    pub fn decode(&self) -> SensorSample {
        let b = &self.bytes;

        let ir = if self.ir_overflow() {
            0
        } else {
            ((b[1] as u16) << 2) | ((b[0] as u16) & 0x03)
        };

        let als = u16::from_le_bytes([b[2], b[3]]);

        // Bits 4-6 of PS_DATA_LOW are status flags, only the low nibble is data
        let ps = if self.ps_overflow() {
            0
        } else {
            (((b[5] as u16) & 0x3F) << 4) | ((b[4] as u16) & 0x0F)
        };

        SensorSample { ir, als, ps }
    }
}

impl From<RawRegisters> for SensorSample {
    fn from(raw: RawRegisters) -> Self {
        raw.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: [u8; DATA_LEN]) -> SensorSample {
        RawRegisters::new(bytes).decode()
    }

    #[test]
    fn test_register_block_is_contiguous() {
        assert_eq!(DATA_LEN, 6);
        assert_eq!(IR_DATA_HIGH, IR_DATA_LOW + 1);
        assert_eq!(ALS_DATA_LOW, IR_DATA_LOW + 2);
        assert_eq!(ALS_DATA_HIGH, IR_DATA_LOW + 3);
        assert_eq!(PS_DATA_LOW, IR_DATA_LOW + 4);
    }

    #[test]
    fn test_ir_overflow_forces_zero() {
        for low in 0x80..=0xFFu8 {
            for high in [0x00, 0x01, 0x7F, 0xFF] {
                let sample = decode([low, high, 0, 0, 0, 0]);
                assert_eq!(sample.ir, 0, "low={low:#04x} high={high:#04x}");
            }
        }
    }

    #[test]
    fn test_ir_ten_bit_value() {
        for low in 0x00..0x80u8 {
            for high in 0..=0xFFu8 {
                let sample = decode([low, high, 0, 0, 0, 0]);
                let expected = ((high as u16) << 2) | (low as u16 & 0x03);
                assert_eq!(sample.ir, expected);
                assert!(sample.ir <= 1023);
            }
        }
    }

    #[test]
    fn test_als_ignores_flags() {
        for low in [0x00, 0x01, 0x80, 0xFF] {
            for high in 0..=0xFFu8 {
                // overflow flags on the other channels must not touch ALS
                let sample = decode([0xFF, 0xFF, low, high, 0xFF, 0xFF]);
                assert_eq!(sample.als, ((high as u16) << 8) | low as u16);
            }
        }
    }

    #[test]
    fn test_ps_overflow_forces_zero() {
        for low in (0..=0xFFu8).filter(|b| b & 0x40 != 0) {
            for high in [0x00, 0x3F, 0xFF] {
                let sample = decode([0, 0, 0, 0, low, high]);
                assert_eq!(sample.ps, 0);
            }
        }
    }

    #[test]
    fn test_ps_masks_status_bits() {
        for low in (0..=0xFFu8).filter(|b| b & 0x40 == 0) {
            for high in 0..=0xFFu8 {
                let sample = decode([0, 0, 0, 0, low, high]);
                let expected = (((high as u16) & 0x3F) << 4) | (low as u16 & 0x0F);
                assert_eq!(sample.ps, expected);
                assert!(sample.ps <= 1023);
            }
        }
        // object-near and IR_OF-for-PS bits are status only
        assert_eq!(decode([0, 0, 0, 0, 0xB5, 0x00]).ps, 0x05);
    }

    #[test]
    fn test_ir_overflow_scenario() {
        let sample = decode([0x85, 0x10, 0x20, 0x01, 0x00, 0x00]);
        assert_eq!(sample, SensorSample { ir: 0, als: 288, ps: 0 });
    }

    #[test]
    fn test_all_channels_valid_scenario() {
        let sample = decode([0x03, 0x40, 0x20, 0x01, 0x05, 0x02]);
        assert_eq!(sample, SensorSample { ir: 259, als: 288, ps: 37 });
    }

    #[test]
    fn test_sample_from_raw_registers() {
        let raw = RawRegisters::new([0x03, 0x40, 0x20, 0x01, 0x05, 0x02]);
        assert_eq!(SensorSample::from(raw), raw.decode());
    }

    #[test]
    fn test_status_flags() {
        let raw = RawRegisters::new([0x80, 0, 0, 0, 0xC0, 0]);
        assert!(raw.ir_overflow());
        assert!(raw.ps_overflow());
        assert!(raw.ps_object_near());

        let raw = RawRegisters::default();
        assert!(!raw.ir_overflow());
        assert!(!raw.ps_overflow());
        assert!(!raw.ps_object_near());
    }

    #[test]
    fn test_mode_opcodes() {
        assert_eq!(Mode::SwReset as u8, 0x04);
        assert_eq!(Mode::AlsPsIrActive as u8, 0x03);
        for code in 0x00..=0x07u8 {
            assert_eq!(Mode::try_from(code).map(|m| m as u8), Ok(code));
        }
        assert_eq!(Mode::try_from(0x08), Err(0x08));
    }
}
