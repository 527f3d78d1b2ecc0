//! I2C device addressing.
//!
//! Bus access itself goes through [`embedded_hal::i2c::I2c`]; this module only
//! turns user input (integers, `"0x4C"` strings) into checked addresses.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Represents a 7-bit or 10-bit I2C slave address.
/// Use `I2cAddress::new_7bit(addr)` or `I2cAddress::new_10bit(addr)`,
/// or convert from an integer or a string such as `"0x4C"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum I2cAddress {
    /// Standard 7-bit address (0x00 - 0x7F).
    Bit7(u8),
    /// Extended 10-bit address (0x0000 - 0x03FF).
    Bit10(u16),
}

impl I2cAddress {
    /// Creates a 7-bit address, checking validity (0-127).
    pub fn new_7bit(addr: u8) -> Result<Self> {
        if addr <= 0x7F {
            Ok(I2cAddress::Bit7(addr))
        } else {
            Err(Error::InvalidAddress(format!(
                "0x{:02X} is not a 7-bit address (0x00-0x7F)",
                addr
            )))
        }
    }

    /// Creates a 10-bit address, checking validity (0-1023).
    pub fn new_10bit(addr: u16) -> Result<Self> {
        if addr <= 0x03FF {
            Ok(I2cAddress::Bit10(addr))
        } else {
            Err(Error::InvalidAddress(format!(
                "0x{:04X} is not a 10-bit address (0x000-0x3FF)",
                addr
            )))
        }
    }

    /// Returns the raw address value.
    #[inline]
    pub fn value(&self) -> u16 {
        match *self {
            I2cAddress::Bit7(a) => a as u16,
            I2cAddress::Bit10(a) => a,
        }
    }

    /// The address as an `embedded-hal` `SevenBitAddress`.
    /// Fails for 10-bit addresses.
    pub fn seven_bit(&self) -> Result<u8> {
        match *self {
            I2cAddress::Bit7(a) => Ok(a),
            I2cAddress::Bit10(_) => Err(Error::InvalidAddress(format!(
                "{} is not a 7-bit address",
                self
            ))),
        }
    }
}

impl fmt::Display for I2cAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            I2cAddress::Bit7(a) => write!(f, "0x{:02X}", a),
            I2cAddress::Bit10(a) => write!(f, "10-bit 0x{:03X}", a),
        }
    }
}

impl TryFrom<u8> for I2cAddress {
    type Error = Error;

    fn try_from(addr: u8) -> Result<Self> {
        I2cAddress::new_7bit(addr)
    }
}

/// Values up to 0x7F become 7-bit addresses, larger ones 10-bit.
impl TryFrom<u16> for I2cAddress {
    type Error = Error;

    fn try_from(addr: u16) -> Result<Self> {
        match u8::try_from(addr) {
            Ok(a) if a <= 0x7F => Ok(I2cAddress::Bit7(a)),
            _ => I2cAddress::new_10bit(addr),
        }
    }
}

impl TryFrom<i32> for I2cAddress {
    type Error = Error;

    fn try_from(addr: i32) -> Result<Self> {
        let addr = u16::try_from(addr)
            .map_err(|_| Error::InvalidAddress(format!("{} is not a valid address", addr)))?;
        I2cAddress::try_from(addr)
    }
}

/// Parses `"0x4C"` / `"0X4c"` as hexadecimal and `"76"` as decimal.
impl FromStr for I2cAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => trimmed.parse::<u16>(),
        };
        let addr = parsed
            .map_err(|e| Error::InvalidAddress(format!("cannot parse '{}': {}", s, e)))?;
        I2cAddress::try_from(addr)
    }
}

impl TryFrom<&str> for I2cAddress {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}
