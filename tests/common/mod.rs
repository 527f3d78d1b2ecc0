//! Shared setup for the integration tests.

#![allow(dead_code)]

use embedded_hal_mock::eh1::i2c::Transaction as I2cTransaction;

pub const DAC_ADDR: u8 = 0x4C;

/// One DAC command as the bus sees it: `[register, hi, lo]` to `address`.
pub fn command(address: u8, register: u8, word: u16) -> I2cTransaction {
    let [hi, lo] = word.to_be_bytes();
    I2cTransaction::write(address, vec![register, hi, lo])
}

/// Reset followed by the default control word, written by every constructor.
pub fn init_sequence(address: u8) -> Vec<I2cTransaction> {
    vec![command(address, 0x40, 0x8000), command(address, 0x40, 0x0000)]
}

/// The init sequence at [`DAC_ADDR`] followed by `rest`.
pub fn after_init(rest: impl IntoIterator<Item = I2cTransaction>) -> Vec<I2cTransaction> {
    let mut all = init_sequence(DAC_ADDR);
    all.extend(rest);
    all
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
