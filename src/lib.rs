//! # speaker-test-bench
//!
//! Host-side toolkit for a speaker test bench: a driver for the Analog
//! Devices AD5693 family of 16-bit I2C DACs, an I2C transport over the
//! MaxLinear/Exar XR2280x USB bridges, and helpers used to write
//! measurement reports as JSON.
//!
//! ## Features
//!
//! *   AD5693 / AD5692 / AD5691 (R) control ([`Ad5693`]):
//!     *   Software reset and control register configuration (output mode,
//!         internal reference, gain).
//!     *   Voltage output (`set_voltage`), input register preload and
//!         update (`write_input_register`, `update_output`).
//!     *   Voltage quantization (`convert_analog_to_digital`) for scalars and sequences.
//!     *   Software-paced sine wave generation (`generate_sine_wave`).
//! *   Generic over any [`embedded_hal::i2c::I2c`] bus, with a USB HID
//!     implementation for XR22800/1/2/4 bridges ([`Xr2280xBus`]) selected by
//!     bus number.
//! *   Reporting helpers: JSON encoding with a conversion hook ([`json::ToJson`]),
//!     `flatten`, `copy_key_content`, `check_timestamp_iso` and enum value listing.
//!
//! ## Wire Format
//!
//! Every DAC command is a single I2C write of three bytes:
//!
//! | Byte | Content |
//! |------|---------|
//! | 0 | command: `0x00` NOP, `0x10` write input, `0x20` update, `0x30` write DAC, `0x40` control |
//! | 1 | data D15..D8 |
//! | 2 | data D7..D0 |
//!
//! The control word is `D15` reset, `D14:D13` mode, `D12` **disable**
//! internal reference, `D11` gain, the rest zero. Reset is `0x8000`.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use hidapi::HidApi;
//! use speaker_test_bench::{Ad5693, OutputMode, Result};
//!
//! fn main() -> Result<()> {
//!     env_logger::init();
//!     let hid_api = HidApi::new()?;
//!
//!     // DAC at 0x4C on the first XR2280x bridge, 5 V full scale.
//!     let mut dac = Ad5693::open(&hid_api, "0x4C", 1, 5.0)?;
//!
//!     dac.set_voltage(1.25)?;
//!     dac.generate_sine_wave(2.0, 1.0)?;
//!
//!     // Park the output in high impedance.
//!     dac.update_control_register(OutputMode::TriState, true, false)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Other Buses
//!
//! Any `embedded-hal` 1.0 I2C implementation works, e.g. `linux-embedded-hal`'s
//! `I2cdev` for `/dev/i2c-N`. Pass it to [`Ad5693::new`].
//! The driver never retries: the first transport error is returned wrapped
//! in [`Error::BusWrite`] with its [`ErrorKind`](embedded_hal::i2c::ErrorKind),
//! and the original error as a [`HalError`] `source()`.
//!
//! ## Hardware Setup Notes
//!
//! *   **Address:** `0x4C` with A0 low, `0x4E` with A0 high.
//! *   **I²C Pull-up Resistors:** Required externally (e.g., 4.7kΩ to 3.3V).
//! *   **Linux udev Rules:** Grant user permission to the bridge's HID interface:
//!     ```udev
//!     SUBSYSTEM=="hidraw", ATTRS{idVendor}=="04e2", ATTRS{idProduct}=="1100", MODE="0666", GROUP="plugdev"
//!     ```
//!
//! ## License
//!
//! This project is licensed under the WTFPL.

mod consts;
mod error;
pub mod bridge;
pub mod dac;
pub mod i2c;
pub mod json;
pub mod util;

pub use bridge::{find_bridges, BridgeInfo, Xr2280xBus};
pub use consts::{DEFAULT_BUS_NUMBER, DEFAULT_V_REF, EXAR_VID, XR2280X_I2C_PID};
pub use dac::{
    convert_analog_to_digital, sample_plan, Ad5693, ControlConfig, OutputMode, SamplePlan,
};
pub use error::{Error, HalError, Result, TransportError};
pub use i2c::I2cAddress;
pub use json::{to_json_string, JsonEncoder, ToJson};
pub use util::{check_timestamp_iso, copy_key_content, flatten, with_key_content, EnumValues};
