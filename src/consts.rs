//! Internal constants, register addresses, and bit definitions.

/// Default reference voltage (volts) used when none is given.
pub const DEFAULT_V_REF: f64 = 5.0;
/// Default bus number. Bus numbers are 1-based, so this is the first bridge found.
pub const DEFAULT_BUS_NUMBER: usize = 1;

// --- AD5693 Related Constants ---
pub mod ad5693 {
    // Command/register bytes (first byte of every write)
    pub const NOP: u8 = 0x00;
    /// Preloads the input register without touching VOUT.
    pub const WRITE_INPUT_REGISTER: u8 = 0x10;
    /// Transfers the input register to the DAC register (data is ignored).
    pub const UPDATE_REGISTER: u8 = 0x20;
    /// Writes the DAC register and updates VOUT when the write completes.
    pub const DATA_REGISTER: u8 = 0x30;
    /// Power-down mode, reference, gain and software reset.
    pub const CONTROL_REGISTER: u8 = 0x40;

    pub const RESOLUTION_BITS: u32 = 16;
    pub const FULL_SCALE_CODE: f64 = ((1u32 << RESOLUTION_BITS) - 1) as f64; // 65535

    // Control register bits (D15..D0)
    pub mod control {
        /// D15. Cleared by the device once the reset completes.
        pub const RESET: u16 = 1 << 15;
        pub const MODE_SHIFT: u8 = 13; // D14:D13
        pub const MODE_MASK: u16 = 0b11 << MODE_SHIFT;
        /// D12. Set to DISABLE the internal reference.
        pub const REF_DISABLE: u16 = 1 << 12;
        /// D11. Set for 2x gain (0 to 2 x VREF).
        pub const GAIN: u16 = 1 << 11;
        // D10..D0 reserved, written as zero
    }
}

// Default Vendor/Product IDs
/// Exar Corporation vendor ID for XR2280x devices.
pub const EXAR_VID: u16 = 0x04E2;
/// Product ID for XR2280x I2C interface (common for XR22800/1/2/4).
pub const XR2280X_I2C_PID: u16 = 0x1100;

// --- XR2280x I2C bridge Constants ---
pub mod bridge {
    pub const DEFAULT_I2C_TIMEOUT_MS: i32 = 500;

    pub const REPORT_MAX_DATA_SIZE: usize = 32;
    // Flags(1) + WrSize(1) + RdSize(1) + SlaveAddr(1) + Data(32)
    pub const OUT_REPORT_WRITE_BUF_SIZE: usize = 36;
    // Flags(1) + WrSize(1) + RdSize(1) + Reserved(1) + Data(32)
    pub const IN_REPORT_READ_BUF_SIZE: usize = 36;

    // Feature report used to program the SCL timing registers
    pub const REPORT_ID_WRITE_HID_REGISTER: u8 = 0x3C;
    pub const REG_SCL_LOW: u16 = 0x0341;
    pub const REG_SCL_HIGH: u16 = 0x0342;

    // I2C_SLAVE_OUT Flags (Byte 0 of OUT report buffer)
    pub mod out_flags {
        pub const START_BIT: u8 = 1 << 0;
        pub const STOP_BIT: u8 = 1 << 1;
    }

    // I2C_SLAVE_IN Status Flags (Byte 0 of IN report buffer)
    pub mod in_flags {
        pub const REQUEST_ERROR: u8 = 1 << 0;
        pub const NAK_RECEIVED: u8 = 1 << 1;
        pub const ARBITRATION_LOST: u8 = 1 << 2;
        pub const TIMEOUT: u8 = 1 << 3;
        // Bits 7..4 Sequence number
    }
}
