//! XR2280x USB-to-I2C bridge transport.
//!
//! The MaxLinear/Exar XR22800/1/2/4 expose their I2C master as a USB HID
//! interface. Each transfer is one OUT report followed by one IN status report.
//! [`Xr2280xBus`] implements [`embedded_hal::i2c::I2c`] for both 7-bit and
//! 10-bit addressing.

use crate::consts::{self, bridge as hw};
use crate::error::{Error, Result};
use crate::i2c::I2cAddress;
use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress, TenBitAddress};
use hidapi::{HidApi, HidDevice};
use log::{debug, trace, warn};
use std::ffi::CString;
use std::ops::Range;

/// A discovered XR2280x I2C interface.
#[derive(Debug, Clone)]
pub struct BridgeInfo {
    /// 1-based bus number used by [`Xr2280xBus::open`].
    pub bus_number: usize,
    /// Platform-specific HID path.
    pub path: CString,
    /// Device serial number string.
    pub serial_number: Option<String>,
    /// Human-readable product name/description.
    pub product_string: Option<String>,
}

/// Lists the XR2280x I2C interfaces currently attached, in bus number order.
///
/// Ordering is by serial number, then path, so bus numbers stay stable
/// across runs as long as the same bridges are plugged in.
pub fn find_bridges(hid_api: &HidApi) -> Vec<BridgeInfo> {
    let mut found: Vec<(Option<String>, CString, Option<String>)> = hid_api
        .device_list()
        .filter(|info| {
            info.vendor_id() == consts::EXAR_VID && info.product_id() == consts::XR2280X_I2C_PID
        })
        .map(|info| {
            debug!(
                "Found XR2280x I2C interface: Path={:?}, SN={:?}",
                info.path(),
                info.serial_number()
            );
            (
                info.serial_number().map(|s| s.to_string()),
                info.path().to_owned(),
                info.product_string().map(|s| s.to_string()),
            )
        })
        .collect();

    found.sort_by(|a, b| match (&a.0, &b.0) {
        (Some(sa), Some(sb)) => sa.cmp(sb).then_with(|| a.1.cmp(&b.1)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.cmp(&b.1),
    });

    found
        .into_iter()
        .enumerate()
        .map(|(idx, (serial_number, path, product_string))| BridgeInfo {
            bus_number: idx + 1,
            path,
            serial_number,
            product_string,
        })
        .collect()
}

/// An opened XR2280x I2C interface, usable as an [`embedded_hal::i2c::I2c`] bus.
/// **Note:** This handle is not thread-safe; give each controller its own.
#[derive(Debug)]
pub struct Xr2280xBus {
    device: HidDevice,
    timeout_ms: i32,
}

impl Xr2280xBus {
    /// Opens the bridge registered under `bus_number` (1-based, see [`find_bridges`]).
    pub fn open(hid_api: &HidApi, bus_number: usize) -> Result<Self> {
        let bridges = find_bridges(hid_api);
        if bridges.is_empty() {
            return Err(Error::DeviceNotFound);
        }
        let info = bus_number
            .checked_sub(1)
            .and_then(|idx| bridges.get(idx))
            .ok_or_else(|| Error::BusNotFound {
                bus_number,
                message: format!("bus numbers start at 1 (found {} bridges)", bridges.len()),
            })?;

        debug!("Opening I2C bus {} at {:?}", bus_number, info.path);
        let device = hid_api.open_path(&info.path)?;
        Ok(Self::from_hid_device(device))
    }

    /// Wraps an already opened HID handle of an XR2280x I2C interface.
    pub fn from_hid_device(device: HidDevice) -> Self {
        Self {
            device,
            timeout_ms: hw::DEFAULT_I2C_TIMEOUT_MS,
        }
    }

    /// Sets how long a transfer waits for the status report.
    pub fn set_timeout_ms(&mut self, timeout_ms: i32) {
        self.timeout_ms = timeout_ms;
    }

    /// Sets the I2C bus speed (approximated). Max supported is 400 kHz.
    pub fn set_speed_khz(&self, speed_khz: u32) -> Result<()> {
        let (low, high) = scl_registers(speed_khz)?;
        debug!(
            "Setting I2C speed ~{}kHz: SCL_LOW=0x{:04X}, SCL_HIGH=0x{:04X}",
            speed_khz, low, high
        );
        self.write_hid_register(hw::REG_SCL_LOW, low)?;
        self.write_hid_register(hw::REG_SCL_HIGH, high)?;
        Ok(())
    }

    fn write_hid_register(&self, reg_addr: u16, value: u16) -> Result<()> {
        let [reg_lo, reg_hi] = reg_addr.to_le_bytes();
        let [val_lo, val_hi] = value.to_le_bytes();
        let buf = [
            hw::REPORT_ID_WRITE_HID_REGISTER,
            reg_lo,
            reg_hi,
            val_lo,
            val_hi,
        ];
        trace!(
            "Writing Feature Report (Write Reg {:04X} = {:04X}): {:02X?}",
            reg_addr,
            value,
            &buf[..]
        );
        self.device.send_feature_report(&buf)?;
        Ok(())
    }

    fn run_transaction(&self, address: I2cAddress, operations: &mut [Operation<'_>]) -> Result<()> {
        for segment in split_segments(operations) {
            let mut read = vec![0u8; segment.read_len];
            self.transfer(address, &segment.write, &mut read, segment.stop)?;

            let mut rest = read.as_slice();
            for op in &mut operations[segment.reads] {
                if let Operation::Read(buf) = op {
                    let (head, tail) = rest.split_at(buf.len());
                    buf.copy_from_slice(head);
                    rest = tail;
                }
            }
        }
        Ok(())
    }

    /// One START, write, (repeated START) read, optional STOP exchange.
    fn transfer(&self, address: I2cAddress, write: &[u8], read: &mut [u8], stop: bool) -> Result<()> {
        let mut flags = hw::out_flags::START_BIT;
        if stop {
            flags |= hw::out_flags::STOP_BIT;
        }
        let out_buf = build_out_report(address, write, read.len(), flags)?;
        debug!(
            "I2C transfer to {}: write {} bytes, read {} bytes, flags=0x{:02X}",
            address,
            write.len(),
            read.len(),
            flags
        );
        trace!("I2C OUT buffer: {:02X?}", &out_buf);

        match self.device.write(&out_buf) {
            Ok(written) if written == out_buf.len() => {}
            Ok(written) => {
                warn!("Partial write: sent {} of {} bytes", written, out_buf.len());
                return Err(Error::Io(std::io::Error::other("Partial HID write")));
            }
            Err(e) => return Err(Error::Hid(e)),
        }

        // The bridge always answers with a status report, even for writes.
        let mut in_buf = [0u8; hw::IN_REPORT_READ_BUF_SIZE];
        let received = self
            .device
            .read_timeout(&mut in_buf, self.timeout_ms)
            .inspect_err(|e| warn!("I2C status read failed: {}", e))?;
        trace!("I2C IN buffer: {:02X?}", &in_buf[..received]);
        if received < 4 {
            return Err(Error::InvalidReport(received));
        }
        check_status(address, in_buf[0])?;

        if !read.is_empty() {
            let reported = in_buf[2] as usize;
            if reported != read.len() {
                warn!(
                    "I2C read length mismatch: expected {}, got {}",
                    read.len(),
                    reported
                );
            }
            let n = reported.min(read.len()).min(received - 4);
            read[..n].copy_from_slice(&in_buf[4..4 + n]);
        }
        Ok(())
    }
}

impl ErrorType for Xr2280xBus {
    type Error = Error;
}

impl I2c<SevenBitAddress> for Xr2280xBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<()> {
        let address = I2cAddress::new_7bit(address)?;
        self.run_transaction(address, operations)
    }
}

impl I2c<TenBitAddress> for Xr2280xBus {
    fn transaction(&mut self, address: u16, operations: &mut [Operation<'_>]) -> Result<()> {
        let address = I2cAddress::new_10bit(address)?;
        self.run_transaction(address, operations)
    }
}

/// Part of a transaction carried by one bridge transfer.
#[derive(Debug, PartialEq, Eq)]
struct Segment {
    /// Concatenated payload of the leading write operations.
    write: Vec<u8>,
    /// Indices of the read operations that follow them.
    reads: Range<usize>,
    read_len: usize,
    /// STOP only after the last segment.
    stop: bool,
}

/// Groups writes followed by reads into one transfer each. Adjacent
/// operations of one kind are merged; a write after a read starts a new
/// segment behind a repeated START.
fn split_segments(operations: &[Operation<'_>]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut idx = 0;
    while idx < operations.len() {
        let mut write = Vec::new();
        while let Some(Operation::Write(bytes)) = operations.get(idx) {
            write.extend_from_slice(bytes);
            idx += 1;
        }
        let first_read = idx;
        let mut read_len = 0;
        while let Some(Operation::Read(buf)) = operations.get(idx) {
            read_len += buf.len();
            idx += 1;
        }
        segments.push(Segment {
            write,
            reads: first_read..idx,
            read_len,
            stop: idx == operations.len(),
        });
    }
    segments
}

/// Validated SCL timing register values for `speed_khz`.
fn scl_registers(speed_khz: u32) -> Result<(u16, u16)> {
    if speed_khz == 0 || speed_khz > 400 {
        return Err(Error::ArgumentOutOfRange(format!(
            "I2C speed {} kHz out of range (1-400)",
            speed_khz
        )));
    }
    Ok(scl_cycles(speed_khz))
}

/// SCL low/high period in 60 MHz cycles, clamped to the datasheet minimums.
fn scl_cycles(speed_khz: u32) -> (u16, u16) {
    let total = 60_000 / speed_khz;
    let low = total / 2;
    let high = total - low;
    let (min_low, min_high) = if speed_khz <= 100 { (252, 240) } else { (78, 36) };
    // speed_khz >= 1 keeps both within u16
    (low.max(min_low) as u16, high.max(min_high) as u16)
}

/// Builds the I2C_SLAVE_OUT report: `[flags, write_len, read_len, address, data..]`.
fn build_out_report(
    address: I2cAddress,
    write: &[u8],
    read_len: usize,
    flags: u8,
) -> Result<[u8; hw::OUT_REPORT_WRITE_BUF_SIZE]> {
    // 10-bit addressing spends one data byte on the low address bits
    let extra = matches!(address, I2cAddress::Bit10(_)) as usize;
    let write_len = write.len() + extra;
    if write_len > hw::REPORT_MAX_DATA_SIZE {
        return Err(Error::OperationTooLarge {
            max: hw::REPORT_MAX_DATA_SIZE - extra,
            actual: write.len(),
        });
    }
    if read_len > hw::REPORT_MAX_DATA_SIZE {
        return Err(Error::OperationTooLarge {
            max: hw::REPORT_MAX_DATA_SIZE,
            actual: read_len,
        });
    }

    let mut buf = [0u8; hw::OUT_REPORT_WRITE_BUF_SIZE];
    buf[0] = flags;
    buf[1] = write_len as u8;
    buf[2] = read_len as u8;
    match address {
        // 7-bit address in bits 7:1, bit 0 is R/W
        I2cAddress::Bit7(a) => buf[3] = a << 1,
        I2cAddress::Bit10(a) => {
            buf[3] = ((((a >> 8) & 0x03) as u8) << 1) | 0xF0; // 11110xx0
            buf[4] = (a & 0xFF) as u8;
        }
    }
    buf[4 + extra..4 + write_len].copy_from_slice(write);
    Ok(buf)
}

fn check_status(address: I2cAddress, status: u8) -> Result<()> {
    use hw::in_flags;
    if status & in_flags::REQUEST_ERROR != 0 {
        Err(Error::I2cRequestError { address })
    } else if status & in_flags::NAK_RECEIVED != 0 {
        Err(Error::I2cNack { address })
    } else if status & in_flags::ARBITRATION_LOST != 0 {
        Err(Error::I2cArbitrationLost { address })
    } else if status & in_flags::TIMEOUT != 0 {
        Err(Error::I2cTimeout { address })
    } else if status & 0x0F != 0 {
        Err(Error::I2cUnknownError {
            address,
            flags: status,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{Error as _, ErrorKind, NoAcknowledgeSource};

    const START_STOP: u8 = hw::out_flags::START_BIT | hw::out_flags::STOP_BIT;

    #[test]
    fn test_write_report_7bit_dac_command() {
        let addr = I2cAddress::new_7bit(0x4C).unwrap();
        let buf = build_out_report(addr, &[0x30, 0x12, 0x34], 0, START_STOP).unwrap();
        assert_eq!(&buf[..7], &[0x03, 3, 0, 0x98, 0x30, 0x12, 0x34]);
        assert!(buf[7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_report_10bit_prefixes_low_address_byte() {
        let addr = I2cAddress::new_10bit(0x2A5).unwrap();
        let buf = build_out_report(addr, &[0x40, 0x80, 0x00], 0, START_STOP).unwrap();
        assert_eq!(&buf[..8], &[0x03, 4, 0, 0xF4, 0xA5, 0x40, 0x80, 0x00]);
    }

    #[test]
    fn test_read_report_without_stop() {
        let addr = I2cAddress::new_7bit(0x4C).unwrap();
        let buf = build_out_report(addr, &[0x30], 2, hw::out_flags::START_BIT).unwrap();
        assert_eq!(&buf[..5], &[0x01, 1, 2, 0x98, 0x30]);

        // 10-bit read-only still writes the low address byte
        let addr10 = I2cAddress::new_10bit(0x150).unwrap();
        let buf = build_out_report(addr10, &[], 4, START_STOP).unwrap();
        assert_eq!(&buf[..5], &[0x03, 1, 4, 0xF2, 0x50]);
    }

    #[test]
    fn test_report_size_limits() {
        let addr = I2cAddress::new_7bit(0x4C).unwrap();
        assert!(build_out_report(addr, &[0u8; 32], 0, START_STOP).is_ok());
        assert!(matches!(
            build_out_report(addr, &[0u8; 33], 0, START_STOP),
            Err(Error::OperationTooLarge { max: 32, actual: 33 })
        ));
        assert!(matches!(
            build_out_report(addr, &[], 33, START_STOP),
            Err(Error::OperationTooLarge { max: 32, actual: 33 })
        ));
        let addr10 = I2cAddress::new_10bit(0x150).unwrap();
        assert!(matches!(
            build_out_report(addr10, &[0u8; 32], 0, START_STOP),
            Err(Error::OperationTooLarge { max: 31, actual: 32 })
        ));
    }

    #[test]
    fn test_status_flags() {
        let addr = I2cAddress::new_7bit(0x4C).unwrap();
        assert!(check_status(addr, 0x00).is_ok());
        assert!(check_status(addr, 0xF0).is_ok()); // sequence number only
        assert!(matches!(check_status(addr, 0x01), Err(Error::I2cRequestError { .. })));
        assert!(matches!(check_status(addr, 0x02), Err(Error::I2cNack { .. })));
        assert!(matches!(check_status(addr, 0x04), Err(Error::I2cArbitrationLost { .. })));
        assert!(matches!(check_status(addr, 0x08), Err(Error::I2cTimeout { .. })));
    }

    #[test]
    fn test_status_errors_map_to_hal_kinds() {
        let addr = I2cAddress::new_7bit(0x4C).unwrap();
        let kind = |status| check_status(addr, status).unwrap_err().kind();
        assert_eq!(kind(0x02), ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown));
        assert_eq!(kind(0x04), ErrorKind::ArbitrationLoss);
        assert_eq!(kind(0x08), ErrorKind::Other);
    }

    #[test]
    fn test_segments_merge_adjacent_operations() {
        let (mut a, mut b) = ([0u8; 2], [0u8; 3]);
        let ops = [
            Operation::Write(&[0x30]),
            Operation::Write(&[0x12, 0x34]),
            Operation::Read(&mut a),
            Operation::Read(&mut b),
            Operation::Write(&[0x01]),
        ];
        let segments = split_segments(&ops);
        assert_eq!(
            segments,
            vec![
                Segment {
                    write: vec![0x30, 0x12, 0x34],
                    reads: 2..4,
                    read_len: 5,
                    stop: false,
                },
                Segment {
                    write: vec![0x01],
                    reads: 5..5,
                    read_len: 0,
                    stop: true,
                },
            ]
        );
        assert!(split_segments(&[]).is_empty());
    }

    #[test]
    fn test_scl_cycles() {
        assert_eq!(scl_cycles(100), (300, 300));
        assert_eq!(scl_cycles(400), (78, 75));
        assert_eq!(scl_cycles(1), (30_000, 30_000));
    }

    #[test]
    fn test_speed_outside_1_to_400_khz_is_rejected() {
        for khz in [0, 401, 1000] {
            assert!(
                matches!(scl_registers(khz), Err(Error::ArgumentOutOfRange(_))),
                "{khz} kHz should be rejected"
            );
        }
        assert_eq!(scl_registers(1).unwrap(), scl_cycles(1));
        assert_eq!(scl_registers(400).unwrap(), scl_cycles(400));
    }
}
