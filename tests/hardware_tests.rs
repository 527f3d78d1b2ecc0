// tests/hardware_tests.rs
//! Tests against a real AD5693 behind an XR2280x bridge.
//! All are ignored by default: `cargo test -- --ignored` with hardware attached.

use hidapi::HidApi;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use speaker_test_bench::{find_bridges, Ad5693, Error, HalError, OutputMode, Result, Xr2280xBus};

const DAC_ADDR: &str = "0x4C"; // CHANGE THIS if A0 is tied high (0x4E)
const EMPTY_ADDR: u8 = 0x31; // CHANGE THIS to an address KNOWN TO BE EMPTY

fn open_test_dac() -> Ad5693<Xr2280xBus> {
    let _ = env_logger::builder().is_test(true).try_init();
    let hid_api = HidApi::new().expect("Failed to create HID API");
    Ad5693::open_default(&hid_api, DAC_ADDR)
        .expect("Failed to open AD5693. Is the bridge connected and the DAC powered?")
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_find_bridges_numbers_from_one() {
    let hid_api = HidApi::new().expect("Failed to create HID API");
    for (idx, bridge) in find_bridges(&hid_api).iter().enumerate() {
        assert_eq!(bridge.bus_number, idx + 1);
    }
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_open_unknown_bus_number() {
    let hid_api = HidApi::new().expect("Failed to create HID API");
    let count = find_bridges(&hid_api).len();
    match Xr2280xBus::open(&hid_api, count + 1) {
        Err(Error::DeviceNotFound) => assert_eq!(count, 0),
        Err(Error::BusNotFound { bus_number, .. }) => assert_eq!(bus_number, count + 1),
        other => panic!("Expected a lookup error, got: {:?}", other.map(|_| ())),
    }
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_voltage_steps() -> Result<()> {
    let mut dac = open_test_dac();
    for v in [0.0, 1.25, 2.5, 3.75, 5.0] {
        println!("Setting {} V", v);
        dac.set_voltage(v)?;
        std::thread::sleep(std::time::Duration::from_millis(200));
    }
    dac.set_voltage(0.0)
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_power_down_modes() -> Result<()> {
    let mut dac = open_test_dac();
    for mode in [
        OutputMode::Output1kImpedance,
        OutputMode::Output100kImpedance,
        OutputMode::TriState,
        OutputMode::Normal,
    ] {
        dac.update_control_register(mode, true, false)?;
        assert_eq!(dac.config().mode, mode);
    }
    Ok(())
}

#[test]
#[ignore] // Ignore by default, requires hardware
fn test_missing_device_fails_init() {
    let hid_api = HidApi::new().expect("Failed to create HID API");
    let err = Ad5693::open(&hid_api, EMPTY_ADDR, 1, 5.0).unwrap_err();
    match err {
        Error::DeviceInit { source, .. } => {
            assert!(matches!(
                *source,
                Error::BusWrite {
                    kind: ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
                    ..
                }
            ));
            let cause = source
                .transport_error()
                .and_then(|e| e.downcast_ref::<HalError<Error>>());
            assert!(
                matches!(cause, Some(HalError(Error::I2cNack { .. }))),
                "expected NACK, got {:?}",
                cause
            );
        }
        e => panic!("Expected DeviceInit error, got: {:?}", e),
    }
}
