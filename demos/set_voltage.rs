//! Sets a fixed output voltage.
//!
//! Usage: `cargo run --example set_voltage -- <volts> [address] [bus] [v_ref]`

use hidapi::HidApi;
use speaker_test_bench::{self, Ad5693, Result};
use std::env;

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    let volts: f64 = args.first().and_then(|s| s.parse().ok()).unwrap_or(2.5);
    let address = args.get(1).map(String::as_str).unwrap_or("0x4C");
    let bus: usize = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(speaker_test_bench::DEFAULT_BUS_NUMBER);
    let v_ref: f64 = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(speaker_test_bench::DEFAULT_V_REF);

    let hid_api = HidApi::new()?;
    println!("Opening AD5693 at {} on bus {} (v_ref {} V)...", address, bus, v_ref);
    let mut dac = match Ad5693::open(&hid_api, address, bus, v_ref) {
        Ok(dac) => dac,
        Err(e) => {
            eprintln!("Error opening DAC: {}", e);
            eprintln!("Ensure the bridge is connected and permissions are set (e.g., udev rules on Linux).");
            return Err(e);
        }
    };

    if !(0.0..=v_ref).contains(&volts) {
        eprintln!("Warning: {} V is outside 0..={} V, the code will wrap.", volts, v_ref);
    }
    dac.set_voltage(volts)?;
    println!(
        "Output set to {} V (code {}).",
        volts,
        speaker_test_bench::convert_analog_to_digital(volts, v_ref)
    );
    Ok(())
}
