use hidapi::HidApi;
use speaker_test_bench::{find_bridges, Result};

fn main() -> Result<()> {
    env_logger::init();
    let hid_api = HidApi::new()?;
    let bridges = find_bridges(&hid_api);
    if bridges.is_empty() {
        println!("No XR2280x I2C bridges found.");
        return Ok(());
    }
    for b in &bridges {
        println!(
            "bus {}: {} (SN {}) at {:?}",
            b.bus_number,
            b.product_string.as_deref().unwrap_or("XR2280x"),
            b.serial_number.as_deref().unwrap_or("-"),
            b.path
        );
    }
    Ok(())
}
