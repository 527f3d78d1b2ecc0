use hidapi::HidApi;
use speaker_test_bench::{self, sample_plan, Ad5693, OutputMode, Result};
use std::env;

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    let frequency: f64 = args.first().and_then(|s| s.parse().ok()).unwrap_or(2.0);
    let duration: f64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(1.0);

    let hid_api = HidApi::new()?;
    let mut dac = Ad5693::open_default(&hid_api, "0x4C")?;

    let plan = sample_plan(dac.v_ref(), duration, frequency)?;
    println!(
        "Sine {} Hz: {} samples, {:.3} ms apart",
        frequency,
        plan.num_samples,
        plan.delay_per_sample * 1000.0
    );
    dac.generate_sine_wave(frequency, duration)?;

    // Leave the output floating once done
    dac.update_control_register(OutputMode::TriState, true, false)?;
    println!("Done.");
    Ok(())
}
