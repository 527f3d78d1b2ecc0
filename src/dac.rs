//! AD5693 / AD5692 / AD5691 (R) 16-bit I2C DAC driver.
//!
//! Every command is one block write of three bytes: the command (register)
//! byte followed by a 16-bit big-endian payload.

use crate::bridge::Xr2280xBus;
use crate::consts::{self, ad5693};
use crate::error::{Error, Result};
use crate::i2c::I2cAddress;
use crate::util::EnumValues;
use embedded_hal::i2c::{self as hal_i2c, I2c};
use hidapi::HidApi;
use log::{debug, trace, warn};
use std::f64::consts::PI;
use std::fmt;
use std::thread;
use std::time::Duration;
use strum::EnumIter;

/// Command bytes of the AD5693 register map.
pub use crate::consts::ad5693::{
    CONTROL_REGISTER, DATA_REGISTER, NOP, UPDATE_REGISTER, WRITE_INPUT_REGISTER,
};

/// Output stage operating mode (control register bits D14:D13).
///
/// In normal mode the output buffer drives VOUT directly. In the power-down
/// modes the buffer is disabled and VOUT is tied to ground through the
/// selected impedance, or left floating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter)]
pub enum OutputMode {
    /// Normal operation.
    #[default]
    Normal = 0b00,
    /// Power-down, 1 kΩ to GND.
    Output1kImpedance = 0b01,
    /// Power-down, 100 kΩ to GND.
    Output100kImpedance = 0b10,
    /// Power-down, three-state output.
    TriState = 0b11,
}

impl OutputMode {
    /// The 2-bit mode field value.
    #[inline]
    pub fn bits(self) -> u16 {
        self as u16
    }

    /// Creates a mode from its 2-bit field value.
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0b00 => Ok(OutputMode::Normal),
            0b01 => Ok(OutputMode::Output1kImpedance),
            0b10 => Ok(OutputMode::Output100kImpedance),
            0b11 => Ok(OutputMode::TriState),
            _ => Err(Error::ArgumentOutOfRange(format!(
                "output mode {} out of range (0-3)",
                bits
            ))),
        }
    }
}

impl EnumValues for OutputMode {
    type Value = u8;

    fn value(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputMode::Normal => "normal",
            OutputMode::Output1kImpedance => "1k to GND",
            OutputMode::Output100kImpedance => "100k to GND",
            OutputMode::TriState => "three-state",
        };
        f.write_str(s)
    }
}

/// The control register contents last written by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlConfig {
    pub mode: OutputMode,
    /// Use the on-chip 2.5 V reference.
    pub internal_ref: bool,
    /// 2x output gain.
    pub gain: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        ControlConfig {
            mode: OutputMode::Normal,
            internal_ref: true,
            gain: false,
        }
    }
}

impl ControlConfig {
    /// Encodes the configuration as a control register word.
    ///
    /// D15 (reset) is always clear and D10..D0 are zero.
    pub fn control_word(&self) -> u16 {
        let mut word =
            (self.mode.bits() << ad5693::control::MODE_SHIFT) & ad5693::control::MODE_MASK;
        if reference_disable_bit(self.internal_ref) {
            word |= ad5693::control::REF_DISABLE;
        }
        if self.gain {
            word |= ad5693::control::GAIN;
        }
        word
    }
}

/// The hardware bit D12 means "disable internal reference", so it is the
/// inverse of the `internal_ref` setting.
#[inline]
pub fn reference_disable_bit(internal_ref: bool) -> bool {
    !internal_ref
}

/// Input accepted by [`convert_analog_to_digital`]; the output mirrors the input's shape.
pub trait AnalogInput {
    /// Digital code(s) produced for this input.
    type Output;

    /// Quantizes against `v_ref`.
    fn to_digital(&self, v_ref: f64) -> Self::Output;
}

/// `trunc(voltage / v_ref * 65535)`. Not clamped: voltages outside
/// `0..=v_ref` give codes outside `0..=65535`, including negative ones.
/// NaN maps to 0.
#[inline]
fn quantize(voltage: f64, v_ref: f64) -> i64 {
    ((voltage / v_ref) * ad5693::FULL_SCALE_CODE) as i64
}

impl AnalogInput for f64 {
    type Output = i64;

    fn to_digital(&self, v_ref: f64) -> i64 {
        quantize(*self, v_ref)
    }
}

impl AnalogInput for [f64] {
    type Output = Vec<i64>;

    fn to_digital(&self, v_ref: f64) -> Vec<i64> {
        self.iter().map(|&v| quantize(v, v_ref)).collect()
    }
}

impl AnalogInput for Vec<f64> {
    type Output = Vec<i64>;

    fn to_digital(&self, v_ref: f64) -> Vec<i64> {
        self.as_slice().to_digital(v_ref)
    }
}

impl<const N: usize> AnalogInput for [f64; N] {
    type Output = Vec<i64>;

    fn to_digital(&self, v_ref: f64) -> Vec<i64> {
        self.as_slice().to_digital(v_ref)
    }
}

impl<T: AnalogInput + ?Sized> AnalogInput for &T {
    type Output = T::Output;

    fn to_digital(&self, v_ref: f64) -> T::Output {
        (**self).to_digital(v_ref)
    }
}

/// Converts a voltage (or a sequence of voltages) to 16-bit DAC code(s).
///
/// ```
/// use speaker_test_bench::dac::convert_analog_to_digital;
///
/// assert_eq!(convert_analog_to_digital(5.0, 5.0), 65535);
/// assert_eq!(convert_analog_to_digital([0.0, 2.5], 5.0), vec![0, 32767]);
/// ```
pub fn convert_analog_to_digital<V: AnalogInput>(voltage: V, v_ref: f64) -> V::Output {
    voltage.to_digital(v_ref)
}

/// Sample count and pacing of a generated sine wave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePlan {
    pub num_samples: u64,
    /// Seconds to sleep after each sample.
    pub delay_per_sample: f64,
}

impl SamplePlan {
    /// The per-sample delay as a [`Duration`], saturating at
    /// [`Duration::ZERO`] and [`Duration::MAX`] for hand-built plans.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_per_sample).unwrap_or(
            if self.delay_per_sample > 0.0 {
                Duration::MAX
            } else {
                Duration::ZERO
            },
        )
    }
}

/// Computes `num_samples = floor(v_ref * duration * frequency)` and
/// `delay_per_sample = 1 / (frequency * num_samples)`.
///
/// Note: the sample count scales with `v_ref`, not with a sample rate, so the
/// same call plays 2.5x more samples on a 5 V reference than on a 2 V one.
/// Paced this way the samples always span `1 / frequency` seconds (one
/// period), whatever `duration` asks for.
pub fn sample_plan(v_ref: f64, duration: f64, frequency: f64) -> Result<SamplePlan> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return Err(Error::ArgumentOutOfRange(format!(
            "frequency {} Hz must be finite and > 0",
            frequency
        )));
    }
    if !(duration.is_finite() && duration >= 0.0) {
        return Err(Error::ArgumentOutOfRange(format!(
            "duration {} s must be finite and >= 0",
            duration
        )));
    }
    let num_samples = (v_ref * duration * frequency).floor() as u64;
    if num_samples == 0 {
        return Err(Error::ArgumentOutOfRange(format!(
            "{} Hz for {} s at v_ref {} V yields no samples",
            frequency, duration, v_ref
        )));
    }
    let delay_per_sample = 1.0 / (frequency * num_samples as f64);
    if Duration::try_from_secs_f64(delay_per_sample).is_err() {
        return Err(Error::ArgumentOutOfRange(format!(
            "{} s between samples is not a representable delay",
            delay_per_sample
        )));
    }
    Ok(SamplePlan {
        num_samples,
        delay_per_sample,
    })
}

/// Voltages of the sine wave swinging over `0..=v_ref` around `v_ref / 2`.
pub fn sine_wave_voltages(
    plan: SamplePlan,
    frequency: f64,
    v_ref: f64,
) -> impl Iterator<Item = f64> {
    let half = 0.5 * v_ref;
    (0..plan.num_samples).map(move |i| {
        let angle = 2.0 * PI * frequency * i as f64 * plan.delay_per_sample;
        half * angle.sin() + half
    })
}

/// Driver for one AD5693-family DAC on an [`embedded_hal::i2c::I2c`] bus.
///
/// Construction resets the device and writes the default control
/// configuration (normal mode, internal reference on, gain off).
/// The driver takes `&mut self` for every write; share a bus between
/// controllers through `embedded-hal-bus` or your own serialization.
#[derive(Debug)]
pub struct Ad5693<I2C> {
    i2c: I2C,
    address: u8,
    v_ref: f64,
    config: ControlConfig,
}

impl Ad5693<Xr2280xBus> {
    /// Opens XR2280x bus `bus_number` (1-based) and initializes the DAC at `address`.
    pub fn open<A>(hid_api: &HidApi, address: A, bus_number: usize, v_ref: f64) -> Result<Self>
    where
        A: TryInto<I2cAddress>,
        A::Error: Into<Error>,
    {
        let address: I2cAddress = address.try_into().map_err(Into::into)?;
        address.seven_bit()?;
        check_v_ref(v_ref)?;
        let bus = Xr2280xBus::open(hid_api, bus_number)?;
        Self::new(bus, address, v_ref)
    }

    /// [`Ad5693::open`] on the default bus with the default reference voltage.
    pub fn open_default<A>(hid_api: &HidApi, address: A) -> Result<Self>
    where
        A: TryInto<I2cAddress>,
        A::Error: Into<Error>,
    {
        Self::open(
            hid_api,
            address,
            consts::DEFAULT_BUS_NUMBER,
            consts::DEFAULT_V_REF,
        )
    }
}

impl<I2C, E> Ad5693<I2C>
where
    I2C: I2c<Error = E>,
    E: hal_i2c::Error + Send + Sync + 'static,
{
    /// Binds the DAC at `address` on `i2c`, resets it and writes the default
    /// control configuration.
    ///
    /// The AD5693 only answers on 7-bit addresses. Fails with
    /// [`Error::InvalidAddress`] or [`Error::InvalidReferenceVoltage`] before
    /// any bus traffic, and with [`Error::DeviceInit`] if either
    /// initialization write fails.
    pub fn new<A>(i2c: I2C, address: A, v_ref: f64) -> Result<Self>
    where
        A: TryInto<I2cAddress>,
        A::Error: Into<Error>,
    {
        let address: I2cAddress = address.try_into().map_err(Into::into)?;
        let wire_address = address.seven_bit()?;
        check_v_ref(v_ref)?;

        let mut dac = Ad5693 {
            i2c,
            address: wire_address,
            v_ref,
            config: ControlConfig::default(),
        };
        let ControlConfig {
            mode,
            internal_ref,
            gain,
        } = dac.config;
        dac.update_control_register(mode, internal_ref, gain)
            .map_err(|e| Error::DeviceInit {
                address,
                source: Box::new(e),
            })?;
        debug!("AD5693 at {} initialized (v_ref = {} V)", address, v_ref);
        Ok(dac)
    }

    /// [`Ad5693::new`] with the default 5 V reference.
    pub fn with_default_v_ref<A>(i2c: I2C, address: A) -> Result<Self>
    where
        A: TryInto<I2cAddress>,
        A::Error: Into<Error>,
    {
        Self::new(i2c, address, consts::DEFAULT_V_REF)
    }

    /// Device address.
    pub fn address(&self) -> I2cAddress {
        I2cAddress::Bit7(self.address)
    }

    /// Reference voltage used for all conversions.
    pub fn v_ref(&self) -> f64 {
        self.v_ref
    }

    /// Control configuration last written successfully.
    pub fn config(&self) -> ControlConfig {
        self.config
    }

    /// Borrows the underlying bus.
    pub fn bus(&self) -> &I2C {
        &self.i2c
    }

    /// Mutably borrows the underlying bus.
    pub fn bus_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Destroys the driver and returns the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Sends a 16-bit payload to `register` as one write `[register, hi, lo]`.
    pub fn send_command(&mut self, register: u8, data: u16) -> Result<()> {
        let [hi, lo] = data.to_be_bytes();
        trace!(
            "AD5693 0x{:02X}: reg 0x{:02X} <- 0x{:04X}",
            self.address,
            register,
            data
        );
        self.i2c
            .write(self.address, &[register, hi, lo])
            .map_err(|e| Error::bus_write(register, e))
    }

    /// Issues a software reset: DAC to zero-scale and all registers to defaults.
    ///
    /// The device clears D15 itself once the reset completes. Nothing here
    /// waits for that; the next write follows immediately.
    pub fn reset(&mut self) -> Result<()> {
        debug!("AD5693 0x{:02X}: software reset", self.address);
        self.send_command(ad5693::CONTROL_REGISTER, ad5693::control::RESET)
    }

    /// Resets the device, then writes a new control configuration.
    pub fn update_control_register(
        &mut self,
        mode: OutputMode,
        internal_ref: bool,
        gain: bool,
    ) -> Result<()> {
        self.reset()?;
        let config = ControlConfig {
            mode,
            internal_ref,
            gain,
        };
        let word = config.control_word();
        debug!(
            "AD5693 0x{:02X}: control mode={}, internal_ref={}, gain={} (0x{:04X})",
            self.address, mode, internal_ref, gain, word
        );
        self.send_command(ad5693::CONTROL_REGISTER, word)?;
        self.config = config;
        Ok(())
    }

    /// Sets the output voltage.
    ///
    /// No range check: codes outside `0..=65535` are sent as their low
    /// 16 bits, exactly as the hardware would see them.
    pub fn set_voltage(&mut self, voltage: f64) -> Result<()> {
        let code = self.wire_code(voltage);
        self.send_command(ad5693::DATA_REGISTER, code)
    }

    /// Preloads the input register without changing the output.
    pub fn write_input_register(&mut self, voltage: f64) -> Result<()> {
        let code = self.wire_code(voltage);
        self.send_command(ad5693::WRITE_INPUT_REGISTER, code)
    }

    /// Transfers the input register to the DAC register, updating VOUT.
    pub fn update_output(&mut self) -> Result<()> {
        self.send_command(ad5693::UPDATE_REGISTER, 0)
    }

    /// No-operation command.
    pub fn nop(&mut self) -> Result<()> {
        self.send_command(ad5693::NOP, 0)
    }

    /// Plays a sine wave over `0..=v_ref` at `frequency` Hz for about `duration` seconds.
    ///
    /// Blocks the calling thread; pacing is a plain sleep after each write,
    /// so bus latency and scheduler jitter stretch the real period. See
    /// [`sample_plan`] for how the sample count is derived.
    pub fn generate_sine_wave(&mut self, frequency: f64, duration: f64) -> Result<()> {
        let plan = sample_plan(self.v_ref, duration, frequency)?;
        let delay = plan.delay();
        debug!(
            "AD5693 0x{:02X}: sine {} Hz, {} samples, {:?} per sample",
            self.address, frequency, plan.num_samples, delay
        );
        for voltage in sine_wave_voltages(plan, frequency, self.v_ref) {
            self.set_voltage(voltage)?;
            thread::sleep(delay);
        }
        Ok(())
    }

    fn wire_code(&self, voltage: f64) -> u16 {
        let code = convert_analog_to_digital(voltage, self.v_ref);
        if !(0..=0xFFFF).contains(&code) {
            warn!(
                "AD5693 0x{:02X}: {} V is outside 0..={} V, code {} sent as 0x{:04X}",
                self.address, voltage, self.v_ref, code, code as u16
            );
        }
        code as u16
    }
}

fn check_v_ref(v_ref: f64) -> Result<()> {
    if v_ref.is_finite() && v_ref > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidReferenceVoltage(v_ref))
    }
}
