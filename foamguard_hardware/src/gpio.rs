//! Raspberry Pi adapters (rppal): level switches and digital foam probe on
//! GPIO inputs with pull-ups, analog foam probe through an MCP3008 on SPI0,
//! pump on a GPIO output.
use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

use foamguard_traits::{FoamProbe, FoamRaw, HwResult, LevelSwitches, Pump};

use crate::error::{HwError, Result};

/// Full scale of the MCP3008 (10-bit).
pub const MCP3008_MAX: u16 = 1023;

fn input_pullup(gpio: &Gpio, pin: u8) -> Result<InputPin> {
    Ok(gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("open input pin {pin}: {e}")))?
        .into_input_pullup())
}

#[inline]
fn asserted(pin: &InputPin, active_low: bool) -> bool {
    pin.is_low() == active_low
}

pub struct GpioLevelSwitches {
    pins: [InputPin; 3],
    active_low: bool,
}

impl GpioLevelSwitches {
    pub fn new(low: u8, mid: u8, high: u8, active_low: bool) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(Self {
            pins: [
                input_pullup(&gpio, low)?,
                input_pullup(&gpio, mid)?,
                input_pullup(&gpio, high)?,
            ],
            active_low,
        })
    }
}

impl LevelSwitches for GpioLevelSwitches {
    fn read(&mut self) -> HwResult<[bool; 3]> {
        let [l, m, h] = &self.pins;
        Ok([
            asserted(l, self.active_low),
            asserted(m, self.active_low),
            asserted(h, self.active_low),
        ])
    }
}

pub struct GpioFoamSwitch {
    pin: InputPin,
    active_low: bool,
}

impl GpioFoamSwitch {
    pub fn new(pin: u8, active_low: bool) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(Self {
            pin: input_pullup(&gpio, pin)?,
            active_low,
        })
    }
}

impl FoamProbe for GpioFoamSwitch {
    fn read(&mut self, _timeout: std::time::Duration) -> HwResult<FoamRaw> {
        Ok(FoamRaw::Digital(asserted(&self.pin, self.active_low)))
    }
}

pub struct Mcp3008Foam {
    spi: Spi,
    channel: u8,
}

impl Mcp3008Foam {
    pub fn new(channel: u8) -> Result<Self> {
        if channel > 7 {
            return Err(HwError::Spi(format!("mcp3008 channel {channel} out of range")));
        }
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, 1_000_000, Mode::Mode0)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self { spi, channel })
    }
}

impl FoamProbe for Mcp3008Foam {
    fn read(&mut self, _timeout: std::time::Duration) -> HwResult<FoamRaw> {
        // Start bit, single-ended mode + channel, then clock out 10 bits.
        let tx = [0x01, (0x08 | self.channel) << 4, 0x00];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        let counts = (u16::from(rx[1] & 0x03) << 8) | u16::from(rx[2]);
        tracing::trace!(channel = self.channel, counts, "mcp3008 sample");
        Ok(FoamRaw::Analog(counts))
    }
}

pub struct GpioPump {
    pin: OutputPin,
}

impl GpioPump {
    pub fn new(pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("open pump pin {pin}: {e}")))?
            .into_output_low();
        Ok(Self { pin })
    }
}

impl Pump for GpioPump {
    fn start(&mut self) -> HwResult<()> {
        self.pin.set_high();
        Ok(())
    }

    fn stop(&mut self) -> HwResult<()> {
        self.pin.set_low();
        Ok(())
    }
}

/// Raw "is the shutdown button pressed" reader for the runner's debouncer.
pub fn make_button_reader(pin: u8, active_low: bool) -> Result<Box<dyn FnMut() -> bool + Send>> {
    let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
    let input = input_pullup(&gpio, pin)?;
    Ok(Box::new(move || asserted(&input, active_low)))
}
