//! Raspberry Pi GPIO backends (`rppal`).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pendant_traits::{ChipSelectBus, EnableLine, HwResult, Panel, PanelLevels};
use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

/// Selector switches wired to pulled-up inputs.
pub struct GpioPanel {
    axis: [InputPin; 3],
    speed: [InputPin; 3],
    adaptive: InputPin,
    active_low: bool,
}

impl GpioPanel {
    pub fn new(
        gpio: &Gpio,
        axis: [u8; 3],
        speed: [u8; 3],
        adaptive: u8,
        active_low: bool,
    ) -> Result<Self> {
        let input = |pin: u8| -> Result<InputPin> { Ok(gpio.get(pin)?.into_input_pullup()) };
        Ok(Self {
            axis: [input(axis[0])?, input(axis[1])?, input(axis[2])?],
            speed: [input(speed[0])?, input(speed[1])?, input(speed[2])?],
            adaptive: input(adaptive)?,
            active_low,
        })
    }

    #[inline]
    fn asserted(&self, pin: &InputPin) -> bool {
        pin.is_low() == self.active_low
    }
}

impl Panel for GpioPanel {
    fn sample(&mut self) -> HwResult<PanelLevels> {
        Ok(PanelLevels {
            axis: [
                self.asserted(&self.axis[0]),
                self.asserted(&self.axis[1]),
                self.asserted(&self.axis[2]),
            ],
            speed: [
                self.asserted(&self.speed[0]),
                self.asserted(&self.speed[1]),
                self.asserted(&self.speed[2]),
            ],
            adaptive: self.asserted(&self.adaptive),
        })
    }
}

/// Bit-banged SPI mode 0, MSB first, one chip-select per potentiometer.
pub struct BitBangBus {
    sck: OutputPin,
    mosi: OutputPin,
    cs: [OutputPin; 3],
}

impl BitBangBus {
    pub fn new(gpio: &Gpio, sck: u8, mosi: u8, cs: [u8; 3]) -> Result<Self> {
        // chip-selects idle high, clock idles low
        let cs_pin = |pin: u8| -> Result<OutputPin> { Ok(gpio.get(pin)?.into_output_high()) };
        Ok(Self {
            sck: gpio.get(sck)?.into_output_low(),
            mosi: gpio.get(mosi)?.into_output_low(),
            cs: [cs_pin(cs[0])?, cs_pin(cs[1])?, cs_pin(cs[2])?],
        })
    }

    fn cs(&mut self, device: usize) -> Result<&mut OutputPin> {
        self.cs
            .get_mut(device)
            .ok_or_else(|| HwError::Bus(format!("no chip-select for device {device}")))
    }
}

#[inline(always)]
fn half_clock() {
    // MCP4151 takes 10 MHz; GPIO writes are slower than that already.
    std::hint::spin_loop();
}

impl ChipSelectBus for BitBangBus {
    fn select(&mut self, device: usize) -> HwResult<()> {
        self.sck.set_low();
        self.cs(device)?.set_low();
        Ok(())
    }

    fn shift_out(&mut self, byte: u8) -> HwResult<()> {
        for bit in (0..8).rev() {
            self.mosi.write(if byte & (1 << bit) != 0 {
                Level::High
            } else {
                Level::Low
            });
            half_clock();
            self.sck.set_high();
            half_clock();
            self.sck.set_low();
        }
        trace!(byte, "spi byte");
        Ok(())
    }

    fn deselect(&mut self, device: usize) -> HwResult<()> {
        self.cs(device)?.set_high();
        Ok(())
    }
}

/// Joystick enable output.
pub struct GpioEnableLine {
    pin: OutputPin,
    active_high: bool,
}

impl GpioEnableLine {
    /// Opens the pin deasserted.
    pub fn new(gpio: &Gpio, pin: u8, active_high: bool) -> Result<Self> {
        let pin = gpio.get(pin)?;
        let pin = if active_high {
            pin.into_output_low()
        } else {
            pin.into_output_high()
        };
        Ok(Self { pin, active_high })
    }
}

impl EnableLine for GpioEnableLine {
    fn set_enabled(&mut self, enabled: bool) -> HwResult<()> {
        if enabled == self.active_high {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

/// Jogwheel phase inputs with edge interrupts on both lines.
///
/// Each line's interrupt thread records its new level and hands the pair
/// of current levels to the sink. The sink runs on an interrupt thread and
/// must not block.
pub struct Jogwheel {
    a: InputPin,
    b: InputPin,
    levels: Arc<[AtomicBool; 2]>,
}

impl Jogwheel {
    pub fn new(gpio: &Gpio, a: u8, b: u8) -> Result<Self> {
        let a = gpio.get(a)?.into_input_pullup();
        let b = gpio.get(b)?.into_input_pullup();
        let levels = Arc::new([AtomicBool::new(a.is_high()), AtomicBool::new(b.is_high())]);
        Ok(Self { a, b, levels })
    }

    /// Line levels (A, B) sampled at open time.
    pub fn initial_levels(&self) -> (bool, bool) {
        (
            self.levels[0].load(Ordering::Acquire),
            self.levels[1].load(Ordering::Acquire),
        )
    }

    /// Install both-edge interrupts forwarding `(a, b)` to `sink`.
    pub fn start<F>(&mut self, sink: F) -> Result<()>
    where
        F: Fn(bool, bool) + Send + Sync + 'static,
    {
        let sink = Arc::new(sink);

        let levels = Arc::clone(&self.levels);
        let on_a = Arc::clone(&sink);
        self.a
            .set_async_interrupt(Trigger::Both, move |level: Level| {
                let a = level == Level::High;
                levels[0].store(a, Ordering::Release);
                on_a(a, levels[1].load(Ordering::Acquire));
            })?;

        let levels = Arc::clone(&self.levels);
        let on_b = sink;
        self.b
            .set_async_interrupt(Trigger::Both, move |level: Level| {
                let b = level == Level::High;
                levels[1].store(b, Ordering::Release);
                on_b(levels[0].load(Ordering::Acquire), b);
            })?;

        debug!("jogwheel interrupts armed");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.a.clear_async_interrupt()?;
        self.b.clear_async_interrupt()?;
        Ok(())
    }
}

impl Drop for Jogwheel {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
