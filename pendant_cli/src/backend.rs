//! Hardware assembly: GPIO devices with the `hardware` feature, simulated otherwise.

use pendant_core::{Pendant, PendantConfig};

/// An assembled controller plus whatever keeps its inputs alive.
pub struct Backend {
    pub pendant: Pendant,
    pub name: &'static str,
    #[cfg(feature = "hardware")]
    _jogwheel: pendant_hardware::Jogwheel,
}

#[cfg(feature = "hardware")]
pub fn open(cfg: &pendant_config::Config, core: PendantConfig) -> eyre::Result<Backend> {
    use eyre::WrapErr;
    use pendant_hardware::{BitBangBus, GpioEnableLine, GpioPanel, Jogwheel, open_gpio};

    let pins = &cfg.pins;
    let gpio = open_gpio().wrap_err("open gpio controller")?;
    let panel = GpioPanel::new(
        &gpio,
        [pins.axis_x, pins.axis_y, pins.axis_z],
        [pins.speed_x1, pins.speed_x10, pins.speed_x100],
        pins.adaptive,
        cfg.selector.active_low,
    )
    .wrap_err("open gpio pins for selector switches")?;
    let bus = BitBangBus::new(&gpio, pins.sck, pins.mosi, [pins.cs_x, pins.cs_y, pins.cs_z])
        .wrap_err("open gpio pins for potentiometer bus")?;
    let enable =
        GpioEnableLine::new(&gpio, pins.enable_out, true).wrap_err("open gpio enable output")?;

    let mut pendant = Pendant::builder()
        .with_panel(panel)
        .with_bus(bus)
        .with_enable_line(enable)
        .with_config(core)
        .build()?;

    let mut jogwheel =
        Jogwheel::new(&gpio, pins.jog_a, pins.jog_b).wrap_err("open gpio jogwheel inputs")?;
    let (a, b) = jogwheel.initial_levels();
    let decoder = pendant.attach_decoder(a, b);
    jogwheel
        .start(move |a, b| decoder.on_levels(a, b))
        .wrap_err("arm gpio jogwheel interrupts")?;
    tracing::info!(jog_a = pins.jog_a, jog_b = pins.jog_b, "jogwheel armed");

    Ok(Backend {
        pendant,
        name: "gpio",
        _jogwheel: jogwheel,
    })
}

#[cfg(not(feature = "hardware"))]
pub fn open(_cfg: &pendant_config::Config, core: PendantConfig) -> eyre::Result<Backend> {
    use pendant_hardware::{RecordingBus, SimulatedEnableLine, SimulatedPanel};

    let pendant = Pendant::builder()
        .with_panel(SimulatedPanel::default())
        .with_bus(RecordingBus::new())
        .with_enable_line(SimulatedEnableLine::new())
        .with_config(core)
        .build()?;
    tracing::info!("simulated backend (build with --features hardware for GPIO)");
    Ok(Backend {
        pendant,
        name: "simulated",
    })
}
