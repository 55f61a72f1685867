//! Backend selection: simulated reservoir by default, Raspberry Pi GPIO with
//! the `hardware` feature on Linux.

use foamguard_config::{Config, FoamMode};
use foamguard_core::DynCore;

/// Boxed raw reader for the panel shutdown button.
pub type ButtonReader = Box<dyn FnMut() -> bool + Send>;

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn make_core(cfg: &Config) -> eyre::Result<(DynCore, Option<ButtonReader>)> {
    use foamguard_hardware::{SimFoamKind, SimReservoir};

    /// Starting water level of the simulated reservoir, in percent.
    const SIM_LEVEL_ENV: &str = "FOAMGUARD_SIM_LEVEL";

    let reservoir = SimReservoir::new();
    let level = std::env::var(SIM_LEVEL_ENV)
        .ok()
        .and_then(|s| s.trim().parse::<u8>().ok())
        .unwrap_or(50);
    reservoir.set_level_pct(level);

    let kind = match cfg.sampler.foam_mode {
        FoamMode::Analog => SimFoamKind::Analog {
            adc_max: cfg.sampler.adc_max,
        },
        FoamMode::Digital => SimFoamKind::Digital {
            present_at_pct: cfg.control.threshold_pct,
        },
    };
    tracing::info!(level, ?kind, "using simulated reservoir");

    let core = DynCore::builder()
        .with_switches(reservoir.switches())
        .with_foam_probe(reservoir.foam_probe(kind))
        .with_pump(reservoir.pump())
        .apply_config(cfg)
        .build()?;
    Ok((core, None))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn make_core(cfg: &Config) -> eyre::Result<(DynCore, Option<ButtonReader>)> {
    use eyre::WrapErr;
    use foamguard_hardware::gpio::{
        GpioFoamSwitch, GpioLevelSwitches, GpioPump, MCP3008_MAX, Mcp3008Foam, make_button_reader,
    };

    let pins = &cfg.pins;
    let switches = GpioLevelSwitches::new(
        pins.level_low,
        pins.level_mid,
        pins.level_high,
        pins.active_low,
    )
    .wrap_err("open level switches")?;
    let pump = GpioPump::new(pins.pump).wrap_err("open pump output")?;

    let builder = DynCore::builder()
        .with_switches(switches)
        .with_pump(pump)
        .apply_config(cfg);
    let builder = match cfg.sampler.foam_mode {
        FoamMode::Analog => {
            if cfg.sampler.adc_max > MCP3008_MAX {
                tracing::warn!(
                    adc_max = cfg.sampler.adc_max,
                    mcp3008_max = MCP3008_MAX,
                    "sampler.adc_max exceeds the MCP3008 range; foam percentages will read low"
                );
            }
            builder.with_foam_probe(
                Mcp3008Foam::new(pins.foam_adc_channel).wrap_err("open foam ADC")?,
            )
        }
        FoamMode::Digital => builder.with_foam_probe(
            GpioFoamSwitch::new(pins.foam, pins.active_low).wrap_err("open foam switch")?,
        ),
    };
    let core = builder.build()?;

    let button = match pins.shutdown_button {
        Some(pin) => Some(make_button_reader(pin, pins.active_low).wrap_err("open shutdown button")?),
        None => None,
    };
    Ok((core, button))
}
