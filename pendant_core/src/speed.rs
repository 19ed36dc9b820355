//! Speed-mode switch resolution.

use pendant_traits::PanelLevels;

/// Position of the discrete X1/X10/X100 speed switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detent {
    X1,
    X10,
    X100,
}

impl Detent {
    pub const ALL: [Detent; 3] = [Detent::X1, Detent::X10, Detent::X100];
}

/// Speed mode in effect for one control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedMode {
    X1,
    X10,
    X100,
    Adaptive,
    Disabled,
}

impl From<Detent> for SpeedMode {
    fn from(d: Detent) -> Self {
        match d {
            Detent::X1 => SpeedMode::X1,
            Detent::X10 => SpeedMode::X10,
            Detent::X100 => SpeedMode::X100,
        }
    }
}

impl SpeedMode {
    pub fn name(self) -> &'static str {
        match self {
            SpeedMode::X1 => "x1",
            SpeedMode::X10 => "x10",
            SpeedMode::X100 => "x100",
            SpeedMode::Adaptive => "adaptive",
            SpeedMode::Disabled => "disabled",
        }
    }
}

/// Outcome of sampling the speed switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedSelection {
    pub mode: SpeedMode,
    /// The unambiguous detent, if any. Kept separately from `mode` because
    /// it still picks the pulse width class while adaptive mode is on.
    pub detent: Option<Detent>,
    /// Whether the speed switch allows the joystick output to be enabled.
    pub output_enabled: bool,
}

impl SpeedSelection {
    pub const DISABLED: SpeedSelection = SpeedSelection {
        mode: SpeedMode::Disabled,
        detent: None,
        output_enabled: false,
    };
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SpeedModeSelector;

impl SpeedModeSelector {
    /// Resolve the speed inputs.
    ///
    /// - With `speed_switch_enable`, an open or ambiguous detent switch disables
    ///   output entirely, adaptive or not.
    /// - Adaptive enable overrides the detent for pulse magnitude.
    /// - Without adaptive and without a detent there is nothing to size a pulse
    ///   with, so the mode is `Disabled` while the enable output stays on.
    pub fn resolve(levels: &PanelLevels, speed_switch_enable: bool) -> SpeedSelection {
        let detent = single_detent(&levels.speed);
        let output_enabled = !(speed_switch_enable && detent.is_none());
        let mode = if !output_enabled {
            SpeedMode::Disabled
        } else if levels.adaptive {
            SpeedMode::Adaptive
        } else {
            detent.map_or(SpeedMode::Disabled, SpeedMode::from)
        };
        SpeedSelection {
            mode,
            detent,
            output_enabled,
        }
    }
}

fn single_detent(levels: &[bool; 3]) -> Option<Detent> {
    let mut found = None;
    for (detent, asserted) in Detent::ALL.into_iter().zip(levels.iter()) {
        if *asserted {
            if found.is_some() {
                return None;
            }
            found = Some(detent);
        }
    }
    found
}
