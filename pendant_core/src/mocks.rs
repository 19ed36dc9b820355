//! Helper backends for pendant_core

use pendant_traits::{EnableLine, HwResult, Panel, PanelLevels};

/// Enable output for pendants wired without one; accepts every level.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEnableLine;

impl EnableLine for NoopEnableLine {
    fn set_enabled(&mut self, _enabled: bool) -> HwResult<()> {
        Ok(())
    }
}

/// Panel frozen at one set of levels.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedPanel(pub PanelLevels);

impl Panel for FixedPanel {
    fn sample(&mut self) -> HwResult<PanelLevels> {
        Ok(self.0)
    }
}
