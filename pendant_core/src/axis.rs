//! Motion axes and the axis-select switch.

use core::fmt;
use core::ops::{Index, IndexMut};

/// One of the three jog axes. The discriminant doubles as the device index
/// on the potentiometer bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(format!("unknown axis '{other}' (expected x, y or z)")),
        }
    }
}

/// Fixed-size per-axis storage indexed by [`Axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisMap<T>(pub [T; 3]);

impl<T> AxisMap<T> {
    pub fn from_fn(mut f: impl FnMut(Axis) -> T) -> Self {
        Self([f(Axis::X), f(Axis::Y), f(Axis::Z)])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, &T)> {
        Axis::ALL.into_iter().zip(self.0.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Axis, &mut T)> {
        Axis::ALL.into_iter().zip(self.0.iter_mut())
    }
}

impl<T> Index<Axis> for AxisMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, axis: Axis) -> &T {
        &self.0[axis.index()]
    }
}

impl<T> IndexMut<Axis> for AxisMap<T> {
    #[inline]
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        &mut self.0[axis.index()]
    }
}

/// Resolves the three axis-select inputs into the active axis.
///
/// Exactly one asserted input selects that axis. None, or more than one,
/// resolves to no axis. Contact bounce is filtered in hardware.
#[derive(Debug, Default, Clone, Copy)]
pub struct AxisSelector;

impl AxisSelector {
    pub fn resolve(levels: &[bool; 3]) -> Option<Axis> {
        let mut selected = None;
        for (axis, asserted) in Axis::ALL.into_iter().zip(levels.iter()) {
            if *asserted {
                if selected.is_some() {
                    return None;
                }
                selected = Some(axis);
            }
        }
        selected
    }
}
