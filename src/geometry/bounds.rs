use crate::error::{GeokernError, InputError};

/// Marks which ends of a line are bounding.
///
/// `start` refers to the line's first point, `end` to its second.
/// An unbounded end extends to infinity past that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    /// Whether the line stops at its first point.
    pub start: bool,
    /// Whether the line stops at its second point.
    pub end: bool,
}

impl Bounds {
    /// An infinite line.
    pub const LINE: Self = Self::new(false, false);

    /// A ray starting at the first point and passing through the second.
    pub const RAY: Self = Self::new(true, false);

    /// A segment between the two points.
    pub const SEGMENT: Self = Self::new(true, true);

    /// Creates bounds from per-end flags.
    #[must_use]
    pub const fn new(start: bool, end: bool) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn as_line() -> Self {
        Self::LINE
    }

    #[must_use]
    pub const fn as_ray() -> Self {
        Self::RAY
    }

    #[must_use]
    pub const fn as_segment() -> Self {
        Self::SEGMENT
    }

    /// Returns `true` if neither end is bounded.
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        !self.start && !self.end
    }

    /// Returns `true` if both ends are bounded.
    #[must_use]
    pub const fn is_segment(self) -> bool {
        self.start && self.end
    }

    /// Returns `true` if the line parameter `t` lies within these bounds.
    ///
    /// `t = 0` is the first point and `t = 1` the second; `slack` widens
    /// each bounded end.
    #[must_use]
    pub fn admits(self, t: f64, slack: f64) -> bool {
        (!self.start || t >= -slack) && (!self.end || t <= 1.0 + slack)
    }

    /// Clamps a line parameter into these bounds.
    #[must_use]
    pub fn clamp(self, t: f64) -> f64 {
        let t = if self.start { t.max(0.0) } else { t };
        if self.end {
            t.min(1.0)
        } else {
            t
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::LINE
    }
}

/// A single flag applies to both ends: `true` is a segment, `false` a line.
impl From<bool> for Bounds {
    fn from(bounded: bool) -> Self {
        Self::new(bounded, bounded)
    }
}

impl From<[bool; 2]> for Bounds {
    fn from([start, end]: [bool; 2]) -> Self {
        Self::new(start, end)
    }
}

impl TryFrom<&[bool]> for Bounds {
    type Error = GeokernError;

    fn try_from(flags: &[bool]) -> Result<Self, Self::Error> {
        match *flags {
            [both] => Ok(Self::from(both)),
            [start, end] => Ok(Self::new(start, end)),
            _ => Err(InputError::MalformedBounds(flags.len()).into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn named_constants() {
        assert_eq!(Bounds::as_ray(), Bounds::new(true, false));
        assert!(Bounds::as_segment().is_segment());
        assert!(Bounds::as_line().is_unbounded());
        assert_eq!(Bounds::default(), Bounds::LINE);
    }

    #[test]
    fn broadcast_single_flag() {
        assert_eq!(Bounds::from(true), Bounds::SEGMENT);
        assert_eq!(Bounds::from(false), Bounds::LINE);
        assert_eq!(Bounds::from([true, false]), Bounds::RAY);
    }

    #[test]
    fn slice_conversion_checks_length() {
        assert_eq!(Bounds::try_from(&[true][..]).unwrap(), Bounds::SEGMENT);
        assert_eq!(Bounds::try_from(&[false, true][..]).unwrap(), Bounds::new(false, true));
        assert!(Bounds::try_from(&[][..]).is_err());
        assert!(Bounds::try_from(&[true, true, false][..]).is_err());
    }

    #[test]
    fn admits_respects_each_end() {
        assert!(Bounds::LINE.admits(-5.0, 0.0));
        assert!(!Bounds::RAY.admits(-0.1, 0.0));
        assert!(Bounds::RAY.admits(7.0, 0.0));
        assert!(!Bounds::SEGMENT.admits(1.1, 0.0));
        assert!(Bounds::SEGMENT.admits(1.0 + 1e-12, 1e-9));
    }

    #[test]
    fn clamp_matches_bounds() {
        assert!((Bounds::RAY.clamp(-2.0)).abs() < f64::EPSILON);
        assert!((Bounds::RAY.clamp(3.0) - 3.0).abs() < f64::EPSILON);
        assert!((Bounds::SEGMENT.clamp(3.0) - 1.0).abs() < f64::EPSILON);
        assert!((Bounds::new(false, true).clamp(-2.0) + 2.0).abs() < f64::EPSILON);
    }
}
