//! Instrument (program) selection with wraparound

use log::info;

/// Highest valid MIDI program number
pub const MAX_PROGRAM: u8 = 127;

/// Cycles through a closed range of program numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentSelector {
    first: u8,
    last: u8,
    current: u8,
}

impl InstrumentSelector {
    /// Create a selector over `first..=last` starting at `initial`.
    ///
    /// Bounds are clamped to the MIDI program range and `initial` is clamped
    /// into the bounds.
    pub fn new(first: u8, last: u8, initial: u8) -> Self {
        let last = last.min(MAX_PROGRAM);
        let first = first.min(last);
        Self {
            first,
            last,
            current: initial.clamp(first, last),
        }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn bounds(&self) -> (u8, u8) {
        (self.first, self.last)
    }

    /// Next instrument, wrapping from the last to the first
    pub fn step_up(&mut self) -> u8 {
        self.current = if self.current >= self.last {
            self.first
        } else {
            self.current + 1
        };
        info!("instrument {}", self.current);
        self.current
    }

    /// Previous instrument, wrapping from the first to the last
    pub fn step_down(&mut self) -> u8 {
        self.current = if self.current <= self.first {
            self.last
        } else {
            self.current - 1
        };
        info!("instrument {}", self.current);
        self.current
    }
}

impl Default for InstrumentSelector {
    fn default() -> Self {
        Self::new(0, MAX_PROGRAM, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_up_and_down() {
        let mut sel = InstrumentSelector::default();
        assert_eq!(sel.step_up(), 1);
        assert_eq!(sel.step_up(), 2);
        assert_eq!(sel.step_down(), 1);
    }

    #[test]
    fn test_wraps_past_maximum() {
        let mut sel = InstrumentSelector::new(0, 127, 127);
        assert_eq!(sel.step_up(), 0);
    }

    #[test]
    fn test_wraps_past_minimum() {
        let mut sel = InstrumentSelector::new(0, 127, 0);
        assert_eq!(sel.step_down(), 127);
    }

    #[test]
    fn test_custom_bank() {
        // Eight-program bank starting at the strings
        let mut sel = InstrumentSelector::new(40, 47, 40);
        assert_eq!(sel.step_down(), 47);
        assert_eq!(sel.step_up(), 40);
        for _ in 0..8 {
            sel.step_up();
        }
        assert_eq!(sel.current(), 40);
    }

    #[test]
    fn test_bounds_are_clamped() {
        let sel = InstrumentSelector::new(10, 200, 5);
        assert_eq!(sel.bounds(), (10, 127));
        assert_eq!(sel.current(), 10);
    }
}
