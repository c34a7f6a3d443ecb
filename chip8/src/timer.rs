/// An 8-bit countdown timer. The machine holds two of these (delay and
/// sound); the host drives them at its own fixed cadence, conventionally
/// 60Hz, independent of the instruction rate.
pub struct Timer {
    left: u8,
}

impl Timer {
    pub fn new() -> Timer {
        Timer { left: 0 }
    }

    pub fn reset(&mut self) {
        self.left = 0;
    }

    /// Counts down by one, holding at zero.
    pub fn tick(&mut self) {
        self.left = self.left.saturating_sub(1);
    }

    pub fn get(&self) -> u8 {
        self.left
    }

    pub fn set(&mut self, ticks: u8) {
        self.left = ticks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_zero_and_stays() {
        let mut timer = Timer::new();
        timer.set(2);
        timer.tick();
        assert_eq!(timer.get(), 1);
        timer.tick();
        assert_eq!(timer.get(), 0);
        timer.tick();
        assert_eq!(timer.get(), 0);
    }
}
