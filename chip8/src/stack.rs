const MAX_DEPTH: usize = 16;

/// Fixed-depth return-address stack. Overflow and underflow are reported
/// to the caller; the machine surfaces them as fatal errors instead of
/// wrapping around and corrupting unrelated state.
#[derive(Debug)]
pub struct Stack {
    frames: [u16; MAX_DEPTH],
    sp: usize,
}

impl Stack {
    pub fn new() -> Stack {
        Stack {
            frames: [0; MAX_DEPTH],
            sp: 0,
        }
    }

    pub fn reset(&mut self) {
        self.frames = [0; MAX_DEPTH];
        self.sp = 0;
    }

    /// Pushes a return address. Returns `false` when all 16 frames are
    /// already occupied, leaving the stack unchanged.
    pub fn push(&mut self, value: u16) -> bool {
        if self.sp == MAX_DEPTH {
            return false;
        }
        self.frames[self.sp] = value;
        self.sp += 1;
        true
    }

    /// Pops the most recently pushed address, or `None` when empty.
    pub fn pop(&mut self) -> Option<u16> {
        if self.sp == 0 {
            return None;
        }
        self.sp -= 1;
        Some(self.frames[self.sp])
    }

    pub fn depth(&self) -> usize {
        self.sp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_from_empty() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn simple_push_pop() {
        let mut stack = Stack::new();
        assert!(stack.push(128));
        assert_eq!(stack.pop(), Some(128));
    }

    #[test]
    fn lifo_order() {
        let mut stack = Stack::new();
        assert!(stack.push(0x200));
        assert!(stack.push(0x300));
        assert_eq!(stack.pop(), Some(0x300));
        assert_eq!(stack.pop(), Some(0x200));
    }

    #[test]
    fn overflow_at_seventeenth_push() {
        let mut stack = Stack::new();
        for frame in 0..16 {
            assert!(stack.push(frame));
        }
        assert_eq!(stack.depth(), 16);
        assert!(!stack.push(0xDEAD));
        // The failed push must not clobber the topmost frame.
        assert_eq!(stack.pop(), Some(15));
    }
}
