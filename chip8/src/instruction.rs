//! Instruction words and their decoding.
//!
//! A CHIP-8 instruction is a 16-bit big-endian word. Decoding looks at its
//! four 4-bit digits: the first selects the instruction family, the rest
//! carry operands (`x`, `y`, `n`) or merge into wider immediates (`nn`,
//! `nnn`).

use std::fmt;

use enum_primitive::FromPrimitive;

/// A raw, not yet decoded 16-bit instruction word.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Word(pub u16);

impl Word {
    /// Low 12 bits, an absolute address operand.
    pub fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }

    /// Low byte, an immediate operand.
    pub fn nn(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// Lowest digit, a 4-bit immediate.
    pub fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// Second digit as a register id.
    pub fn x(self) -> Reg {
        Reg(((self.0 >> 8) & 0xF) as u8)
    }

    /// Third digit as a register id.
    pub fn y(self) -> Reg {
        Reg(((self.0 >> 4) & 0xF) as u8)
    }

    fn digits(self) -> (u8, u8, u8, u8) {
        (
            ((self.0 >> 12) & 0xF) as u8,
            ((self.0 >> 8) & 0xF) as u8,
            ((self.0 >> 4) & 0xF) as u8,
            (self.0 & 0xF) as u8,
        )
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Word({:04X})", self.0)
    }
}

/// Id of one of the general registers V0-VF. Only ever constructed from a
/// 4-bit digit, so it is always a valid index.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Reg(u8);

impl Reg {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Reg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "V{:X}", self.0)
    }
}

enum_from_primitive! {
    /// Function selected by the last digit of an `8xyN` instruction.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub enum AluOp {
        Assign = 0x0,
        Or = 0x1,
        And = 0x2,
        Xor = 0x3,
        Add = 0x4,
        Sub = 0x5,
        ShiftRight = 0x6,
        SubRev = 0x7,
        ShiftLeft = 0xE,
    }
}

/// A decoded instruction, ready for execution.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// The all-zero word. Does nothing but advance the program counter.
    Nop,
    ClearScreen,
    Return,
    Jump(u16),
    Call(u16),
    /// `3xnn` / `4xnn`, `inv` distinguishing not-equal from equal.
    SkipEqImm { vx: Reg, imm: u8, inv: bool },
    /// `5xy0` / `9xy0`.
    SkipEqReg { vx: Reg, vy: Reg, inv: bool },
    SetImm { vx: Reg, imm: u8 },
    /// Wrapping add of an immediate, no flag.
    AddImm { vx: Reg, imm: u8 },
    Alu { vx: Reg, vy: Reg, op: AluOp },
    SetIndex(u16),
    JumpV0(u16),
    Random { vx: Reg, mask: u8 },
    Draw { vx: Reg, vy: Reg, rows: u8 },
    /// `Ex9E` / `ExA1`.
    SkipKey { vx: Reg, inv: bool },
    ReadDelay(Reg),
    WaitKey(Reg),
    SetDelay(Reg),
    SetSound(Reg),
    AddIndex(Reg),
    LoadGlyph(Reg),
    StoreBcd(Reg),
    StoreRegs(Reg),
    LoadRegs(Reg),
}

impl Instruction {
    /// Decodes a fetched word. `None` means the word matches no base-set
    /// pattern; the machine reports that as an `UnknownOpcode` error.
    pub fn decode(word: Word) -> Option<Instruction> {
        use self::Instruction::*;

        let insn = match word.digits() {
            (0x0, 0x0, 0x0, 0x0) => Nop,
            (0x0, 0x0, 0xE, 0x0) => ClearScreen,
            (0x0, 0x0, 0xE, 0xE) => Return,
            (0x1, ..) => Jump(word.nnn()),
            (0x2, ..) => Call(word.nnn()),
            (0x3, ..) => SkipEqImm {
                vx: word.x(),
                imm: word.nn(),
                inv: false,
            },
            (0x4, ..) => SkipEqImm {
                vx: word.x(),
                imm: word.nn(),
                inv: true,
            },
            (0x5, _, _, 0x0) => SkipEqReg {
                vx: word.x(),
                vy: word.y(),
                inv: false,
            },
            (0x6, ..) => SetImm {
                vx: word.x(),
                imm: word.nn(),
            },
            (0x7, ..) => AddImm {
                vx: word.x(),
                imm: word.nn(),
            },
            (0x8, _, _, f) => Alu {
                vx: word.x(),
                vy: word.y(),
                op: AluOp::from_u8(f)?,
            },
            (0x9, _, _, 0x0) => SkipEqReg {
                vx: word.x(),
                vy: word.y(),
                inv: true,
            },
            (0xA, ..) => SetIndex(word.nnn()),
            (0xB, ..) => JumpV0(word.nnn()),
            (0xC, ..) => Random {
                vx: word.x(),
                mask: word.nn(),
            },
            (0xD, ..) => Draw {
                vx: word.x(),
                vy: word.y(),
                rows: word.n(),
            },
            (0xE, _, 0x9, 0xE) => SkipKey {
                vx: word.x(),
                inv: false,
            },
            (0xE, _, 0xA, 0x1) => SkipKey {
                vx: word.x(),
                inv: true,
            },
            (0xF, _, 0x0, 0x7) => ReadDelay(word.x()),
            (0xF, _, 0x0, 0xA) => WaitKey(word.x()),
            (0xF, _, 0x1, 0x5) => SetDelay(word.x()),
            (0xF, _, 0x1, 0x8) => SetSound(word.x()),
            (0xF, _, 0x1, 0xE) => AddIndex(word.x()),
            (0xF, _, 0x2, 0x9) => LoadGlyph(word.x()),
            (0xF, _, 0x3, 0x3) => StoreBcd(word.x()),
            (0xF, _, 0x5, 0x5) => StoreRegs(word.x()),
            (0xF, _, 0x6, 0x5) => LoadRegs(word.x()),
            _ => return None,
        };

        Some(insn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_fields() {
        let word = Word(0xD125);
        assert_eq!(word.nnn(), 0x125);
        assert_eq!(word.nn(), 0x25);
        assert_eq!(word.n(), 0x5);
        assert_eq!(word.x().index(), 0x1);
        assert_eq!(word.y().index(), 0x2);
    }

    #[test]
    fn decodes_families() {
        assert_eq!(Instruction::decode(Word(0x0000)), Some(Instruction::Nop));
        assert_eq!(
            Instruction::decode(Word(0x00E0)),
            Some(Instruction::ClearScreen)
        );
        assert_eq!(
            Instruction::decode(Word(0x00EE)),
            Some(Instruction::Return)
        );
        assert_eq!(
            Instruction::decode(Word(0x1ABC)),
            Some(Instruction::Jump(0xABC))
        );
        assert_eq!(
            Instruction::decode(Word(0x8124)),
            Some(Instruction::Alu {
                vx: Word(0x8124).x(),
                vy: Word(0x8124).y(),
                op: AluOp::Add,
            })
        );
        assert_eq!(
            Instruction::decode(Word(0xF21E)),
            Some(Instruction::AddIndex(Word(0xF21E).x()))
        );
    }

    #[test]
    fn rejects_unknown_patterns() {
        // SYS (0nnn) is not part of the base set.
        assert_eq!(Instruction::decode(Word(0x0123)), None);
        // 8xy8 is not a valid ALU function.
        assert_eq!(Instruction::decode(Word(0x8128)), None);
        assert_eq!(Instruction::decode(Word(0x5121)), None);
        assert_eq!(Instruction::decode(Word(0x9121)), None);
        assert_eq!(Instruction::decode(Word(0xE19F)), None);
        assert_eq!(Instruction::decode(Word(0xF1FF)), None);
    }
}
