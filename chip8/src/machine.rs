use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use rand::{Rng, ThreadRng};

use display::Framebuffer;
use instruction::{AluOp, Instruction, Reg, Word};
use regfile::RegFile;
use stack::Stack;
use timer::Timer;
use {ErrorKind, Result, MEMORY_SIZE, PROGRAM_START};

const NUM_KEYS: usize = 16;
const FONT_OFFSET: u16 = 0x000;
const GLYPH_SIZE: u16 = 5;

/// The whole interpreter state: memory with the font preloaded, register
/// file, call stack, timers, keypad state and the framebuffer.
///
/// The host drives it by calling [`tick`] several times per rendered
/// frame, [`tick_timers`] once per frame at a fixed cadence, and
/// [`keypress`] whenever its input state changes. Each machine is an
/// independent value; nothing is shared between instances.
///
/// [`tick`]: #method.tick
/// [`tick_timers`]: #method.tick_timers
/// [`keypress`]: #method.keypress
pub struct Machine<R: Rng = ThreadRng> {
    memory: [u8; MEMORY_SIZE],
    gpr: RegFile,
    stack: Stack,
    pc: u16,
    index: u16,
    delay: Timer,
    sound: Timer,
    framebuffer: Framebuffer,
    keys: [bool; NUM_KEYS],
    rng: R,
}

impl Machine {
    /// A machine with an OS-seeded random source. Use [`with_rng`] when
    /// the `Cxnn` instruction has to be reproducible.
    ///
    /// [`with_rng`]: #method.with_rng
    pub fn new() -> Machine {
        Machine::with_rng(::rand::thread_rng())
    }
}

impl<R: Rng> Machine<R> {
    pub fn with_rng(rng: R) -> Machine<R> {
        let mut machine = Machine {
            memory: [0; MEMORY_SIZE],
            gpr: RegFile::new(),
            stack: Stack::new(),
            pc: PROGRAM_START,
            index: 0,
            delay: Timer::new(),
            sound: Timer::new(),
            framebuffer: Framebuffer::new(),
            keys: [false; NUM_KEYS],
            rng: rng,
        };
        machine.load_font();
        machine
    }

    /// Reinitializes everything except the random source: memory is
    /// cleared and the font reloaded, registers, stack, timers, keys and
    /// the framebuffer are zeroed, and execution restarts at `0x200`.
    pub fn reset(&mut self) {
        self.memory = [0; MEMORY_SIZE];
        self.load_font();
        self.gpr.reset();
        self.stack.reset();
        self.pc = PROGRAM_START;
        self.index = 0;
        self.delay.reset();
        self.sound.reset();
        self.framebuffer.clear();
        self.keys = [false; NUM_KEYS];
    }

    fn load_font(&mut self) {
        let start = FONT_OFFSET as usize;
        self.memory[start..start + FONT_SPRITES.len()].copy_from_slice(&FONT_SPRITES);
    }

    /// Copies a program into memory starting at `0x200`. May be called
    /// again after [`reset`] to install a different ROM.
    ///
    /// [`reset`]: #method.reset
    pub fn load(&mut self, rom: &[u8]) -> Result<()> {
        let start = PROGRAM_START as usize;
        if rom.len() > MEMORY_SIZE - start {
            bail!(ErrorKind::RomTooLarge(rom.len()));
        }
        self.memory[start..start + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    /// One fetch-decode-execute step. An error ends the session; the
    /// machine is left as the failing instruction found it.
    pub fn tick(&mut self) -> Result<()> {
        let word = self.fetch()?;
        let instruction = match Instruction::decode(word) {
            Some(instruction) => instruction,
            None => bail!(ErrorKind::UnknownOpcode(self.pc, word.0)),
        };
        trace!("{:03X}: {:?}", self.pc, instruction);

        let next_pc = self.execute(instruction)?;
        self.pc = next_pc;

        Ok(())
    }

    fn fetch(&self) -> Result<Word> {
        let pc = self.pc as usize;
        if pc + 1 >= MEMORY_SIZE {
            bail!(ErrorKind::OutOfBounds(self.pc));
        }
        Ok(Word(BigEndian::read_u16(&self.memory[pc..])))
    }

    /// Counts both timers down by one. The host calls this at its frame
    /// cadence; instruction execution never touches the timers' decay.
    pub fn tick_timers(&mut self) {
        self.delay.tick();
        self.sound.tick();
    }

    /// Records a key state change. `key` is the keypad index, `0x0` to
    /// `0xF`.
    pub fn keypress(&mut self, key: usize, pressed: bool) {
        self.keys[key] = pressed;
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn is_beeping(&self) -> bool {
        self.sound.get() != 0
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn register(&self, index: usize) -> u8 {
        self.gpr.read_at(index)
    }

    /// Runs one instruction and returns the program counter to resume
    /// at. Straight-line instructions get the default `pc + 2`; jumps,
    /// calls, skips and the key wait compute their own.
    fn execute(&mut self, instruction: Instruction) -> Result<u16> {
        use instruction::Instruction::*;

        let mut next_pc = self.pc + 2;

        match instruction {
            Nop => {}
            ClearScreen => self.framebuffer.clear(),
            Return => {
                let call_site = match self.stack.pop() {
                    Some(addr) => addr,
                    None => bail!(ErrorKind::StackUnderflow(self.pc)),
                };
                next_pc = call_site + 2;
            }
            Jump(addr) => {
                next_pc = addr;
            }
            Call(addr) => {
                // The address of the call instruction itself goes on the
                // stack; Return resumes past it.
                if !self.stack.push(self.pc) {
                    bail!(ErrorKind::StackOverflow(self.pc));
                }
                next_pc = addr;
            }
            SkipEqImm { vx, imm, inv } => {
                if (self.gpr[vx] == imm) != inv {
                    next_pc += 2;
                }
            }
            SkipEqReg { vx, vy, inv } => {
                if (self.gpr[vx] == self.gpr[vy]) != inv {
                    next_pc += 2;
                }
            }
            SetImm { vx, imm } => {
                self.gpr[vx] = imm;
            }
            AddImm { vx, imm } => {
                let x = self.gpr[vx];
                self.gpr[vx] = x.wrapping_add(imm);
            }
            Alu { vx, vy, op } => self.alu(vx, vy, op),
            SetIndex(addr) => {
                self.index = addr;
            }
            JumpV0(addr) => {
                next_pc = addr.wrapping_add(self.gpr.read_at(0) as u16);
            }
            Random { vx, mask } => {
                let byte = self.rng.gen::<u8>();
                self.gpr[vx] = byte & mask;
            }
            Draw { vx, vy, rows } => {
                let x = self.gpr[vx] as usize;
                let y = self.gpr[vy] as usize;
                let from = self.index as usize;
                let to = from + rows as usize;
                if to > MEMORY_SIZE {
                    bail!(ErrorKind::OutOfBounds(self.index));
                }

                let collision = self.framebuffer.draw(x, y, &self.memory[from..to]);
                self.gpr.set_flag(collision);
            }
            SkipKey { vx, inv } => {
                let key = (self.gpr[vx] & 0x0F) as usize;
                if self.keys[key] != inv {
                    next_pc += 2;
                }
            }
            ReadDelay(vx) => {
                self.gpr[vx] = self.delay.get();
            }
            WaitKey(vx) => {
                match self.keys.iter().position(|&pressed| pressed) {
                    Some(key) => self.gpr[vx] = key as u8,
                    // Nothing is down: re-execute this instruction on the
                    // next tick. The host keeps servicing input between
                    // ticks, so this is a cooperative busy-wait.
                    None => next_pc = self.pc,
                }
            }
            SetDelay(vx) => {
                let v = self.gpr[vx];
                self.delay.set(v);
            }
            SetSound(vx) => {
                let v = self.gpr[vx];
                self.sound.set(v);
            }
            AddIndex(vx) => {
                let v = self.gpr[vx] as u16;
                self.index = self.index.wrapping_add(v);
            }
            LoadGlyph(vx) => {
                let glyph = (self.gpr[vx] & 0x0F) as u16;
                self.index = FONT_OFFSET + glyph * GLYPH_SIZE;
            }
            StoreBcd(vx) => {
                let v = self.gpr[vx];
                let i = self.index_span(2)?;
                self.memory[i] = v / 100;
                self.memory[i + 1] = (v / 10) % 10;
                self.memory[i + 2] = v % 10;
            }
            StoreRegs(vx) => {
                let last = vx.index();
                let i = self.index_span(last)?;
                for offset in 0..last + 1 {
                    self.memory[i + offset] = self.gpr.read_at(offset);
                }
            }
            LoadRegs(vx) => {
                let last = vx.index();
                let i = self.index_span(last)?;
                for offset in 0..last + 1 {
                    self.gpr.write_at(offset, self.memory[i + offset]);
                }
            }
        }

        Ok(next_pc)
    }

    // Bounds check for accesses touching `I..=I+extent`.
    fn index_span(&self, extent: usize) -> Result<usize> {
        let i = self.index as usize;
        if i + extent >= MEMORY_SIZE {
            bail!(ErrorKind::OutOfBounds(self.index));
        }
        Ok(i)
    }

    fn alu(&mut self, vx: Reg, vy: Reg, op: AluOp) {
        let x = self.gpr[vx];
        let y = self.gpr[vy];

        match op {
            AluOp::Assign => {
                self.gpr[vx] = y;
            }
            AluOp::Or => {
                self.gpr[vx] = x | y;
            }
            AluOp::And => {
                self.gpr[vx] = x & y;
            }
            AluOp::Xor => {
                self.gpr[vx] = x ^ y;
            }
            AluOp::Add => {
                let (v, carry) = x.overflowing_add(y);
                self.gpr[vx] = v;
                self.gpr.set_flag(carry);
            }
            AluOp::Sub => {
                let (v, borrow) = x.overflowing_sub(y);
                self.gpr[vx] = v;
                self.gpr.set_flag(!borrow);
            }
            AluOp::ShiftRight => {
                self.gpr[vx] = x >> 1;
                self.gpr.set_flag(x & 0x01 != 0);
            }
            AluOp::SubRev => {
                let (v, borrow) = y.overflowing_sub(x);
                self.gpr[vx] = v;
                self.gpr.set_flag(!borrow);
            }
            AluOp::ShiftLeft => {
                self.gpr[vx] = x << 1;
                self.gpr.set_flag(x & 0x80 != 0);
            }
        }
    }
}

impl<R: Rng> fmt::Debug for Machine<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Machine")
            .field("gpr", &self.gpr)
            .field("pc", &format!("{:04x}", self.pc))
            .field("i", &format!("{:04x}", self.index))
            .field("dt", &format!("{:02x}", self.delay.get()))
            .field("st", &format!("{:02x}", self.sound.get()))
            .field("stack", &self.stack)
            .finish()
    }
}

#[cfg_attr(rustfmt, rustfmt_skip)]
const FONT_SPRITES: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
