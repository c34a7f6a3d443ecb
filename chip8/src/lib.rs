//! Interpreter core for the CHIP-8 virtual machine: 4K of memory, sixteen
//! 8-bit registers, a 64x32 monochrome framebuffer and two countdown timers.
//! Host integration (windowing, input, audio, ROM files) lives elsewhere;
//! this crate only executes instructions.

// `error_chain!` can recurse deeply
#![recursion_limit = "1024"]

extern crate byteorder;
#[macro_use]
extern crate enum_primitive;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
extern crate rand;

mod machine;
mod regfile;
mod stack;
mod timer;

pub mod display;
pub mod instruction;

pub use display::{Framebuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use machine::Machine;

/// Size of the addressable memory, `0x000..=0xFFF`.
pub const MEMORY_SIZE: usize = 4096;

/// Address at which programs are installed and execution begins.
pub const PROGRAM_START: u16 = 0x200;

error_chain! {
    errors {
        // The fetched word does not decode to any base-set instruction.
        // Continuing past it would desynchronize interpretation, so the
        // session is over once this is returned.
        UnknownOpcode(addr: u16, word: u16) {
            description("unknown opcode")
            display("unknown opcode {:04X} at {:03X}", word, addr)
        }
        // More than 16 nested calls.
        StackOverflow(addr: u16) {
            description("call stack overflow")
            display("call stack overflow at {:03X}", addr)
        }
        // Return executed with an empty call stack.
        StackUnderflow(addr: u16) {
            description("call stack underflow")
            display("return with empty call stack at {:03X}", addr)
        }
        // A fetch or an `I`-relative access would run past 0xFFF.
        OutOfBounds(addr: u16) {
            description("memory access out of bounds")
            display("memory access out of bounds near {:04X}", addr)
        }
        // The program does not fit between 0x200 and the end of memory.
        RomTooLarge(len: usize) {
            description("rom does not fit in memory")
            display("rom of {} bytes does not fit in memory", len)
        }
    }
}
