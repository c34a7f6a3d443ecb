//! End-to-end runs of small assembled-in-source programs through the
//! public API only.

extern crate chip8;

use chip8::{Machine, DISPLAY_HEIGHT, DISPLAY_WIDTH};

fn boot(rom: &[u8]) -> Machine {
    let mut machine = Machine::new();
    machine.load(rom).unwrap();
    machine
}

/// Runs until the program counter reaches `stop`, with a tick budget so a
/// broken program fails the test instead of hanging it.
fn run_until(machine: &mut Machine, stop: u16, budget: usize) {
    for _ in 0..budget {
        if machine.pc() == stop {
            return;
        }
        machine.tick().unwrap();
    }
    panic!("pc never reached {:03X}, stuck at {:03X}", stop, machine.pc());
}

#[test]
fn counting_loop_with_bcd_result() {
    // Count V0 up to 100, store its decimal digits at 0x300, then read
    // them back into V0..=V2 through Fx65.
    let rom = [
        0x60, 0x00, // 0x200: V0 = 0
        0x70, 0x01, // 0x202: V0 += 1
        0x30, 0x64, // 0x204: skip if V0 == 100
        0x12, 0x02, // 0x206: jump 0x202
        0xA3, 0x00, // 0x208: I = 0x300
        0xF0, 0x33, // 0x20A: BCD of V0
        0xF2, 0x65, // 0x20C: V0..=V2 = digits
    ];
    let mut machine = boot(&rom);
    run_until(&mut machine, 0x20E, 1000);

    assert_eq!(machine.register(0), 1);
    assert_eq!(machine.register(1), 0);
    assert_eq!(machine.register(2), 0);
}

#[test]
fn draws_builtin_glyph_onto_framebuffer() {
    // Put the glyph for "8" at the top-left corner and compare the
    // framebuffer against its bitmap.
    let rom = [
        0x60, 0x08, // V0 = 8
        0xF0, 0x29, // I = glyph address for V0
        0x60, 0x00, // V0 = 0 (x)
        0x61, 0x00, // V1 = 0 (y)
        0xD0, 0x15, // draw 5 rows at (V0, V1)
    ];
    let mut machine = boot(&rom);
    run_until(&mut machine, 0x20A, 10);

    let glyph: [u8; 5] = [0xF0, 0x90, 0xF0, 0x90, 0xF0];
    for (y, row) in glyph.iter().enumerate() {
        for x in 0..8 {
            let expected = row & (0b1000_0000 >> x) != 0;
            assert_eq!(
                machine.framebuffer().get(x, y),
                expected,
                "pixel ({}, {})",
                x,
                y
            );
        }
    }
    assert_eq!(machine.register(0xF), 0);

    // Nothing outside the glyph's 8x5 box is lit.
    let lit = machine
        .framebuffer()
        .as_slice()
        .iter()
        .filter(|&&p| p)
        .count();
    assert_eq!(lit, 16);
    assert_eq!(
        machine.framebuffer().as_slice().len(),
        DISPLAY_WIDTH * DISPLAY_HEIGHT
    );
}

#[test]
fn sprite_draw_reads_memory_at_index() {
    // The 4 program bytes double as sprite data. The fifth row is the
    // zero fill after the ROM.
    let rom = [0xA2, 0x00, 0xD0, 0x05];
    let mut machine = boot(&rom);
    run_until(&mut machine, 0x204, 10);

    let sprite = [0xA2, 0x00, 0xD0, 0x05, 0x00];
    for (y, row) in sprite.iter().enumerate() {
        for x in 0..8 {
            let expected = row & (0b1000_0000 >> x) != 0;
            assert_eq!(
                machine.framebuffer().get(x, y),
                expected,
                "pixel ({}, {})",
                x,
                y
            );
        }
    }
    assert_eq!(machine.register(0xF), 0);
}

#[test]
fn waits_for_key_then_branches_on_it() {
    let rom = [
        0xF0, 0x0A, // 0x200: V0 = wait for key
        0x30, 0x07, // 0x202: skip if V0 == 7
        0x61, 0x01, // 0x204: V1 = 1 (not taken)
        0x62, 0x01, // 0x206: V2 = 1
    ];
    let mut machine = boot(&rom);

    // No key yet: the wait instruction re-executes.
    for _ in 0..5 {
        machine.tick().unwrap();
        assert_eq!(machine.pc(), 0x200);
    }

    machine.keypress(0x7, true);
    run_until(&mut machine, 0x208, 10);
    assert_eq!(machine.register(0), 0x7);
    assert_eq!(machine.register(1), 0);
    assert_eq!(machine.register(2), 1);
}

#[test]
fn subroutines_nest_and_unwind() {
    let rom = [
        0x22, 0x06, // 0x200: call 0x206
        0x60, 0xAA, // 0x202: V0 = 0xAA
        0x12, 0x04, // 0x204: jump self (halt)
        0x22, 0x0C, // 0x206: call 0x20C
        0x71, 0x01, // 0x208: V1 += 1
        0x00, 0xEE, // 0x20A: ret
        0x72, 0x01, // 0x20C: V2 += 1
        0x00, 0xEE, // 0x20E: ret
    ];
    let mut machine = boot(&rom);
    run_until(&mut machine, 0x204, 20);

    assert_eq!(machine.register(0), 0xAA);
    assert_eq!(machine.register(1), 1);
    assert_eq!(machine.register(2), 1);
}

#[test]
fn reset_allows_loading_a_second_rom() {
    let mut machine = boot(&[0x60, 0x11]);
    machine.tick().unwrap();
    assert_eq!(machine.register(0), 0x11);

    machine.reset();
    machine.load(&[0x60, 0x22]).unwrap();
    machine.tick().unwrap();
    assert_eq!(machine.register(0), 0x22);
}
