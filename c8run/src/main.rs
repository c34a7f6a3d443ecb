//! Desktop runner: SDL2 window, keyboard mapping and beeper around the
//! `chip8` interpreter core.

extern crate chip8;
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
extern crate sdl2;

mod beep;

use std::fs::File;
use std::io;
use std::path::Path;
use std::process::exit;
use std::{thread, time};

use chip8::{Machine, DISPLAY_HEIGHT, DISPLAY_WIDTH};

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::Color;
use sdl2::rect::Rect;
use sdl2::render::Canvas;
use sdl2::video::Window;

error_chain! {
    links {
        Chip8(chip8::Error, chip8::ErrorKind);
    }
    foreign_links {
        Io(io::Error);
    }
}

struct CommandArgs {
    rom_file_name: String,
    cycles_per_second: u32,
    scale: u32,
}

impl CommandArgs {
    fn parse() -> CommandArgs {
        use clap::{App, Arg};

        let matches = App::new("c8run")
            .about("CHIP-8 interpreter")
            .arg(
                Arg::with_name("ROM_FILE")
                    .help("rom file to load")
                    .required(true),
            )
            .arg(
                Arg::with_name("cycles per second")
                    .short("c")
                    .long("cycles-per-sec")
                    .value_name("cycles_per_second")
                    .help(
                        "How many interpreter ticks should be executed per second. \
                         Values between 500-1000 should be fine.",
                    )
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("scale")
                    .short("s")
                    .long("scale")
                    .value_name("scale")
                    .help("Window pixels per framebuffer pixel")
                    .takes_value(true),
            )
            .get_matches();

        let cycles_per_second = matches
            .value_of("cycles per second")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(500);

        let scale = matches
            .value_of("scale")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        CommandArgs {
            rom_file_name: matches.value_of("ROM_FILE").unwrap().to_string(),
            cycles_per_second: cycles_per_second,
            scale: scale,
        }
    }
}

fn read_rom<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    use std::io::Read;

    let mut rom_file = File::open(path)?;
    let mut rom_buffer = Vec::new();
    rom_file.read_to_end(&mut rom_buffer)?;
    Ok(rom_buffer)
}

fn main() {
    env_logger::init();

    match do_run() {
        Ok(_) => exit(0),
        Err(e) => {
            eprintln!("error: {}", e);
            for cause in e.iter().skip(1) {
                eprintln!("caused by: {}", cause);
            }
            exit(1);
        }
    }
}

fn do_run() -> Result<()> {
    let args = CommandArgs::parse();

    let rom_data = read_rom(&args.rom_file_name)?;
    let mut machine = Machine::new();
    machine.load(&rom_data)?;
    info!(
        "loaded {} ({} bytes)",
        args.rom_file_name,
        rom_data.len()
    );

    let app = App {
        machine: machine,
        cycles_per_second: args.cycles_per_second,
        scale: args.scale,
        passed_dt: 0.0,
    };
    app.run()
}

struct App {
    machine: Machine,
    cycles_per_second: u32,
    scale: u32,
    passed_dt: f64,
}

impl App {
    fn run(mut self) -> Result<()> {
        let ctx = sdl2::init().map_err(Error::from)?;
        let video_ctx = ctx.video().map_err(Error::from)?;
        let window = video_ctx
            .window(
                "c8run",
                DISPLAY_WIDTH as u32 * self.scale,
                DISPLAY_HEIGHT as u32 * self.scale,
            )
            .position_centered()
            .opengl()
            .build()
            .map_err(|e| Error::from(e.to_string()))?;
        let mut canvas = window
            .into_canvas()
            .build()
            .map_err(|e| Error::from(e.to_string()))?;

        let mut events = ctx.event_pump().map_err(Error::from)?;
        let mut timer = ctx.timer().map_err(Error::from)?;
        let audio = ctx.audio().map_err(Error::from)?;
        let mut beeper = beep::Beeper::new(&audio)?;

        let frame_interval = time::Duration::from_millis(16);
        let mut last_ticks = timer.ticks();

        'main: loop {
            let frame_start = time::Instant::now();

            for event in events.poll_iter() {
                match event {
                    Event::Quit { .. }
                    | Event::KeyDown {
                        keycode: Some(Keycode::Escape),
                        ..
                    } => break 'main,

                    Event::KeyDown {
                        keycode: Some(keycode),
                        ..
                    } => {
                        if let Some(key) = map_keycode(keycode) {
                            self.machine.keypress(key, true);
                        }
                    }
                    Event::KeyUp {
                        keycode: Some(keycode),
                        ..
                    } => {
                        if let Some(key) = map_keycode(keycode) {
                            self.machine.keypress(key, false);
                        }
                    }
                    _ => {}
                }
            }

            let current_ticks = timer.ticks();
            let dt = (current_ticks - last_ticks) as f64 / 1000.0;
            last_ticks = current_ticks;

            self.update(dt)?;
            self.render(&mut canvas);
            beeper.set_beeping(self.machine.is_beeping());

            if let Some(delay) = frame_interval.checked_sub(frame_start.elapsed()) {
                thread::sleep(delay);
            }
        }

        Ok(())
    }

    /// Runs the ticks that `dt` seconds of wall time are worth and feeds
    /// the 60Hz timer cadence from the same clock.
    fn update(&mut self, dt: f64) -> Result<()> {
        const TIMER_TICK_DURATION: f64 = 1.0 / 60.0;

        let cycles_to_perform = (dt * self.cycles_per_second as f64).floor() as usize;
        if cycles_to_perform == 0 {
            return Ok(());
        }
        let dt_per_cycle = dt / cycles_to_perform as f64;

        for _ in 0..cycles_to_perform {
            self.machine.tick()?;

            self.passed_dt += dt_per_cycle;
            while self.passed_dt > TIMER_TICK_DURATION {
                self.machine.tick_timers();
                self.passed_dt -= TIMER_TICK_DURATION;
            }
        }

        Ok(())
    }

    fn render(&self, canvas: &mut Canvas<Window>) {
        canvas.set_draw_color(Color::RGB(12, 18, 12));
        canvas.clear();

        canvas.set_draw_color(Color::RGB(140, 230, 160));
        let framebuffer = self.machine.framebuffer();
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                if framebuffer.get(x, y) {
                    let rect = Rect::new(
                        x as i32 * self.scale as i32,
                        y as i32 * self.scale as i32,
                        self.scale,
                        self.scale,
                    );
                    let _ = canvas.fill_rect(rect);
                }
            }
        }

        canvas.present();
    }
}

fn map_keycode(k: Keycode) -> Option<usize> {
    // Classical layout, see http://devernay.free.fr/hacks/chip8/C8TECH10.HTM#2.3
    // +---+---+---+---+
    // | 1 | 2 | 3 | C |
    // +---+---+---+---+
    // | 4 | 5 | 6 | D |
    // +---+---+---+---+
    // | 7 | 8 | 9 | E |
    // +---+---+---+---+
    // | A | 0 | B | F |
    // +---+---+---+---+

    match k {
        Keycode::Num1 => Some(0x1),
        Keycode::Num2 => Some(0x2),
        Keycode::Num3 => Some(0x3),
        Keycode::Num4 => Some(0xC),

        Keycode::Q => Some(0x4),
        Keycode::W => Some(0x5),
        Keycode::E => Some(0x6),
        Keycode::R => Some(0xD),

        Keycode::A => Some(0x7),
        Keycode::S => Some(0x8),
        Keycode::D => Some(0x9),
        Keycode::F => Some(0xE),

        Keycode::Z => Some(0xA),
        Keycode::X => Some(0x0),
        Keycode::C => Some(0xB),
        Keycode::V => Some(0xF),
        _ => None,
    }
}
