use sdl2;
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

const TONE_HZ: f32 = 440.0;

struct SquareWave {
    phase_inc: f32,
    phase: f32,
    volume: f32,
}

impl AudioCallback for SquareWave {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = if self.phase <= 0.5 {
                self.volume
            } else {
                -self.volume
            };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}

/// Square-wave beeper driven by the machine's sound timer. The device
/// starts paused; `set_beeping` toggles playback on state changes only.
pub struct Beeper {
    device: AudioDevice<SquareWave>,
    beeping: bool,
}

impl Beeper {
    pub fn new(audio: &sdl2::AudioSubsystem) -> ::Result<Beeper> {
        let desired = AudioSpecDesired {
            freq: Some(44_100),
            channels: Some(1),
            samples: None,
        };

        let device = audio
            .open_playback(None, &desired, |spec| SquareWave {
                phase_inc: TONE_HZ / spec.freq as f32,
                phase: 0.0,
                volume: 0.25,
            })
            .map_err(::Error::from)?;

        Ok(Beeper {
            device: device,
            beeping: false,
        })
    }

    pub fn set_beeping(&mut self, beeping: bool) {
        if self.beeping != beeping {
            self.beeping = beeping;
            if beeping {
                self.device.resume();
            } else {
                self.device.pause();
            }
        }
    }
}
