//! Seeded stand-in for a human at the keyboard.

use jinri_system_controls::FrameInput;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Produces plausible frame inputs: keys held for a while, occasional shots.
#[derive(Debug)]
pub struct RandomInput {
    rng: ChaCha8Rng,
    held: FrameInput,
    hold_frames: u32,
}

impl RandomInput {
    /// Creates an input source from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            held: FrameInput::default(),
            hold_frames: 0,
        }
    }

    /// Input for the next frame.
    pub fn next_frame(&mut self) -> FrameInput {
        if self.hold_frames == 0 {
            self.held = FrameInput::default();
            match self.rng.gen_range(0..5) {
                0 => self.held.west = true,
                1 => self.held.south = true,
                2 => self.held.north = true,
                3 => self.held.east = true,
                _ => {}
            }
            self.hold_frames = self.rng.gen_range(10..60);
        }
        self.hold_frames -= 1;

        FrameInput {
            fire: self.rng.gen_bool(0.05),
            reset: self.rng.gen_bool(0.002),
            ..self.held
        }
    }
}
