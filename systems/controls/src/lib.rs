#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that translates per-frame input into world commands.

use jinri_core::{Command, Direction};

/// Input sampled once per frame by the host.
///
/// Directional flags are true while the key is pressed or held. The remaining
/// flags are edges and are only true on the frame the key went down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    /// Left.
    pub west: bool,
    /// Down.
    pub south: bool,
    /// Up.
    pub north: bool,
    /// Right.
    pub east: bool,
    /// Fire the player projectile.
    pub fire: bool,
    /// Flip the debug overlay.
    pub toggle_debug: bool,
    /// Respawn the player on a fresh tile.
    pub respawn: bool,
    /// Restore destroyed terrain and monster health.
    pub reset: bool,
}

impl FrameInput {
    /// Direction requested this frame, resolved in the order west, south,
    /// north, east when several keys are held.
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        [
            (self.west, Direction::West),
            (self.south, Direction::South),
            (self.north, Direction::North),
            (self.east, Direction::East),
        ]
        .into_iter()
        .find_map(|(held, direction)| held.then_some(direction))
    }
}

/// Controls system that emits movement, fire and debug commands.
#[derive(Debug, Default)]
pub struct Controls;

impl Controls {
    /// Creates a new controls system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Emits the commands requested by `input`.
    ///
    /// `debug_overlay` is the overlay state currently reported by the world.
    pub fn handle(&self, input: &FrameInput, debug_overlay: bool, out: &mut Vec<Command>) {
        if input.toggle_debug {
            out.push(Command::SetDebugOverlay {
                enabled: !debug_overlay,
            });
        }

        if input.respawn {
            out.push(Command::RequestPlayerRespawn);
        }

        if input.reset {
            out.push(Command::ResetDestruction);
        }

        if let Some(direction) = input.direction() {
            out.push(Command::MovePlayer { direction });
        }

        if input.fire {
            out.push(Command::FirePlayerProjectile);
        }
    }
}
