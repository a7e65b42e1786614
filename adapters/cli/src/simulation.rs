//! Fixed-order frame loop: controls, tick, pathfinding, combat.

use std::{fmt, time::Duration};

use anyhow::{bail, Result};
use jinri_core::{Command, Event, GameStatus, MapLayout, SimulationConfig};
use jinri_system_combat::{self as combat, MonsterCombat};
use jinri_system_controls::{Controls, FrameInput};
use jinri_system_pathfinding::{self as pathfinding, Pathfinding};
use jinri_system_spawning::{self as spawning, Spawning};
use jinri_world::{self as world, query, World};
use tracing::{debug, info, trace};

/// Seeds for every system that draws random numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationSeeds {
    /// Seed of the spawn placement generator.
    pub spawning: u64,
    /// Seed of the wander-goal generator.
    pub pathfinding: u64,
}

impl SimulationSeeds {
    /// Derives independent per-system seeds from one session seed.
    #[must_use]
    pub const fn from_seed(seed: u64) -> Self {
        Self {
            spawning: seed ^ 0x9e37_79b9_7f4a_7c15,
            pathfinding: seed.wrapping_mul(0xbf58_476d_1ce4_e5b9).wrapping_add(1),
        }
    }
}

/// Summary of a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Outcome {
    /// Frames simulated.
    pub frames: u64,
    /// Whether the player survived.
    pub status: GameStatus,
    /// Player health at the end of the run.
    pub player_health: i32,
    /// Monsters still standing.
    pub monsters_alive: usize,
    /// Terrain tiles destroyed over the run, resets included.
    pub terrain_destroyed: u32,
    /// Monsters defeated over the run, resets included.
    pub monsters_defeated: u32,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames, status {:?}, health {}, {} monsters alive, {} tiles destroyed, {} monsters defeated",
            self.frames,
            self.status,
            self.player_health,
            self.monsters_alive,
            self.terrain_destroyed,
            self.monsters_defeated
        )
    }
}

/// World plus systems, pumped once per frame.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    controls: Controls,
    spawning: Spawning,
    pathfinding: Pathfinding,
    combat: MonsterCombat,
    frame_time: Duration,
    frames: u64,
    terrain_destroyed: u32,
    monsters_defeated: u32,
}

impl Simulation {
    /// Creates a simulation with no map loaded.
    #[must_use]
    pub fn new(
        config: SimulationConfig,
        monster_count: usize,
        seeds: SimulationSeeds,
        frame_time: Duration,
    ) -> Self {
        let pathfinding = Pathfinding::new(pathfinding::Config::new(
            config.sensing_range,
            config.max_path_length,
            seeds.pathfinding,
        ));
        let combat = MonsterCombat::new(combat::Config::new(config.sensing_range));
        Self {
            world: World::with_config(config),
            controls: Controls::new(),
            spawning: Spawning::new(spawning::Config::new(monster_count, seeds.spawning)),
            pathfinding,
            combat,
            frame_time,
            frames: 0,
            terrain_destroyed: 0,
            monsters_defeated: 0,
        }
    }

    /// Installs `layout` and places the player and monsters.
    pub fn load(&mut self, layout: MapLayout) -> Result<Vec<Event>> {
        let mut log = Vec::new();
        let events = self.apply_all(vec![Command::LoadMap { layout }], &mut log);
        if let Some(Event::MapRejected { reason }) = events
            .iter()
            .find(|event| matches!(event, Event::MapRejected { .. }))
        {
            bail!("map rejected: {reason}");
        }

        self.spawn_from(&events, &mut log);
        self.plan_paths(&events, &mut log);
        Ok(log)
    }

    /// Runs one frame and returns every event it produced.
    pub fn step(&mut self, input: &FrameInput) -> Vec<Event> {
        let mut log = Vec::new();

        let mut commands = Vec::new();
        self.controls
            .handle(input, query::debug_overlay(&self.world), &mut commands);
        let events = self.apply_all(commands, &mut log);
        self.spawn_from(&events, &mut log);

        let events = self.apply_all(
            vec![Command::Tick {
                dt: self.frame_time,
            }],
            &mut log,
        );

        self.plan_paths(&events, &mut log);

        let mut commands = Vec::new();
        self.combat.handle(
            &events,
            &query::player(&self.world),
            &query::monster_view(&self.world),
            query::tile_length(&self.world),
            &mut commands,
        );
        let _ = self.apply_all(commands, &mut log);

        self.frames = self.frames.saturating_add(1);
        log
    }

    /// Read-only access to the simulated world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Summary of the run so far.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        let player = query::player(&self.world);
        Outcome {
            frames: self.frames,
            status: query::status(&self.world),
            player_health: player.health,
            monsters_alive: query::monster_view(&self.world)
                .iter()
                .filter(|monster| monster.alive)
                .count(),
            terrain_destroyed: self.terrain_destroyed,
            monsters_defeated: self.monsters_defeated,
        }
    }

    fn plan_paths(&mut self, events: &[Event], log: &mut Vec<Event>) {
        let mut commands = Vec::new();
        self.pathfinding.handle(
            events,
            &query::player(&self.world),
            &query::monster_view(&self.world),
            &query::collider_view(&self.world),
            query::grid(&self.world),
            query::tile_length(&self.world),
            &mut commands,
        );
        let _ = self.apply_all(commands, log);
    }

    fn spawn_from(&mut self, events: &[Event], log: &mut Vec<Event>) {
        let mut commands = Vec::new();
        self.spawning.handle(
            events,
            query::grid(&self.world),
            &query::collider_view(&self.world),
            query::tile_length(&self.world),
            &mut commands,
        );
        let _ = self.apply_all(commands, log);
    }

    /// Applies `commands` in order, appending their events to `log`.
    ///
    /// Returns only the events these commands produced.
    fn apply_all(&mut self, commands: Vec<Command>, log: &mut Vec<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        for command in commands {
            trace!(?command, "apply");
            world::apply(&mut self.world, command, &mut events);
        }

        for event in &events {
            match event {
                Event::TerrainDestroyed { tile, .. } => {
                    self.terrain_destroyed += 1;
                    debug!(?tile, "terrain destroyed");
                }
                Event::MonsterDefeated { monster } => {
                    self.monsters_defeated += 1;
                    debug!(monster = monster.get(), "monster defeated");
                }
                Event::PlayerDefeated => info!(frame = self.frames, "player defeated"),
                _ => {}
            }
        }

        log.extend(events.iter().cloned());
        events
    }
}
