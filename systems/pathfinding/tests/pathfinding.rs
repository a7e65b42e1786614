use std::time::Duration;

use jinri_core::{
    ColliderId, ColliderView, Command, Event, Facing, Grid, MapLayout, MonsterId, MonsterSnapshot,
    MonsterView, PlayerSnapshot, TileCoord,
};
use jinri_system_pathfinding::{Config, Pathfinding};
use jinri_world::{self as world, query, World};

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn frame(world: &mut World, pathfinding: &mut Pathfinding, millis: u64) -> Vec<Event> {
    let mut events = run(
        world,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
    );

    let mut commands = Vec::new();
    pathfinding.handle(
        &events,
        &query::player(world),
        &query::monster_view(world),
        &query::collider_view(world),
        query::grid(world),
        query::tile_length(world),
        &mut commands,
    );
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn setup(layout: MapLayout, player: TileCoord, monsters: &[TileCoord]) -> World {
    let mut world = World::new();
    let _ = run(&mut world, Command::LoadMap { layout });
    let _ = run(&mut world, Command::SpawnPlayer { tile: player });
    for &tile in monsters {
        let _ = run(&mut world, Command::SpawnMonster { tile });
    }
    world
}

#[test]
fn first_frame_plans_a_path_toward_the_player() {
    let mut world = setup(
        MapLayout::new(10, 10, 32.0),
        TileCoord::new(5, 5),
        &[TileCoord::new(1, 1)],
    );
    let mut pathfinding = Pathfinding::new(Config::default());

    let events = frame(&mut world, &mut pathfinding, 16);

    assert!(events.contains(&Event::MonsterPathAssigned {
        monster: MonsterId::new(0),
        goal: TileCoord::new(5, 5),
        length: 7,
    }));
}

#[test]
fn monster_walks_around_a_wall_and_stops_next_to_the_player() {
    let mut layout = MapLayout::new(12, 12, 32.0);
    for row in 0..10 {
        layout.push_terrain(TileCoord::new(5, row));
    }
    let player = TileCoord::new(9, 2);
    let mut world = setup(layout, player, &[TileCoord::new(2, 2)]);
    let mut pathfinding = Pathfinding::new(Config::default());

    for _ in 0..400 {
        let _ = frame(&mut world, &mut pathfinding, 50);
    }

    let view = query::monster_view(&world);
    let Some(monster) = view.get(MonsterId::new(0)) else {
        panic!("monster missing from view");
    };
    assert_eq!(monster.anchor.manhattan_distance(player), 1);
    assert!(monster.path.is_empty());
}

#[test]
fn monsters_outside_sensing_range_stay_put() {
    let mut world = setup(
        MapLayout::new(40, 4, 32.0),
        TileCoord::new(1, 1),
        &[TileCoord::new(30, 1)],
    );
    let mut pathfinding = Pathfinding::new(Config::default());

    for _ in 0..20 {
        let events = frame(&mut world, &mut pathfinding, 16);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::MonsterPathAssigned { .. })));
    }
}

#[test]
fn second_monster_routes_around_the_first_plan() {
    let mut world = setup(
        MapLayout::new(10, 10, 32.0),
        TileCoord::new(8, 1),
        &[TileCoord::new(1, 1), TileCoord::new(1, 2)],
    );
    let mut pathfinding = Pathfinding::new(Config::default());

    let _ = frame(&mut world, &mut pathfinding, 16);

    let view = query::monster_view(&world);
    let paths: Vec<Vec<TileCoord>> = view.iter().map(|monster| monster.path.clone()).collect();
    assert_eq!(paths.len(), 2);
    assert!(!paths[0].is_empty());
    assert!(!paths[1].is_empty());
    assert!(paths[1].iter().all(|tile| !paths[0].contains(tile)));
}

const TILE: f32 = 32.0;

fn player_on(tile: TileCoord) -> PlayerSnapshot {
    let position = tile.to_world(TILE);
    PlayerSnapshot {
        position,
        target: position,
        target_tile: tile,
        facing: Facing::default(),
        walking_x: false,
        walking_y: false,
        health: 100,
        spawned: true,
    }
}

fn monster_on(id: u32, tile: TileCoord, path: Vec<TileCoord>) -> MonsterSnapshot {
    MonsterSnapshot {
        id: MonsterId::new(id),
        position: tile.to_tile_units(),
        anchor: tile,
        health: 100,
        alive: true,
        goal: path.last().copied(),
        path,
        projectile_live: false,
        collider: ColliderId::new(id),
    }
}

fn time_advanced() -> Event {
    Event::TimeAdvanced {
        dt: Duration::from_millis(16),
    }
}

fn plan(
    pathfinding: &mut Pathfinding,
    events: &[Event],
    player: &PlayerSnapshot,
    monsters: &MonsterView,
) -> Vec<(MonsterId, TileCoord)> {
    let mut commands = Vec::new();
    pathfinding.handle(
        events,
        player,
        monsters,
        &ColliderView::default(),
        Grid::new(64, 64),
        TILE,
        &mut commands,
    );
    commands
        .into_iter()
        .filter_map(|command| match command {
            Command::SetMonsterPath { monster, goal, .. } => Some((monster, goal)),
            _ => None,
        })
        .collect()
}

#[test]
fn idle_monster_wanders_when_the_player_stands_still() {
    let player = player_on(TileCoord::new(24, 24));
    let anchor = TileCoord::new(10, 10);
    let monsters = MonsterView::from_snapshots(vec![monster_on(0, anchor, Vec::new())]);
    let mut pathfinding = Pathfinding::new(Config::default());

    let chase = plan(&mut pathfinding, &[time_advanced()], &player, &monsters);
    assert_eq!(chase, vec![(MonsterId::new(0), TileCoord::new(24, 24))]);

    for _ in 0..20 {
        let wander = plan(&mut pathfinding, &[time_advanced()], &player, &monsters);

        assert_eq!(wander.len(), 1);
        let (monster, goal) = wander[0];
        assert_eq!(monster, MonsterId::new(0));
        assert_ne!(goal, anchor);
        assert_ne!(goal, TileCoord::new(24, 24));
        assert!(goal.column().abs_diff(anchor.column()) <= 10);
        assert!(goal.row().abs_diff(anchor.row()) <= 10);
    }
}

#[test]
fn monsters_lined_up_with_the_player_do_not_wander() {
    let player = player_on(TileCoord::new(20, 10));
    let monsters =
        MonsterView::from_snapshots(vec![monster_on(0, TileCoord::new(10, 10), Vec::new())]);
    let mut pathfinding = Pathfinding::new(Config::default());
    let _ = plan(&mut pathfinding, &[time_advanced()], &player, &monsters);

    assert!(plan(&mut pathfinding, &[time_advanced()], &player, &monsters).is_empty());
}

#[test]
fn collided_monsters_replan_toward_the_player() {
    let player_tile = TileCoord::new(20, 20);
    let player = player_on(player_tile);
    let busy_path = vec![TileCoord::new(11, 10), TileCoord::new(12, 10)];
    let monsters = MonsterView::from_snapshots(vec![
        monster_on(0, TileCoord::new(10, 10), busy_path.clone()),
        monster_on(1, TileCoord::new(10, 12), busy_path.clone()),
        monster_on(2, TileCoord::new(14, 14), busy_path),
    ]);
    let mut pathfinding = Pathfinding::new(Config::default());
    let _ = plan(&mut pathfinding, &[time_advanced()], &player, &monsters);
    assert!(plan(&mut pathfinding, &[time_advanced()], &player, &monsters).is_empty());

    let collided = Event::MonstersCollided {
        first: MonsterId::new(1),
        second: MonsterId::new(0),
    };
    let replanned = plan(&mut pathfinding, &[collided], &player, &monsters);

    assert_eq!(
        replanned,
        vec![
            (MonsterId::new(0), player_tile),
            (MonsterId::new(1), player_tile),
        ]
    );
}

#[test]
fn map_reload_forgets_the_last_seen_player_tile() {
    let player = player_on(TileCoord::new(20, 20));
    let monsters = MonsterView::from_snapshots(vec![monster_on(
        0,
        TileCoord::new(10, 10),
        vec![TileCoord::new(11, 10)],
    )]);
    let mut pathfinding = Pathfinding::new(Config::default());
    let _ = plan(&mut pathfinding, &[time_advanced()], &player, &monsters);
    assert!(plan(&mut pathfinding, &[time_advanced()], &player, &monsters).is_empty());

    let loaded = Event::MapLoaded {
        columns: 64,
        rows: 64,
    };
    assert!(plan(&mut pathfinding, &[loaded], &player, &monsters).is_empty());

    assert_eq!(
        plan(&mut pathfinding, &[time_advanced()], &player, &monsters),
        vec![(MonsterId::new(0), TileCoord::new(20, 20))]
    );
}
