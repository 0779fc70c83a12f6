//! Two lines of agents acquiring each other across a village.
//!
//! Run with: cargo run --example skirmish_demo
//! Set RUST_LOG=mass_targeting=debug to see per-pass summaries.

use glam::Vec3;
use mass_targeting::{AgentArchetype, DebugShape, Faction, SimWorld, TerrainGrid, TerrainType, UnitClass};
use std::f32::consts::PI;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    println!("=== Mass Targeting - Skirmish Demo ===\n");

    let mut sim = SimWorld::new();
    let debug_rx = sim.enable_debug_draw();
    sim.config_mut().draw_tracked_sounds = true;

    // A wall of houses splits the field
    let mut terrain = TerrainGrid::new(80, 80, 2.0);
    for y in [-14.0, -12.0, 12.0, 14.0] {
        terrain.set_terrain_at(0.0, y, TerrainType::Building);
    }
    // A low rise for the tank to sit on
    terrain.set_height_at(-30.0, 0.0, 2.0);
    sim.set_terrain(terrain);

    let infantry = AgentArchetype::default();
    let armor = AgentArchetype {
        breadth: 1,
        min_caliber: 1.0,
        worker_count: 1,
        draw_search_areas: true,
    };

    for i in 0..8u32 {
        let y = -28.0 + i as f32 * 8.0;
        spawn(&mut sim, i, Faction::Blue, UnitClass::Soldier, Vec3::new(-18.0, y, 0.0), 0.0, &infantry);
        spawn(&mut sim, 100 + i, Faction::Red, UnitClass::Soldier, Vec3::new(18.0, y, 0.0), PI, &infantry);
    }
    let rise = sim.terrain().ground_position(-30.0, 0.0);
    spawn(&mut sim, 50, Faction::Blue, UnitClass::Vehicle, rise, 0.0, &armor);

    // Red mortar fire that nobody can see
    sim.emit_sound(Vec3::new(-10.0, 60.0, 0.0), Faction::Red, 120.0, 3.0);

    println!("Running 2 seconds at 30 Hz...\n");
    let fixed = sim.config().fixed_timestep;
    for _ in 0..60 {
        sim.step(fixed);
        if sim.current_tick() % 15 == 0 {
            print_summary(&mut sim);
        }
    }

    let (areas, sounds) = debug_rx.try_iter().fold((0, 0), |(areas, sounds), shape| match shape {
        DebugShape::SearchArea { .. } => (areas + 1, sounds),
        DebugShape::SoundHeading { .. } => (areas, sounds + 1),
        DebugShape::Searching { .. } => (areas, sounds),
    });
    println!("\nDebug shapes: {areas} search areas, {sounds} sound headings");

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(error) => eprintln!("failed to serialize snapshot: {error}"),
    }
}

fn spawn(
    sim: &mut SimWorld,
    id: u32,
    faction: Faction,
    class: UnitClass,
    position: Vec3,
    heading: f32,
    archetype: &AgentArchetype,
) {
    if let Err(error) = sim.spawn_agent(id, faction, class, position, heading, archetype) {
        eprintln!("agent {id} rejected: {error}");
    }
}

fn print_summary(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();
    let tracking = snapshot.agents.iter().filter(|a| a.target.is_some()).count();
    println!(
        "--- Tick {} (t={:.1}s, phase {}) --- {}/{} agents tracking",
        snapshot.tick,
        snapshot.time,
        snapshot.phase,
        tracking,
        snapshot.agents.len()
    );
    for agent in snapshot.agents.iter().filter(|a| a.target.is_some()) {
        println!(
            "    {:?} {} -> {} (aim +{:.2} m/s, {} cached blockers)",
            agent.faction,
            agent.id,
            agent.target.unwrap_or_default(),
            agent.vertical_aim_offset,
            agent.cached_blockers
        );
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
