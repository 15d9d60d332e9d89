#![deny(warnings)]

//! Headless CLI: builds a starter galaxy, scripts a few turns of
//! intentions and prints the audit trail. Stands in for the UI layer.

use anyhow::Result;
use chrono::Utc;
use sim_core::*;
use sim_engine::execute_turn;
use std::collections::BTreeMap;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

fn parse_args() -> Option<u32> {
    let mut turns: Option<u32> = None;
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--turns" => turns = it.next().and_then(|s| s.parse().ok()),
            _ => {}
        }
    }
    turns
}

fn starter_state() -> GameState {
    let now = Utc::now();
    let faction = |id: &str, home: &str| Faction {
        faction_id: id.to_string(),
        kind: FactionKind::Human,
        status: FactionStatus::Active,
        player_id: None,
        controlled_systems: vec![home.to_string()],
        created_at: now,
    };
    let system = |id: &str, owner: Option<&str>, x: i32, y: i32| StarSystem {
        system_id: id.to_string(),
        owner_faction_id: owner.map(String::from),
        position: Position { x, y },
        structures: vec![],
        connected_systems: vec![],
    };
    let ledger = |id: &str| FactionResources {
        faction_id: id.to_string(),
        resources: BTreeMap::from([
            (RESOURCE_METAL.to_string(), 5),
            (RESOURCE_ENERGY.to_string(), 5),
            (RESOURCE_CREDITS.to_string(), 100),
        ]),
    };
    GameState {
        instance: Instance {
            instance_id: "instance-1".into(),
            status: InstanceStatus::Active,
            current_turn: 1,
            max_turns: 80,
            seed: 123,
            created_at: now,
            last_turn_at: now,
        },
        factions: vec![faction("f1", "s1"), faction("f2", "s2")],
        systems: vec![
            system("s1", Some("f1"), 0, 0),
            system("s2", Some("f2"), 4, 0),
            system("s3", None, 2, 1),
            system("s4", None, 2, -1),
        ],
        resources: vec![ledger("f1"), ledger("f2")],
        fleets: vec![
            Fleet {
                fleet_id: "fleet-1".into(),
                owner_faction_id: "f1".into(),
                location_system_id: "s1".into(),
                strength: 10,
                status: FleetStatus::Idle,
            },
            Fleet {
                fleet_id: "fleet-2".into(),
                owner_faction_id: "f2".into(),
                location_system_id: "s2".into(),
                strength: 10,
                status: FleetStatus::Idle,
            },
        ],
        intentions: vec![],
        logs: vec![],
    }
}

/// Pick f1's next move: claim a neutral system while any remain, then
/// build mines once metal allows.
fn next_intention(state: &GameState) -> Option<Intention> {
    let turn = state.instance.current_turn;
    if let Some(neutral) = state.systems.iter().find(|s| s.owner_faction_id.is_none()) {
        return Some(Intention {
            turn,
            faction_id: "f1".into(),
            action: Action::ExploreSystem {
                fleet_id: Some("fleet-1".into()),
                target_system_id: neutral.system_id.clone(),
            },
        });
    }
    let metal = state
        .resources
        .iter()
        .find(|r| r.faction_id == "f1")
        .map(|r| r.balance(RESOURCE_METAL))?;
    if metal >= sim_econ::MINE_COST_METAL {
        let home = state
            .systems
            .iter()
            .find(|s| s.owner_faction_id.as_deref() == Some("f1"))?;
        return Some(Intention {
            turn,
            faction_id: "f1".into(),
            action: Action::BuildMine {
                system_id: home.system_id.clone(),
            },
        });
    }
    None
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let turns = parse_args().unwrap_or(5);
    info!(turns, "starting CLI");

    let mut state = starter_state();
    validate_state(&state)?;

    for _ in 0..turns {
        let intentions: Vec<Intention> = next_intention(&state).into_iter().collect();
        let outcome = execute_turn(&state, &intentions)?;
        for log in &outcome.logs {
            match log.visibility {
                LogVisibility::Public => {
                    info!(turn = log.turn, phase = ?log.phase, "{}", log.message);
                }
                LogVisibility::Faction => {
                    warn!(
                        turn = log.turn,
                        phase = ?log.phase,
                        faction = log.faction_id.as_deref().unwrap_or("?"),
                        "{}",
                        log.message
                    );
                }
            }
        }
        state = outcome.next_state;
    }

    let f1_metal = state
        .resources
        .iter()
        .find(|r| r.faction_id == "f1")
        .map(|r| r.balance(RESOURCE_METAL))
        .unwrap_or(0);
    println!(
        "Galaxy OK | turn: {} | factions: {} | systems: {} | f1 metal: {}",
        state.instance.current_turn,
        state.factions.len(),
        state.systems.len(),
        f1_metal
    );
    println!("{}", serde_json::to_string_pretty(&state.instance)?);
    Ok(())
}
