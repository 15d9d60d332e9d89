#![deny(warnings)]

//! Turn engine for Starhold.
//!
//! [`execute_turn`] resolves one turn of the simulation: it screens the
//! submitted intentions, runs the phase resolvers (exploration, combat,
//! economy) against the pre-turn snapshot, applies the accumulated deltas
//! in a single pass, and advances the turn counter. The input state is
//! never mutated; callers receive a fresh snapshot plus the full delta
//! and log trail of the turn.
//!
//! Every phase reads the same pre-turn snapshot. Deltas from different
//! phases never see each other's effects; conflicts between phases are
//! settled purely by delta application order, which matches emission
//! order (exploration, combat, economy).

mod applier;
mod combat;
mod exploration;
mod validate;

use chrono::Utc;
use sim_core::{Delta, GameState, InstanceStatus, Intention, LogEntry, Phase};
use thiserror::Error;
use tracing::debug;

pub use applier::apply;

/// Fatal failures of turn resolution.
///
/// Per-intention problems are never fatal; they surface as log entries.
/// These errors abort the turn with no next state: the precondition
/// variant for a non-active instance, the rest for deltas referencing
/// ids absent from state at application time (an upstream data bug).
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// The instance is not accepting turns.
    #[error("turn resolution requires an active instance (status: {0})")]
    InstanceNotActive(InstanceStatus),
    /// A delta referenced a faction absent from state.
    #[error("delta references unknown faction {0}")]
    UnknownFaction(String),
    /// A delta referenced a system absent from state.
    #[error("delta references unknown system {0}")]
    UnknownSystem(String),
    /// A delta referenced a fleet absent from state.
    #[error("delta references unknown fleet {0}")]
    UnknownFleet(String),
    /// A resource delta targeted a faction with no ledger.
    #[error("faction {0} has no resource ledger")]
    MissingResourceLedger(String),
}

/// Everything one resolved turn produces.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    /// All deltas applied, in application order.
    pub deltas: Vec<Delta>,
    /// Full log trail in phase order.
    pub logs: Vec<LogEntry>,
    /// The authoritative new snapshot.
    pub next_state: GameState,
}

/// Resolve one turn of `state` against the submitted `intentions`.
///
/// The input state is read-only; the returned [`TurnOutcome::next_state`]
/// is an independent snapshot with `current_turn` advanced by one and
/// `last_turn_at` refreshed.
pub fn execute_turn(
    state: &GameState,
    intentions: &[Intention],
) -> Result<TurnOutcome, EngineError> {
    if state.instance.status != InstanceStatus::Active {
        return Err(EngineError::InstanceNotActive(state.instance.status));
    }
    let turn = state.instance.current_turn;

    let (surviving, mut logs) = validate::screen(state, intentions);
    debug!(turn, submitted = intentions.len(), surviving = surviving.len(), "intentions screened");

    // The surviving set is echoed onto the working snapshot so resolvers
    // (and the audit trail) read it from state. Nothing else differs from
    // the input snapshot until application.
    let mut working = state.clone();
    working.intentions = surviving;

    let mut deltas = Vec::new();

    let (d, l) = exploration::resolve(&working);
    debug!(turn, deltas = d.len(), "exploration resolved");
    deltas.extend(d);
    logs.extend(l);

    let (d, l) = combat::resolve(&working);
    debug!(turn, deltas = d.len(), "combat resolved");
    deltas.extend(d);
    logs.extend(l);

    let d = sim_econ::compute(&working);
    debug!(turn, deltas = d.len(), "economy resolved");
    logs.push(LogEntry::public(
        turn,
        Phase::Economy,
        format!("Economy produced {} deltas", d.len()),
    ));
    deltas.extend(d);

    let mut next_state = applier::apply(&working, &deltas)?;
    next_state.instance.current_turn = turn + 1;
    next_state.instance.last_turn_at = Utc::now();
    logs.push(LogEntry::public(
        turn,
        Phase::Closure,
        format!("Turn {turn} resolved"),
    ));

    Ok(TurnOutcome {
        deltas,
        logs,
        next_state,
    })
}

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::{DateTime, TimeZone, Utc};
    use sim_core::{
        Faction, FactionKind, FactionResources, FactionStatus, Fleet, FleetStatus, GameState,
        Instance, InstanceStatus, Position, StarSystem, RESOURCE_METAL,
    };
    use std::collections::BTreeMap;

    pub fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    pub fn faction(id: &str) -> Faction {
        Faction {
            faction_id: id.into(),
            kind: FactionKind::Human,
            status: FactionStatus::Active,
            player_id: None,
            controlled_systems: vec![],
            created_at: ts(),
        }
    }

    pub fn system(id: &str, owner: Option<&str>) -> StarSystem {
        StarSystem {
            system_id: id.into(),
            owner_faction_id: owner.map(Into::into),
            position: Position { x: 0, y: 0 },
            structures: vec![],
            connected_systems: vec![],
        }
    }

    pub fn fleet(id: &str, owner: &str, at: &str, strength: i64) -> Fleet {
        Fleet {
            fleet_id: id.into(),
            owner_faction_id: owner.into(),
            location_system_id: at.into(),
            strength,
            status: FleetStatus::Idle,
        }
    }

    pub fn ledger(faction: &str, metal: i64) -> FactionResources {
        FactionResources {
            faction_id: faction.into(),
            resources: BTreeMap::from([(RESOURCE_METAL.to_string(), metal)]),
        }
    }

    /// Two factions, two owned home systems, one neutral frontier system,
    /// one idle fleet each.
    pub fn two_faction_state() -> GameState {
        let mut f1 = faction("f1");
        f1.controlled_systems = vec!["s1".into()];
        let mut f2 = faction("f2");
        f2.controlled_systems = vec!["s2".into()];
        GameState {
            instance: Instance {
                instance_id: "instance-1".into(),
                status: InstanceStatus::Active,
                current_turn: 1,
                max_turns: 80,
                seed: 123,
                created_at: ts(),
                last_turn_at: ts(),
            },
            factions: vec![f1, f2],
            systems: vec![
                system("s1", Some("f1")),
                system("s2", Some("f2")),
                system("s3", None),
            ],
            resources: vec![ledger("f1", 6), ledger("f2", 6)],
            fleets: vec![
                fleet("fleet-1", "f1", "s1", 10),
                fleet("fleet-2", "f2", "s2", 10),
            ],
            intentions: vec![],
            logs: vec![],
        }
    }
}
