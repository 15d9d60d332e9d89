#![deny(warnings)]

//! Core domain models and invariants for Starhold.
//!
//! This crate defines the serializable world state shared across the
//! simulation: the instance header, factions, star systems, resource
//! ledgers, fleets, per-turn intentions and logs, and the `Delta` union
//! through which all state changes flow. Validation helpers guard the
//! cross-reference invariants that the turn engine relies on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// Resource key for metal, the construction currency.
pub const RESOURCE_METAL: &str = "metal";
/// Resource key for energy.
pub const RESOURCE_ENERGY: &str = "energy";
/// Resource key for credits.
pub const RESOURCE_CREDITS: &str = "credits";
/// The only structure kind buildable today.
pub const STRUCTURE_MINE: &str = "mine";

/// Lifecycle status of a game instance. Turns resolve only while `Active`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Accepting and resolving turns.
    Active,
    /// Temporarily halted; turn resolution is refused.
    Paused,
    /// Reached its end; turn resolution is refused.
    Finished,
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InstanceStatus::Active => "active",
            InstanceStatus::Paused => "paused",
            InstanceStatus::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// Header of one game instance: identity, status and turn bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance identifier.
    pub instance_id: String,
    /// Lifecycle status.
    pub status: InstanceStatus,
    /// Turn currently being collected/resolved (1-based).
    pub current_turn: u32,
    /// Upper bound on turns for this instance.
    pub max_turns: u32,
    /// Seed recorded at creation; resolution itself is deterministic.
    pub seed: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last resolved turn.
    pub last_turn_at: DateTime<Utc>,
}

/// Who drives a faction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactionKind {
    /// A human player.
    Human,
    /// A scripted/computer opponent.
    Ai,
}

/// Participation status of a faction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactionStatus {
    /// Playing normally.
    Active,
    /// Not currently submitting intentions.
    Inactive,
    /// Knocked out of the game.
    Eliminated,
}

/// A player faction and the systems it controls.
///
/// `controlled_systems` must always mirror the set of systems whose
/// `owner_faction_id` names this faction; only the delta applier maintains
/// that pairing, and [`validate_state`] checks it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    /// Faction identifier.
    pub faction_id: String,
    /// Human or AI.
    pub kind: FactionKind,
    /// Participation status.
    pub status: FactionStatus,
    /// Backing player account, when human-driven.
    pub player_id: Option<String>,
    /// Ids of systems this faction owns.
    pub controlled_systems: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Map grid position of a star system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

/// A star system on the map. `owner_faction_id = None` means neutral.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarSystem {
    /// System identifier.
    pub system_id: String,
    /// Owning faction, if any.
    pub owner_faction_id: Option<String>,
    /// Map position.
    pub position: Position,
    /// Built structures, e.g. [`STRUCTURE_MINE`].
    pub structures: Vec<String>,
    /// Ids of systems reachable from here.
    pub connected_systems: Vec<String>,
}

/// Per-faction resource ledger: resource key to signed balance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactionResources {
    /// Owning faction.
    pub faction_id: String,
    /// Balances by resource key.
    pub resources: BTreeMap<String, i64>,
}

impl FactionResources {
    /// Balance for `key`, treating an absent entry as zero.
    pub fn balance(&self, key: &str) -> i64 {
        self.resources.get(key).copied().unwrap_or(0)
    }
}

/// Operational status of a fleet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FleetStatus {
    /// Stationed and available.
    Idle,
    /// In transit.
    Moving,
    /// Lost in combat. Destroyed fleets stay in the collection for audit
    /// and are excluded from resolution by this status, not by absence.
    Destroyed,
}

/// A combat fleet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
    /// Fleet identifier.
    pub fleet_id: String,
    /// Owning faction.
    pub owner_faction_id: String,
    /// System the fleet is stationed at.
    pub location_system_id: String,
    /// Combat power.
    pub strength: i64,
    /// Operational status.
    pub status: FleetStatus,
}

/// The action a faction requests for one turn.
///
/// Serialized as `{"type": ..., "payload": {...}}` to match the snapshot
/// document shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Action {
    /// Build a mine on an owned system. Costs metal.
    BuildMine {
        /// Target system.
        system_id: String,
    },
    /// Claim a neutral system.
    ExploreSystem {
        /// Fleet nominally carrying out the survey; not consulted today.
        fleet_id: Option<String>,
        /// System to claim.
        target_system_id: String,
    },
    /// Attack an enemy-held system with a fleet.
    AttackSystem {
        /// Attacking fleet.
        fleet_id: String,
        /// System under attack.
        target_system_id: String,
    },
}

impl Action {
    /// Whether this action counts against the one-major-action-per-turn rule.
    pub fn is_major(&self) -> bool {
        matches!(
            self,
            Action::BuildMine { .. } | Action::ExploreSystem { .. } | Action::AttackSystem { .. }
        )
    }
}

/// A faction's requested action for a specific turn, not yet validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intention {
    /// Turn the intention targets; must match the instance's current turn.
    pub turn: u32,
    /// Submitting faction.
    pub faction_id: String,
    /// Requested action.
    #[serde(flatten)]
    pub action: Action,
}

/// Phase of the turn pipeline a log entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Structural precondition checks.
    Prechecks,
    /// Intention screening.
    Intentions,
    /// Exploration resolution.
    Exploration,
    /// Combat resolution.
    Combat,
    /// Economy resolution.
    Economy,
    /// Turn bookkeeping after application.
    Closure,
}

/// Who may see a log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogVisibility {
    /// Visible to every faction.
    Public,
    /// Visible only to the faction named in the entry.
    Faction,
}

/// One audit entry produced during turn resolution.
///
/// Logs are advisory: they never influence resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Turn the entry belongs to.
    pub turn: u32,
    /// Pipeline phase that produced it.
    pub phase: Phase,
    /// Human-readable message.
    pub message: String,
    /// Visibility scope.
    pub visibility: LogVisibility,
    /// Addressed faction when faction-scoped.
    pub faction_id: Option<String>,
}

impl LogEntry {
    /// Entry visible to all factions.
    pub fn public(turn: u32, phase: Phase, message: impl Into<String>) -> Self {
        Self {
            turn,
            phase,
            message: message.into(),
            visibility: LogVisibility::Public,
            faction_id: None,
        }
    }

    /// Entry scoped to one faction.
    pub fn faction(
        turn: u32,
        phase: Phase,
        message: impl Into<String>,
        faction_id: impl Into<String>,
    ) -> Self {
        Self {
            turn,
            phase,
            message: message.into(),
            visibility: LogVisibility::Faction,
            faction_id: Some(faction_id.into()),
        }
    }
}

/// An atomic, typed state change. Resolvers emit deltas; only the delta
/// applier consumes them. The closed enum makes an unrecognized delta kind
/// unrepresentable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    /// Add `amount` (signed) to one faction's balance of `resource`.
    Resource {
        /// Receiving (or paying) faction.
        faction_id: String,
        /// Resource key, e.g. [`RESOURCE_METAL`].
        resource: String,
        /// Signed amount to add.
        amount: i64,
    },
    /// Append a structure to a system.
    Structure {
        /// Target system.
        system_id: String,
        /// Structure kind, e.g. [`STRUCTURE_MINE`].
        structure: String,
    },
    /// Transfer control of a system.
    Control {
        /// System changing hands.
        system_id: String,
        /// Owner before the transfer; `None` when claiming a neutral system.
        previous_owner: Option<String>,
        /// Owner after the transfer.
        new_owner: String,
    },
    /// Mark a fleet destroyed. The fleet stays in state for audit.
    FleetDestroyed {
        /// The destroyed fleet.
        fleet_id: String,
    },
}

/// Complete world state of one game instance.
///
/// The state is replaced wholesale once per turn by the delta applier;
/// resolvers treat it as read-only. `intentions` holds the surviving
/// intentions of the turn currently being resolved, echoed in by the
/// engine for the resolvers (and audit) to read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Instance header.
    pub instance: Instance,
    /// Participating factions.
    pub factions: Vec<Faction>,
    /// Star systems on the map.
    pub systems: Vec<StarSystem>,
    /// One resource ledger per faction.
    pub resources: Vec<FactionResources>,
    /// All fleets, destroyed ones included.
    pub fleets: Vec<Fleet>,
    /// Surviving intentions of the turn in flight.
    pub intentions: Vec<Intention>,
    /// Log entries retained in state (informational only).
    pub logs: Vec<LogEntry>,
}

/// Id-indexed read view over a [`GameState`].
///
/// Built once per resolution phase so lookups are map hits instead of
/// per-intention scans. Absence of an id is a valid, checked case.
pub struct StateIndex<'a> {
    factions: HashMap<&'a str, &'a Faction>,
    systems: HashMap<&'a str, &'a StarSystem>,
    fleets: HashMap<&'a str, &'a Fleet>,
    resources: HashMap<&'a str, &'a FactionResources>,
}

impl<'a> StateIndex<'a> {
    /// Index every collection of `state` by id.
    pub fn new(state: &'a GameState) -> Self {
        Self {
            factions: state
                .factions
                .iter()
                .map(|f| (f.faction_id.as_str(), f))
                .collect(),
            systems: state
                .systems
                .iter()
                .map(|s| (s.system_id.as_str(), s))
                .collect(),
            fleets: state
                .fleets
                .iter()
                .map(|f| (f.fleet_id.as_str(), f))
                .collect(),
            resources: state
                .resources
                .iter()
                .map(|r| (r.faction_id.as_str(), r))
                .collect(),
        }
    }

    /// Faction by id.
    pub fn faction(&self, id: &str) -> Option<&'a Faction> {
        self.factions.get(id).copied()
    }

    /// System by id.
    pub fn system(&self, id: &str) -> Option<&'a StarSystem> {
        self.systems.get(id).copied()
    }

    /// Fleet by id.
    pub fn fleet(&self, id: &str) -> Option<&'a Fleet> {
        self.fleets.get(id).copied()
    }

    /// Resource ledger by faction id.
    pub fn faction_resources(&self, faction_id: &str) -> Option<&'a FactionResources> {
        self.resources.get(faction_id).copied()
    }
}

/// Violations of the cross-reference invariants in [`GameState`].
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    /// Two entities share an id within one collection.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    /// A system names an owner that does not exist.
    #[error("system {system} is owned by unknown faction {faction}")]
    DanglingOwner {
        /// Offending system.
        system: String,
        /// Missing faction.
        faction: String,
    },
    /// A faction claims a system that does not exist.
    #[error("faction {faction} claims unknown system {system}")]
    DanglingControl {
        /// Offending faction.
        faction: String,
        /// Missing system.
        system: String,
    },
    /// `owner_faction_id` and `controlled_systems` disagree.
    #[error("ownership records for system {system} and faction {faction} disagree")]
    ControlMismatch {
        /// System whose records disagree.
        system: String,
        /// Faction whose records disagree.
        faction: String,
    },
    /// A fleet references a faction or system that does not exist.
    #[error("fleet {fleet} references unknown {referent}")]
    DanglingFleetRef {
        /// Offending fleet.
        fleet: String,
        /// Description of the missing referent.
        referent: String,
    },
    /// A resource ledger belongs to no known faction.
    #[error("resource ledger references unknown faction {0}")]
    OrphanLedger(String),
    /// A faction is missing its resource ledger.
    #[error("faction {0} has no resource ledger")]
    MissingLedger(String),
    /// A system links to a neighbor that does not exist.
    #[error("system {system} connects to unknown system {other}")]
    DanglingLink {
        /// Offending system.
        system: String,
        /// Missing neighbor.
        other: String,
    },
    /// The turn counter ran past the configured maximum.
    #[error("current turn {current} exceeds max turns {max}")]
    TurnOverflow {
        /// Current turn.
        current: u32,
        /// Configured maximum.
        max: u32,
    },
}

/// Validate every cross-reference invariant of `state`, including the
/// bidirectional ownership pairing between systems and factions.
pub fn validate_state(state: &GameState) -> Result<(), StateError> {
    let mut faction_ids: BTreeSet<&str> = BTreeSet::new();
    for f in &state.factions {
        if !faction_ids.insert(&f.faction_id) {
            return Err(StateError::DuplicateId(f.faction_id.clone()));
        }
    }
    let mut system_ids: BTreeSet<&str> = BTreeSet::new();
    for s in &state.systems {
        if !system_ids.insert(&s.system_id) {
            return Err(StateError::DuplicateId(s.system_id.clone()));
        }
    }
    let mut fleet_ids: BTreeSet<&str> = BTreeSet::new();
    for fl in &state.fleets {
        if !fleet_ids.insert(&fl.fleet_id) {
            return Err(StateError::DuplicateId(fl.fleet_id.clone()));
        }
    }

    for s in &state.systems {
        if let Some(owner) = &s.owner_faction_id {
            let faction = state
                .factions
                .iter()
                .find(|f| &f.faction_id == owner)
                .ok_or_else(|| StateError::DanglingOwner {
                    system: s.system_id.clone(),
                    faction: owner.clone(),
                })?;
            if !faction.controlled_systems.contains(&s.system_id) {
                return Err(StateError::ControlMismatch {
                    system: s.system_id.clone(),
                    faction: owner.clone(),
                });
            }
        }
        for other in &s.connected_systems {
            if !system_ids.contains(other.as_str()) {
                return Err(StateError::DanglingLink {
                    system: s.system_id.clone(),
                    other: other.clone(),
                });
            }
        }
    }

    for f in &state.factions {
        for sys_id in &f.controlled_systems {
            let system = state
                .systems
                .iter()
                .find(|s| &s.system_id == sys_id)
                .ok_or_else(|| StateError::DanglingControl {
                    faction: f.faction_id.clone(),
                    system: sys_id.clone(),
                })?;
            if system.owner_faction_id.as_deref() != Some(f.faction_id.as_str()) {
                return Err(StateError::ControlMismatch {
                    system: sys_id.clone(),
                    faction: f.faction_id.clone(),
                });
            }
        }
        if !state
            .resources
            .iter()
            .any(|r| r.faction_id == f.faction_id)
        {
            return Err(StateError::MissingLedger(f.faction_id.clone()));
        }
    }

    for r in &state.resources {
        if !faction_ids.contains(r.faction_id.as_str()) {
            return Err(StateError::OrphanLedger(r.faction_id.clone()));
        }
    }

    for fl in &state.fleets {
        if !faction_ids.contains(fl.owner_faction_id.as_str()) {
            return Err(StateError::DanglingFleetRef {
                fleet: fl.fleet_id.clone(),
                referent: format!("faction {}", fl.owner_faction_id),
            });
        }
        if !system_ids.contains(fl.location_system_id.as_str()) {
            return Err(StateError::DanglingFleetRef {
                fleet: fl.fleet_id.clone(),
                referent: format!("system {}", fl.location_system_id),
            });
        }
    }

    if state.instance.current_turn > state.instance.max_turns {
        return Err(StateError::TurnOverflow {
            current: state.instance.current_turn,
            max: state.instance.max_turns,
        });
    }

    Ok(())
}
