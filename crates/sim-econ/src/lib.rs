#![deny(warnings)]

//! Economy resolver for Starhold.
//!
//! This module computes the economic deltas of one turn:
//! - Base production per owned system (+1 metal, +1 energy)
//! - Mine production (+1 metal per mine on an owned system)
//! - `build_mine` intention effects (spend metal, add the structure)
//!
//! [`compute`] is a pure function of the pre-turn snapshot. It never
//! mutates state, never logs, and never emits a spend it cannot justify
//! from the pre-turn balance.

use sim_core::{
    Action, Delta, GameState, StateIndex, RESOURCE_ENERGY, RESOURCE_METAL, STRUCTURE_MINE,
};

/// Metal cost of building one mine.
pub const MINE_COST_METAL: i64 = 5;
/// Metal produced per owned system per turn.
pub const SYSTEM_METAL_YIELD: i64 = 1;
/// Energy produced per owned system per turn.
pub const SYSTEM_ENERGY_YIELD: i64 = 1;

/// Compute the economy deltas for the current turn.
///
/// `build_mine` intentions are read from `state.intentions` (the surviving
/// set echoed in by the turn engine). Ineligible intentions — unknown
/// system, system not owned by the requester, insufficient pre-turn metal —
/// are skipped silently.
pub fn compute(state: &GameState) -> Vec<Delta> {
    let mut deltas = Vec::new();
    let index = StateIndex::new(state);

    // Base production per owned system.
    for system in &state.systems {
        let Some(owner) = &system.owner_faction_id else {
            continue;
        };
        deltas.push(Delta::Resource {
            faction_id: owner.clone(),
            resource: RESOURCE_METAL.to_string(),
            amount: SYSTEM_METAL_YIELD,
        });
        deltas.push(Delta::Resource {
            faction_id: owner.clone(),
            resource: RESOURCE_ENERGY.to_string(),
            amount: SYSTEM_ENERGY_YIELD,
        });
    }

    // Mine production.
    for system in &state.systems {
        let Some(owner) = &system.owner_faction_id else {
            continue;
        };
        let mines = system
            .structures
            .iter()
            .filter(|s| s.as_str() == STRUCTURE_MINE)
            .count() as i64;
        if mines > 0 {
            deltas.push(Delta::Resource {
                faction_id: owner.clone(),
                resource: RESOURCE_METAL.to_string(),
                amount: mines,
            });
        }
    }

    // build_mine intentions.
    for intention in &state.intentions {
        let Action::BuildMine { system_id } = &intention.action else {
            continue;
        };
        let Some(system) = index.system(system_id) else {
            continue;
        };
        if system.owner_faction_id.as_deref() != Some(intention.faction_id.as_str()) {
            continue;
        }
        let Some(ledger) = index.faction_resources(&intention.faction_id) else {
            continue;
        };
        if ledger.balance(RESOURCE_METAL) < MINE_COST_METAL {
            continue;
        }
        deltas.push(Delta::Resource {
            faction_id: intention.faction_id.clone(),
            resource: RESOURCE_METAL.to_string(),
            amount: -MINE_COST_METAL,
        });
        deltas.push(Delta::Structure {
            system_id: system_id.clone(),
            structure: STRUCTURE_MINE.to_string(),
        });
    }

    deltas
}
