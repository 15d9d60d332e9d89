//! The delta applier: the sole mutation point of the simulation.
//!
//! [`apply`] folds an ordered delta list into a fresh copy of the state.
//! No game rules live here; eligibility is the resolvers' job. The only
//! failures are referential: a delta naming an id absent from state.

use crate::EngineError;
use sim_core::{Delta, FleetStatus, GameState};
use std::collections::HashMap;

/// Apply `deltas` to a deep copy of `state`, in list order.
///
/// The input state is untouched and remains safe to keep as a pre-turn
/// reference. Control transfers maintain the bidirectional ownership
/// invariant: the system id leaves the previous owner's
/// `controlled_systems` and joins the new owner's.
pub fn apply(state: &GameState, deltas: &[Delta]) -> Result<GameState, EngineError> {
    let mut next = state.clone();

    // Positions by id. Deltas never add or remove entities, so the maps
    // stay valid across the whole fold.
    let faction_pos: HashMap<String, usize> = positions(&next.factions, |f| &f.faction_id);
    let system_pos: HashMap<String, usize> = positions(&next.systems, |s| &s.system_id);
    let fleet_pos: HashMap<String, usize> = positions(&next.fleets, |f| &f.fleet_id);
    let ledger_pos: HashMap<String, usize> = positions(&next.resources, |r| &r.faction_id);

    for delta in deltas {
        match delta {
            Delta::Resource {
                faction_id,
                resource,
                amount,
            } => {
                let ix = *ledger_pos
                    .get(faction_id)
                    .ok_or_else(|| EngineError::MissingResourceLedger(faction_id.clone()))?;
                *next.resources[ix]
                    .resources
                    .entry(resource.clone())
                    .or_insert(0) += amount;
            }
            Delta::Structure {
                system_id,
                structure,
            } => {
                let ix = *system_pos
                    .get(system_id)
                    .ok_or_else(|| EngineError::UnknownSystem(system_id.clone()))?;
                next.systems[ix].structures.push(structure.clone());
            }
            Delta::Control {
                system_id,
                previous_owner,
                new_owner,
            } => {
                let six = *system_pos
                    .get(system_id)
                    .ok_or_else(|| EngineError::UnknownSystem(system_id.clone()))?;
                let nix = *faction_pos
                    .get(new_owner)
                    .ok_or_else(|| EngineError::UnknownFaction(new_owner.clone()))?;
                if let Some(prev) = previous_owner {
                    let pix = *faction_pos
                        .get(prev)
                        .ok_or_else(|| EngineError::UnknownFaction(prev.clone()))?;
                    next.factions[pix]
                        .controlled_systems
                        .retain(|s| s != system_id);
                }
                next.systems[six].owner_faction_id = Some(new_owner.clone());
                let owner = &mut next.factions[nix];
                if !owner.controlled_systems.contains(system_id) {
                    owner.controlled_systems.push(system_id.clone());
                }
            }
            Delta::FleetDestroyed { fleet_id } => {
                let ix = *fleet_pos
                    .get(fleet_id)
                    .ok_or_else(|| EngineError::UnknownFleet(fleet_id.clone()))?;
                // Kept in the collection for audit; only the status flips.
                next.fleets[ix].status = FleetStatus::Destroyed;
            }
        }
    }

    Ok(next)
}

fn positions<T>(items: &[T], id: impl Fn(&T) -> &String) -> HashMap<String, usize> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| (id(item).clone(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::two_faction_state;
    use sim_core::{validate_state, RESOURCE_METAL, STRUCTURE_MINE};

    #[test]
    fn resource_delta_adds_and_initializes() {
        let state = two_faction_state();
        let next = apply(
            &state,
            &[
                Delta::Resource {
                    faction_id: "f1".into(),
                    resource: RESOURCE_METAL.into(),
                    amount: -4,
                },
                Delta::Resource {
                    faction_id: "f1".into(),
                    resource: "crystal".into(),
                    amount: 2,
                },
            ],
        )
        .unwrap();
        let ledger = &next.resources[0];
        assert_eq!(ledger.balance(RESOURCE_METAL), 2);
        assert_eq!(ledger.balance("crystal"), 2);
    }

    #[test]
    fn structure_delta_appends() {
        let state = two_faction_state();
        let next = apply(
            &state,
            &[Delta::Structure {
                system_id: "s1".into(),
                structure: STRUCTURE_MINE.into(),
            }],
        )
        .unwrap();
        assert_eq!(next.systems[0].structures, vec![STRUCTURE_MINE.to_string()]);
    }

    #[test]
    fn control_claim_updates_both_records() {
        let state = two_faction_state();
        let next = apply(
            &state,
            &[Delta::Control {
                system_id: "s3".into(),
                previous_owner: None,
                new_owner: "f1".into(),
            }],
        )
        .unwrap();
        assert_eq!(next.systems[2].owner_faction_id.as_deref(), Some("f1"));
        assert!(next.factions[0].controlled_systems.contains(&"s3".to_string()));
        validate_state(&next).unwrap();
    }

    #[test]
    fn control_transfer_removes_previous_owner_record() {
        let state = two_faction_state();
        let next = apply(
            &state,
            &[Delta::Control {
                system_id: "s2".into(),
                previous_owner: Some("f2".into()),
                new_owner: "f1".into(),
            }],
        )
        .unwrap();
        assert!(!next.factions[1].controlled_systems.contains(&"s2".to_string()));
        assert!(next.factions[0].controlled_systems.contains(&"s2".to_string()));
        validate_state(&next).unwrap();
    }

    #[test]
    fn fleet_destroyed_flips_status_in_place() {
        let state = two_faction_state();
        let next = apply(
            &state,
            &[Delta::FleetDestroyed {
                fleet_id: "fleet-2".into(),
            }],
        )
        .unwrap();
        assert_eq!(next.fleets.len(), state.fleets.len());
        assert_eq!(next.fleets[1].status, FleetStatus::Destroyed);
    }

    #[test]
    fn input_state_is_never_mutated() {
        let state = two_faction_state();
        let before = state.clone();
        let _ = apply(
            &state,
            &[Delta::Resource {
                faction_id: "f1".into(),
                resource: RESOURCE_METAL.into(),
                amount: 100,
            }],
        )
        .unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn referential_errors_per_kind() {
        let state = two_faction_state();
        assert_eq!(
            apply(
                &state,
                &[Delta::Resource {
                    faction_id: "ghost".into(),
                    resource: RESOURCE_METAL.into(),
                    amount: 1,
                }],
            ),
            Err(EngineError::MissingResourceLedger("ghost".into()))
        );
        assert_eq!(
            apply(
                &state,
                &[Delta::Structure {
                    system_id: "nowhere".into(),
                    structure: STRUCTURE_MINE.into(),
                }],
            ),
            Err(EngineError::UnknownSystem("nowhere".into()))
        );
        assert_eq!(
            apply(
                &state,
                &[Delta::Control {
                    system_id: "s3".into(),
                    previous_owner: None,
                    new_owner: "ghost".into(),
                }],
            ),
            Err(EngineError::UnknownFaction("ghost".into()))
        );
        assert_eq!(
            apply(
                &state,
                &[Delta::FleetDestroyed {
                    fleet_id: "ghost-fleet".into(),
                }],
            ),
            Err(EngineError::UnknownFleet("ghost-fleet".into()))
        );
    }

    #[test]
    fn deltas_fold_in_list_order() {
        let state = two_faction_state();
        // Claim then transfer in one batch: last delta wins.
        let next = apply(
            &state,
            &[
                Delta::Control {
                    system_id: "s3".into(),
                    previous_owner: None,
                    new_owner: "f1".into(),
                },
                Delta::Control {
                    system_id: "s3".into(),
                    previous_owner: Some("f1".into()),
                    new_owner: "f2".into(),
                },
            ],
        )
        .unwrap();
        assert_eq!(next.systems[2].owner_faction_id.as_deref(), Some("f2"));
        validate_state(&next).unwrap();
    }
}
