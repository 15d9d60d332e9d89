//! Combat resolution: fleet attacks on enemy-held systems.

use sim_core::{Action, Delta, Fleet, FleetStatus, GameState, LogEntry, Phase, StateIndex};

/// Resolve the surviving `attack_system` intentions of `state`.
///
/// Ineligible attacks (missing or foreign or destroyed fleet, unknown
/// target, neutral target, own target) are skipped with a faction-scoped
/// log. An eligible attack succeeds only on strictly greater strength
/// than the defense; a tie favors the defender.
pub(crate) fn resolve(state: &GameState) -> (Vec<Delta>, Vec<LogEntry>) {
    let turn = state.instance.current_turn;
    let index = StateIndex::new(state);
    let mut deltas = Vec::new();
    let mut logs = Vec::new();

    for intention in &state.intentions {
        let Action::AttackSystem {
            fleet_id,
            target_system_id,
        } = &intention.action
        else {
            continue;
        };
        let faction_id = intention.faction_id.as_str();

        let Some(attacker) = index.fleet(fleet_id) else {
            logs.push(LogEntry::faction(
                turn,
                Phase::Combat,
                format!("Attack skipped: fleet {fleet_id} does not exist"),
                faction_id,
            ));
            continue;
        };
        if attacker.owner_faction_id != faction_id || attacker.status == FleetStatus::Destroyed {
            logs.push(LogEntry::faction(
                turn,
                Phase::Combat,
                format!("Attack skipped: fleet {fleet_id} is unavailable"),
                faction_id,
            ));
            continue;
        }
        let Some(target) = index.system(target_system_id) else {
            logs.push(LogEntry::faction(
                turn,
                Phase::Combat,
                format!("Attack skipped: system {target_system_id} does not exist"),
                faction_id,
            ));
            continue;
        };
        let Some(defender_faction) = target.owner_faction_id.as_deref() else {
            logs.push(LogEntry::faction(
                turn,
                Phase::Combat,
                format!("Attack skipped: system {target_system_id} is neutral"),
                faction_id,
            ));
            continue;
        };
        if defender_faction == faction_id {
            logs.push(LogEntry::faction(
                turn,
                Phase::Combat,
                format!("Attack skipped: system {target_system_id} is already yours"),
                faction_id,
            ));
            continue;
        }

        // Absence of a stationed defender means zero defense strength.
        let defender = defending_fleet(state, defender_faction, target_system_id);
        let defense_strength = defender.map_or(0, |f| f.strength);

        if attacker.strength > defense_strength {
            deltas.push(Delta::Control {
                system_id: target_system_id.clone(),
                previous_owner: Some(defender_faction.to_string()),
                new_owner: faction_id.to_string(),
            });
            if let Some(defender) = defender {
                deltas.push(Delta::FleetDestroyed {
                    fleet_id: defender.fleet_id.clone(),
                });
            }
            logs.push(LogEntry::public(
                turn,
                Phase::Combat,
                format!(
                    "Faction {faction_id} captured system {target_system_id} from {defender_faction}"
                ),
            ));
        } else {
            deltas.push(Delta::FleetDestroyed {
                fleet_id: fleet_id.clone(),
            });
            logs.push(LogEntry::public(
                turn,
                Phase::Combat,
                format!(
                    "Attack on system {target_system_id} by faction {faction_id} was repelled"
                ),
            ));
        }
    }

    (deltas, logs)
}

/// First non-destroyed fleet of `faction` stationed at `system_id`.
fn defending_fleet<'a>(
    state: &'a GameState,
    faction: &str,
    system_id: &str,
) -> Option<&'a Fleet> {
    state.fleets.iter().find(|f| {
        f.owner_faction_id == faction
            && f.location_system_id == system_id
            && f.status != FleetStatus::Destroyed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::two_faction_state;
    use sim_core::Intention;

    fn attack(faction: &str, fleet: &str, target: &str) -> Intention {
        Intention {
            turn: 1,
            faction_id: faction.into(),
            action: Action::AttackSystem {
                fleet_id: fleet.into(),
                target_system_id: target.into(),
            },
        }
    }

    #[test]
    fn stronger_attacker_captures_and_destroys_defender() {
        let mut state = two_faction_state();
        state.fleets[0].strength = 15;
        state.intentions = vec![attack("f1", "fleet-1", "s2")];
        let (deltas, logs) = resolve(&state);
        assert_eq!(
            deltas,
            vec![
                Delta::Control {
                    system_id: "s2".into(),
                    previous_owner: Some("f2".into()),
                    new_owner: "f1".into(),
                },
                Delta::FleetDestroyed {
                    fleet_id: "fleet-2".into(),
                },
            ]
        );
        assert_eq!(logs.len(), 1);
    }

    #[test]
    fn tie_destroys_attacker_only() {
        let mut state = two_faction_state();
        state.intentions = vec![attack("f1", "fleet-1", "s2")];
        let (deltas, _) = resolve(&state);
        assert_eq!(
            deltas,
            vec![Delta::FleetDestroyed {
                fleet_id: "fleet-1".into(),
            }]
        );
    }

    #[test]
    fn undefended_system_falls_without_fleet_loss() {
        let mut state = two_faction_state();
        // Move f2's fleet away from its home system.
        state.fleets[1].location_system_id = "s3".into();
        state.intentions = vec![attack("f1", "fleet-1", "s2")];
        let (deltas, _) = resolve(&state);
        assert_eq!(
            deltas,
            vec![Delta::Control {
                system_id: "s2".into(),
                previous_owner: Some("f2".into()),
                new_owner: "f1".into(),
            }]
        );
    }

    #[test]
    fn destroyed_defender_counts_as_no_defense() {
        let mut state = two_faction_state();
        state.fleets[1].status = FleetStatus::Destroyed;
        state.intentions = vec![attack("f1", "fleet-1", "s2")];
        let (deltas, _) = resolve(&state);
        assert!(matches!(deltas[0], Delta::Control { .. }));
        assert_eq!(deltas.len(), 1);
    }

    #[test]
    fn neutral_target_is_skipped_with_log() {
        let mut state = two_faction_state();
        state.intentions = vec![attack("f1", "fleet-1", "s3")];
        let (deltas, logs) = resolve(&state);
        assert!(deltas.is_empty());
        assert_eq!(logs.len(), 1);
        assert!(logs[0].message.contains("neutral"));
    }

    #[test]
    fn foreign_fleet_is_skipped() {
        let mut state = two_faction_state();
        state.intentions = vec![attack("f1", "fleet-2", "s2")];
        let (deltas, logs) = resolve(&state);
        assert!(deltas.is_empty());
        assert_eq!(logs.len(), 1);
    }

    #[test]
    fn missing_fleet_is_skipped() {
        let mut state = two_faction_state();
        state.intentions = vec![attack("f1", "ghost-fleet", "s2")];
        let (deltas, logs) = resolve(&state);
        assert!(deltas.is_empty());
        assert!(logs[0].message.contains("does not exist"));
    }
}
