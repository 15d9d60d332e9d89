//! Exploration resolution: claiming neutral systems.

use sim_core::{Action, Delta, GameState, LogEntry, Phase, StateIndex};

/// Resolve the surviving `explore_system` intentions of `state`.
///
/// Unknown or already-owned targets are no-ops: no delta, no log.
/// Contested or invalid claims simply vanish.
pub(crate) fn resolve(state: &GameState) -> (Vec<Delta>, Vec<LogEntry>) {
    let turn = state.instance.current_turn;
    let index = StateIndex::new(state);
    let mut deltas = Vec::new();
    let mut logs = Vec::new();

    for intention in &state.intentions {
        let Action::ExploreSystem {
            target_system_id, ..
        } = &intention.action
        else {
            continue;
        };
        let Some(system) = index.system(target_system_id) else {
            continue;
        };
        if system.owner_faction_id.is_some() {
            continue;
        }
        deltas.push(Delta::Control {
            system_id: target_system_id.clone(),
            previous_owner: None,
            new_owner: intention.faction_id.clone(),
        });
        logs.push(LogEntry::public(
            turn,
            Phase::Exploration,
            format!(
                "Faction {} explored and claimed system {}",
                intention.faction_id, target_system_id
            ),
        ));
    }

    (deltas, logs)
}
