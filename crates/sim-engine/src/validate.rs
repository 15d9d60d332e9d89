//! Intention screening: the first phase of turn resolution.
//!
//! Screening never fails the turn. Every rejected intention becomes a log
//! entry; the survivors form the working intention list the resolvers read.

use sim_core::{GameState, Intention, LogEntry, Phase, StateIndex};

/// Screen `intentions` against `state`.
///
/// Drops wrong-turn intentions (faction-scoped log) and unknown-faction
/// intentions (public log), then enforces the one-major-action rule over
/// the whole surviving batch: if more than one major action survives, all
/// major actions are stripped and one public rejection is logged.
pub(crate) fn screen(
    state: &GameState,
    intentions: &[Intention],
) -> (Vec<Intention>, Vec<LogEntry>) {
    let turn = state.instance.current_turn;
    let index = StateIndex::new(state);
    let mut logs = Vec::new();
    let mut surviving = Vec::new();

    for intention in intentions {
        if intention.turn != turn {
            logs.push(LogEntry::faction(
                turn,
                Phase::Intentions,
                format!("Invalid intention: wrong turn ({})", intention.turn),
                intention.faction_id.clone(),
            ));
            continue;
        }
        if index.faction(&intention.faction_id).is_none() {
            logs.push(LogEntry::public(
                turn,
                Phase::Intentions,
                format!(
                    "Invalid intention: unknown faction ({})",
                    intention.faction_id
                ),
            ));
            continue;
        }
        surviving.push(intention.clone());
    }

    let majors = surviving.iter().filter(|i| i.action.is_major()).count();
    if majors > 1 {
        logs.push(LogEntry::public(
            turn,
            Phase::Intentions,
            "Only one major action is allowed per turn",
        ));
        surviving.retain(|i| !i.action.is_major());
    }

    (surviving, logs)
}
