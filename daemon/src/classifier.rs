//! Pure decision rules: one journal event in, notifications plus the new
//! mission count out. No I/O happens here; the session driver owns the
//! count and performs the dispatch.

use crate::events::JournalEvent;
use crate::notifier::Notification;

/// Result of classifying a single event against the current mission count.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Notifications to dispatch, in order. No rule emits more than one per
    /// event today.
    pub notifications: Vec<Notification>,
    /// Mission count after applying the event.
    pub mission_count: u32,
}

impl Verdict {
    fn silent(mission_count: u32) -> Self {
        Self {
            notifications: Vec::new(),
            mission_count,
        }
    }

    fn notify(notification: Notification, mission_count: u32) -> Self {
        Self {
            notifications: vec![notification],
            mission_count,
        }
    }
}

/// Hull percentage below which every `HullDamage` report notifies.
///
/// The historical rule chained `< 75 || < 50 || < 25`, which collapses to
/// this single check. The collapsed form keeps the same observable,
/// level-triggered behavior: a notification on every qualifying report, not
/// only on threshold crossings. Suspected upstream defect; see DESIGN.md
/// before changing it to edge-triggered.
const HULL_NOTIFY_BELOW_PERCENT: f64 = 75.0;

/// Sender display name the game uses for police ships in `ReceiveText`.
const POLICE_SENDER: &str = "System Authority Vessel";

/// Raw-message fragments marking an unprovoked police attack. Matched as
/// substrings of the message key, not whole-message equality; works around a
/// game bug where system authority opens fire without cause.
const POLICE_ATTACK_FRAGMENTS: [&str; 2] = ["Police_Attack", "OverwatchAttackRun"];

/// Applies the per-tag rule table to one event.
///
/// Deterministic and total: unknown tags yield no notifications and an
/// unchanged count.
pub fn classify(event: &JournalEvent, mission_count: u32) -> Verdict {
    match event {
        JournalEvent::ShieldState { shields_up, .. } => {
            if *shields_up {
                // There is no "shields restored" notification.
                Verdict::silent(mission_count)
            } else {
                Verdict::notify(
                    Notification::new("Shields Are Down", "Shields are down, Commander!"),
                    mission_count,
                )
            }
        }

        JournalEvent::HullDamage { health, player_pilot, .. } => {
            let hull_percent = health * 100.0;
            if *player_pilot && hull_percent < HULL_NOTIFY_BELOW_PERCENT {
                Verdict::notify(
                    Notification::new(
                        "Hull Damage",
                        format!("Hull damage detected, Commander! Hull is at {hull_percent}%"),
                    ),
                    mission_count,
                )
            } else {
                Verdict::silent(mission_count)
            }
        }

        JournalEvent::FighterDestroyed { .. } => Verdict::notify(
            Notification::new("Fighter Destroyed", "Fighter destroyed, Commander!"),
            mission_count,
        ),

        // Authoritative resync: the snapshot replaces the tracked count and
        // never notifies on its own.
        JournalEvent::Missions { active } => {
            let count = active.iter().filter(|m| m.expires_in_seconds > 0).count() as u32;
            Verdict::silent(count)
        }

        JournalEvent::MissionAccepted => Verdict::silent(mission_count + 1),

        JournalEvent::MissionRedirected
        | JournalEvent::MissionFailed
        | JournalEvent::MissionAbandoned => mission_lost(mission_count),

        JournalEvent::ReceiveText { from_localised, message } => {
            let is_police_attack = from_localised == POLICE_SENDER
                && POLICE_ATTACK_FRAGMENTS.iter().any(|f| message.contains(f));
            if is_police_attack {
                Verdict::notify(
                    Notification::new("Police Attack", "Police attack detected, Commander!"),
                    mission_count,
                )
            } else {
                Verdict::silent(mission_count)
            }
        }

        JournalEvent::CollectCargo { stolen } => {
            if *stolen {
                Verdict::notify(
                    Notification::new("Stolen Cargo Collected", "Stolen cargo collected, Commander!"),
                    mission_count,
                )
            } else {
                Verdict::silent(mission_count)
            }
        }

        JournalEvent::Died => Verdict::notify(
            Notification::new("Commander Died", "Your commander has died!"),
            mission_count,
        ),

        JournalEvent::Unknown => Verdict::silent(mission_count),
    }
}

/// A mission left the active set. The decrement saturates at 0 (the count is
/// best-effort; a loss can arrive before any snapshot or accept was seen).
fn mission_lost(mission_count: u32) -> Verdict {
    let remaining = mission_count.saturating_sub(1);
    if remaining == 0 {
        Verdict::notify(
            Notification::new("All Missions Completed", "All missions completed, Commander!"),
            remaining,
        )
    } else {
        Verdict::silent(remaining)
    }
}
