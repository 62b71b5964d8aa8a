use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One decoded entry from the game's journal.
///
/// Journal lines are JSON objects tagged by an `"event"` field, with
/// PascalCase payload fields (except the lowercase `timestamp`). Only the
/// tags the classifier acts on are modelled; every other tag decodes to
/// [`JournalEvent::Unknown`], so an unrecognized line can never fail the
/// stream by itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event")]
pub enum JournalEvent {
    /// The ship's shield generator came up or went down.
    #[serde(rename_all = "PascalCase")]
    ShieldState {
        shields_up: bool,
        #[serde(rename = "timestamp")]
        timestamp: DateTime<Utc>,
    },

    /// The hull took damage. `health` is the remaining fraction in 0.0–1.0.
    /// `player_pilot` is false for damage to a ship-launched fighter flown
    /// by a crew member.
    #[serde(rename_all = "PascalCase")]
    HullDamage {
        health: f64,
        player_pilot: bool,
        #[serde(rename = "timestamp")]
        timestamp: DateTime<Utc>,
    },

    /// A ship-launched fighter was destroyed.
    FighterDestroyed {
        timestamp: DateTime<Utc>,
    },

    /// Full snapshot of the mission log, written at startup and on resume.
    Missions {
        #[serde(rename = "Active")]
        active: Vec<MissionSummary>,
    },

    /// A new mission was accepted.
    MissionAccepted,

    /// A mission's goal moved elsewhere (usually on completion of the
    /// original objective).
    MissionRedirected,

    /// A mission was failed.
    MissionFailed,

    /// A mission was abandoned.
    MissionAbandoned,

    /// An incoming text message. `from_localised` is the display name of
    /// the sender; `message` is the raw message key.
    ReceiveText {
        #[serde(rename = "From_Localised", default)]
        from_localised: String,
        #[serde(rename = "Message", default)]
        message: String,
    },

    /// A cargo canister was scooped.
    #[serde(rename_all = "PascalCase")]
    CollectCargo {
        stolen: bool,
    },

    /// The commander died.
    Died,

    /// Any journal tag this daemon does not act on.
    #[serde(other)]
    Unknown,
}

impl JournalEvent {
    /// Timestamp carried by the entry, for the variants that record one.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::ShieldState { timestamp, .. }
            | Self::HullDamage { timestamp, .. }
            | Self::FighterDestroyed { timestamp } => Some(*timestamp),
            _ => None,
        }
    }
}

/// Per-mission entry inside a [`JournalEvent::Missions`] snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MissionSummary {
    /// Seconds until the mission expires; 0 means already expired.
    #[serde(rename = "Expires")]
    pub expires_in_seconds: i64,
}
