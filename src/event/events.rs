use serde::{Deserialize, Serialize};

use crate::backend::OnlineUser;
use crate::subscription::EventKind;

/// State changes observed on the host server
///
/// Events represent facts about things that have already happened to a
/// connected user. The host invokes the dispatcher with one of these;
/// there is no ambient event bus, handlers are plain functions taking
/// explicit event data.
///
/// Note that the wildcard kind has no variant here: `ALL` exists only
/// inside subscriptions, never as an occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PresenceEvent {
    /// A user connected to the server
    Joined { user: OnlineUser },

    /// A user disconnected from the server
    Left { user: OnlineUser },

    /// A user set themselves away
    WentAway { user: OnlineUser },

    /// A user returned from away
    CameBack { user: OnlineUser },

    /// A user toggled their microphone
    MuteToggled { user: OnlineUser, muted: bool },

    /// A user toggled their speakers
    DeafToggled { user: OnlineUser, deafened: bool },

    /// A media client switched tracks
    TrackChanged { user: OnlineUser, track: String },
}

impl PresenceEvent {
    /// The user this event is about, i.e. the subscription target side
    pub fn user(&self) -> &OnlineUser {
        match self {
            PresenceEvent::Joined { user } => user,
            PresenceEvent::Left { user } => user,
            PresenceEvent::WentAway { user } => user,
            PresenceEvent::CameBack { user } => user,
            PresenceEvent::MuteToggled { user, .. } => user,
            PresenceEvent::DeafToggled { user, .. } => user,
            PresenceEvent::TrackChanged { user, .. } => user,
        }
    }

    /// The subscription kind this event falls under
    pub fn kind(&self) -> EventKind {
        match self {
            PresenceEvent::Joined { .. } => EventKind::Join,
            PresenceEvent::Left { .. } => EventKind::Leave,
            PresenceEvent::WentAway { .. } => EventKind::Away,
            PresenceEvent::CameBack { .. } => EventKind::Back,
            PresenceEvent::MuteToggled { .. } => EventKind::Mute,
            PresenceEvent::DeafToggled { .. } => EventKind::Deaf,
            PresenceEvent::TrackChanged { .. } => EventKind::Track,
        }
    }

    /// The text delivered to subscribers
    pub fn message(&self) -> String {
        match self {
            PresenceEvent::Joined { user } => {
                format!("{} just joined the server.", user.display_name)
            }
            PresenceEvent::Left { user } => {
                format!("{} just left the server.", user.display_name)
            }
            PresenceEvent::WentAway { user } => format!("{} is now away.", user.display_name),
            PresenceEvent::CameBack { user } => format!("{} is back.", user.display_name),
            PresenceEvent::MuteToggled { user, muted: true } => {
                format!("{} muted their microphone.", user.display_name)
            }
            PresenceEvent::MuteToggled { user, muted: false } => {
                format!("{} unmuted their microphone.", user.display_name)
            }
            PresenceEvent::DeafToggled {
                user,
                deafened: true,
            } => format!("{} deafened themselves.", user.display_name),
            PresenceEvent::DeafToggled {
                user,
                deafened: false,
            } => format!("{} undeafened themselves.", user.display_name),
            PresenceEvent::TrackChanged { user, track } => {
                format!("{} is now playing {}.", user.display_name, track)
            }
        }
    }
}
