//! Subscriber identity: a server channel or a direct-message user.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub const CHANNEL_KEY_PREFIX: &str = "config-channel";
pub const USER_KEY_PREFIX: &str = "config-user";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubscriberKey {
    /// A channel inside a server.
    Channel { server_id: String, channel_id: String },
    /// Direct messages to one user.
    User { user_id: String },
}

impl SubscriberKey {
    pub fn channel(server_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self::Channel {
            server_id: server_id.into(),
            channel_id: channel_id.into(),
        }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self::User {
            user_id: user_id.into(),
        }
    }

    /// Like [`SubscriberKey::channel`], rejecting ids that cannot be stored.
    pub fn try_channel(server_id: &str, channel_id: &str) -> Result<Self, String> {
        Ok(Self::channel(
            check_id("server", server_id)?,
            check_id("channel", channel_id)?,
        ))
    }

    /// Like [`SubscriberKey::user`], rejecting ids that cannot be stored.
    pub fn try_user(user_id: &str) -> Result<Self, String> {
        Ok(Self::user(check_id("user", user_id)?))
    }

    /// Whether the ids survive a trip through [`SubscriberKey::db_key`].
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Channel {
                server_id,
                channel_id,
            } => {
                check_id("server", server_id)?;
                check_id("channel", channel_id)?;
            }
            Self::User { user_id } => {
                check_id("user", user_id)?;
            }
        }
        Ok(())
    }

    /// Server id for server-scoped subscribers, `None` for users.
    pub fn scope(&self) -> Option<&str> {
        match self {
            Self::Channel { server_id, .. } => Some(server_id),
            Self::User { .. } => None,
        }
    }

    /// Channel id or user id, whichever addresses the subscriber.
    pub fn target_id(&self) -> &str {
        match self {
            Self::Channel { channel_id, .. } => channel_id,
            Self::User { user_id } => user_id,
        }
    }

    /// Rebuild a key from the `(scope, target)` pair used in persisted monitors.
    pub fn from_parts(scope: Option<&str>, target: &str) -> Self {
        match scope {
            Some(server) => Self::channel(server, target),
            None => Self::user(target),
        }
    }

    /// Key under which this subscriber's options are stored.
    pub fn db_key(&self) -> String {
        match self {
            Self::Channel {
                server_id,
                channel_id,
            } => format!("{CHANNEL_KEY_PREFIX}-{server_id}-{channel_id}"),
            Self::User { user_id } => format!("{USER_KEY_PREFIX}-{user_id}"),
        }
    }

    /// Parse a stored config key back into a subscriber.
    pub fn from_db_key(key: &str) -> Result<Self, StoreError> {
        let corrupt = || StoreError::Corrupt(format!("not a subscriber config key: {key}"));

        if let Some(rest) = key.strip_prefix(USER_KEY_PREFIX).and_then(|r| r.strip_prefix('-')) {
            if rest.is_empty() || rest.contains('-') {
                return Err(corrupt());
            }
            return Ok(Self::user(rest));
        }

        if let Some(rest) = key.strip_prefix(CHANNEL_KEY_PREFIX).and_then(|r| r.strip_prefix('-')) {
            let (server, channel) = rest.split_once('-').ok_or_else(corrupt)?;
            if server.is_empty() || channel.is_empty() || channel.contains('-') {
                return Err(corrupt());
            }
            return Ok(Self::channel(server, channel));
        }

        Err(corrupt())
    }
}

impl fmt::Display for SubscriberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel {
                server_id,
                channel_id,
            } => write!(f, "channel:{server_id}/{channel_id}"),
            Self::User { user_id } => write!(f, "user:{user_id}"),
        }
    }
}

/// Config keys are `-` separated, so ids may not contain `-`.
fn check_id<'a>(kind: &str, id: &'a str) -> Result<&'a str, String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("empty {kind} id"));
    }
    if id.contains('-') {
        return Err(format!("{kind} id '{id}' may not contain '-'"));
    }
    Ok(id)
}

/// Parses the CLI forms `SERVER/CHANNEL` and `user:ID` (plus the `channel:` prefix).
impl FromStr for SubscriberKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(user) = s.strip_prefix("user:") {
            return Self::try_user(user);
        }
        let rest = s.strip_prefix("channel:").unwrap_or(s);
        match rest.split_once('/') {
            Some((server, channel)) => Self::try_channel(server, channel),
            None => Err(format!("expected SERVER/CHANNEL or user:ID, got '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_keys_round_trip() {
        let channel = SubscriberKey::channel("360523650912223253", "general");
        assert_eq!(channel.db_key(), "config-channel-360523650912223253-general");
        assert_eq!(SubscriberKey::from_db_key(&channel.db_key()).unwrap(), channel);

        let user = SubscriberKey::user("42");
        assert_eq!(user.db_key(), "config-user-42");
        assert_eq!(SubscriberKey::from_db_key("config-user-42").unwrap(), user);
    }

    #[test]
    fn unknown_prefixes_are_rejected() {
        assert!(SubscriberKey::from_db_key("launch-monitors").is_err());
        assert!(SubscriberKey::from_db_key("config-user-").is_err());
        assert!(SubscriberKey::from_db_key("config-channel-123").is_err());
    }

    #[test]
    fn scope_and_target() {
        let channel = SubscriberKey::channel("s1", "c1");
        assert_eq!(channel.scope(), Some("s1"));
        assert_eq!(channel.target_id(), "c1");
        assert_eq!(SubscriberKey::from_parts(Some("s1"), "c1"), channel);

        let user = SubscriberKey::user("u1");
        assert_eq!(user.scope(), None);
        assert_eq!(SubscriberKey::from_parts(None, "u1"), user);
    }

    #[test]
    fn cli_forms() {
        assert_eq!("s1/c1".parse::<SubscriberKey>().unwrap(), SubscriberKey::channel("s1", "c1"));
        assert_eq!(
            "channel:s1/c1".parse::<SubscriberKey>().unwrap(),
            SubscriberKey::channel("s1", "c1")
        );
        assert_eq!("user:u1".parse::<SubscriberKey>().unwrap(), SubscriberKey::user("u1"));
        assert!("nonsense".parse::<SubscriberKey>().is_err());
        assert!("user:".parse::<SubscriberKey>().is_err());
        assert!("/c1".parse::<SubscriberKey>().is_err());
    }

    #[test]
    fn dashed_ids_are_refused() {
        let err = "user:alice-b".parse::<SubscriberKey>().unwrap_err();
        assert!(err.contains("may not contain '-'"), "{err}");
        assert!("s1/c-1".parse::<SubscriberKey>().is_err());
        assert!("s-1/c1".parse::<SubscriberKey>().is_err());
        assert!(SubscriberKey::try_user("alice-b").is_err());
        assert!(SubscriberKey::user("alice-b").validate().is_err());
        assert_eq!(SubscriberKey::try_user(" 42 ").unwrap(), SubscriberKey::user("42"));
    }

    #[test]
    fn accepted_ids_survive_the_config_key() {
        for subscriber in [
            SubscriberKey::try_channel("360523650912223253", "general").unwrap(),
            SubscriberKey::try_user("alice_b").unwrap(),
        ] {
            assert_eq!(SubscriberKey::from_db_key(&subscriber.db_key()).unwrap(), subscriber);
        }
    }
}
