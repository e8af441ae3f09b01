use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::TwitterError;

/// Permissions that can be requested on the authorize URL
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Scope {
    #[serde(rename = "tweet.read")]
    TweetRead,
    #[serde(rename = "tweet.write")]
    TweetWrite,
    #[serde(rename = "tweet.moderate.write")]
    TweetModerateWrite,
    #[serde(rename = "users.read")]
    UsersRead,
    #[serde(rename = "follow.read")]
    FollowRead,
}

impl Scope {
    pub const ALL: [Scope; 5] = [
        Scope::TweetRead,
        Scope::TweetWrite,
        Scope::TweetModerateWrite,
        Scope::UsersRead,
        Scope::FollowRead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::TweetRead => "tweet.read",
            Scope::TweetWrite => "tweet.write",
            Scope::TweetModerateWrite => "tweet.moderate.write",
            Scope::UsersRead => "users.read",
            Scope::FollowRead => "follow.read",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = TwitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .iter()
            .copied()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| TwitterError::UnknownScope(s.to_string()))
    }
}

/// Space-separated scope list, as the authorize endpoint expects it
pub fn join_scopes(scopes: &[Scope]) -> String {
    scopes
        .iter()
        .map(Scope::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
