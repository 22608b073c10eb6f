use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Key manager families that can send notifications to this service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyManagerType {
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "WSO2-IS")]
    Wso2Is,
    #[serde(rename = "Okta")]
    Okta,
    #[serde(rename = "KeyCloak")]
    KeyCloak,
    #[serde(rename = "Auth0")]
    Auth0,
    #[serde(rename = "PingFederate")]
    PingFederate,
    #[serde(rename = "ForgeRock")]
    ForgeRock,
    #[serde(rename = "AzureAD")]
    AzureAd,
}

impl KeyManagerType {
    pub const ALL: [KeyManagerType; 8] = [
        KeyManagerType::Default,
        KeyManagerType::Wso2Is,
        KeyManagerType::Okta,
        KeyManagerType::KeyCloak,
        KeyManagerType::Auth0,
        KeyManagerType::PingFederate,
        KeyManagerType::ForgeRock,
        KeyManagerType::AzureAd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyManagerType::Default => "default",
            KeyManagerType::Wso2Is => "WSO2-IS",
            KeyManagerType::Okta => "Okta",
            KeyManagerType::KeyCloak => "KeyCloak",
            KeyManagerType::Auth0 => "Auth0",
            KeyManagerType::PingFederate => "PingFederate",
            KeyManagerType::ForgeRock => "ForgeRock",
            KeyManagerType::AzureAd => "AzureAD",
        }
    }
}

impl fmt::Display for KeyManagerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Unknown key manager type: {0}")]
pub struct UnknownKeyManagerType(pub String);

impl FromStr for KeyManagerType {
    type Err = UnknownKeyManagerType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKeyManagerType(s.to_string()))
    }
}
