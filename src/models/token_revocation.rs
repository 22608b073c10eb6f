use serde::{Deserialize, Deserializer};

/// Marker that identifies a token revocation notification in the raw event text
pub const TOKEN_REVOCATION_EVENT: &str = "TOKEN_REVOCATION_EVENT";

pub const TOKEN_TYPE_JWT: &str = "JWT";

/// Token revocation notification as sent by a key manager.
///
/// Only the seven revocation fields are kept; anything else in the payload
/// (`eventType`, `timeStamp`, vendor extensions) is dropped during decoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRevocationEvent {
    pub event_id: String,
    pub consumer_key: String,
    pub token_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub tenant_id: String,
    pub tenant_domain: String,
    pub access_token: String,
    #[serde(deserialize_with = "string_or_number")]
    pub expiry_time: String,
}

/// Metadata that accompanies a revoked token on its way to the publisher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationProperties {
    pub event_id: String,
    pub consumer_key: String,
    pub token_type: String,
    pub tenant_id: String,
    pub tenant_domain: String,
}

impl TokenRevocationEvent {
    pub fn from_json(event: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(event)
    }

    /// Splits the event into the token, its expiry time and the remaining metadata
    pub fn into_parts(self) -> (String, String, RevocationProperties) {
        let properties = RevocationProperties {
            event_id: self.event_id,
            consumer_key: self.consumer_key,
            token_type: self.token_type,
            tenant_id: self.tenant_id,
            tenant_domain: self.tenant_domain,
        };

        (self.access_token, self.expiry_time, properties)
    }
}

impl RevocationProperties {
    pub fn is_jwt(&self) -> bool {
        self.token_type.eq_ignore_ascii_case(TOKEN_TYPE_JWT)
    }
}

/// Key managers send tenant ids and expiry times either as JSON numbers or as
/// strings; both are carried as their decimal text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Text(text) => text,
        StringOrNumber::Number(number) => number.to_string(),
    })
}

/// Epoch values below this are seconds (JWT `exp` style); 10^11 seconds is
/// year 5138 while 10^11 millis is only 1973.
const SECONDS_CUTOFF: i64 = 100_000_000_000;

/// Parses an expiry time into epoch milliseconds, `None` when it is not numeric.
///
/// Key managers send either seconds or milliseconds; values below
/// [`SECONDS_CUTOFF`] are taken as seconds.
pub fn expiry_millis(expiry_time: &str) -> Option<i64> {
    let value = expiry_time.trim().parse::<i64>().ok()?;
    if value.abs() < SECONDS_CUTOFF {
        value.checked_mul(1000)
    } else {
        Some(value)
    }
}
