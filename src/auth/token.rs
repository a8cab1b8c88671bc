use chrono::{DateTime, Duration, Utc};

/// Tokens this close to expiry are treated as already expired.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Longest lifetime accepted from a token endpoint.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// A minted OAuth access token.
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    /// Refresh margin, at most a quarter of the lifetime.
    skew_secs: i64,
}

impl AccessToken {
    /// `expires_in_secs` is clamped to `0..=MAX_TOKEN_LIFETIME_SECS`.
    pub fn new(token: impl Into<String>, token_type: impl Into<String>, expires_in_secs: i64) -> Self {
        let lifetime = expires_in_secs.clamp(0, MAX_TOKEN_LIFETIME_SECS);
        Self {
            token: token.into(),
            token_type: token_type.into(),
            expires_at: Utc::now() + Duration::seconds(lifetime),
            skew_secs: EXPIRY_SKEW_SECS.min(lifetime / 4),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at - Duration::seconds(self.skew_secs) <= Utc::now()
    }

    /// Seconds until expiry, clamped at zero.
    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }

    /// Value for an `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_not_expired() {
        let token = AccessToken::new("ya29.abc", "Bearer", 3600);
        assert!(!token.is_expired());
        assert!(token.remaining_secs() > 3500);
    }

    #[test]
    fn token_near_expiry_counts_as_expired() {
        let mut token = AccessToken::new("ya29.abc", "Bearer", 3600);
        token.expires_at = Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS - 5);
        assert!(token.is_expired());
    }

    #[test]
    fn short_lived_token_is_usable_when_minted() {
        let token = AccessToken::new("ya29.abc", "Bearer", 30);
        assert!(!token.is_expired());
        assert!(token.remaining_secs() > 20);
    }

    #[test]
    fn zero_lifetime_token_is_expired() {
        assert!(AccessToken::new("ya29.abc", "Bearer", 0).is_expired());
        assert!(AccessToken::new("ya29.abc", "Bearer", -5).is_expired());
    }

    #[test]
    fn out_of_range_lifetime_is_clamped() {
        let token = AccessToken::new("ya29.abc", "Bearer", 100_000_000_000_000_000);
        assert!(!token.is_expired());
        assert!(token.remaining_secs() <= MAX_TOKEN_LIFETIME_SECS);

        let token = AccessToken::new("ya29.abc", "Bearer", i64::MAX);
        assert!(token.remaining_secs() <= MAX_TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn debug_never_prints_token() {
        let token = AccessToken::new("ya29.super-secret", "Bearer", 3600);
        let printed = format!("{token:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
