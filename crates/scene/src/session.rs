use serde::{Deserialize, Serialize};

/// How long the intro stays dismissed after being acknowledged.
pub const INTRO_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminStatus {
    /// Not checked yet (or no wallet connected).
    #[default]
    Unknown,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    NoWallet,
    NotAdmin,
    Expired,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::NoWallet => write!(f, "no wallet connected"),
            SessionError::NotAdmin => write!(f, "admin access required"),
            SessionError::Expired => write!(f, "session expired"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Per-visitor session flags: connected wallet, admin status, and when the
/// intro dialog was last acknowledged.
///
/// Created at session start; `logout` and expiry reset it. Timestamps are
/// Unix milliseconds supplied by the caller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub wallet: Option<String>,
    pub admin: AdminStatus,
    pub started_at_ms: u64,
    pub expires_at_ms: Option<u64>,
    pub intro_acknowledged_at_ms: Option<u64>,
}

impl SessionContext {
    pub fn start(now_ms: u64, ttl_ms: Option<u64>) -> Self {
        Self {
            started_at_ms: now_ms,
            expires_at_ms: ttl_ms.map(|ttl| now_ms.saturating_add(ttl)),
            ..Default::default()
        }
    }

    /// Connecting a different wallet forgets the previous admin decision.
    pub fn connect_wallet(&mut self, wallet: impl Into<String>) {
        let wallet = wallet.into();
        let same = self
            .wallet
            .as_deref()
            .is_some_and(|w| w.eq_ignore_ascii_case(&wallet));
        if !same {
            self.admin = AdminStatus::Unknown;
        }
        self.wallet = Some(wallet);
    }

    pub fn disconnect_wallet(&mut self) {
        self.wallet = None;
        self.admin = AdminStatus::Unknown;
    }

    pub fn set_admin(&mut self, is_admin: bool) {
        self.admin = if is_admin {
            AdminStatus::Granted
        } else {
            AdminStatus::Denied
        };
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms.is_some_and(|at| now_ms >= at)
    }

    pub fn is_admin(&self, now_ms: u64) -> bool {
        self.require_admin(now_ms).is_ok()
    }

    /// Returns the admin wallet, or why admin actions are refused.
    pub fn require_admin(&self, now_ms: u64) -> Result<&str, SessionError> {
        if self.is_expired(now_ms) {
            return Err(SessionError::Expired);
        }
        let wallet = self.wallet.as_deref().ok_or(SessionError::NoWallet)?;
        match self.admin {
            AdminStatus::Granted => Ok(wallet),
            _ => Err(SessionError::NotAdmin),
        }
    }

    /// Shows the intro unless it was acknowledged within the last 24 hours.
    pub fn should_show_intro(&self, now_ms: u64) -> bool {
        match self.intro_acknowledged_at_ms {
            None => true,
            Some(at) => now_ms.saturating_sub(at) > INTRO_INTERVAL_MS,
        }
    }

    pub fn acknowledge_intro(&mut self, now_ms: u64) {
        self.intro_acknowledged_at_ms = Some(now_ms);
    }

    /// Clears wallet and admin state. The intro acknowledgement survives.
    pub fn logout(&mut self, now_ms: u64) {
        *self = Self {
            intro_acknowledged_at_ms: self.intro_acknowledged_at_ms,
            ..Self::start(now_ms, None)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0xAbC0000000000000000000000000000000000001";

    #[test]
    fn admin_requires_wallet_and_grant() {
        let mut s = SessionContext::start(0, None);
        assert_eq!(s.require_admin(1), Err(SessionError::NoWallet));
        s.connect_wallet(WALLET);
        assert_eq!(s.require_admin(1), Err(SessionError::NotAdmin));
        s.set_admin(true);
        assert_eq!(s.require_admin(1), Ok(WALLET));
    }

    #[test]
    fn switching_wallet_resets_admin() {
        let mut s = SessionContext::start(0, None);
        s.connect_wallet(WALLET);
        s.set_admin(true);
        s.connect_wallet(WALLET.to_lowercase());
        assert!(s.is_admin(1));
        s.connect_wallet("0x0000000000000000000000000000000000000002");
        assert_eq!(s.admin, AdminStatus::Unknown);
    }

    #[test]
    fn expiry_blocks_admin() {
        let mut s = SessionContext::start(1_000, Some(500));
        s.connect_wallet(WALLET);
        s.set_admin(true);
        assert!(s.is_admin(1_499));
        assert_eq!(s.require_admin(1_500), Err(SessionError::Expired));
    }

    #[test]
    fn intro_reappears_after_a_day() {
        let mut s = SessionContext::start(0, None);
        assert!(s.should_show_intro(0));
        s.acknowledge_intro(10);
        assert!(!s.should_show_intro(10 + INTRO_INTERVAL_MS));
        assert!(s.should_show_intro(11 + INTRO_INTERVAL_MS));
    }

    #[test]
    fn logout_keeps_intro_acknowledgement() {
        let mut s = SessionContext::start(0, Some(10));
        s.connect_wallet(WALLET);
        s.set_admin(true);
        s.acknowledge_intro(5);
        s.logout(20);
        assert_eq!(s.wallet, None);
        assert_eq!(s.admin, AdminStatus::Unknown);
        assert_eq!(s.started_at_ms, 20);
        assert_eq!(s.expires_at_ms, None);
        assert_eq!(s.intro_acknowledged_at_ms, Some(5));
    }

    #[test]
    fn serializes_camel_case() {
        let s = SessionContext::start(7, None);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["startedAtMs"], 7);
        assert_eq!(json["admin"], "unknown");
    }
}
