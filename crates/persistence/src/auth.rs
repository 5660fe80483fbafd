use tracing::warn;

use crate::backend::LoreBackend;

/// Wallet that is always an admin, whatever the backend says.
pub const MASTER_WALLET: &str = "0xf8Ca9dA64Bb500C4C4395f7Bb987De3e77883130";

/// Whether `wallet` may use the admin console.
///
/// `master` matches case-insensitively without a backend round trip. Any
/// other wallet is looked up; a failed lookup counts as "not admin".
pub async fn check_admin(backend: &dyn LoreBackend, wallet: &str, master: &str) -> bool {
    let wallet = wallet.trim();
    if wallet.is_empty() {
        return false;
    }
    if wallet.eq_ignore_ascii_case(master) {
        return true;
    }
    match backend.is_admin(wallet).await {
        Ok(is_admin) => is_admin,
        Err(e) => {
            warn!(wallet, error = %e, "admin check failed");
            false
        }
    }
}
