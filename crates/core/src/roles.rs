//! Role names carried in access tokens.

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_VIEWER: &str = "viewer";

/// Roles allowed to start an invite send run.
pub fn can_send_invites(role: &str) -> bool {
    role == ROLE_OWNER || role == ROLE_ADMIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_owner_and_admin_send() {
        assert!(can_send_invites(ROLE_OWNER));
        assert!(can_send_invites(ROLE_ADMIN));
        assert!(!can_send_invites(ROLE_VIEWER));
        assert!(!can_send_invites("Owner"));
    }
}
