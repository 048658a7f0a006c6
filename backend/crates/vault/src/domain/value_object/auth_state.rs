//! Authentication Flow States
//!
//! Exactly one state is active per login attempt lifecycle. The transition
//! table here is the single authority; anything outside it is a programming
//! error and fails loudly.

use std::fmt;

/// Login flow state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    MfaSetupRequired,
    MfaRequired,
    Authenticated,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::MfaSetupRequired => "mfa_setup_required",
            AuthState::MfaRequired => "mfa_required",
            AuthState::Authenticated => "authenticated",
        }
    }

    /// Whether `self -> to` is in the transition table.
    ///
    /// Logout (any state back to `Unauthenticated`) is always allowed;
    /// `MfaRequired` may self-loop on a wrong code. Transitions into
    /// `Authenticated` are terminal on success.
    pub fn can_transition_to(self, to: AuthState) -> bool {
        use AuthState::*;

        match (self, to) {
            // Explicit logout or forced logout
            (_, Unauthenticated) => true,
            // Login outcomes
            (Unauthenticated, Authenticated) => true,
            (Unauthenticated, MfaSetupRequired) => true,
            (Unauthenticated, MfaRequired) => true,
            // MFA code verification; self-loop on a wrong code
            (MfaRequired, Authenticated) => true,
            (MfaRequired, MfaRequired) => true,
            // Enrollment completes with a valid code
            (MfaSetupRequired, Authenticated) => true,
            _ => false,
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AuthState::*;

    #[test]
    fn test_transition_table() {
        let valid = [
            (Unauthenticated, Authenticated),
            (Unauthenticated, MfaSetupRequired),
            (Unauthenticated, MfaRequired),
            (MfaRequired, Authenticated),
            (MfaRequired, MfaRequired),
            (MfaSetupRequired, Authenticated),
            // Logout from every state
            (Unauthenticated, Unauthenticated),
            (MfaSetupRequired, Unauthenticated),
            (MfaRequired, Unauthenticated),
            (Authenticated, Unauthenticated),
        ];
        for (from, to) in valid {
            assert!(from.can_transition_to(to), "{from} -> {to} should be valid");
        }

        let invalid = [
            (Authenticated, Authenticated),
            (Authenticated, MfaRequired),
            (Authenticated, MfaSetupRequired),
            (MfaRequired, MfaSetupRequired),
            (MfaSetupRequired, MfaRequired),
            (MfaSetupRequired, MfaSetupRequired),
        ];
        for (from, to) in invalid {
            assert!(
                !from.can_transition_to(to),
                "{from} -> {to} should be invalid"
            );
        }
    }
}
