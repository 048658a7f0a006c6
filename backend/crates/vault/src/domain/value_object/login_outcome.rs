//! Login Collaborator Outcome

use kernel::token::CredentialToken;

/// Outcome of one call to the external login collaborator
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Credentials accepted; here is the issued token
    Authenticated(CredentialToken),
    /// MFA is enrolled and a code is required
    MfaRequired,
    /// MFA enrollment is mandatory and not yet completed
    MfaSetupRequired,
}
