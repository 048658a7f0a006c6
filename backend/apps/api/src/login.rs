//! Demo Login Collaborator
//!
//! A small in-memory identity provider implementing `vault::LoginService`:
//! Argon2id password verification, optional TOTP MFA, and HMAC-signed
//! credential tokens. Stands in for the external identity service; the
//! session subsystem itself never verifies passwords or codes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use kernel::token::CredentialToken;
use platform::password::{ClearTextPassword, HashedPassword};
use sha2::Sha256;
use totp_rs::TOTP;
use vault::{LoginOutcome, LoginService, VaultError, VaultResult};

/// Wrong MFA codes tolerated before the account locks for the process
/// lifetime. Retry bounding lives here, in the collaborator, by contract.
const MAX_MFA_FAILURES: u32 = 5;

struct DemoUser {
    password: HashedPassword,
    totp: Option<TOTP>,
    mfa_enrollment_pending: AtomicBool,
    hashed_user_id: String,
}

/// In-memory login collaborator
pub struct DemoLoginService {
    users: HashMap<String, DemoUser>,
    token_secret: [u8; 32],
    token_ttl: Duration,
    mfa_failures: Mutex<HashMap<String, u32>>,
}

impl DemoLoginService {
    /// Build the demo user table from the environment.
    ///
    /// `DEMO_USERNAME` / `DEMO_PASSWORD` seed one account; setting
    /// `DEMO_TOTP_SECRET` (base32) enrolls it in MFA, and
    /// `DEMO_MFA_SETUP=1` marks enrollment as still pending.
    pub fn from_env(token_secret: [u8; 32]) -> anyhow::Result<Self> {
        let username = std::env::var("DEMO_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let password = std::env::var("DEMO_PASSWORD")
            .unwrap_or_else(|_| "correct horse battery".to_string());

        let hashed = ClearTextPassword::new(password)?.hash(None)?;

        let totp = match std::env::var("DEMO_TOTP_SECRET") {
            Ok(secret) => Some(build_totp(&secret, &username)?),
            Err(_) => None,
        };
        let mfa_enrollment_pending =
            totp.is_some() && std::env::var("DEMO_MFA_SETUP").is_ok_and(|v| v == "1");

        let hashed_user_id =
            platform::crypto::to_base64url(&platform::crypto::sha256(username.as_bytes()));

        let mut users = HashMap::new();
        users.insert(
            username,
            DemoUser {
                password: hashed,
                totp,
                mfa_enrollment_pending: AtomicBool::new(mfa_enrollment_pending),
                hashed_user_id,
            },
        );

        Ok(Self {
            users,
            token_secret,
            token_ttl: Duration::from_secs(15 * 60),
            mfa_failures: Mutex::new(HashMap::new()),
        })
    }

    /// Verify a bearer token and issue a replacement for the same subject.
    ///
    /// This is the server-side signature check the client half never does.
    pub fn refresh_token(&self, raw: &str) -> VaultResult<CredentialToken> {
        let (signed_part, signature_b64) = raw
            .rsplit_once('.')
            .ok_or(VaultError::RefreshFailed("malformed token".into()))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| VaultError::RefreshFailed("malformed signature".into()))?;

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.token_secret)
            .expect("HMAC can take key of any size");
        mac.update(signed_part.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| VaultError::RefreshFailed("signature mismatch".into()))?;

        let current = CredentialToken::parse(raw)?;
        if current.is_expired() {
            return Err(VaultError::RefreshFailed("token already expired".into()));
        }

        self.mint(
            current.subject(),
            current.hashed_user_id().unwrap_or(current.subject()),
        )
    }

    fn mint(&self, subject: &str, hashed_user_id: &str) -> VaultResult<CredentialToken> {
        let now = Utc::now().timestamp();
        let claims = serde_json::json!({
            "sub": subject,
            "iat": now,
            "exp": now + self.token_ttl.as_secs() as i64,
            "huid": hashed_user_id,
        });
        let claims_bytes =
            serde_json::to_vec(&claims).map_err(|e| VaultError::Internal(e.to_string()))?;

        let signed_part = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(&claims_bytes)
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.token_secret)
            .expect("HMAC can take key of any size");
        mac.update(signed_part.as_bytes());
        let signature = mac.finalize().into_bytes();

        let raw = format!("{}.{}", signed_part, URL_SAFE_NO_PAD.encode(signature));
        Ok(CredentialToken::parse(&raw)?)
    }

    fn check_mfa_code(&self, username: &str, totp: &TOTP, code: &str) -> VaultResult<()> {
        let mut failures = self
            .mfa_failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let count = failures.entry(username.to_string()).or_insert(0);
        if *count >= MAX_MFA_FAILURES {
            tracing::warn!(username, "MFA attempts exhausted");
            return Err(VaultError::LoginRejected);
        }

        let valid = totp
            .check_current(code)
            .map_err(|e| VaultError::Internal(e.to_string()))?;

        if valid {
            *count = 0;
            Ok(())
        } else {
            *count += 1;
            Err(VaultError::MfaRejected)
        }
    }
}

impl LoginService for DemoLoginService {
    async fn login(
        &self,
        username: &str,
        password: &str,
        mfa_code: Option<&str>,
    ) -> VaultResult<LoginOutcome> {
        let user = self.users.get(username).ok_or(VaultError::LoginRejected)?;

        let password = ClearTextPassword::new(password.to_string())
            .map_err(|_| VaultError::LoginRejected)?;
        if !user.password.verify(&password, None) {
            tracing::warn!(username, "Password verification failed");
            return Err(VaultError::LoginRejected);
        }

        if let Some(totp) = &user.totp {
            if user.mfa_enrollment_pending.load(Ordering::SeqCst) {
                match mfa_code {
                    None => return Ok(LoginOutcome::MfaSetupRequired),
                    Some(code) => {
                        // A valid code confirms the secret and completes
                        // enrollment
                        self.check_mfa_code(username, totp, code)?;
                        user.mfa_enrollment_pending.store(false, Ordering::SeqCst);
                        tracing::info!(username, "MFA enrollment completed");
                    }
                }
            } else {
                match mfa_code {
                    None => return Ok(LoginOutcome::MfaRequired),
                    Some(code) => self.check_mfa_code(username, totp, code)?,
                }
            }
        }

        let token = self.mint(username, &user.hashed_user_id)?;
        tracing::info!(username, "Login accepted");
        Ok(LoginOutcome::Authenticated(token))
    }
}

fn build_totp(base32_secret: &str, account: &str) -> anyhow::Result<TOTP> {
    let secret = totp_rs::Secret::Encoded(base32_secret.to_string())
        .to_bytes()
        .map_err(|e| anyhow::anyhow!("Invalid TOTP secret: {}", e))?;

    TOTP::new(
        totp_rs::Algorithm::SHA1,
        6,
        1,
        30,
        secret,
        Some("Panel".to_string()),
        account.to_string(),
    )
    .map_err(|e| anyhow::anyhow!("Failed to create TOTP: {}", e))
}
