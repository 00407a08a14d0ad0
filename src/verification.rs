//! Bot-verification token providers.
//!
//! The analysis endpoint accepts an optional one-time token proving a human started the
//! action. Providers are pluggable; when nothing is configured the no-op provider hands out
//! an empty token and the backend decides what to do with it.

use crate::model::ClientConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Action name the analysis token is scoped to.
pub const ANALYZE_ACTION: &str = "analyze_workflow";

const TOKEN_CMD_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("token helper could not be started: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("token helper exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("token helper returned an empty token")]
    Empty,

    #[error("token helper timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait BotVerifier: Send + Sync {
    async fn token(&self, action: &str) -> Result<String, VerificationError>;

    /// Whether a real provider is behind this verifier.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Used when no site key is configured.
pub struct NoopVerifier;

#[async_trait]
impl BotVerifier for NoopVerifier {
    async fn token(&self, _action: &str) -> Result<String, VerificationError> {
        Ok(String::new())
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// A token obtained out of band (e.g. pasted from a browser session).
pub struct StaticTokenVerifier {
    token: String,
}

impl StaticTokenVerifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl BotVerifier for StaticTokenVerifier {
    async fn token(&self, _action: &str) -> Result<String, VerificationError> {
        Ok(self.token.clone())
    }
}

/// Runs an external helper as `<program> <action> <site-key>` and reads the token from stdout.
pub struct CommandVerifier {
    program: String,
    site_key: String,
}

impl CommandVerifier {
    pub fn new(program: impl Into<String>, site_key: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            site_key: site_key.into(),
        }
    }
}

#[async_trait]
impl BotVerifier for CommandVerifier {
    async fn token(&self, action: &str) -> Result<String, VerificationError> {
        let output = tokio::time::timeout(
            TOKEN_CMD_TIMEOUT,
            tokio::process::Command::new(&self.program)
                .arg(action)
                .arg(&self.site_key)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| VerificationError::Timeout(TOKEN_CMD_TIMEOUT))??;

        if !output.status.success() {
            return Err(VerificationError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(VerificationError::Empty);
        }
        Ok(token)
    }
}

/// Pick a verifier from configuration. Without a site key there is no provider at all.
pub fn verifier_from_config(cfg: &ClientConfig) -> Arc<dyn BotVerifier> {
    let Some(site_key) = cfg.recaptcha_site_key.as_deref().filter(|k| !k.trim().is_empty())
    else {
        return Arc::new(NoopVerifier);
    };
    if let Some(token) = cfg.recaptcha_token.as_deref().filter(|t| !t.trim().is_empty()) {
        return Arc::new(StaticTokenVerifier::new(token.trim()));
    }
    if let Some(cmd) = cfg.recaptcha_token_cmd.as_deref().filter(|c| !c.trim().is_empty()) {
        return Arc::new(CommandVerifier::new(cmd.trim(), site_key.trim()));
    }
    tracing::warn!("site key configured but no token source; analysis requests will carry no token");
    Arc::new(NoopVerifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_hands_out_empty_token() {
        let v = NoopVerifier;
        assert_eq!(v.token(ANALYZE_ACTION).await.unwrap(), "");
        assert!(!v.is_configured());
    }

    #[test]
    fn selection_follows_config() {
        let mut cfg = ClientConfig::default();
        assert!(!verifier_from_config(&cfg).is_configured());

        // A token without a site key is ignored.
        cfg.recaptcha_token = Some("tok".into());
        assert!(!verifier_from_config(&cfg).is_configured());

        cfg.recaptcha_site_key = Some("site".into());
        assert!(verifier_from_config(&cfg).is_configured());

        cfg.recaptcha_token = None;
        assert!(!verifier_from_config(&cfg).is_configured());

        cfg.recaptcha_token_cmd = Some("get-token".into());
        assert!(verifier_from_config(&cfg).is_configured());
    }

    #[tokio::test]
    async fn static_token_is_returned_verbatim() {
        let v = StaticTokenVerifier::new("abc123");
        assert_eq!(v.token(ANALYZE_ACTION).await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn missing_helper_program_is_a_spawn_error() {
        let v = CommandVerifier::new("/nonexistent/workscan-token-helper", "site");
        let err = v.token(ANALYZE_ACTION).await.unwrap_err();
        assert!(matches!(err, VerificationError::Spawn(_)));
    }
}
