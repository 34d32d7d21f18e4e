use anyhow::{anyhow, bail, Result};
use rand::{distr::Alphanumeric, RngExt};

/// Password hashing on the blocking pool; bcrypt is deliberately slow.
pub struct PasswordService;

impl PasswordService {
    pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| anyhow!("password hashing task failed: {e}"))?
            .map_err(|e| anyhow!("password hashing failed: {e}"))
    }

    pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| anyhow!("password verification task failed: {e}"))?
            .map_err(|e| anyhow!("password verification failed: {e}"))
    }

    pub fn validate_password_strength(password: &str, min_length: usize) -> Result<()> {
        if password.chars().count() < min_length {
            bail!("Password must be at least {min_length} characters long");
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            bail!("Password must contain at least one digit");
        }
        if !password.chars().any(|c| c.is_alphabetic()) {
            bail!("Password must contain at least one letter");
        }
        Ok(())
    }

    /// Temporary password handed out when an admin creates an account.
    pub fn generate_temporary_password() -> String {
        let body: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        // Guarantee the strength rules hold regardless of what was sampled.
        format!("{body}a7")
    }
}
