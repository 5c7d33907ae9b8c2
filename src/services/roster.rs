use anyhow::Result;
use bcrypt::{hash, verify};

use crate::config::Config;
use crate::database::models::Role;
use crate::database::repositories::UserRepository;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Upserts the admin account and every rostered employee. A stored hash is
/// only replaced when the configured password no longer verifies against it,
/// so running this on every start is a no-op once the store is in sync.
pub async fn seed_users(users: &UserRepository, config: &Config) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut accounts = vec![(
        config.admin_username.as_str(),
        config.admin_password.as_str(),
        Role::Admin,
    )];
    accounts.extend(
        config
            .roster
            .iter()
            .map(|(name, employee)| (name.as_str(), employee.password.as_str(), Role::Employee)),
    );

    for (username, password, role) in accounts {
        match users.find_by_username(username).await? {
            None => {
                let password_hash = hash(password, config.bcrypt_cost)?;
                users.create_user(username, &password_hash, role).await?;
                log::info!("Seeded {} account {}", role, username);
                summary.created += 1;
            }
            Some(existing) if !verify(password, &existing.password_hash).unwrap_or(false) => {
                let password_hash = hash(password, config.bcrypt_cost)?;
                users.update_password(existing.id, &password_hash).await?;
                log::info!("Updated password for {}", username);
                summary.updated += 1;
            }
            Some(_) => summary.unchanged += 1,
        }
    }

    Ok(summary)
}
