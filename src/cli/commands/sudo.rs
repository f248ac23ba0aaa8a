use anyhow::{anyhow, bail};
use clap::Args;
use serde_json::json;

use crate::auth::password::hash_password;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::Role;
use crate::database::users::NewUser;
use crate::database::{DatabaseManager, UserRepository};
use crate::services::user_service::{clean_email, clean_username};

/// Flags fall back to the SUDO_* environment variables
#[derive(Args, Debug)]
pub struct SetupSudoArgs {
    #[arg(long, env = "SUDO_USERNAME", help = "Username of the SUDO account")]
    pub username: Option<String>,

    #[arg(long, env = "SUDO_EMAIL", help = "Email of the SUDO account")]
    pub email: Option<String>,

    #[arg(long, env = "SUDO_PASSWORD", hide_env_values = true, help = "Password of the SUDO account")]
    pub password: Option<String>,

    #[arg(long, help = "Leave the email unconfirmed (login stays blocked until confirmed)")]
    pub unconfirmed: bool,
}

pub async fn handle(args: SetupSudoArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let users = UserRepository::new(DatabaseManager::main_pool().await?);

    if let Some(existing) = users.find_sudo().await? {
        return output_success(
            &output_format,
            &format!("A SUDO user already exists ({}); nothing changed", existing.username),
            Some(json!({ "created": false, "id": existing.id, "username": existing.username })),
        );
    }

    let new_user = build_sudo(args)?;
    let user = users.create(&new_user).await?;
    tracing::info!(target: "audit", user_id = user.id, "SUDO user created from CLI");

    output_success(
        &output_format,
        &format!("SUDO user \"{}\" created", user.username),
        Some(json!({ "created": true, "id": user.id, "username": user.username })),
    )
}

fn build_sudo(args: SetupSudoArgs) -> anyhow::Result<NewUser> {
    let (Some(username), Some(email), Some(password)) = (args.username, args.email, args.password) else {
        bail!("SUDO_USERNAME, SUDO_EMAIL and SUDO_PASSWORD must all be set (or passed as flags)");
    };
    if password.is_empty() {
        bail!("SUDO password may not be empty");
    }

    let username = clean_username(&username).map_err(|e| anyhow!("username: {e}"))?;
    let email = clean_email(&email).map_err(|e| anyhow!("email: {e}"))?;

    Ok(NewUser {
        username,
        email,
        password_hash: hash_password(&password)?,
        first_name: String::new(),
        last_name: String::new(),
        role: Role::Sudo,
        is_email_confirmed: !args.unconfirmed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(username: Option<&str>, email: Option<&str>, password: Option<&str>) -> SetupSudoArgs {
        SetupSudoArgs {
            username: username.map(str::to_string),
            email: email.map(str::to_string),
            password: password.map(str::to_string),
            unconfirmed: false,
        }
    }

    #[test]
    fn builds_confirmed_sudo() {
        let user = build_sudo(args(Some(" root "), Some("Root@Example.com"), Some("s3cret-pass"))).unwrap();
        assert_eq!(user.username, "root");
        assert_eq!(user.email, "root@example.com");
        assert_eq!(user.role, Role::Sudo);
        assert!(user.is_email_confirmed);
        assert!(bcrypt::verify("s3cret-pass", &user.password_hash).unwrap());
    }

    #[test]
    fn requires_all_credentials() {
        assert!(build_sudo(args(Some("root"), None, Some("pw"))).is_err());
        assert!(build_sudo(args(Some("root"), Some("root@example.com"), Some(""))).is_err());
        assert!(build_sudo(args(Some("root"), Some("not-an-email"), Some("pw"))).is_err());
    }
}
