//! `curio key set|delete|show`: a user's own LLM API key.

use anyhow::{Result, bail};
use console::style;
use dialoguer::Password;

use curio_types::identity::UserId;
use curio_types::secret::Redacted;

use crate::state::AppState;

/// Store a user's key, prompting with hidden input when no value is given.
///
/// ```bash
/// curio key set --user alice
/// curio key set --user alice --value sk-...
/// ```
pub async fn set_key(state: &AppState, user: &str, value: Option<&str>, json: bool) -> Result<()> {
    let secret = match value {
        Some(v) => v.to_string(),
        None => Password::new()
            .with_prompt(format!("API key for {}", style(user).bold()))
            .interact()?,
    };
    if secret.trim().is_empty() {
        bail!("API key must not be empty");
    }
    let key = Redacted::new(secret.trim());

    state
        .recommender
        .gateway()
        .set_user_key(&UserId::from(user), &key)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"set": true, "user_id": user, "masked": key.masked()})
        );
    } else {
        println!(
            "  {} Key for '{}' stored ({})",
            style("✓").green().bold(),
            style(user).bold(),
            key.masked()
        );
    }
    Ok(())
}

pub async fn delete_key(state: &AppState, user: &str, json: bool) -> Result<()> {
    let existed = state
        .recommender
        .gateway()
        .delete_user_key(&UserId::from(user))
        .await?;

    if json {
        println!("{}", serde_json::json!({"deleted": existed, "user_id": user}));
    } else if existed {
        println!(
            "  {} Key for '{}' deleted; the shared key applies from now on",
            style("✓").green().bold(),
            style(user).bold()
        );
    } else {
        println!("  {} '{}' had no key stored", style("i").blue().bold(), user);
    }
    Ok(())
}

pub async fn show_key(state: &AppState, user: &str, json: bool) -> Result<()> {
    let entry = state
        .recommender
        .gateway()
        .user_key_entry(&UserId::from(user))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    match entry {
        Some(entry) => println!(
            "  {} {} (updated {})",
            style(user).cyan(),
            entry.masked,
            entry.updated_at.format("%Y-%m-%d")
        ),
        None => println!(
            "  {} '{}' has no key; calls use the shared key. Add one with: {}",
            style("i").blue().bold(),
            user,
            style(format!("curio key set --user {user}")).yellow()
        ),
    }
    Ok(())
}
