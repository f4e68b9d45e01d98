//! `curio invalidate`.

use anyhow::Result;
use console::style;

use curio_types::identity::UserId;

use crate::state::AppState;

pub async fn invalidate(state: &AppState, user: &str, json: bool) -> Result<()> {
    let removed = state.recommender.invalidate_user_cache(&UserId::from(user)).await;

    if json {
        println!("{}", serde_json::json!({"user_id": user, "invalidated": removed}));
    } else {
        println!(
            "  {} Cleared {} cached list{} for {}",
            style("✓").green().bold(),
            style(removed).bold(),
            if removed == 1 { "" } else { "s" },
            style(user).cyan()
        );
    }
    Ok(())
}
