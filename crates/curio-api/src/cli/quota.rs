//! `curio quota`.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use curio_types::identity::UserId;

use crate::state::AppState;

pub async fn show_quota(state: &AppState, user: &str, json: bool) -> Result<()> {
    let user_id = UserId::from(user);
    let status = state.recommender.get_quota_status(&user_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} quota for {} ({} key)",
        style("LLM").bold(),
        style(&status.user_id).cyan(),
        status.key_source
    );
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Window").fg(Color::White),
        Cell::new("Used").fg(Color::White),
        Cell::new("Limit").fg(Color::White),
        Cell::new("Remaining").fg(Color::White),
        Cell::new("Resets").fg(Color::White),
    ]);

    for usage in status.windows() {
        let remaining = usage.remaining();
        table.add_row(vec![
            Cell::new(usage.window),
            Cell::new(usage.used),
            Cell::new(usage.limit),
            Cell::new(remaining).fg(if remaining == 0 { Color::Red } else { Color::Green }),
            Cell::new(usage.resets_at.format("%Y-%m-%d %H:%M:%S UTC")).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    println!();
    Ok(())
}
