//! `curio recommend`.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use curio_types::identity::{ProjectId, TaskId, UserId};
use curio_types::request::RecommendationRequest;

use super::RecommendArgs;
use crate::state::AppState;

pub fn build_request(args: RecommendArgs) -> RecommendationRequest {
    RecommendationRequest {
        user_id: UserId::new(args.user),
        query_text: args.query,
        project_id: args.project.map(ProjectId),
        task_id: args.task.map(TaskId),
        technology_profile: args.tech,
        engine_preference: args.engine,
        max_results: args.max_results,
        diversity_weight: args.diversity,
        quality_threshold: args.min_quality,
    }
}

pub async fn recommend(state: &AppState, args: RecommendArgs, json: bool) -> Result<()> {
    let request = build_request(args);
    let outcome = state.recommender.recommend(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!();
    let intent = outcome
        .intent
        .as_ref()
        .map(|i| format!("{} ({:.0}%, {})", i.intent_type, i.confidence * 100.0, i.source))
        .unwrap_or_else(|| "unresolved".to_string());
    println!(
        "  {} {}   {} {}",
        style("Intent").dim(),
        style(intent).bold(),
        style("Engine").dim(),
        style(outcome.engine_used).cyan()
    );
    if outcome.cache_hit {
        println!("  {}", style("served from cache").dim());
    }
    if outcome.degraded {
        println!(
            "  {} some sources were unavailable; results may be less relevant",
            style("!").yellow().bold()
        );
    }
    println!();

    if outcome.is_empty() {
        println!(
            "  {} Nothing matched. Try lowering {} or broadening the query.",
            style("i").blue().bold(),
            style("--min-quality").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Item").fg(Color::White),
        Cell::new("Score").fg(Color::White),
        Cell::new("Why").fg(Color::White),
    ]);

    for (rank, rec) in outcome.recommendations.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1).fg(Color::DarkGrey),
            Cell::new(rec.candidate_id).fg(Color::Cyan),
            Cell::new(format!("{:.3}", rec.score)),
            Cell::new(&rec.reason),
        ]);
    }

    println!("{table}");
    println!();
    Ok(())
}
