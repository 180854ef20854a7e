use clap::Args;
use homeflow_core::{Barrier, Intention, TimeBudget, UserState};

use super::Context;

#[derive(Args)]
pub struct RecommendArgs {
    /// overwhelmed, have_energy, hard_to_start, need_planning or need_shopping
    intention: Intention,
    /// What makes starting hard (with hard_to_start)
    #[arg(long)]
    barrier: Option<Barrier>,
    /// Time available: 5-10, 15-20, 30+ or unsure
    #[arg(long)]
    time: Option<TimeBudget>,
}

pub async fn run(ctx: &Context, args: RecommendArgs) -> Result<(), Box<dyn std::error::Error>> {
    let state = UserState {
        intention: args.intention,
        barrier: args.barrier,
        time_budget: args.time,
    };
    let rec = ctx.engine.recommend(&ctx.user, &state, ctx.now).await?;

    ctx.emit(&rec, || {
        let mut out = format!("Strategy: {}", rec.strategy.name);
        if let Some(text) = rec.strategy.messaging.as_ref().and_then(|m| m.pre_task.as_deref()) {
            out.push_str(&format!("\n{text}"));
        }
        if rec.tasks.is_empty() {
            out.push_str("\nNo matching tasks right now.");
        }
        for (i, scored) in rec.tasks.iter().enumerate() {
            out.push_str(&format!(
                "\n{}. {} ({} min) [{}] score {:.0}",
                i + 1,
                scored.task.title,
                scored.task.estimated_minutes,
                scored.task.id,
                scored.score
            ));
            if let Some(reason) = &scored.reason {
                out.push_str(&format!("\n   {reason}"));
            }
        }
        out
    })
}

pub async fn tiny(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let task = ctx.engine.tiny_task(&ctx.user).await?;
    ctx.emit(&task, || match &task {
        Some(task) => format!("{} ({} min) [{}]", task.title, task.estimated_minutes, task.id),
        None => "No tiny tasks available.".to_string(),
    })
}
