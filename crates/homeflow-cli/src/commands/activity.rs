use clap::Args;
use homeflow_core::{CompleteTask, Intention, Mood};

use super::{parse_mood, Context};

#[derive(Args)]
pub struct StartArgs {
    /// Task ID
    task_id: String,
    /// Mood before starting, 1 (very bad) to 5 (very good)
    #[arg(long, value_parser = parse_mood)]
    mood: Mood,
    /// Intention the task was recommended for
    #[arg(long)]
    route: Option<Intention>,
}

#[derive(Args)]
pub struct CompleteArgs {
    /// Activity log ID printed by `start`
    log_id: String,
    /// Mood after finishing, 1 (very bad) to 5 (very good)
    #[arg(long, value_parser = parse_mood)]
    mood: Mood,
    /// Minutes spent; measured from the start time when omitted
    #[arg(long)]
    minutes: Option<u32>,
}

pub async fn start(ctx: &Context, args: StartArgs) -> Result<(), Box<dyn std::error::Error>> {
    let log = ctx
        .engine
        .start_task(&ctx.user, &args.task_id, args.mood, args.route, ctx.now)
        .await?;
    ctx.emit(&log, || format!("Started {}. Log: {}", log.task_id, log.id))
}

pub async fn complete(ctx: &Context, args: CompleteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = ctx
        .engine
        .complete_task(
            &ctx.user,
            CompleteTask {
                log_id: args.log_id,
                mood_after: args.mood,
                actual_minutes: args.minutes,
            },
            ctx.now,
        )
        .await?;

    ctx.emit(&outcome, || {
        let mut out = format!(
            "+{} points. Streak: {} day(s). This week: {} points.",
            outcome.points, outcome.current_streak, outcome.weekly_points
        );
        if outcome.mood_delta > 0 {
            out.push_str(&format!("\nMood up by {}.", outcome.mood_delta));
        }
        out
    })
}
