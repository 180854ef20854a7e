use clap::Subcommand;
use serde_json::json;

use super::Context;

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Streak, totals and weekly points
    Show,
    /// Points this week against the goal
    Weekly,
    /// Tasks completed today
    Today,
    /// What has been learned about you
    Insights,
    /// Set the weekly points goal
    Goal {
        /// Points per week
        points: u32,
    },
}

pub async fn run(ctx: &Context, action: ProgressAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = &ctx.engine;
    let user = ctx.user.as_str();

    match action {
        ProgressAction::Show => {
            let progress = engine.progress(user).await?;
            let streak = engine.current_streak(user, ctx.now).await?;
            let weekly = engine.weekly_progress(user, ctx.now).await?;
            let value = json!({
                "progress": progress,
                "current_streak": streak,
                "weekly": weekly,
            });
            ctx.emit(&value, || {
                format!(
                    "Streak: {streak} (longest {})\nCompleted: {}\nThis week: {}/{} points ({:.0}%)",
                    progress.longest_streak.max(streak),
                    progress.total_tasks_completed,
                    weekly.weekly_points,
                    weekly.weekly_goal,
                    weekly.percentage
                )
            })?;
        }
        ProgressAction::Weekly => {
            let weekly = engine.weekly_progress(user, ctx.now).await?;
            ctx.emit(&weekly, || {
                format!(
                    "{}/{} points ({:.0}%)",
                    weekly.weekly_points, weekly.weekly_goal, weekly.percentage
                )
            })?;
        }
        ProgressAction::Today => {
            let count = engine.completed_today(user, ctx.now).await?;
            ctx.emit(&json!({ "completed_today": count }), || {
                format!("{count} task(s) completed today")
            })?;
        }
        ProgressAction::Insights => {
            let insights = engine.insights(user).await?;
            ctx.emit(&insights, || {
                if insights.is_empty() {
                    "Keep going, insights appear after a few tasks.".to_string()
                } else {
                    insights
                        .iter()
                        .map(|i| format!("- {}", i.message))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            })?;
        }
        ProgressAction::Goal { points } => {
            let progress = engine.set_weekly_goal(user, points).await?;
            ctx.emit(&progress, || format!("Weekly goal set to {}", progress.weekly_goal))?;
        }
    }
    Ok(())
}
