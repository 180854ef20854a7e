//! Task library and custom task commands.

use clap::Subcommand;
use homeflow_core::task::custom::suggest_intensity_levels;
use homeflow_core::{CustomTaskDraft, CustomTaskPatch, EffortLevel, ImpactLevel, Task, TaskCategory};

use super::Context;

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks available to you
    List {
        /// Only your own tasks
        #[arg(long)]
        custom: bool,
        /// Filter by room
        #[arg(long)]
        room: Option<String>,
    },
    /// Show task details
    Show {
        /// Task ID
        id: String,
    },
    /// Create a custom task
    Create {
        /// Task title
        title: String,
        /// Task description
        #[arg(long, default_value = "")]
        description: String,
        /// Room the task belongs to
        #[arg(long)]
        room: Option<String>,
        /// cleaning, organizing, shopping or maintenance
        #[arg(long, default_value = "cleaning")]
        category: TaskCategory,
        /// Estimated minutes
        #[arg(long, default_value = "10")]
        minutes: u32,
        /// Step, repeatable
        #[arg(long = "step")]
        steps: Vec<String>,
        /// Add basic/standard/deep levels derived from the estimate
        #[arg(long)]
        tiers: bool,
    },
    /// Update a custom task
    Update {
        /// Task ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        room: Option<String>,
        #[arg(long)]
        category: Option<TaskCategory>,
        #[arg(long)]
        minutes: Option<u32>,
        #[arg(long)]
        effort: Option<EffortLevel>,
        #[arg(long)]
        impact: Option<ImpactLevel>,
    },
    /// Delete a custom task
    Delete {
        /// Task ID
        id: String,
    },
}

fn summary(task: &Task) -> String {
    let mut flags = Vec::new();
    if task.is_micro_task {
        flags.push("micro");
    }
    if task.is_custom() {
        flags.push("custom");
    }
    format!(
        "{:<36} {:<28} {:>3} min  {}/{}  {}",
        task.id,
        task.title,
        task.estimated_minutes,
        task.effort,
        task.impact,
        flags.join(",")
    )
}

fn detail(task: &Task) -> String {
    let mut out = format!(
        "{}\n  id: {}\n  category: {}\n  room: {}\n  estimate: {} min\n  effort: {}\n  impact: {}",
        task.title,
        task.id,
        task.category,
        task.room.as_deref().unwrap_or("-"),
        task.estimated_minutes,
        task.effort,
        task.impact
    );
    if !task.description.is_empty() {
        out.push_str(&format!("\n  {}", task.description));
    }
    for (i, step) in task.steps.iter().enumerate() {
        out.push_str(&format!("\n  {}. {step}", i + 1));
    }
    if let Some(levels) = &task.intensity_levels {
        for (name, level) in [("basic", &levels.basic), ("standard", &levels.standard), ("deep", &levels.deep)] {
            out.push_str(&format!("\n  {name}: {} ({} min)", level.description, level.minutes));
        }
    }
    out
}

pub async fn run(ctx: &Context, action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = &ctx.engine;
    let user = ctx.user.as_str();

    match action {
        TaskAction::List { custom, room } => {
            let tasks = if custom {
                engine.list_custom_tasks(user).await?
            } else {
                engine.tasks_for(user).await?
            };
            let filtered: Vec<Task> = tasks
                .into_iter()
                .filter(|t| room.is_none() || t.room == room)
                .collect();
            ctx.emit(&filtered, || {
                filtered.iter().map(summary).collect::<Vec<_>>().join("\n")
            })?;
        }
        TaskAction::Show { id } => {
            let task = engine.find_task(user, &id).await?;
            ctx.emit(&task, || detail(&task))?;
        }
        TaskAction::Create {
            title,
            description,
            room,
            category,
            minutes,
            steps,
            tiers,
        } => {
            let draft = CustomTaskDraft {
                title,
                description,
                room,
                category,
                estimated_minutes: minutes,
                steps,
                intensity_levels: tiers.then(|| suggest_intensity_levels(minutes)),
            };
            let task = engine.create_custom_task(user, draft, ctx.now).await?;
            ctx.emit(&task, || format!("Task created: {}\n{}", task.id, detail(&task)))?;
        }
        TaskAction::Update {
            id,
            title,
            description,
            room,
            category,
            minutes,
            effort,
            impact,
        } => {
            let patch = CustomTaskPatch {
                title,
                description,
                room,
                category,
                estimated_minutes: minutes,
                effort,
                impact,
                ..Default::default()
            };
            let task = engine.update_custom_task(user, &id, patch, ctx.now).await?;
            ctx.emit(&task, || format!("Task updated:\n{}", detail(&task)))?;
        }
        TaskAction::Delete { id } => {
            engine.delete_custom_task(user, &id).await?;
            ctx.emit(&serde_json::json!({ "deleted": id }), || format!("Task deleted: {id}"))?;
        }
    }
    Ok(())
}
