use clap::Subcommand;
use homeflow_core::{Room, RoomPriority};

use super::Context;

#[derive(Subcommand)]
pub enum RoomAction {
    /// Add a room or change its priority
    Set {
        /// Room type, e.g. kitchen
        kind: String,
        /// high, medium or low
        #[arg(long, default_value = "medium")]
        priority: RoomPriority,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
    /// List your rooms
    List,
    /// Record that work was done in a room
    Serviced {
        /// Room type
        kind: String,
    },
}

pub async fn run(ctx: &Context, action: RoomAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = &ctx.engine;
    let user = ctx.user.as_str();

    match action {
        RoomAction::Set { kind, priority, name } => {
            let existing = engine.rooms(user).await?.into_iter().find(|r| r.kind == kind);
            let mut room = match existing {
                Some(mut room) => {
                    room.priority = priority;
                    room
                }
                None => Room::new(user, kind, priority),
            };
            if let Some(name) = name {
                room.name = name;
            }
            engine.upsert_room(&room).await?;
            ctx.emit(&room, || format!("{} set to {} priority", room.name, room.priority))?;
        }
        RoomAction::List => {
            let rooms = engine.rooms(user).await?;
            ctx.emit(&rooms, || {
                rooms
                    .iter()
                    .map(|r| {
                        let serviced = match r.days_since_serviced(ctx.now) {
                            Some(days) => format!("{days} day(s) ago"),
                            None => "never".to_string(),
                        };
                        format!("{:<16} {:<7} last serviced {serviced}", r.name, r.priority.as_str())
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        RoomAction::Serviced { kind } => {
            if !engine.mark_room_serviced(user, &kind, ctx.now).await? {
                return Err(format!("unknown room: {kind}").into());
            }
            ctx.emit(&serde_json::json!({ "serviced": kind }), || format!("{kind} marked as serviced"))?;
        }
    }
    Ok(())
}
