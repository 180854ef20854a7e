//! Built-in starter library, loaded into an empty catalog.

use crate::task::{EffortLevel, ImpactLevel, IntensityDetail, IntensityLevels, Task, TaskCategory};

use EffortLevel::{Low, Medium, Micro};
use ImpactLevel::High as HighImpact;
use ImpactLevel::Low as LowImpact;
use ImpactLevel::Medium as MediumImpact;
use TaskCategory::{Cleaning, Organizing, Shopping};

fn levels(basic: (&str, u32), standard: (&str, u32), deep: (&str, u32)) -> IntensityLevels {
    IntensityLevels {
        basic: IntensityDetail::new(basic.0, basic.1),
        standard: IntensityDetail::new(standard.0, standard.1),
        deep: IntensityDetail::new(deep.0, deep.1),
    }
}

/// The default household task library.
pub fn default_catalog() -> Vec<Task> {
    vec![
        // bedroom
        Task::new("task_bedroom_make_bed", "Make the bed", Organizing, 2, Micro, HighImpact)
            .in_room("bedroom")
            .with_description("Pull up the covers so the bed looks done")
            .micro()
            .with_steps(["Straighten the sheet", "Pull up the duvet", "Place the pillows"])
            .with_intensity(levels(
                ("Just pull up the duvet", 1),
                ("Sheet, duvet and pillows", 2),
                ("Change the pillowcases too", 5),
            )),
        Task::new("task_bedroom_nightstand", "Tidy the nightstand", Organizing, 3, Micro, MediumImpact)
            .in_room("bedroom")
            .micro()
            .with_movement()
            .with_intensity(levels(
                ("Take one thing away", 1),
                ("Clear the surface", 3),
                ("Clear and wipe the drawer", 8),
            )),
        Task::new("task_bedroom_closet", "Organize the closet", Organizing, 15, Medium, HighImpact)
            .in_room("bedroom")
            .with_description("Put clothes back where they belong")
            .with_decisions()
            .with_movement()
            .with_intensity(levels(
                ("Fold one shelf", 5),
                ("Fold and hang what is out", 15),
                ("Sort out clothes you no longer wear", 30),
            )),
        // bathroom
        Task::new("task_bathroom_sink", "Clean the sink", Cleaning, 3, Micro, MediumImpact)
            .in_room("bathroom")
            .micro()
            .with_intensity(levels(
                ("Rinse the basin", 1),
                ("Basin and tap", 3),
                ("Basin, tap and drain", 7),
            )),
        Task::new("task_bathroom_mirror", "Wipe the mirror", Cleaning, 2, Micro, MediumImpact)
            .in_room("bathroom")
            .micro()
            .with_intensity(levels(("Spot clean", 1), ("Whole mirror", 2), ("Mirror and frame", 5))),
        Task::new("task_bathroom_toilet", "Clean the toilet", Cleaning, 5, Low, HighImpact)
            .in_room("bathroom")
            .with_steps(["Apply cleaner", "Scrub the bowl", "Wipe the seat and lid"]),
        Task::new("task_bathroom_towels", "Straighten the towels", Organizing, 2, Micro, LowImpact)
            .in_room("bathroom")
            .micro(),
        Task::new("task_bathroom_shower", "Clean the shower", Cleaning, 12, Medium, HighImpact)
            .in_room("bathroom")
            .with_movement()
            .with_intensity(levels(
                ("Rinse the walls", 5),
                ("Scrub walls and floor", 12),
                ("Scrub grout and screen", 25),
            )),
        // kitchen
        Task::new("task_kitchen_dishes", "Wash the dishes", Cleaning, 10, Low, HighImpact)
            .in_room("kitchen")
            .with_intensity(levels(
                ("Just the glasses", 3),
                ("Everything in the sink", 10),
                ("Dishes and dry them away", 20),
            )),
        Task::new("task_kitchen_counter", "Wipe the counter", Cleaning, 5, Micro, HighImpact)
            .in_room("kitchen")
            .with_movement(),
        Task::new("task_kitchen_stove", "Clean the stove top", Cleaning, 8, Low, HighImpact)
            .in_room("kitchen"),
        Task::new("task_kitchen_floor", "Sweep the floor", Cleaning, 5, Low, MediumImpact)
            .in_room("kitchen")
            .with_movement(),
        Task::new("task_kitchen_fridge", "Organize the fridge", Organizing, 15, Medium, HighImpact)
            .in_room("kitchen")
            .with_decisions()
            .with_movement(),
        // living room
        Task::new("task_living_cushions", "Arrange the cushions", Organizing, 2, Micro, LowImpact)
            .in_room("living_room")
            .micro(),
        Task::new("task_living_objects", "Pick up loose objects", Organizing, 5, Low, HighImpact)
            .in_room("living_room")
            .with_movement(),
        // errands
        Task::new("task_shopping_list", "Write the shopping list", Shopping, 5, Low, MediumImpact)
            .with_decisions(),
    ]
}
