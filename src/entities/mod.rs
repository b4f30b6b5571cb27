//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod completion;
pub mod habit;
pub mod progress;

// Re-export specific types to avoid conflicts
pub use completion::{
    Column as CompletionColumn, Entity as Completion, Model as CompletionModel,
};
pub use habit::{Column as HabitColumn, Entity as Habit, Model as HabitModel};
pub use progress::{Column as ProgressColumn, Entity as Progress, Model as ProgressModel};
