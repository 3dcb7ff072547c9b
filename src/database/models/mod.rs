pub mod badge;
pub mod catalog;
pub mod exercise;
pub mod meditation;
pub mod program;
pub mod sleep;
pub mod user;

pub use badge::{Badge, BadgeStatus, EarnedBadge};
pub use catalog::{Category, CategoryTranslation, LocalizedCategory, LocalizedResource};
pub use exercise::{ExerciseContent, ExerciseSession, EXERCISE_CONTENTS, EXERCISE_SESSIONS};
pub use meditation::{MeditationContent, MeditationSession, MeditationType, MEDITATION_CONTENTS, MEDITATION_SESSIONS};
pub use program::{Program, ProgramDay, UserProgram, PROGRAMS, USER_PROGRAMS};
pub use sleep::{SleepSession, SLEEP_SESSIONS};
pub use user::User;
