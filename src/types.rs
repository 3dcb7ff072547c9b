/// Shared types used across the codebase
///
/// Enumerations are persisted as TEXT columns, so each one round-trips through
/// `as_str` / `FromStr` and row structs keep the raw string.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($name), other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// Account role carried in access tokens
    Role {
        User => "user",
        Coach => "coach",
        Admin => "admin",
    }
}

impl Role {
    /// Coaches author content; admins can do everything coaches can.
    pub fn can_author(&self) -> bool {
        matches!(self, Role::Coach | Role::Admin)
    }
}

text_enum! {
    MeditationMode {
        Audio => "audio",
        Timer => "timer",
        Visual => "visual",
    }
}

text_enum! {
    ExerciseKind {
        Cardio => "cardio",
        Strength => "strength",
        Flexibility => "flexibility",
        Breathing => "breathing",
    }
}

text_enum! {
    ProgramKind {
        Workout => "workout",
        Sleep => "sleep",
        Meditation => "meditation",
    }
}

text_enum! {
    /// What a badge threshold is measured against
    Metric {
        SleepSessions => "sleep_sessions",
        MeditationSessions => "meditation_sessions",
        MeditationMinutes => "meditation_minutes",
        MeditationStreakDays => "meditation_streak_days",
        ExerciseSessions => "exercise_sessions",
        ExerciseMinutes => "exercise_minutes",
        ProgramsCompleted => "programs_completed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip_matches_serde() {
        for metric in Metric::ALL {
            let parsed: Metric = metric.as_str().parse().unwrap();
            assert_eq!(parsed, *metric);
            assert_eq!(serde_json::to_value(metric).unwrap(), metric.as_str());
        }
    }

    #[test]
    fn only_coaches_and_admins_author() {
        assert!(!Role::User.can_author());
        assert!(Role::Coach.can_author());
        assert!(Role::Admin.can_author());
        assert!("root".parse::<Role>().is_err());
    }
}
