//! Closed vocabularies shared by every table.
//!
//! Each enum serializes to the exact string stored in the database and
//! exchanged with the frontend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// All values, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::validation_field(
                        stringify!($name),
                        format!("unknown value '{other}'"),
                    )),
                }
            }
        }
    };
}

string_enum! {
    /// Account role, stored on the profile.
    #[derive(Default)]
    Role {
        /// Regular trainee
        #[default]
        Student => "student",
        /// Staff with access to every student's data
        Admin => "admin",
    }
}

string_enum! {
    /// Academic year of a student.
    #[derive(Default)]
    Level {
        /// Fourth year
        Fourth => "4e",
        /// Fifth year
        Fifth => "5e",
        /// Anything else, and the default for new profiles
        #[default]
        Other => "autre",
    }
}

string_enum! {
    /// Interface and simulation language.
    #[derive(Default)]
    Language {
        /// French
        #[default]
        Fr => "fr",
        /// English
        En => "en",
    }
}

string_enum! {
    /// Lifecycle of a simulated session.
    SessionStatus {
        /// Not yet reachable
        Locked => "locked",
        /// Next session to start
        Available => "available",
        /// Started, transcript growing
        InProgress => "in_progress",
        /// Ended by the student
        Completed => "completed",
    }
}

string_enum! {
    /// Hidden difficulty of the simulated patient.
    Difficulty {
        /// Cooperative patient
        L1 => "L1",
        /// Moderately guarded patient
        L2 => "L2",
        /// Reluctant patient
        L3 => "L3",
    }
}

string_enum! {
    /// Whether (and when) the scenario calls for referring the patient elsewhere.
    Reorientation {
        /// No referral expected
        None => "none",
        /// Referral expected during the session
        Immediate => "immediate",
        /// Referral expected after follow-up
        Delayed => "delayed",
    }
}

string_enum! {
    /// Gender of the simulated patient.
    Gender {
        /// Female patient
        Female => "female",
        /// Male patient
        Male => "male",
    }
}

string_enum! {
    /// Author of a transcript message.
    MessageRole {
        /// The trainee
        Student => "student",
        /// The simulated patient
        Patient => "patient",
    }
}

impl SessionStatus {
    /// Returns `true` if the session can receive chat messages.
    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Available | SessionStatus::InProgress)
    }
}
