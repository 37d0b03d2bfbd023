//! Status helper enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table. Variants also carry a
//! lowercase wire name used in JSON payloads and query-string filters.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Lowercase name used on the wire.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire ),+
                }
            }

            /// Resolve a database status ID back to a variant.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Parse a lowercase wire name (query filters, request bodies).
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $wire => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Dataset lifecycle status.
    DatasetStatus {
        Pending = 1 => "pending",
        Downloading = 2 => "downloading",
        Completed = 3 => "completed",
        Failed = 4 => "failed",
    }
}

define_status_enum! {
    /// Download lease (task) status.
    TaskStatus {
        Active = 1 => "active",
        Timeout = 2 => "timeout",
        Failed = 3 => "failed",
        Completed = 4 => "completed",
    }
}

impl DatasetStatus {
    /// Legal lifecycle transitions.
    ///
    /// pending -> downloading (lease grant), downloading -> pending (lease
    /// timeout), downloading -> completed/failed (verified completion), and
    /// failed -> pending (manual reset).
    pub fn can_transition_to(self, next: DatasetStatus) -> bool {
        matches!(
            (self, next),
            (DatasetStatus::Pending, DatasetStatus::Downloading)
                | (DatasetStatus::Downloading, DatasetStatus::Pending)
                | (DatasetStatus::Downloading, DatasetStatus::Completed)
                | (DatasetStatus::Downloading, DatasetStatus::Failed)
                | (DatasetStatus::Failed, DatasetStatus::Pending)
        )
    }

    /// Whether a manual reset to PENDING is allowed from this status.
    ///
    /// Resetting an already-pending dataset is an idempotent no-op;
    /// DOWNLOADING and COMPLETED are never directly resettable.
    pub fn is_resettable(self) -> bool {
        matches!(self, DatasetStatus::Pending | DatasetStatus::Failed)
    }
}

impl TaskStatus {
    /// Legal lifecycle transitions. ACTIVE is the only non-terminal status.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Active, TaskStatus::Timeout)
                | (TaskStatus::Active, TaskStatus::Failed)
                | (TaskStatus::Active, TaskStatus::Completed)
        )
    }
}
