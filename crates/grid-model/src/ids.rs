use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for an entity that may not have been acknowledged by the server
/// yet.
///
/// Entities created optimistically on the client carry a locally minted
/// `Temporary` id until the server responds with the real one. Keeping the
/// distinction in the type (rather than a recognizable string prefix) means
/// re-keying has to be explicit: a `Temporary` id can never be confused for a
/// server-issued id, and rendering layers can match on it to show a
/// "creating…" state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityId {
    /// Locally minted placeholder, owned by the mutation that created it.
    Temporary(Uuid),
    /// Server-issued identifier.
    Committed(Uuid),
}

impl EntityId {
    /// Mint a fresh temporary id.
    pub fn mint_temporary() -> Self {
        EntityId::Temporary(Uuid::new_v4())
    }

    pub const fn committed(id: Uuid) -> Self {
        EntityId::Committed(id)
    }

    pub const fn is_temporary(self) -> bool {
        matches!(self, EntityId::Temporary(_))
    }

    /// The underlying uuid, regardless of commit state.
    pub const fn as_uuid(self) -> Uuid {
        match self {
            EntityId::Temporary(id) | EntityId::Committed(id) => id,
        }
    }
}

macro_rules! committed_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

macro_rules! rekeyable_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(pub EntityId);

        impl $name {
            pub fn mint_temporary() -> Self {
                Self(EntityId::mint_temporary())
            }

            pub const fn committed(id: Uuid) -> Self {
                Self(EntityId::committed(id))
            }

            pub const fn is_temporary(self) -> bool {
                self.0.is_temporary()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.as_uuid().fmt(f)
            }
        }
    };
}

committed_id! {
    /// Identifier for a table. Tables are never created optimistically by this
    /// engine, so the id is always server-issued.
    TableId
}

committed_id! {
    /// Identifier for a server-side bulk insert job.
    JobId
}

rekeyable_id! {
    /// Identifier for a column within a table.
    ColumnId
}

rekeyable_id! {
    /// Identifier for a row within a table.
    RowId
}

rekeyable_id! {
    /// Identifier for a saved view over a table.
    ViewId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_and_committed_are_distinct() {
        let raw = Uuid::new_v4();
        assert_ne!(EntityId::Temporary(raw), EntityId::Committed(raw));
        assert_eq!(EntityId::Temporary(raw).as_uuid(), raw);
    }

    #[test]
    fn rekeyable_id_reports_commit_state() {
        let temp = RowId::mint_temporary();
        assert!(temp.is_temporary());
        let real = RowId::committed(Uuid::new_v4());
        assert!(!real.is_temporary());
    }
}
