//! Builder stages.
//!
//! Each marker names a grammatical position in a statement. The step traits
//! below say which clause may follow a position and where it leads, so an
//! out-of-order chain such as `offset()` before `limit()` does not compile.
//!
//! ```text
//! SELECT: Projected -from-> Sourced -join*-> Sourced -where-> Filtered
//!         -group_by-> Grouped -order_by-> Ordered -limit-> Limited -offset-> Paged
//! UPDATE: Updating -set-> Assigned -where-> MutationFiltered
//!         -order_by-> MutationOrdered -limit-> MutationLimited
//! DELETE: Deleting -where-> MutationFiltered -> ... (as UPDATE)
//! INSERT: Inserted
//! ```
//!
//! Optional clauses can be skipped: every step trait is also implemented for
//! the earlier positions it may follow.

mod sealed {
    pub trait Sealed {}
}

/// A builder position.
pub trait Stage: sealed::Sealed {}

macro_rules! stages {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;
            impl sealed::Sealed for $name {}
            impl Stage for $name {}
        )*
    };
}

stages!(
    /// After `select`/`count`/aggregates; needs `from`.
    Projected,
    /// After `from` or `join`.
    Sourced,
    /// After `where_` on a SELECT.
    Filtered,
    /// After `group_by`.
    Grouped,
    /// After `order_by` on a SELECT.
    Ordered,
    /// After `limit` on a SELECT.
    Limited,
    /// After `offset`.
    Paged,
    /// After `update(table)`; needs `set`.
    Updating,
    /// After `set` or `update_with`.
    Assigned,
    /// After `insert`.
    Inserted,
    /// After `delete_from`.
    Deleting,
    /// After `where_` on an UPDATE or DELETE.
    MutationFiltered,
    /// After `order_by` on an UPDATE or DELETE.
    MutationOrdered,
    /// After `limit` on an UPDATE or DELETE.
    MutationLimited,
);

/// Positions that accept `where_`.
pub trait WhereStep: Stage {
    type Next: Stage;
    /// Reject an empty condition instead of omitting the clause.
    const GUARDED: bool;
}

/// Positions that accept `group_by`.
pub trait GroupByStep: Stage {
    type Next: Stage;
}

/// Positions that accept `order_by`.
pub trait OrderByStep: Stage {
    type Next: Stage;
}

/// Positions that accept `limit`.
pub trait LimitStep: Stage {
    type Next: Stage;
}

macro_rules! step {
    ($trait:ident => $next:ident: $($from:ident),+) => {
        $(impl $trait for $from {
            type Next = $next;
        })+
    };
}

impl WhereStep for Sourced {
    type Next = Filtered;
    const GUARDED: bool = false;
}

impl WhereStep for Assigned {
    type Next = MutationFiltered;
    const GUARDED: bool = true;
}

impl WhereStep for Deleting {
    type Next = MutationFiltered;
    const GUARDED: bool = true;
}

step!(GroupByStep => Grouped: Sourced, Filtered);
step!(OrderByStep => Ordered: Sourced, Filtered, Grouped);
step!(OrderByStep => MutationOrdered: Assigned, Deleting, MutationFiltered);
step!(LimitStep => Limited: Sourced, Filtered, Grouped, Ordered);
step!(LimitStep => MutationLimited: Assigned, Deleting, MutationFiltered, MutationOrdered);
