//! Query builder (QB) for MySQL statements.
//!
//! Statements are assembled from thirteen clause slots (count, select, update,
//! insert, delete, set, from, join, where, group by, order by, limit, offset)
//! that are concatenated in that fixed order. Identifiers travel as `??`
//! params and values as `?` params, so the output can be handed to any
//! MySQL driver that understands both placeholder kinds.
//!
//! # Usage
//!
//! ```ignore
//! use myorm::qb::{JoinType, OrderBy, SqlBuilder};
//! use myorm::{Op, Where};
//!
//! let qb = SqlBuilder::new();
//!
//! // SELECT with a join and pagination
//! let q = qb
//!     .select(["u.*", "o.total"])?
//!     .from("users u")?
//!     .join(JoinType::Left, "orders o", "o.user_id = u.id")?
//!     .where_(Where::new().op("u.age", Op::gte(18)))?
//!     .order_by([OrderBy::desc("u.ctime")])
//!     .limit(20)
//!     .offset(40)
//!     .build_query();
//!
//! // UPDATE with an increment
//! let q = qb
//!     .update("accounts")?
//!     .set(myorm::UpdateValues::new().increment("balance", 5))?
//!     .where_(Where::new().eq("id", 7))?
//!     .build_query();
//!
//! // DELETE (an empty condition is rejected)
//! let q = qb.delete_from("sessions")?.where_(Where::new().eq("expired", true))?;
//! ```

mod clause;
mod compile;
mod field;
mod mutation;
mod query;
mod stage;

pub use clause::{BuildOptions, BuiltQuery, Clause};
pub use field::{Field, Fields, IntoFields};
pub use mutation::{
    Assign, InsertOptions, IntoAssignments, IntoRows, Timestamp, UpdateOptions, UpdateValues,
};
pub use query::{Direction, JoinType, OrderBy, Query, SqlBuilder};
pub use stage::{
    Assigned, Deleting, Filtered, GroupByStep, Grouped, Inserted, LimitStep, Limited,
    MutationFiltered, MutationLimited, MutationOrdered, OrderByStep, Ordered, Paged, Projected,
    Sourced, Stage, Updating, WhereStep,
};

#[cfg(test)]
mod tests;
