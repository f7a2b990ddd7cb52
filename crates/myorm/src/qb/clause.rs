//! Clause slots and statement assembly.

use crate::format::format_query;
use crate::value::Value;

/// The thirteen clause slots, in assembly order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ClauseKind {
    Count,
    Select,
    Update,
    Insert,
    Delete,
    Set,
    From,
    Join,
    Where,
    GroupBy,
    OrderBy,
    Limit,
    Offset,
}

impl ClauseKind {
    pub(crate) const ORDER: [ClauseKind; 13] = [
        ClauseKind::Count,
        ClauseKind::Select,
        ClauseKind::Update,
        ClauseKind::Insert,
        ClauseKind::Delete,
        ClauseKind::Set,
        ClauseKind::From,
        ClauseKind::Join,
        ClauseKind::Where,
        ClauseKind::GroupBy,
        ClauseKind::OrderBy,
        ClauseKind::Limit,
        ClauseKind::Offset,
    ];

    /// Statement heads start the SQL text; every other slot is preceded by a space.
    fn is_head(self) -> bool {
        matches!(
            self,
            ClauseKind::Count
                | ClauseKind::Select
                | ClauseKind::Update
                | ClauseKind::Insert
                | ClauseKind::Delete
        )
    }
}

/// SQL text plus the params for its placeholders, left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Clause {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// One owned [`Clause`] per [`ClauseKind`].
#[derive(Debug, Clone, Default)]
pub(crate) struct ClauseSet {
    slots: [Clause; 13],
}

impl ClauseSet {
    pub(crate) fn set(&mut self, kind: ClauseKind, clause: Clause) {
        self.slots[kind as usize] = clause;
    }

    /// Append to a slot, separating fragments with a space.
    pub(crate) fn append(&mut self, kind: ClauseKind, clause: Clause) {
        let slot = &mut self.slots[kind as usize];
        if !slot.sql.is_empty() {
            slot.sql.push(' ');
        }
        slot.sql.push_str(&clause.sql);
        slot.params.extend(clause.params);
    }

    #[cfg(test)]
    pub(crate) fn get(&self, kind: ClauseKind) -> &Clause {
        &self.slots[kind as usize]
    }

    /// Concatenate populated slots in [`ClauseKind::ORDER`].
    pub(crate) fn assemble(&self) -> BuiltQuery {
        let mut sql = String::new();
        let mut params = Vec::new();
        for kind in ClauseKind::ORDER {
            let clause = &self.slots[kind as usize];
            if clause.is_empty() {
                continue;
            }
            if !kind.is_head() && !sql.is_empty() {
                sql.push(' ');
            }
            sql.push_str(&clause.sql);
            params.extend(clause.params.iter().cloned());
        }
        BuiltQuery { sql, params }
    }
}

/// Options for `build_query_with`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Inline params into the SQL text. The result carries no params and is
    /// meant for display only.
    pub format: bool,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: bool) -> Self {
        self.format = format;
        self
    }
}

/// A finished statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl BuiltQuery {
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    /// The statement with params inlined.
    pub fn formatted(&self) -> String {
        format_query(&self.sql, &self.params)
    }

    /// Number of `?` and `??` placeholders in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let bytes = self.sql.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'?' {
                let run = bytes[i..].iter().take_while(|b| **b == b'?').count();
                if run <= 2 {
                    count += 1;
                }
                i += run;
            } else {
                i += 1;
            }
        }
        count
    }

    pub(crate) fn apply(self, options: BuildOptions) -> Self {
        if options.format {
            BuiltQuery {
                sql: self.formatted(),
                params: Vec::new(),
            }
        } else {
            self
        }
    }
}

impl From<BuiltQuery> for (String, Vec<Value>) {
    fn from(query: BuiltQuery) -> Self {
        query.into_parts()
    }
}
