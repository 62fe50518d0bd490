use std::fmt;

/// A table joined onto a domain's base table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Relation(&'static str);

impl Relation {
    #[must_use]
    pub const fn new(table: &'static str) -> Self {
        Self(table)
    }

    #[must_use]
    pub fn table(self) -> &'static str {
        self.0
    }
}

/// A table-qualified column. Columns are only ever named by catalog code,
/// never by condition data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column {
    table: &'static str,
    name: &'static str,
}

impl Column {
    #[must_use]
    pub const fn new(table: &'static str, name: &'static str) -> Self {
        Self { table, name }
    }

    #[must_use]
    pub fn table(self) -> &'static str {
        self.table
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.name
    }

    /// The relation that must be joined for this column to be readable from
    /// a collection rooted at `base_table`, if any.
    #[must_use]
    pub fn relation_from(self, base_table: &str) -> Option<Relation> {
        (self.table != base_table).then_some(Relation(self.table))
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}
