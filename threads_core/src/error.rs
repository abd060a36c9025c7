use sea_orm::DbErr;
use thiserror::Error;

/// Storage failure tagged with the operation that hit it.
///
/// Every store call site in the services wraps its `DbErr` through this type,
/// so callers see "failed creating thread: ..." instead of a bare driver
/// error.
#[derive(Debug, Error)]
#[error("failed {op}: {source}")]
pub struct PersistenceError {
    op: &'static str,
    #[source]
    source: DbErr,
}

impl PersistenceError {
    pub fn new(op: &'static str, source: DbErr) -> Self {
        Self { op, source }
    }

    /// Adapter for `map_err` at store call sites.
    pub(crate) fn during(op: &'static str) -> impl FnOnce(DbErr) -> Self {
        move |source| Self { op, source }
    }

    pub fn operation(&self) -> &'static str {
        self.op
    }
}
