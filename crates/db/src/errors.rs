//! Classification of sqlx errors by PostgreSQL SQLSTATE.

/// `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// `undefined_table`: the schema has not been provisioned.
pub const UNDEFINED_TABLE: &str = "42P01";

/// `check_violation`.
pub const CHECK_VIOLATION: &str = "23514";

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// `true` if `err` is a unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(UNIQUE_VIOLATION)
}

/// `true` if `err` reports a missing table.
pub fn is_undefined_table(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(UNDEFINED_TABLE)
}

/// `true` if `err` is a CHECK constraint violation.
pub fn is_check_violation(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(CHECK_VIOLATION)
}

/// `true` if the database could not be reached at all.
pub fn is_unreachable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
    )
}
