//! Shared helpers for the Diesel repositories.
//!
//! - pool and Diesel error mapping into any port error that exposes
//!   `connection` and `query` variants;
//! - conversions between domain quantities/identifiers and `BIGINT` columns.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::{OffsetPersistenceError, ProductPersistenceError, UserPersistenceError};
use crate::domain::{CarbonMass, RecordIdError};

use super::pool::PoolError;

/// Port errors that can represent connection and query failures.
pub(crate) trait RepositoryError: Sized {
    fn connection_failure(message: String) -> Self;
    fn query_failure(message: String) -> Self;
}

macro_rules! impl_repository_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RepositoryError for $ty {
                fn connection_failure(message: String) -> Self {
                    Self::connection(message)
                }

                fn query_failure(message: String) -> Self {
                    Self::query(message)
                }
            }
        )*
    };
}

impl_repository_error!(
    UserPersistenceError,
    ProductPersistenceError,
    OffsetPersistenceError,
);

/// Map pool errors to a port connection error.
pub(crate) fn map_pool_error<E: RepositoryError>(error: PoolError) -> E {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            E::connection_failure(message)
        }
    }
}

/// Map Diesel errors to port errors, logging the underlying cause.
pub(crate) fn map_diesel_error<E: RepositoryError>(error: DieselError) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            E::connection_failure("database connection error".to_owned())
        }
        DieselError::NotFound => E::query_failure("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => E::query_failure("database query error".to_owned()),
        _ => E::query_failure("database error".to_owned()),
    }
}

/// Whether the error is a unique-constraint violation.
pub(crate) fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// Whether the error is a foreign-key violation.
pub(crate) fn is_foreign_key_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)
    )
}

/// Convert a domain mass to its `BIGINT` column value.
pub(crate) fn kilograms_to_db(mass: CarbonMass) -> i64 {
    i64::try_from(mass.kilograms()).unwrap_or(i64::MAX)
}

/// Convert a stored kilogram count back into a domain mass.
pub(crate) fn kilograms_from_db(value: i64) -> Result<CarbonMass, String> {
    u64::try_from(value)
        .map(CarbonMass::from_kilograms)
        .map_err(|_| format!("stored mass {value} is negative"))
}

/// Convert a stored primary key into a domain identifier.
pub(crate) fn parse_record_id<T>(value: i64) -> Result<T, String>
where
    T: TryFrom<i64, Error = RecordIdError>,
{
    T::try_from(value).map_err(|err| err.to_string())
}

/// Collect row conversion results, mapping the first error into a query error.
pub(crate) fn collect_rows<T, E: RepositoryError>(
    results: impl Iterator<Item = Result<T, String>>,
) -> Result<Vec<T>, E> {
    results
        .collect::<Result<Vec<_>, _>>()
        .map_err(E::query_failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use rstest::rstest;

    #[rstest]
    #[case(PoolError::checkout("timed out"))]
    #[case(PoolError::build("bad url"))]
    fn pool_errors_become_connection_failures(#[case] error: PoolError) {
        let mapped: UserPersistenceError = map_pool_error(error);
        assert!(matches!(mapped, UserPersistenceError::Connection { .. }));
    }

    #[test]
    fn not_found_becomes_a_query_failure() {
        let mapped: OffsetPersistenceError = map_diesel_error(DieselError::NotFound);
        assert_eq!(mapped, OffsetPersistenceError::query("record not found"));
    }

    #[test]
    fn masses_round_trip_through_bigint() {
        let mass = CarbonMass::from_kilograms(6_500);
        assert_eq!(kilograms_from_db(kilograms_to_db(mass)), Ok(mass));
        assert!(kilograms_from_db(-1).is_err());
    }

    #[test]
    fn record_ids_are_validated() {
        assert_eq!(parse_record_id::<UserId>(4).map(UserId::get), Ok(4));
        assert!(parse_record_id::<UserId>(0).is_err());
    }

    #[test]
    fn collect_rows_reports_the_first_failure() {
        let rows = vec![Ok(1), Err("bad row".to_owned()), Err("later".to_owned())];
        let result: Result<Vec<i32>, ProductPersistenceError> = collect_rows(rows.into_iter());
        assert_eq!(result, Err(ProductPersistenceError::query("bad row")));
    }
}
