//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper produces an `invalid_request` error whose `details` name the
//! offending request field and a machine-readable code.

use serde_json::json;

use crate::domain::offsets::OffsetValidationError;
use crate::domain::{
    CarbonMass, Error, ProductValidationError, RecordIdError, UserValidationError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidId,
    InvalidField,
    InvalidQuantity,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::InvalidId => "invalid_id",
            Self::InvalidField => "invalid_field",
            Self::InvalidQuantity => "invalid_quantity",
        }
    }
}

fn field_error(field: &str, message: impl Into<String>, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code.as_str(),
    }))
}

/// Validate a raw path or body identifier.
pub(crate) fn parse_id<T>(field: &str, raw: i64) -> Result<T, Error>
where
    T: TryFrom<i64, Error = RecordIdError>,
{
    T::try_from(raw).map_err(|err| field_error(field, err.to_string(), ErrorCode::InvalidId))
}

/// Convert a decimal-tonnes request value into a [`CarbonMass`].
pub(crate) fn parse_tonnes(field: &str, tonnes: f64) -> Result<CarbonMass, Error> {
    CarbonMass::try_from_tonnes(tonnes).map_err(|err| {
        Error::invalid_request(format!("{field}: {err}")).with_details(json!({
            "field": field,
            "reason": err.reason(),
            "code": ErrorCode::InvalidQuantity.as_str(),
        }))
    })
}

pub(crate) fn map_user_validation(err: UserValidationError) -> Error {
    field_error(err.field(), err.to_string(), ErrorCode::InvalidField)
}

pub(crate) fn map_product_validation(err: ProductValidationError) -> Error {
    field_error(err.field(), err.to_string(), ErrorCode::InvalidField)
}

pub(crate) fn map_offset_validation(err: OffsetValidationError) -> Error {
    field_error(err.field(), err.to_string(), ErrorCode::InvalidField)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode as DomainCode, UserId};
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(-4)]
    fn non_positive_ids_are_rejected(#[case] raw: i64) {
        let err = parse_id::<UserId>("id", raw).expect_err("invalid id");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(
            err.details(),
            Some(&json!({"field": "id", "code": "invalid_id"}))
        );
    }

    #[rstest]
    #[case(-1.0, "negative")]
    #[case(f64::NAN, "not_finite")]
    #[case(1e15, "out_of_range")]
    fn bad_tonnes_report_a_reason(#[case] raw: f64, #[case] reason: &str) {
        let err = parse_tonnes("targetTonnes", raw).expect_err("invalid quantity");
        let details = err.details().expect("details");
        assert_eq!(details["field"], "targetTonnes");
        assert_eq!(details["reason"], reason);
    }

    #[rstest]
    fn tonnes_round_to_kilograms() {
        let mass = parse_tonnes("targetTonnes", 6.5).expect("valid");
        assert_eq!(mass.kilograms(), 6_500);
    }

    #[rstest]
    fn user_validation_names_the_field() {
        let err = map_user_validation(UserValidationError::InvalidEmail);
        assert_eq!(err.details().expect("details")["field"], "email");
    }
}
