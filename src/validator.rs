use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::NaiveDate;
use schoolyard_core::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Flattens validation errors, including nested structs and list items, into
/// one message per failed rule. Rules without a message are named after the
/// field path (`records[0].remarks is invalid`).
pub fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, "", &mut messages);
    messages.sort();
    messages.join(", ")
}

fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if field == "__all__" {
            prefix.to_string()
        } else if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.push(match &error.message {
                        Some(message) => message.to_string(),
                        None if path.is_empty() => "request is invalid".to_string(),
                        None => format!("{} is invalid", path),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        value.validate().map_err(|errors| {
            AppError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                anyhow!("{}", format_errors(&errors)),
            )
        })?;

        Ok(ValidatedJson(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    let error_msg = rejection.body_text();

    if let Some(field) = error_msg
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
    {
        return AppError::bad_request(anyhow!("{} is required", field));
    }

    if error_msg.contains("unknown variant") {
        return AppError::bad_request(anyhow!("Invalid enum value in request"));
    }

    if error_msg.contains("invalid type") {
        return AppError::bad_request(anyhow!("Invalid field type in request"));
    }

    AppError::bad_request(anyhow!("Invalid request body"))
}

/// Inclusive date filters: `from` may not come after `to`.
pub fn check_date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), AppError> {
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(AppError::bad_request(anyhow!(
            "'from' date must not be after 'to' date"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Line {
        #[validate(length(max = 3))]
        note: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
        #[validate(nested)]
        lines: Vec<Line>,
    }

    #[test]
    fn test_format_errors_uses_messages() {
        let payload = Payload {
            name: String::new(),
            lines: vec![],
        };
        let errors = payload.validate().unwrap_err();
        assert_eq!(format_errors(&errors), "name is required");
    }

    #[test]
    fn test_format_errors_reports_nested_paths() {
        let payload = Payload {
            name: "ok".to_string(),
            lines: vec![
                Line {
                    note: "abc".to_string(),
                },
                Line {
                    note: "abcd".to_string(),
                },
            ],
        };
        let errors = payload.validate().unwrap_err();
        assert_eq!(format_errors(&errors), "lines[1].note is invalid");
    }

    #[test]
    fn test_check_date_range() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 10, d).unwrap();
        assert!(check_date_range(Some(day(1)), Some(day(1))).is_ok());
        assert!(check_date_range(Some(day(1)), None).is_ok());
        assert!(check_date_range(None, None).is_ok());

        let err = check_date_range(Some(day(2)), Some(day(1))).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
