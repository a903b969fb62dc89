//! Integrate twoface with other libraries, like Actix-web or validator.

use crate::twoface::{ExternalError, Fallible, FieldError, TfError};
use actix_web::{
    http::{header, StatusCode},
    HttpResponse,
};
use serde::Serialize;
use tracing::error;
use validator::{Validate, ValidationError, ValidationErrors};

// Twoface errors can be used as Actix-web errors.
// If a handler returns a Twoface error, the external portion will be shown to the user.
// The internal portion will only be logged.
impl actix_web::ResponseError for TfError {
    fn status_code(&self) -> StatusCode {
        self.external.cause.into()
    }

    fn error_response(&self) -> HttpResponse {
        error!("{:#}", self.internal);
        let resp = serde_json::to_string(&ErrBody {
            error: self.to_string(),
            fields: &self.external.fields,
        })
        .unwrap_or_else(|e| {
            error!("Serde error: {}", e.to_string());
            "{\"error\": \"ServerError: internal server error\"}".to_owned()
        });
        HttpResponse::build(self.status_code())
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(resp)
    }
}

#[derive(Serialize)]
struct ErrBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "<[FieldError]>::is_empty")]
    fields: &'a [FieldError],
}

/// Form validation failures become a UserInvalidField error listing every bad field, named the way
/// the UI names them (camelCase). Fields are sorted so responses are stable.
impl TfError {
    pub fn from_validation(errors: ValidationErrors) -> TfError {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: camel_case(&field),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", camel_case(&field))),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        TfError {
            internal: anyhow::anyhow!("form validation failed: {}", errors),
            external: ExternalError::invalid_fields(fields),
        }
    }
}

/// Run a form's declarative checks plus any extra ones, and report all failures together.
pub trait Validated: Validate {
    /// Checks that can't be expressed as field attributes, e.g. comparing two fields.
    fn extra_checks(&self, _errors: &mut ValidationErrors) {}

    fn validated(&self) -> Fallible<()> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        self.extra_checks(&mut errors);
        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(TfError::from_validation(errors))
        }
    }
}

/// Build a validation error with a user-facing message.
pub fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
