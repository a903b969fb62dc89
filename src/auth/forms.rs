use crate::twoface::{field_error, Validated};
use regex::Regex;
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

lazy_static! {
    pub(crate) static ref USERNAME_CHARS: Regex =
        Regex::new(r"^[A-Za-z0-9_]+$").expect("couldn't compile USERNAME_CHARS");
    pub(crate) static ref PERSON_NAME_CHARS: Regex =
        Regex::new(r"^[A-Za-z\s]+$").expect("couldn't compile PERSON_NAME_CHARS");
}

#[derive(Deserialize, Validate, Debug, Clone)]
pub struct LoginForm {
    /// A username, or the user's email address
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username must be between 3 and 50 characters"
    ))]
    pub username: String,
    #[validate(length(
        min = 6,
        max = 100,
        message = "Password must be between 6 and 100 characters"
    ))]
    pub password: String,
}

impl Validated for LoginForm {
    fn extra_checks(&self, errors: &mut ValidationErrors) {
        check_username(&self.username, errors);
    }
}

#[derive(Deserialize, Validate, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    #[validate(length(
        min = 2,
        max = 100,
        message = "Name must be between 2 and 100 characters"
    ))]
    pub name: String,
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username must be between 3 and 50 characters"
    ))]
    pub username: String,
    #[validate(
        email(message = "Please enter a valid email address"),
        length(max = 255, message = "Email must be less than 255 characters")
    )]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 100,
        message = "Password must be between 6 and 100 characters"
    ))]
    pub password: String,
    #[validate(length(min = 1, message = "Please confirm your password"))]
    pub confirm_password: String,
}

impl Validated for SignupForm {
    fn extra_checks(&self, errors: &mut ValidationErrors) {
        check_person_name("name", &self.name, errors);
        check_username(&self.username, errors);
        if !is_strong(&self.password) {
            errors.add(
                "password",
                field_error(
                    "strength",
                    "Password must contain at least one lowercase letter, one uppercase letter, and one number",
                ),
            );
        }
        if !self.confirm_password.is_empty() && self.password != self.confirm_password {
            errors.add(
                "confirm_password",
                field_error("mismatch", "Passwords do not match"),
            );
        }
    }
}

fn check_username(username: &str, errors: &mut ValidationErrors) {
    if !username.is_empty() && !USERNAME_CHARS.is_match(username) {
        errors.add(
            "username",
            field_error(
                "charset",
                "Username can only contain letters, numbers, and underscores",
            ),
        );
    }
}

/// Names of people (authors, commenters) are letters and spaces only.
pub(crate) fn check_person_name(
    field: &'static str,
    name: &str,
    errors: &mut ValidationErrors,
) {
    if !name.is_empty() && !PERSON_NAME_CHARS.is_match(name) {
        errors.add(
            field,
            field_error("charset", "Name can only contain letters and spaces"),
        );
    }
}

fn is_strong(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twoface::Cause;

    fn signup() -> SignupForm {
        SignupForm {
            name: "Ada Lovelace".to_owned(),
            username: "ada_l".to_owned(),
            email: "ada@example.com".to_owned(),
            password: "Engine1".to_owned(),
            confirm_password: "Engine1".to_owned(),
        }
    }

    fn invalid_fields<V: Validated>(form: &V) -> Vec<(String, String)> {
        let err = form.validated().unwrap_err();
        assert!(matches!(err.cause(), Cause::UserInvalidField));
        err.external
            .fields
            .into_iter()
            .map(|f| (f.field, f.message))
            .collect()
    }

    #[test]
    fn test_valid_forms_pass() {
        assert!(signup().validated().is_ok());
        let login = LoginForm {
            username: "Bret".to_owned(),
            password: "secret".to_owned(),
        };
        assert!(login.validated().is_ok());
    }

    #[test]
    fn test_login_rules() {
        let login = LoginForm {
            username: "no spaces!".to_owned(),
            password: "short".to_owned(),
        };
        assert_eq!(
            invalid_fields(&login),
            vec![
                (
                    "password".to_owned(),
                    "Password must be between 6 and 100 characters".to_owned()
                ),
                (
                    "username".to_owned(),
                    "Username can only contain letters, numbers, and underscores".to_owned()
                ),
            ]
        );
    }

    #[test]
    fn test_weak_password() {
        let form = SignupForm {
            password: "alllowercase1".to_owned(),
            confirm_password: "alllowercase1".to_owned(),
            ..signup()
        };
        let fields = invalid_fields(&form);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "password");
    }

    #[test]
    fn test_mismatched_confirmation_is_reported_on_confirm_password() {
        let form = SignupForm {
            confirm_password: "Engine2".to_owned(),
            ..signup()
        };
        assert_eq!(
            invalid_fields(&form),
            vec![(
                "confirmPassword".to_owned(),
                "Passwords do not match".to_owned()
            )]
        );
    }

    #[test]
    fn test_name_and_email_rules() {
        let form = SignupForm {
            name: "R2D2".to_owned(),
            email: "not-an-email".to_owned(),
            ..signup()
        };
        let fields: Vec<String> = invalid_fields(&form).into_iter().map(|f| f.0).collect();
        assert_eq!(fields, vec!["email", "name"]);
    }
}
