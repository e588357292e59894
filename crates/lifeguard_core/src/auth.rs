//! crates/lifeguard_core/src/auth.rs
//!
//! The Auth Stage: collects credentials and decides whether the user is logging
//! in or signing up. Nothing is checked against a backend and the password is
//! never stored; it only has to be present.

use serde::Deserialize;
use std::fmt;
use tracing::{info, warn};

use crate::domain::User;
use crate::session::{SessionController, SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

/// A failed submission. The `Display` text is the alert shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter your email")]
    MissingEmail,
    #[error("Please enter your password")]
    MissingPassword,
    #[error("Please enter your name")]
    MissingName,
}

/// Raw form contents, exactly as typed.
#[derive(Clone, Default, Deserialize)]
pub struct AuthForm {
    #[serde(default)]
    pub mode: AuthMode,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AuthForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthForm")
            .field("mode", &self.mode)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An accepted submission, ready to hand to the Session Controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: User,
    pub is_signup: bool,
}

impl AuthForm {
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::Login,
            name: String::new(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn signup(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            mode: AuthMode::Signup,
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Checks the form in display order: email, password, then name for signups.
    ///
    /// A login derives the name from the local part of the email; a signup keeps
    /// the entered name verbatim.
    pub fn validate(&self) -> Result<Credentials, ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        if self.password.trim().is_empty() {
            return Err(ValidationError::MissingPassword);
        }
        let is_signup = self.mode == AuthMode::Signup;
        if is_signup && self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }

        let name = if is_signup {
            self.name.clone()
        } else {
            self.email.split('@').next().unwrap_or_default().to_string()
        };

        Ok(Credentials {
            user: User::new(name, self.email.clone()),
            is_signup,
        })
    }
}

/// Errors surfaced by [`submit`].
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Validates the form and, on success, starts the session.
///
/// A rejected form leaves the session untouched.
pub fn submit(form: &AuthForm, session: &mut SessionController) -> Result<(), SubmitError> {
    let credentials = form.validate().inspect_err(|e| {
        warn!("Auth form rejected: {}", e);
    })?;
    info!(
        "Auth form accepted for {} ({:?})",
        credentials.user.email, form.mode
    );
    session.login(credentials.user, credentials.is_signup)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{PortResult, SurveyFlagStore};
    use crate::session::Stage;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    struct NoFlags;

    #[async_trait]
    impl SurveyFlagStore for NoFlags {
        async fn mark_completed(&self, _email: &str) -> PortResult<()> {
            Ok(())
        }
        async fn is_completed(&self, _email: &str) -> PortResult<bool> {
            Ok(false)
        }
    }

    fn controller() -> SessionController {
        SessionController::new(Arc::new(NoFlags))
    }

    #[test]
    fn blank_fields_are_rejected_in_order() {
        assert_eq!(
            AuthForm::login("  ", "").validate(),
            Err(ValidationError::MissingEmail)
        );
        assert_eq!(
            AuthForm::login("jane@x.com", " \t").validate(),
            Err(ValidationError::MissingPassword)
        );
        assert_eq!(
            AuthForm::signup("   ", "jane@x.com", "pw").validate(),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            ValidationError::MissingName.to_string(),
            "Please enter your name"
        );
    }

    #[test]
    fn login_ignores_a_blank_name() {
        let credentials = AuthForm::login("jane@x.com", "pw").validate().unwrap();
        assert_eq!(credentials.user, User::new("jane", "jane@x.com"));
        assert!(!credentials.is_signup);
    }

    #[test]
    fn login_without_at_sign_uses_whole_email() {
        let credentials = AuthForm::login("jane", "pw").validate().unwrap();
        assert_eq!(credentials.user.name, "jane");
    }

    #[test]
    fn signup_keeps_entered_name() {
        let credentials = AuthForm::signup("Jane Doe", "jane@x.com", "pw")
            .validate()
            .unwrap();
        assert_eq!(credentials.user, User::new("Jane Doe", "jane@x.com"));
        assert!(credentials.is_signup);
    }

    #[test]
    fn rejected_submit_does_not_touch_the_session() {
        let mut session = controller();
        let err = submit(&AuthForm::signup("", "jane@x.com", "pw"), &mut session).unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(ValidationError::MissingName)));
        assert_eq!(session.stage(), Stage::Auth);
        assert!(session.state().user().is_none());
    }

    #[test]
    fn login_goes_straight_to_dashboard() {
        let mut session = controller();
        submit(&AuthForm::login("jane@x.com", "secret"), &mut session).unwrap();
        assert_eq!(session.stage(), Stage::Dashboard);
        assert!(session.state().survey_completed());
        assert_eq!(
            session.state().user(),
            Some(&User::new("jane", "jane@x.com"))
        );
    }

    #[test]
    fn signup_goes_to_survey() {
        let mut session = controller();
        submit(&AuthForm::signup("Jane Doe", "jane@x.com", "secret"), &mut session).unwrap();
        assert_eq!(session.stage(), Stage::Survey);
        assert!(!session.state().survey_completed());
        assert!(session.state().is_new_user());
    }

    #[test]
    fn debug_output_hides_the_password() {
        let rendered = format!("{:?}", AuthForm::login("jane@x.com", "hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
