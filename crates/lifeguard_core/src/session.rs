//! crates/lifeguard_core/src/session.rs
//!
//! The Session Controller: the single owner of `SessionState` and the only place
//! it is mutated. Every other stage goes through the operations defined here.

use serde::Serialize;
use std::sync::Arc;
use strum::Display;
use tracing::{info, warn};

use crate::domain::{HealthModel, Lifestyle, User};
use crate::ports::SurveyFlagStore;
use crate::survey::{derive_lifestyle, SurveyData};

//=========================================================================================
// Stage and ActiveScreen
//=========================================================================================

/// The top-level screen that is mounted. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Auth,
    Survey,
    Dashboard,
}

/// What the shell renders for the current state, with the data each screen needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ActiveScreen {
    Auth,
    Survey {
        user: User,
    },
    Dashboard {
        user: User,
        health_model: Option<HealthModel>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("`{operation}` is not permitted while the {stage} screen is mounted")]
    NotPermitted {
        operation: &'static str,
        stage: Stage,
    },
}

//=========================================================================================
// SessionState
//=========================================================================================

/// Session-wide state. Being authenticated is the same thing as having a user,
/// so the two can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    user: Option<User>,
    is_new_user: bool,
    survey_completed: bool,
    dark_mode: bool,
    health_model: Option<HealthModel>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_new_user(&self) -> bool {
        self.is_new_user
    }

    pub fn survey_completed(&self) -> bool {
        self.survey_completed
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn health_model(&self) -> Option<&HealthModel> {
        self.health_model.as_ref()
    }

    pub fn stage(&self) -> Stage {
        match (self.is_authenticated(), self.survey_completed) {
            (false, _) => Stage::Auth,
            (true, false) => Stage::Survey,
            (true, true) => Stage::Dashboard,
        }
    }

    pub fn active_screen(&self) -> ActiveScreen {
        match (&self.user, self.survey_completed) {
            (None, _) => ActiveScreen::Auth,
            (Some(user), false) => ActiveScreen::Survey { user: user.clone() },
            (Some(user), true) => ActiveScreen::Dashboard {
                user: user.clone(),
                health_model: self.health_model.clone(),
            },
        }
    }
}

//=========================================================================================
// SessionController
//=========================================================================================

pub struct SessionController {
    state: SessionState,
    survey_flags: Arc<dyn SurveyFlagStore>,
}

impl SessionController {
    pub fn new(survey_flags: Arc<dyn SurveyFlagStore>) -> Self {
        Self {
            state: SessionState::default(),
            survey_flags,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.state.stage()
    }

    pub fn active_screen(&self) -> ActiveScreen {
        self.state.active_screen()
    }

    fn require(&self, operation: &'static str, expected: Stage) -> Result<(), SessionError> {
        let stage = self.stage();
        if stage != expected {
            warn!("Rejected `{}` while on the {} screen", operation, stage);
            return Err(SessionError::NotPermitted { operation, stage });
        }
        Ok(())
    }

    /// Starts a session. A login skips onboarding outright; the completion flag
    /// store is not consulted.
    pub fn login(&mut self, user: User, is_signup: bool) -> Result<(), SessionError> {
        self.require("login", Stage::Auth)?;
        info!(
            "Session started for {} ({})",
            user.email,
            if is_signup { "signup" } else { "login" }
        );
        self.state.user = Some(user);
        self.state.is_new_user = is_signup;
        self.state.survey_completed = !is_signup;
        Ok(())
    }

    /// Finishes onboarding and records the completion flag for the user.
    ///
    /// The derived lifestyle is returned but NOT written into `health_model`;
    /// the Digital Twin is only populated through the setup screen. A failed
    /// flag write is logged and does not undo the completion.
    pub async fn complete_survey(&mut self, data: &SurveyData) -> Result<Lifestyle, SessionError> {
        self.require("complete_survey", Stage::Survey)?;
        let lifestyle = derive_lifestyle(data.activity_level);
        self.state.survey_completed = true;

        if let Some(user) = &self.state.user {
            info!("Survey completed by {} (lifestyle: {})", user.email, lifestyle);
            if let Err(e) = self.survey_flags.mark_completed(&user.email).await {
                warn!("Failed to persist survey flag for {}: {}", user.email, e);
            }
        }
        Ok(lifestyle)
    }

    /// Replaces the Digital Twin wholesale.
    pub fn set_health_model(&mut self, model: HealthModel) -> Result<(), SessionError> {
        self.require("set_health_model", Stage::Dashboard)?;
        info!("Health model updated: {:?}", model);
        self.state.health_model = Some(model);
        Ok(())
    }

    /// Ends the session. The theme preference and the new-user marker survive.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.require("logout", Stage::Dashboard)?;
        if let Some(user) = &self.state.user {
            info!("Session ended for {}", user.email);
        }
        self.state.user = None;
        self.state.health_model = None;
        self.state.survey_completed = false;
        Ok(())
    }

    /// Flips the theme and returns the new dark-mode setting.
    pub fn toggle_theme(&mut self) -> bool {
        self.state.dark_mode = !self.state.dark_mode;
        self.state.dark_mode
    }
}
