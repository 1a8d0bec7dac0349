//! Application controller.
//!
//! Each user action is an explicit handler on [`App`] that returns a
//! [`View`]; handlers never print. All recoverable failures are turned into
//! `View::Error` or `View::Warning` here so nothing propagates to the caller.

use std::path::PathBuf;

use crate::gemini::Generator;
use crate::profile::{ProfileError, UserProfile};
use crate::prompt;
use crate::session::Session;
use crate::storage::PlanStore;

/// What an action produced, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Answer to a free question.
    Answer(String),
    /// Freshly generated plan, awaiting an optional save.
    Plan(String),
    /// Plan written to `dir/filename`.
    Saved { filename: String, dir: PathBuf },
    /// Saved plan names, most recent first (never empty).
    History(Vec<String>),
    /// Content of one saved plan.
    PlanContent { filename: String, content: String },
    /// A prompt sent, or about to be sent, to the AI.
    Prompt(String),
    Info(String),
    Warning(String),
    Error(String),
}

impl View {
    pub fn is_error(&self) -> bool {
        matches!(self, View::Error(_))
    }
}

pub const EMPTY_QUESTION: &str = "Por favor, escribe una pregunta para la consulta libre.";
pub const NOTHING_TO_SAVE: &str = "No hay un plan nuevo para guardar. Genera uno primero.";
pub const NO_PROMPT_YET: &str = "Aún no se ha enviado ningún prompt a la IA.";
pub const EMPTY_HISTORY: &str = "Aún no tienes planes guardados. ¡Genera uno y guárdalo!";

/// Controller state: the generator, the plan store and one user's session.
pub struct App<G> {
    generator: G,
    store: PlanStore,
    session: Session,
}

impl<G: Generator> App<G> {
    pub fn new(generator: G, store: PlanStore) -> Self {
        Self {
            generator,
            store,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &PlanStore {
        &self.store
    }

    /// Free question sent as-is. Does not touch the session.
    pub fn ask(&self, question: &str) -> View {
        if question.trim().is_empty() {
            return View::Warning(EMPTY_QUESTION.to_owned());
        }
        match self.generator.generate(question) {
            Ok(answer) => View::Answer(answer),
            Err(e) => View::Error(e.user_message()),
        }
    }

    /// Validate the profile, build the meal-plan prompt and generate.
    ///
    /// The session changes only when the generator returns a plan; an invalid
    /// profile or a failed call leaves it exactly as it was.
    pub fn generate_plan(&mut self, profile: &UserProfile) -> View {
        if let Err(e) = profile.validate() {
            if let ProfileError::MissingFields { fields } = &e {
                tracing::debug!(?fields, "generate refused: missing fields");
            }
            return View::Error(e.to_string());
        }

        let prompt_text = prompt::meal_plan(profile);
        match self.generator.generate(&prompt_text) {
            Ok(plan) => {
                self.session
                    .record_plan(prompt_text, plan.clone(), profile.objective.clone());
                View::Plan(plan)
            }
            Err(e) => View::Error(e.user_message()),
        }
    }

    /// Save the pending plan. On failure the offer stays so the user can retry.
    pub fn save_plan(&mut self) -> View {
        if !self.session.save_offered() {
            return View::Warning(NOTHING_TO_SAVE.to_owned());
        }
        match self
            .store
            .save(self.session.last_result(), self.session.current_objective())
        {
            Ok(filename) => {
                self.session.mark_saved();
                View::Saved {
                    filename,
                    dir: self.store.dir().to_path_buf(),
                }
            }
            Err(e) => {
                tracing::warn!(err = %e, "saving plan failed");
                View::Error(format!("Error al guardar el plan: {e}"))
            }
        }
    }

    /// Saved plans, most recent first. `limit` keeps only the newest entries.
    pub fn history(&self, limit: Option<usize>) -> View {
        history_view(&self.store, limit)
    }

    pub fn open_plan(&self, filename: &str) -> View {
        open_view(&self.store, filename)
    }

    pub fn last_prompt(&self) -> View {
        match self.session.last_prompt() {
            "" => View::Info(NO_PROMPT_YET.to_owned()),
            p => View::Prompt(p.to_owned()),
        }
    }
}

/// History listing as a view. Needs no generator, so offline commands use it
/// directly.
pub fn history_view(store: &PlanStore, limit: Option<usize>) -> View {
    let listed = match limit {
        Some(n) => store.list_page(0, n),
        None => store.list(),
    };
    match listed {
        Ok(names) if names.is_empty() => View::Info(EMPTY_HISTORY.to_owned()),
        Ok(names) => View::History(names),
        Err(e) => {
            tracing::warn!(err = %e, "listing saved plans failed");
            View::Warning(e.to_string())
        }
    }
}

pub fn open_view(store: &PlanStore, filename: &str) -> View {
    match store.read(filename) {
        Ok(content) => View::PlanContent {
            filename: filename.to_owned(),
            content,
        },
        Err(e) => View::Error(format!("Error al leer el archivo: {e}")),
    }
}

/// The prompt a generate action would send for `profile`, without sending it.
pub fn preview_prompt(profile: &UserProfile) -> View {
    match profile.validate() {
        Ok(()) => View::Prompt(prompt::meal_plan(profile)),
        Err(e) => View::Error(e.to_string()),
    }
}
