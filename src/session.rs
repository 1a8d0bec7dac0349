/// Per-user state that outlives a single action.
///
/// Owned by [`crate::app::App`]; handlers mutate it through the methods
/// below so the save flag and the stored result cannot drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    last_prompt: String,
    last_result: String,
    current_objective: String,
    save_offered: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prompt sent with the last successful generate action.
    pub fn last_prompt(&self) -> &str {
        &self.last_prompt
    }

    /// Plan text returned by the last successful generate action.
    pub fn last_result(&self) -> &str {
        &self.last_result
    }

    pub fn current_objective(&self) -> &str {
        &self.current_objective
    }

    /// `true` while there is an unsaved plan the user may save.
    pub fn save_offered(&self) -> bool {
        self.save_offered && !self.last_result.is_empty()
    }

    /// Replace the stored plan with a freshly generated one and offer saving it.
    pub fn record_plan(&mut self, prompt: String, result: String, objective: String) {
        self.last_prompt = prompt;
        self.last_result = result;
        self.current_objective = objective;
        self.save_offered = true;
    }

    /// Withdraw the save offer after the plan reached disk.
    pub fn mark_saved(&mut self) {
        self.save_offered = false;
    }
}
