//! Prompt construction for the nutrition advisor.
//!
//! Both strings that reach the model live here: the fixed system
//! instruction and the meal-plan prompt rendered from a [`UserProfile`].
//! Profile text is embedded verbatim; nothing is escaped.

use crate::profile::UserProfile;

/// Role given to the model on every call.
pub const SYSTEM_INSTRUCTION: &str = "Eres un dietista y nutricionista experto. Tu misión es proporcionar \
información precisa, balanceada y basada en evidencia sobre dietas, \
planes de comidas y valor nutricional. **Formatea tu respuesta usando Markdown \
(encabezados, listas y negritas) para que sea fácil de leer.** \
Sé profesional y alienta siempre hábitos saludables.";

/// Meals every day of the plan must cover.
pub const MEAL_MARKERS: [&str; 4] = ["Desayuno", "Almuerzo", "Cena", "Snack"];

/// Build the 3-day meal plan prompt for `profile`.
pub fn meal_plan(profile: &UserProfile) -> String {
    format!(
        "Por favor, actúa como mi asesor nutricional y genera un plan de comidas \
         de **3 días** basado en la siguiente información:\n\n\
         - **Objetivo Principal:** {objective}\n\
         - **Edad:** {age} años\n\
         - **Talla:** {height} cm\n\
         - **Peso:** {weight:.1} kg\n\
         - **Contexto Adicional:** {context}\n\n\
         Para cada día, incluye Desayuno, Almuerzo, Cena y un Snack. \
         Aproxima las calorías y menciona el balance de macronutrientes (P/C/G).",
        objective = profile.objective,
        age = profile.age,
        height = profile.height_cm,
        weight = profile.weight_kg,
        context = profile.context,
    )
}
