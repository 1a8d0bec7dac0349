//! User-supplied parameters for a meal plan and the checks that gate the
//! generate action.

use std::fmt;

pub const DEFAULT_HEIGHT_CM: u32 = 170;
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

pub const MIN_HEIGHT_CM: u32 = 50;
pub const MAX_HEIGHT_CM: u32 = 300;
pub const MAX_WEIGHT_KG: f64 = 500.0;

/// One snapshot of the form: read once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub objective: String,
    pub age: u32,
    pub height_cm: u32,
    pub weight_kg: f64,
    pub context: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            objective: String::new(),
            age: 0,
            height_cm: DEFAULT_HEIGHT_CM,
            weight_kg: DEFAULT_WEIGHT_KG,
            context: String::new(),
        }
    }
}

/// Why a profile was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("Por favor, rellena todos los campos")]
    MissingFields { fields: Vec<&'static str> },

    #[error("La talla debe estar entre {MIN_HEIGHT_CM} y {MAX_HEIGHT_CM} cm (recibido {value})")]
    HeightOutOfRange { value: u32 },

    #[error("El peso debe ser mayor que 0 y como máximo {MAX_WEIGHT_KG:.1} kg (recibido {value})")]
    WeightOutOfRange { value: f64 },
}

impl UserProfile {
    /// Objective, age, height and weight must all be present (non-empty,
    /// non-zero) and inside the widget ranges. Context is optional.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let mut missing = Vec::new();
        if self.objective.trim().is_empty() {
            missing.push("objective");
        }
        if self.age == 0 {
            missing.push("age");
        }
        if self.height_cm == 0 {
            missing.push("height");
        }
        if self.weight_kg == 0.0 {
            missing.push("weight");
        }
        if !missing.is_empty() {
            return Err(ProfileError::MissingFields { fields: missing });
        }

        if !(MIN_HEIGHT_CM..=MAX_HEIGHT_CM).contains(&self.height_cm) {
            return Err(ProfileError::HeightOutOfRange {
                value: self.height_cm,
            });
        }
        if !self.weight_kg.is_finite() || self.weight_kg < 0.0 || self.weight_kg > MAX_WEIGHT_KG {
            return Err(ProfileError::WeightOutOfRange {
                value: self.weight_kg,
            });
        }
        Ok(())
    }
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "objective: {}", self.objective)?;
        writeln!(f, "age: {}", self.age)?;
        writeln!(f, "height: {} cm", self.height_cm)?;
        writeln!(f, "weight: {:.1} kg", self.weight_kg)?;
        write!(f, "context: {}", self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> UserProfile {
        UserProfile {
            objective: "lose weight".into(),
            age: 30,
            ..UserProfile::default()
        }
    }

    #[test]
    fn defaults_match_form_widgets() {
        let p = UserProfile::default();
        assert_eq!(p.height_cm, 170);
        assert_eq!(p.weight_kg, 70.0);
        assert!(p.objective.is_empty());
        assert_eq!(p.age, 0);
    }

    #[test]
    fn valid_profile_passes() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn empty_objective_is_missing() {
        let mut p = valid();
        p.objective = "   ".into();
        match p.validate() {
            Err(ProfileError::MissingFields { fields }) => assert_eq!(fields, vec!["objective"]),
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn zero_age_is_missing() {
        let mut p = valid();
        p.age = 0;
        assert!(matches!(
            p.validate(),
            Err(ProfileError::MissingFields { .. })
        ));
    }

    #[test]
    fn missing_fields_message_is_user_facing() {
        let err = UserProfile::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "Por favor, rellena todos los campos");
    }

    #[test]
    fn context_is_optional() {
        let mut p = valid();
        p.context.clear();
        assert!(p.validate().is_ok());
    }

    #[test]
    fn height_outside_range_rejected() {
        let mut p = valid();
        p.height_cm = 49;
        assert_eq!(
            p.validate(),
            Err(ProfileError::HeightOutOfRange { value: 49 })
        );
        p.height_cm = 301;
        assert!(p.validate().is_err());
        p.height_cm = 300;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn weight_outside_range_rejected() {
        let mut p = valid();
        p.weight_kg = 500.1;
        assert!(matches!(
            p.validate(),
            Err(ProfileError::WeightOutOfRange { .. })
        ));
        p.weight_kg = -2.0;
        assert!(p.validate().is_err());
        p.weight_kg = 500.0;
        assert!(p.validate().is_ok());
    }
}
