//! Interactive session: one [`App`] and one form, driven line by line.
//!
//! The form starts with the same defaults as the plan flags. Every command is
//! parsed into a [`Command`], dispatched to the matching `App` handler and the
//! resulting view is written out; nothing else is recomputed.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::app::{App, View};
use crate::gemini::Generator;
use crate::profile::{MAX_HEIGHT_CM, MAX_WEIGHT_KG, MIN_HEIGHT_CM, UserProfile};
use crate::render::Renderer;

const PROMPT: &str = "nutria> ";
const SAVE_HINT: &str = "Escribe `save` para guardar este plan.";

const HELP: &str = "\
Comandos:
  ask <pregunta>        consulta libre al nutricionista IA
  set <campo> <valor>   campos: objetivo, edad, talla, peso, contexto
  profile               muestra los parámetros actuales
  generate              genera el plan de 3 días
  save                  guarda el último plan generado
  history [N]           lista los planes guardados (los N más recientes)
  open <archivo|número> muestra un plan guardado
  prompt                muestra el último prompt enviado a la IA
  help                  esta ayuda
  quit                  salir";

/// Form field addressed by `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Objective,
    Age,
    Height,
    Weight,
    Context,
}

impl FromStr for Field {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "objective" | "objetivo" => Ok(Field::Objective),
            "age" | "edad" => Ok(Field::Age),
            "height" | "talla" => Ok(Field::Height),
            "weight" | "peso" => Ok(Field::Weight),
            "context" | "contexto" => Ok(Field::Context),
            _ => Err(CommandError::UnknownField(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Set(Field, String),
    Profile,
    Generate,
    Save,
    History(Option<usize>),
    Open(String),
    Prompt,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Comando desconocido '{0}'. Escribe `help` para ver los comandos.")]
    Unknown(String),

    #[error("Falta el argumento: {0}")]
    MissingArgument(&'static str),

    #[error("Campo desconocido '{0}' (usa objetivo, edad, talla, peso o contexto)")]
    UnknownField(String),

    #[error("Valor inválido para {field}: {detail}")]
    InvalidValue { field: &'static str, detail: String },
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "ask" => Command::Ask(required(rest, "pregunta")?.to_owned()),
        "set" => {
            let rest = required(rest, "campo")?;
            let (field, value) = match rest.split_once(char::is_whitespace) {
                Some((f, v)) => (f, v.trim()),
                None => (rest, ""),
            };
            Command::Set(field.parse()?, value.to_owned())
        }
        "profile" => Command::Profile,
        "generate" => Command::Generate,
        "save" => Command::Save,
        "history" => {
            if rest.is_empty() {
                Command::History(None)
            } else {
                let n = rest.parse::<usize>().map_err(|e| CommandError::InvalidValue {
                    field: "history",
                    detail: e.to_string(),
                })?;
                Command::History(Some(n))
            }
        }
        "open" => Command::Open(required(rest, "archivo")?.to_owned()),
        "prompt" => Command::Prompt,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(CommandError::Unknown(word.to_owned())),
    };
    Ok(Some(command))
}

fn required<'a>(rest: &'a str, name: &'static str) -> Result<&'a str, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument(name))
    } else {
        Ok(rest)
    }
}

/// Apply `set <field> <value>` to the form, enforcing the same ranges as the
/// plan flags. Weight is kept to one decimal.
pub fn set_field(form: &mut UserProfile, field: Field, value: &str) -> Result<(), CommandError> {
    match field {
        Field::Objective => form.objective = value.to_owned(),
        Field::Context => form.context = value.to_owned(),
        Field::Age => {
            form.age = value.parse().map_err(|e: std::num::ParseIntError| {
                CommandError::InvalidValue {
                    field: "edad",
                    detail: e.to_string(),
                }
            })?;
        }
        Field::Height => {
            let height: u32 = value.parse().map_err(|e: std::num::ParseIntError| {
                CommandError::InvalidValue {
                    field: "talla",
                    detail: e.to_string(),
                }
            })?;
            if !(MIN_HEIGHT_CM..=MAX_HEIGHT_CM).contains(&height) {
                return Err(CommandError::InvalidValue {
                    field: "talla",
                    detail: format!("debe estar entre {MIN_HEIGHT_CM} y {MAX_HEIGHT_CM}"),
                });
            }
            form.height_cm = height;
        }
        Field::Weight => {
            let weight: f64 = value.replace(',', ".").parse().map_err(
                |e: std::num::ParseFloatError| CommandError::InvalidValue {
                    field: "peso",
                    detail: e.to_string(),
                },
            )?;
            if !weight.is_finite() || !(0.0..=MAX_WEIGHT_KG).contains(&weight) {
                return Err(CommandError::InvalidValue {
                    field: "peso",
                    detail: format!("debe estar entre 0 y {MAX_WEIGHT_KG:.1}"),
                });
            }
            form.weight_kg = (weight * 10.0).round() / 10.0;
        }
    }
    Ok(())
}

/// Run the interactive loop until `quit` or end of input.
pub fn run_session<G, R, W>(
    app: &mut App<G>,
    renderer: &Renderer,
    input: R,
    out: &mut W,
) -> io::Result<()>
where
    G: Generator,
    R: BufRead,
    W: Write,
{
    let mut form = UserProfile::default();
    let mut last_listing: Vec<String> = Vec::new();

    writeln!(out, "NutrIA: Tu Asesor Nutricional con IA\n\n{HELP}\n")?;

    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line?;

        let command = match parse_command(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(e) => {
                renderer.write_view(out, &View::Warning(e.to_string()))?;
                continue;
            }
        };
        tracing::debug!(?command, "session command");

        match command {
            Command::Quit => break,
            Command::Help => writeln!(out, "{HELP}\n")?,
            Command::Profile => writeln!(out, "{form}\n")?,
            Command::Set(field, value) => match set_field(&mut form, field, &value) {
                Ok(()) => writeln!(out, "{form}\n")?,
                Err(e) => renderer.write_view(out, &View::Warning(e.to_string()))?,
            },
            Command::Ask(question) => renderer.write_view(out, &app.ask(&question))?,
            Command::Generate => {
                let view = app.generate_plan(&form);
                renderer.write_view(out, &view)?;
                if matches!(view, View::Plan(_)) {
                    writeln!(out, "{SAVE_HINT}\n")?;
                }
            }
            Command::Save => renderer.write_view(out, &app.save_plan())?,
            Command::History(limit) => {
                let view = app.history(limit);
                if let View::History(names) = &view {
                    last_listing = names.clone();
                }
                renderer.write_view(out, &view)?;
            }
            Command::Open(target) => {
                let name = resolve_selection(&target, &last_listing);
                renderer.write_view(out, &app.open_plan(name))?;
            }
            Command::Prompt => renderer.write_view(out, &app.last_prompt())?,
        }
    }
    Ok(())
}

/// `open 2` picks the second entry of the last history listing; anything
/// else is taken as a file name.
fn resolve_selection<'a>(target: &'a str, listing: &'a [String]) -> &'a str {
    target
        .parse::<usize>()
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| listing.get(i))
        .map_or(target, String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            parse_command("ask  ¿qué ceno hoy? ").unwrap(),
            Some(Command::Ask("¿qué ceno hoy?".into()))
        );
        assert_eq!(
            parse_command("set objetivo bajar de peso").unwrap(),
            Some(Command::Set(Field::Objective, "bajar de peso".into()))
        );
        assert_eq!(
            parse_command("history 3").unwrap(),
            Some(Command::History(Some(3)))
        );
        assert_eq!(
            parse_command("open 20240101_120000_a.txt").unwrap(),
            Some(Command::Open("20240101_120000_a.txt".into()))
        );
        assert_eq!(parse_command("GENERATE").unwrap(), Some(Command::Generate));
        assert_eq!(parse_command("exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn blank_line_is_no_command() {
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn parse_errors_are_specific() {
        assert_eq!(
            parse_command("dance"),
            Err(CommandError::Unknown("dance".into()))
        );
        assert_eq!(
            parse_command("ask"),
            Err(CommandError::MissingArgument("pregunta"))
        );
        assert_eq!(
            parse_command("set mood happy"),
            Err(CommandError::UnknownField("mood".into()))
        );
        assert!(matches!(
            parse_command("history many"),
            Err(CommandError::InvalidValue { .. })
        ));
    }

    #[test]
    fn set_field_accepts_english_and_spanish_names() {
        let mut form = UserProfile::default();
        set_field(&mut form, "age".parse().unwrap(), "41").unwrap();
        set_field(&mut form, "talla".parse().unwrap(), "165").unwrap();
        assert_eq!(form.age, 41);
        assert_eq!(form.height_cm, 165);
    }

    #[test]
    fn weight_rounded_to_one_decimal() {
        let mut form = UserProfile::default();
        set_field(&mut form, Field::Weight, "72,46").unwrap();
        assert_eq!(form.weight_kg, 72.5);
    }

    #[test]
    fn out_of_range_values_leave_form_unchanged() {
        let mut form = UserProfile::default();
        assert!(set_field(&mut form, Field::Height, "20").is_err());
        assert!(set_field(&mut form, Field::Weight, "900").is_err());
        assert!(set_field(&mut form, Field::Age, "-3").is_err());
        assert_eq!(form, UserProfile::default());
    }

    #[test]
    fn selection_by_number_uses_last_listing() {
        let listing = vec!["b.txt".to_owned(), "a.txt".to_owned()];
        assert_eq!(resolve_selection("2", &listing), "a.txt");
        assert_eq!(resolve_selection("3", &listing), "3");
        assert_eq!(resolve_selection("0", &listing), "0");
        assert_eq!(resolve_selection("c.txt", &listing), "c.txt");
    }
}
