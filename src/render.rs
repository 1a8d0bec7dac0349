//! Projection of [`View`] values to terminal text.
//!
//! [`render`] is pure and produces Markdown; [`Renderer`] decides whether that
//! Markdown is styled with termimad or written as-is.

use std::io::{self, Write};

use termimad::{MadSkin, crossterm::style::Color};

use crate::app::View;

/// Markdown for one view.
pub fn render(view: &View) -> String {
    match view {
        View::Answer(text) => format!("## Respuesta del Nutricionista IA\n\n{text}"),
        View::Plan(text) => format!("## Plan generado con éxito\n\n{text}"),
        View::Saved { filename, dir } => format!(
            "Plan guardado exitosamente como **{filename}** en la carpeta **{}**.",
            dir.display()
        ),
        View::History(names) => {
            let mut out = String::from("## 📚 Historial de Planes Guardados\n\n");
            for (i, name) in names.iter().enumerate() {
                out.push_str(&format!("{}. {name}\n", i + 1));
            }
            out
        }
        View::PlanContent { filename, content } => {
            format!("## Contenido de: {filename}\n\n{content}")
        }
        View::Prompt(prompt) => {
            format!("## Prompt enviado a la IA\n\n```markdown\n{prompt}\n```")
        }
        View::Info(msg) => format!("ℹ️  {msg}"),
        View::Warning(msg) => format!("⚠️  {msg}"),
        View::Error(msg) => format!("❌ {msg}"),
    }
}

/// Writes rendered views, styled or plain.
pub struct Renderer {
    rich: bool,
    skin: MadSkin,
}

impl Renderer {
    pub fn new(rich: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Green);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.code_block.set_bg(Color::AnsiValue(238));
        skin.inline_code.set_bg(Color::AnsiValue(238));
        Self { rich, skin }
    }

    pub fn write_view<W: Write>(&self, out: &mut W, view: &View) -> io::Result<()> {
        let markdown = render(view);
        if self.rich {
            write!(out, "{}", self.skin.term_text(&markdown))?;
        } else {
            writeln!(out, "{markdown}")?;
        }
        writeln!(out)
    }
}
