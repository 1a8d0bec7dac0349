use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use nutria::app::{self, App, View};
use nutria::cli::{Cli, Commands};
use nutria::config::NutriaConfig;
use nutria::credentials;
use nutria::gemini::GeminiClient;
use nutria::profile::UserProfile;
use nutria::render::Renderer;
use nutria::repl;
use nutria::storage::PlanStore;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            // Config errors happen before logging is configured; fall back to defaults.
            let _ = nutria::logging::init(None, None);
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = NutriaConfig::load(&cli.common)?;

    nutria::logging::init(config.log_level.as_deref(), config.log_file.as_deref())?;

    let renderer = Renderer::new(!cli.common.plain && io::stdout().is_terminal());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let views = match cli.command {
        Commands::Prompt(args) => vec![app::preview_prompt(&UserProfile::from(&args))],
        Commands::History(args) => vec![app::history_view(&open_store(&config), args.limit)],
        Commands::Show(args) => vec![app::open_view(&open_store(&config), &args.filename)],
        Commands::Ask(args) => {
            let client = connect(&config)?;
            let app = App::new(client, open_store(&config));
            vec![app.ask(&args.text())]
        }
        Commands::Plan(args) => {
            let client = connect(&config)?;
            let mut app = App::new(client, open_store(&config));
            let mut views = vec![app.generate_plan(&UserProfile::from(&args.profile))];
            if args.save && app.session().save_offered() {
                views.push(app.save_plan());
            }
            views
        }
        Commands::Session => {
            let client = connect(&config)?;
            let mut app = App::new(client, open_store(&config));
            let stdin = io::stdin();
            repl::run_session(&mut app, &renderer, stdin.lock(), &mut out)?;
            Vec::new()
        }
    };

    for view in &views {
        renderer.write_view(&mut out, view)?;
    }
    out.flush()?;

    Ok(if views.iter().any(View::is_error) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Plan store with its directory created. Failure to create it is only
/// logged; saving reports it again when it matters.
fn open_store(config: &NutriaConfig) -> PlanStore {
    let store = PlanStore::new(&config.storage_dir);
    if let Err(e) = store.ensure_dir() {
        warn!(err = %e, "plan directory unavailable");
    }
    store
}

/// Resolve the credential and build the Gemini client. A missing key stops
/// the command before anything is rendered.
fn connect(config: &NutriaConfig) -> anyhow::Result<GeminiClient> {
    let (key, source) = credentials::resolve_api_key(&config.secrets_path)?;
    info!(
        model = %config.model,
        api_base = %config.api_base,
        key_source = ?source,
        storage_dir = %config.storage_dir.display(),
        "config loaded"
    );
    Ok(GeminiClient::new(
        key,
        &config.model,
        &config.api_base,
        config.request_timeout(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn history_runs_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let plans = dir.path().join("plans");
        let code = run(cli(&[
            "nutria",
            "history",
            "--plain",
            "--storage-dir",
            plans.to_str().unwrap(),
            "--secrets",
            dir.path().join("absent.toml").to_str().unwrap(),
        ]))
        .expect("history needs no API key");
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(plans.is_dir(), "storage directory is created on startup");
    }

    #[test]
    fn show_missing_plan_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let code = run(cli(&[
            "nutria",
            "show",
            "20240101_000000_nope.txt",
            "--plain",
            "--storage-dir",
            dir.path().to_str().unwrap(),
        ]))
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[test]
    fn ask_fails_when_credential_missing() {
        if std::env::var_os("GEMINI_API_KEY").is_some() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let plans = dir.path().join("plans");
        let err = run(cli(&[
            "nutria",
            "ask",
            "hola",
            "--storage-dir",
            plans.to_str().unwrap(),
            "--secrets",
            dir.path().join("absent.toml").to_str().unwrap(),
        ]))
        .unwrap_err();
        assert!(
            format!("{err}").contains("GEMINI_API_KEY"),
            "unexpected: {err}"
        );
        assert!(!plans.exists(), "no plan directory before the key is found");
    }

    #[test]
    fn run_fails_on_bad_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("nutria.toml");
        fs::write(&cfg, "unknown_key = 1\n").unwrap();
        let err = run(cli(&["nutria", "history", "--config", cfg.to_str().unwrap()])).unwrap_err();
        assert!(
            format!("{err}").contains("failed to parse config file"),
            "unexpected: {err}"
        );
    }
}
