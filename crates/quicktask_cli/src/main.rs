use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use quicktask_cli::cli::{Cli, collect_overrides};
use quicktask_cli::render::{HELP_TEXT, render_json, render_plain};
use quicktask_core::Logic;
use quicktask_core::clock::SystemClock;
use quicktask_core::config::{Config, Palette};
use quicktask_core::error::AppError;
use quicktask_core::notify::notifier_from_env;
use quicktask_core::parser::CommandParser;
use quicktask_core::refresh::{self, Refresher, SharedLogic};
use quicktask_core::storage::JsonStore;
use std::io::{self, BufRead};
use tracing::warn;
use tracing_subscriber::EnvFilter;

struct Session {
    json: bool,
    palette: Palette,
}

fn install_tracing() {
    // RUST_LOG wins; otherwise only warnings reach stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
    println!("{HELP_TEXT}");
}

fn load_config(cli: &Cli) -> Config {
    let loaded = Config::load();
    if let Some(err) = &loaded.error {
        warn!(error = %err, "falling back to default configuration");
    }
    loaded
        .config
        .with_overrides(&collect_overrides(&cli.config_override))
}

fn open_logic(config: &Config) -> Result<Logic, AppError> {
    let store = JsonStore::from_env()?;
    let logic = Logic::load(Box::new(store), Box::new(SystemClock::local()))?;
    Ok(logic.with_parser(CommandParser::with_aliases(config.aliases.clone())))
}

fn run_line(logic: &mut Logic, line: &str, session: &Session) -> Result<(), AppError> {
    let status = logic.execute(line)?;
    let snapshot = logic.snapshot();
    if session.json {
        println!("{}", render_json(&status, &snapshot));
    } else {
        println!("{}", render_plain(&status, &snapshot, &session.palette));
    }
    Ok(())
}

fn run_interactive(logic: &SharedLogic, session: &Session) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let mut guard = refresh::lock(logic);
        if let Err(err) = run_line(&mut guard, line, session) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli);
    let session = Session {
        json: cli.json,
        palette: config.theme().palette(),
    };
    let mut logic = open_logic(&config)?;

    match cli.command_line() {
        Some(line) => run_line(&mut logic, &line, &session),
        None => {
            let notifier = notifier_from_env(config.notifications_enabled());
            let shared = refresh::shared(logic);
            let refresher = Refresher::spawn(shared.clone(), config.refresh_interval(), notifier);
            let result = run_interactive(&shared, &session);
            refresher.stop();
            result
        }
    }
}

fn main() {
    install_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
