// typecalc CLI - evaluate calculator notes from files, stdin or a REPL

mod exit_codes;
mod render;
mod setup;

use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use typecalc_config::store::KeyValueStore;
use typecalc_core::{placeholder_text, Document, DocumentHistory};

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use setup::SessionOptions;

#[derive(Parser)]
#[command(name = "tcalc")]
#[command(about = "Notepad calculator: arithmetic, units and currencies, one line at a time")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Settings file (default: <config dir>/typecalc/settings.json)
    #[arg(long, global = true, env = "TYPECALC_CONFIG")]
    config: Option<PathBuf>,

    /// Store file for the rate cache and document history
    #[arg(long, global = true, env = "TYPECALC_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a document and print each line next to its result
    #[command(after_help = "\
Examples:
  tcalc eval notes.txt
  printf '2+1\\n3 miles to km\\ntotal' | tcalc eval
  tcalc eval notes.txt --json
  tcalc eval notes.txt --last")]
    Eval {
        /// Input file (omit to read from stdin)
        file: Option<PathBuf>,

        /// Print display tokens as JSON
        #[arg(long)]
        json: bool,

        /// Print only the last numeric result
        #[arg(long, conflicts_with = "json")]
        last: bool,

        /// Never call the AI fallback
        #[arg(long)]
        no_ai: bool,

        /// No network: no currency units, no AI
        #[arg(long)]
        offline: bool,
    },

    /// Interactive session; each line is added to the document
    Repl {
        #[arg(long)]
        no_ai: bool,

        #[arg(long)]
        offline: bool,
    },

    /// Show the home currency and the registered currency units
    Currency {
        #[arg(long)]
        json: bool,
    },

    /// List saved documents, newest first
    History {
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
    env_logger::Builder::new()
        .filter(None, log::LevelFilter::Warn)
        .filter(Some("typecalc_core"), level)
        .filter(Some("typecalc_providers"), level)
        .filter(Some("typecalc_config"), level)
        .filter(Some("tcalc"), level)
        .parse_env("RUST_LOG")
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = setup::load_settings(cli.config.as_deref());

    let result = match cli.command {
        None => {
            eprintln!("Usage: tcalc <command> [options]");
            eprintln!("       tcalc --help for more information");
            Ok(())
        }
        Some(Commands::Eval { file, json, last, no_ai, offline }) => {
            let options = SessionOptions { offline, no_ai };
            cmd_eval(&settings, cli.store, options, file, json, last)
        }
        Some(Commands::Repl { no_ai, offline }) => {
            cmd_repl(&settings, cli.store, SessionOptions { offline, no_ai })
        }
        Some(Commands::Currency { json }) => cmd_currency(&settings, cli.store, json),
        Some(Commands::History { json }) => cmd_history(cli.store, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn eval(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// eval
// ============================================================================

fn read_input(file: Option<&PathBuf>) -> Result<String, CliError> {
    let mut text = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| CliError::io(format!("stdin: {}", e)))?;
            buf
        }
    };
    // Documents are \n-separated; a trailing newline from the file is not a line
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(text.replace("\r\n", "\n"))
}

fn cmd_eval(
    settings: &typecalc_config::settings::Settings,
    store_path: Option<PathBuf>,
    options: SessionOptions,
    file: Option<PathBuf>,
    json: bool,
    last: bool,
) -> Result<(), CliError> {
    if let Some(path) = file.as_ref().filter(|p| !p.is_file()) {
        return Err(CliError::args(format!("no such file: {}", path.display())));
    }
    let text = read_input(file.as_ref())?;
    let mut store = setup::open_store(store_path.as_deref(), options.offline)?;
    let (mut calc, _) = setup::build_calculator(settings, options, store.as_mut())?;

    calc.set_text(&text);
    if calc.flush_ai(setup::ai_wait(settings)) {
        log::info!("AI answered for {} line(s)", calc.overrides().len());
    }

    if last {
        return match calc.last_numeric_result() {
            Some(n) => {
                println!("{}", render::format_number(n));
                Ok(())
            }
            None => Err(CliError::eval("No result to copy")),
        };
    }

    let tokens = calc.tokens();
    if json {
        let out = render::render_json(&tokens).map_err(|e| CliError::eval(e.to_string()))?;
        println!("{}", out);
    } else {
        print!("{}", render::render_text(calc.records(), &tokens));
    }
    Ok(())
}

// ============================================================================
// repl
// ============================================================================

const REPL_HELP: &str = ":clear  start over   :last  last result   :example  sample document   :quit  exit";

fn cmd_repl(
    settings: &typecalc_config::settings::Settings,
    store_path: Option<PathBuf>,
    options: SessionOptions,
) -> Result<(), CliError> {
    let mut store = setup::open_store(store_path.as_deref(), options.offline)?;
    let (mut calc, currencies) = setup::build_calculator(settings, options, store.as_mut())?;
    let currency_loaded = currencies.as_ref().is_some_and(|c| c.loaded());
    let wait = setup::ai_wait(settings);

    eprintln!("tcalc {}  ({})", env!("CARGO_PKG_VERSION"), REPL_HELP);

    let mut lines: Vec<String> = Vec::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().map_err(|e| CliError::io(e.to_string()))?;

        let mut input = String::new();
        let read = stdin.lock().read_line(&mut input).map_err(|e| CliError::io(e.to_string()))?;
        if read == 0 {
            break;
        }
        let line = input.trim_end_matches(['\n', '\r']);

        match line.trim() {
            ":quit" | ":q" => break,
            ":clear" => {
                lines.clear();
                calc.set_text("");
                continue;
            }
            ":last" => {
                match calc.last_numeric_result() {
                    Some(n) => println!("{}", render::format_number(n)),
                    None => println!("No result to copy"),
                }
                continue;
            }
            ":example" => {
                lines = placeholder_text(currency_loaded).split('\n').map(str::to_string).collect();
                calc.set_text(&lines.join("\n"));
                calc.flush_ai(wait);
                print!("{}", render::render_text(calc.records(), &calc.tokens()));
                continue;
            }
            cmd if cmd.starts_with(':') => {
                eprintln!("unknown command {:?}; {}", cmd, REPL_HELP);
                continue;
            }
            _ => {}
        }

        lines.push(line.to_string());
        calc.set_text(&lines.join("\n"));
        if calc.flush_ai(wait) {
            // The AI may have rewritten earlier lines
            lines = calc.text().split('\n').map(str::to_string).collect();
        }

        let token = calc.tokens().pop();
        if let Some(text) = token.as_ref().map(render::token_text).filter(|t| !t.is_empty()) {
            println!("  = {}", text);
        }
    }

    save_document(store.as_mut(), calc.text())
}

fn save_document(store: &mut dyn KeyValueStore, text: &str) -> Result<(), CliError> {
    if text.trim().is_empty() {
        return Ok(());
    }
    let doc = Document::new(text, chrono::Utc::now());
    DocumentHistory::new(store)
        .save(&doc)
        .map_err(|e| CliError::io(e.to_string()))?;
    log::info!("Saved document {} ({:?})", doc.id, doc.title);
    Ok(())
}

// ============================================================================
// currency
// ============================================================================

fn cmd_currency(
    settings: &typecalc_config::settings::Settings,
    store_path: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let mut store = setup::open_store(store_path.as_deref(), false)?;
    let mut engine = typecalc_engine::Engine::new();
    let setup = setup::provision_currencies(&mut engine, settings, store.as_mut())?;
    let report = &setup.report;

    if json {
        let out = serde_json::json!({
            "home": setup.home,
            "home_unit": report.home_unit,
            "rates_available": report.rates_available,
            "registered": report.registered,
            "skipped": report.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&out).map_err(|e| CliError::eval(e.to_string()))?);
        return Ok(());
    }

    println!("home currency:  {}", setup.home);
    if !report.rates_available {
        println!("rates:          unavailable");
        return Ok(());
    }
    println!("units:          {}", report.registered.len());
    if !report.skipped.is_empty() {
        println!("skipped:        {}", report.skipped.join(", "));
    }
    Ok(())
}

// ============================================================================
// history
// ============================================================================

fn cmd_history(store_path: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let mut store = setup::open_store(store_path.as_deref(), false)?;
    let history = DocumentHistory::new(store.as_mut());
    let docs = history.list();

    if json {
        let out = serde_json::to_string_pretty(&docs).map_err(|e| CliError::eval(e.to_string()))?;
        println!("{}", out);
        return Ok(());
    }

    if docs.is_empty() {
        eprintln!("No saved documents");
        return Ok(());
    }
    for doc in docs {
        println!("{}  {}  {}", doc.id, doc.modified, doc.title);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_eval_flags() {
        let cli = Cli::try_parse_from(["tcalc", "eval", "notes.txt", "--offline", "--last", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Eval { file, last, offline, json, no_ai }) => {
                assert_eq!(file, Some(PathBuf::from("notes.txt")));
                assert!(last && offline);
                assert!(!json && !no_ai);
            }
            _ => panic!("expected eval"),
        }
    }

    #[test]
    fn last_conflicts_with_json() {
        assert!(Cli::try_parse_from(["tcalc", "eval", "--json", "--last"]).is_err());
    }

    #[test]
    fn save_document_skips_blank_text() {
        let mut store = typecalc_config::store::MemoryStore::new();
        save_document(&mut store, "  \n").unwrap();
        assert!(store.keys().is_empty());
        save_document(&mut store, "2+1\n3x4").unwrap();
        assert_eq!(store.keys().len(), 1);
    }
}
