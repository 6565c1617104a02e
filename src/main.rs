mod report;

use buildmark::config::RuleFile;
use buildmark::{ParserRegistry, Session};
use clap::Parser;
use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Classify compiler, assembler, linker and make output into diagnostics.",
    after_help = "Exit codes:\n  0  Success.\n  1  Errors found (with --fail-on-error) or internal error.\n  2  Invalid arguments, rule file or input."
)]
struct Cli {
    /// Active rule ids in priority order (default: the registry defaults).
    #[arg(long, value_delimiter = ',')]
    rules: Option<Vec<String>>,

    /// TOML file with user-defined regex rules and default ids.
    #[arg(long, value_name = "TOML")]
    rule_file: Option<PathBuf>,

    /// Project that diagnostics without a file are attributed to.
    #[arg(long)]
    project: Option<String>,

    /// Directory relative file names are resolved against.
    #[arg(long, value_name = "DIR")]
    cwd: Option<PathBuf>,

    /// Copy every input line to stdout.
    #[arg(long)]
    echo: bool,

    /// Force ANSI color output.
    #[arg(long, overrides_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long, overrides_with = "color")]
    no_color: bool,

    /// Print the available rule ids and exit.
    #[arg(long)]
    list_rules: bool,

    /// Exit with status 1 when any error was reported.
    #[arg(long)]
    fail_on_error: bool,

    /// Build log to read; stdin when omitted.
    file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let registry = ParserRegistry::global();
    if let Some(path) = &cli.rule_file {
        if let Err(err) = RuleFile::load(path).and_then(|file| file.apply(registry)) {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    }

    if cli.list_rules {
        list_rules(registry);
        return ExitCode::SUCCESS;
    }

    let mut input: Box<dyn Read> = match &cli.file {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(file),
            Err(err) => {
                eprintln!("error: cannot open {}: {err}", path.display());
                return ExitCode::from(2);
            }
        },
        None => Box::new(io::stdin().lock()),
    };

    let color = if cli.no_color { false } else { cli.color || io::stdout().is_terminal() };
    let mut builder = Session::builder(registry).sink(move |d| report::print_diagnostic(&d, color));
    if let Some(ids) = cli.rules {
        builder = builder.rules(ids);
    }
    if let Some(project) = cli.project {
        builder = builder.project(project);
    }
    if let Some(dir) = cli.cwd {
        builder = builder.working_directory(dir);
    }
    if cli.echo {
        builder = builder.echo(io::stdout());
    }

    let mut session = builder.build();
    let metrics = match io::copy(&mut input, &mut session).and_then(|_| session.close()) {
        Ok(metrics) => metrics,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    report::print_summary(&metrics, color);

    if cli.fail_on_error && metrics.errors() > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BUILDMARK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn list_rules(registry: &ParserRegistry) {
    let defaults = registry.default_ids();
    for id in registry.available_ids() {
        let name = registry.get(&id).map(|rule| rule.name().to_string()).unwrap_or_default();
        let marker = if defaults.contains(&id) { "*" } else { " " };
        println!("{marker} {id:<8} {name}");
    }
}
