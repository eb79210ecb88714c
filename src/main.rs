use clap::Parser;
use tracing_subscriber::EnvFilter;

use billmatch::cli::{self, Cli, Commands};
use billmatch::settings::load_settings;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(load_settings().log_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Upload { files, kind } => cli::upload::run(&files, kind),
        Commands::Link { json } => cli::link::run(json),
        Commands::Search { query, kind, json } => cli::search::run(query.as_deref(), kind, json),
        Commands::Report { command } => cli::report::run(command),
        Commands::Show { kind, id, json } => cli::show::run(kind, id, json),
        Commands::Load { path } => cli::load::run(&path),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
