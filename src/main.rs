use clap::{ArgAction, Args, Parser, Subcommand};
use retro::commands::autoremove::AutoremoveOptions;
use retro::commands::compress::CompressOptions;
use retro::commands::config_cmd::ConfigOptions;
use retro::commands::install::InstallOptions;
use retro::commands::remove::RemoveOptions;
use retro::commands::search::SearchOptions;
use retro::commands::{
    execute_autoremove, execute_compress, execute_config, execute_install, execute_list,
    execute_remove, execute_search, execute_update,
};
use retro::error::AppError;

fn main() {
    retro::logging::init();
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Update => execute_update()?,
        Commands::Install(args) => {
            execute_install(InstallOptions { query: args.query, assume_yes: args.yes })?;
        }
        Commands::Remove(args) => {
            execute_remove(RemoveOptions { query: args.query, assume_yes: args.yes })?;
        }
        Commands::List => execute_list()?,
        Commands::Search(args) => execute_search(SearchOptions { query: args.query })?,
        Commands::Compress(args) => execute_compress(CompressOptions { assume_yes: args.yes })?,
        Commands::Autoremove(args) => {
            let options = AutoremoveOptions {
                assume_yes: args.yes,
                regions: (!args.regions.is_empty()).then_some(args.regions),
                verbose: args.verbose,
            };
            execute_autoremove(options)?;
        }
        Commands::Config(args) => {
            let options = ConfigOptions {
                show_path: args.path,
                edit: args.edit,
                add_exclude: args.add_exclude,
            };
            execute_config(options)?;
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "retro", version, about = "Fetch, install and tidy game collections from directory listings.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the package catalog from every configured system.
    #[command(visible_alias = "u")]
    Update,
    /// Download and install the packages matching a query.
    #[command(visible_alias = "i")]
    Install(QueryArgs),
    /// Delete installed games matching a query.
    #[command(visible_alias = "rm")]
    Remove(QueryArgs),
    /// List installed games.
    #[command(visible_alias = "ls")]
    List,
    /// Search the catalog.
    #[command(visible_alias = "s")]
    Search(SearchArgs),
    /// Convert .iso, .cue and .gdi images to CHD.
    #[command(visible_alias = "c")]
    Compress(YesArgs),
    /// Remove duplicate games, keeping the best version of each title.
    #[command(visible_alias = "ar")]
    Autoremove(AutoremoveArgs),
    /// Manage retro configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// System ids, keywords, `-keyword` exclusions, or `all <system>`.
    #[arg(value_name = "QUERY", required = true, num_args = 1.., allow_hyphen_values = true)]
    query: Vec<String>,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long = "yes", action = ArgAction::SetTrue)]
    yes: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// System ids, keywords, `-keyword` exclusions, or `all <system>`.
    #[arg(value_name = "QUERY", required = true, num_args = 1.., allow_hyphen_values = true)]
    query: Vec<String>,
}

#[derive(Args)]
struct YesArgs {
    /// Skip the confirmation prompt.
    #[arg(short = 'y', long = "yes", action = ArgAction::SetTrue)]
    yes: bool,
}

#[derive(Args)]
struct AutoremoveArgs {
    /// Skip the confirmation prompt.
    #[arg(short = 'y', long = "yes", action = ArgAction::SetTrue)]
    yes: bool,

    /// Region priority, best first (e.g. USA,Europe,Japan).
    #[arg(long = "regions", value_delimiter = ',', value_name = "REGION")]
    regions: Vec<String>,

    /// Report unreadable files while scanning.
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Args)]
struct ConfigArgs {
    /// Show the configuration file paths.
    #[arg(long = "path", action = ArgAction::SetTrue)]
    path: bool,

    /// Open the settings file in $EDITOR.
    #[arg(long = "edit", action = ArgAction::SetTrue)]
    edit: bool,

    /// Add a glob pattern for files retro should never list or delete.
    #[arg(long = "add-exclude", value_name = "PATTERN")]
    add_exclude: Option<String>,
}
