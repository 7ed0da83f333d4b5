use clap::Parser;
use pwvault::cli::commands;
use pwvault::cli::{Cli, Commands};

fn main() {
    pwvault::logging::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Add {
            ref category,
            ref account,
            ref pw,
            ref cpw,
        } => commands::add::execute(&cli, category, account, pw.as_deref(), cpw.as_deref()),
        Commands::Remove {
            ref id,
            ref category,
            ref account,
            all,
        } => commands::remove::execute(
            &cli,
            id.as_deref(),
            category.as_deref(),
            account.as_deref(),
            all,
        ),
        Commands::List => commands::list::execute(&cli),
        Commands::Audit { last } => commands::audit_cmd::execute(&cli, last),
        Commands::Version => commands::version::execute(),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        pwvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
