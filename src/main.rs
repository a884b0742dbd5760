//! VittaCash CLI - cached access to the VittaCash expense API

use clap::Parser;
use log::LevelFilter;

use vittacash::cli::{
    self, CacheCommands, Cli, CommandContext, Commands, ExpenseCommands, GlobalOptions,
    ReportCommands,
};
use vittacash::client::ReportRequest;
use vittacash::error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);
    let ctx = CommandContext::new(&opts)?;
    let sweeper = ctx
        .cache
        .start_sweeper(ctx.config.cache.sweep_intervals());

    let result = match cli.command {
        Commands::Cache(cmd) => match cmd {
            CacheCommands::Status => cli::cache::status(&ctx),
            CacheCommands::Clear => cli::cache::clear(&ctx),
            CacheCommands::Sweep => cli::cache::sweep(&ctx),
            CacheCommands::Path => cli::cache::path(&ctx),
        },
        Commands::Expenses(cmd) => match cmd {
            ExpenseCommands::List { filters } => cli::expense::list(&ctx, &filters).await,
            ExpenseCommands::Get { id } => cli::expense::get(&ctx, &id).await,
            ExpenseCommands::Delete { id } => cli::expense::delete(&ctx, &id).await,
            ExpenseCommands::Import { file } => cli::expense::import(&ctx, &file).await,
        },
        Commands::Report(cmd) => {
            let request = match cmd {
                ReportCommands::Monthly { year, month } => ReportRequest::Monthly { year, month },
                ReportCommands::Yearly { year } => ReportRequest::Yearly { year },
            };
            cli::report::show(&ctx, request).await
        }
    };

    sweeper.shutdown().await;
    result
}
