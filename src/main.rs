use factory::cli::commands;
use factory::cli::output::Output;
use factory::cli::{Cli, Commands};
use factory::utils::config::Config;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", default_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(!cli.no_color))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    init_tracing(&cli);

    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = match &cli.env_file {
        Some(path) => Config::from_env_file(path),
        None => Config::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            return Err(e.into());
        }
    };

    let result = match cli.command {
        Commands::Api => commands::run_api(config, &output).await,
        Commands::Registry => commands::run_registry(config, &output).await,
        Commands::Notifier => commands::run_notifier(config, &output).await,
        Commands::SetupIndex => commands::setup_index(config, &output).await,
        Commands::RegisterTool { name, description } => {
            commands::register_tool(config, &output, name, description).await
        }
    };

    if let Err(e) = &result {
        output.error(&e.to_string());
    }
    result.map_err(Into::into)
}
