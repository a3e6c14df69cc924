use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;

use prd_builder::commands::{self, CommandError};
use prd_builder::config::ProviderArgs;
use prd_builder::session::DEFAULT_SESSION_FILE;

#[derive(Parser, Debug)]
#[command(
    name = "prd-builder",
    version,
    about = "Conversational PRD builder: turns a product chat into a structured requirements document",
    arg_required_else_help = true
)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat interactively; each line you type is one turn
    Chat {
        /// Session file to read and update
        #[arg(short, long, default_value = DEFAULT_SESSION_FILE)]
        session: PathBuf,

        /// Continue an existing session file
        #[arg(long)]
        resume: bool,

        /// Replace an existing session file
        #[arg(long, conflicts_with = "resume")]
        force: bool,
    },

    /// Run a single turn against a session file and print the response as JSON
    Turn {
        /// The user message for this turn
        #[arg(short, long)]
        message: String,

        #[arg(short, long, default_value = DEFAULT_SESSION_FILE)]
        session: PathBuf,
    },

    /// Read a chat request JSON from stdin and write the chat response JSON
    Respond,

    /// Print the PRD stored in a session file
    Show {
        #[arg(short, long, default_value = DEFAULT_SESSION_FILE)]
        session: PathBuf,
    },

    /// Delete a session file and start over
    Reset {
        #[arg(short, long, default_value = DEFAULT_SESSION_FILE)]
        session: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let Cli { provider, command } = cli;

    match command {
        Commands::Chat {
            session,
            resume,
            force,
        } => {
            let config = provider.resolve()?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            commands::chat::run(&config, &session, resume, force, stdin, &mut stdout).await
        }
        Commands::Turn { message, session } => {
            let config = provider.resolve()?;
            let response = commands::session::run_turn(&config, &session, &message).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Respond => {
            let config = provider.resolve()?;
            let mut input = String::new();
            tokio::io::stdin().read_to_string(&mut input).await?;
            println!("{}", commands::respond::respond(&config, &input).await?);
            Ok(())
        }
        Commands::Show { session } => {
            println!("{}", commands::session::show(&session)?);
            Ok(())
        }
        Commands::Reset { session } => {
            if commands::session::reset(&session)? {
                println!("Removed {}", session.display());
            } else {
                println!("No session at {}", session.display());
            }
            Ok(())
        }
    }
}
