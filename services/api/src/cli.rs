use crate::demo::{run_demo, DemoArgs};
use crate::server;
use crate::train::{run_train, TrainArgs};
use clap::{Args, Parser, Subcommand};
use risk_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Risk Severity Service",
    about = "Score, classify and learn from operational risk assessments",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Retrain the risk classifier against the configured JSON stores
    Train(TrainArgs),
    /// Run an end-to-end demo on in-memory stores with a scripted advisor
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Train(args) => run_train(args),
        Command::Demo(args) => run_demo(args),
    }
}
