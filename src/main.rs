use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "relay")]
#[command(
    about = "A two-stage AI code modification pipeline: plan with a level 1 model, apply per file with a level 2 model",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable verbose debug output")]
    verbose: bool,

    #[arg(
        long,
        global = true,
        help = "Report planned actions without calling the model or writing files"
    )]
    dry_run: bool,

    #[arg(
        long,
        global = true,
        help = "Path to a settings file (defaults to relay.yml when present)"
    )]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print the project structure listing")]
    Tree {
        #[arg(help = "Project directory to load")]
        project_dir: PathBuf,
    },

    #[command(about = "Render the level 1 planning prompt for a project")]
    Prompt {
        #[arg(help = "Project directory to load")]
        project_dir: PathBuf,

        #[arg(long, help = "File containing the user requirements section")]
        requirements: Option<PathBuf>,

        #[arg(long, help = "Write the prompt to a file instead of stdout")]
        output: Option<PathBuf>,
    },

    #[command(
        about = "Parse a level 1 response and apply its modifications via the level 2 model"
    )]
    Apply {
        #[arg(help = "Project directory to load")]
        project_dir: PathBuf,

        #[arg(help = "File holding the level 1 model's response")]
        level1_output: PathBuf,

        #[arg(
            long,
            help = "Write the modified project to this directory instead of in place"
        )]
        out: Option<PathBuf>,

        #[arg(long, help = "Bypass the on-disk response cache")]
        no_cache: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli::Config {
        verbose: cli.verbose,
        dry_run: cli.dry_run,
    };
    let settings = relay::settings::Settings::load(cli.settings.as_deref())?;

    match cli.command {
        Commands::Tree { project_dir } => {
            cli::tree(&project_dir, &settings, &config)?;
        }
        Commands::Prompt {
            project_dir,
            requirements,
            output,
        } => {
            cli::prepare_prompt(
                &project_dir,
                requirements.as_deref(),
                output.as_deref(),
                &settings,
                &config,
            )?;
        }
        Commands::Apply {
            project_dir,
            level1_output,
            out,
            no_cache,
        } => {
            cli::apply(
                &project_dir,
                &level1_output,
                out.as_deref(),
                no_cache,
                &settings,
                &config,
            )
            .await?;
        }
    }

    Ok(())
}
