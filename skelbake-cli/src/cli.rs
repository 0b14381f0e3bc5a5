//! Root CLI structure for skelbake

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::commands::bake::BakeArgs;
use crate::commands::info::InfoArgs;

#[derive(Parser)]
#[command(name = "skelbake")]
#[command(about = "Bake skeletal animation poses into static meshes", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Log level selected by `-v` (repeatable) and `-q`
    pub fn log_level(&self) -> log::LevelFilter {
        match (self.verbose, self.quiet) {
            (0, true) => log::LevelFilter::Error,
            (0, false) => log::LevelFilter::Warn,
            (1, _) => log::LevelFilter::Info,
            (2, _) => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deform a mesh into an animation pose and write it as OBJ
    Bake(BakeArgs),

    /// Show the joints, animations and meshes of a scene file
    Info(InfoArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
