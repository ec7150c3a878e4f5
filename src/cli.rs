use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "transcript-api")]
#[command(about = "YouTube transcript extraction service", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Print the formatted transcript of a video
    Transcript {
        /// YouTube video URL
        url: String,

        /// Preferred transcript language code
        #[arg(short, long)]
        language: Option<String>,

        /// Print the JSON response instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// List the transcript languages of a video
    Languages {
        /// YouTube video URL
        url: String,

        /// Print JSON instead of one language per line
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}
