use std::path::PathBuf;

use clap::Parser;

use crate::export::ExportFormat;
use crate::pipeline::ScrapeSettings;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobscout", about = "Singapore job scraper with keyword filtering")]
pub struct Config {
    /// Directory where result files are written
    #[arg(long, env = "OUTPUT_DIR", default_value = "job_results")]
    pub output_dir: PathBuf,

    /// WebDriver endpoint used to render script-heavy sources
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:4444")]
    pub webdriver_url: String,

    /// Number of listing pages to fetch per source
    #[arg(long, env = "MAX_PAGES", default_value = "5")]
    pub max_pages: u32,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the web server (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,
    },
    /// Run one scrape from the command line and exit
    Scrape {
        /// Keywords to filter jobs
        #[arg(long, required = true, num_args = 1..)]
        keywords: Vec<String>,

        /// Search term for sites that require it
        #[arg(long, default_value = "")]
        search: String,

        /// Export format
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
    },
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }

    pub fn settings(&self) -> ScrapeSettings {
        ScrapeSettings {
            output_dir: self.output_dir.clone(),
            webdriver_url: self.webdriver_url.clone(),
            max_pages: self.max_pages,
        }
    }
}
