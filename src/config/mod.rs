use std::path::PathBuf;

use clap::Parser;

use crate::utils::normalize_base;

pub const DEFAULT_ADDR: &str = "127.0.0.1:6250";
pub const DEFAULT_HOME: &str = "Home";

/// Command line flags, each falling back to an environment variable and then a default
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "SAM_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Wiki root directory (`~/` is expanded)
    #[arg(long, env = "SAM_DIR", default_value = "./", value_hint = clap::ValueHint::DirPath)]
    pub dir: String,

    /// Base URL path the wiki is mounted under
    #[arg(long, env = "SAM_BASE", default_value = "/")]
    pub base: String,

    /// Page that `/` redirects to
    #[arg(long, env = "SAM_HOME", default_value = DEFAULT_HOME)]
    pub home: String,

    /// Directory served under `/assets/`
    #[arg(long, env = "SAM_ASSETS", default_value = "assets", value_hint = clap::ValueHint::DirPath)]
    pub assets: PathBuf,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: String,
    pub dir: PathBuf,
    pub base: String,
    pub home: String,
    pub assets_dir: PathBuf,
}

impl Config {
    /// Create a configuration for `dir` with default values
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            dir: dir.into(),
            base: "/".to_string(),
            home: DEFAULT_HOME.to_string(),
            assets_dir: PathBuf::from("assets"),
        }
    }

    pub fn with_base(mut self, base: &str) -> Self {
        self.base = normalize_base(base);
        self
    }

    pub fn with_home(mut self, home: &str) -> Self {
        self.home = home.trim_matches('/').to_string();
        self
    }

    pub fn with_assets_dir(mut self, assets: impl Into<PathBuf>) -> Self {
        self.assets_dir = assets.into();
        self
    }

    pub fn with_addr(mut self, addr: &str) -> Self {
        self.addr = addr.to_string();
        self
    }

    /// Build configuration from parsed command line flags
    pub fn from_cli(cli: Cli) -> Self {
        Self::new(expand_dir(&cli.dir))
            .with_addr(&cli.addr)
            .with_base(&cli.base)
            .with_home(&cli.home)
            .with_assets_dir(cli.assets)
    }

    /// Parse the process arguments and environment
    pub fn load() -> Self {
        Self::from_cli(Cli::parse())
    }

    /// Directory whose files are served for otherwise unmatched paths
    pub fn static_dir(&self) -> PathBuf {
        self.dir.join("static")
    }

    pub fn redirects_file(&self) -> PathBuf {
        self.dir.join("redirects.conf")
    }

    /// Custom HTML shell replacing the built-in one
    pub fn custom_template(&self) -> PathBuf {
        self.dir.join("index.html")
    }
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_dir(dir: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(dir).into_owned())
}
