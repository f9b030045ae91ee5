//! Command-line arguments

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use cloudnet_provider::ModuleParams;

use crate::output::OutputFormat;

/// Declare a network present or absent on a CloudStack cloud
#[derive(Parser, Debug)]
#[command(name = "cs-network")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file with module arguments; flags override its values
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Name of the network
    #[arg(long)]
    pub name: Option<String>,

    /// Display text of the network (defaults to the name)
    #[arg(long)]
    pub display_name: Option<String>,

    /// Name or ID of the network offering
    #[arg(long)]
    pub network_offering: Option<String>,

    /// Name or ID of the zone
    #[arg(long)]
    pub zone: Option<String>,

    /// Name, display text or ID of the project
    #[arg(long)]
    pub project: Option<String>,

    /// Name, path or ID of the domain
    #[arg(long)]
    pub domain: Option<String>,

    /// Desired state of the network
    #[arg(long, value_parser = ["present", "absent"])]
    pub state: Option<String>,

    /// Tag for the network (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Wait for async jobs to finish (yes/no)
    #[arg(long, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub poll_async: Option<bool>,

    /// API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// API secret
    #[arg(long)]
    pub api_secret: Option<String>,

    /// API endpoint URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// HTTP method for API calls
    #[arg(long, value_parser = ["get", "post"])]
    pub api_http_method: Option<String>,

    /// Credentials file section
    #[arg(long)]
    pub api_region: Option<String>,

    /// Seconds between async job polls
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Give up on an async job after this many polls
    #[arg(long)]
    pub poll_max_attempts: Option<u32>,

    /// Give up on an async job after this many seconds
    #[arg(long, value_name = "SECS")]
    pub poll_timeout: Option<u64>,

    /// Report what would change without changing anything
    #[arg(long)]
    pub check: bool,

    /// Output format
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parameters from `--params`, overlaid with the flags
    pub fn module_params(&self) -> Result<ModuleParams> {
        let base = match &self.params {
            Some(path) => ModuleParams::from_file(path)
                .with_context(|| format!("Failed to read parameters from {}", path.display()))?,
            None => ModuleParams::default(),
        };
        Ok(base.merge(self.overrides()))
    }

    fn overrides(&self) -> ModuleParams {
        ModuleParams {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            network_offering: self.network_offering.clone(),
            zone: self.zone.clone(),
            project: self.project.clone(),
            domain: self.domain.clone(),
            state: self.state.clone(),
            tags: (!self.tags.is_empty()).then(|| self.tags.clone()),
            poll_async: self.poll_async,
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
            api_url: self.api_url.clone(),
            api_http_method: self.api_http_method.clone(),
            api_region: self.api_region.clone(),
            poll_interval: self.poll_interval,
            poll_max_attempts: self.poll_max_attempts,
            poll_timeout: self.poll_timeout,
            check_mode: self.check.then_some(true),
        }
    }
}
