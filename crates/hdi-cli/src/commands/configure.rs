//! `hdi configure` - persist connection defaults to `~/.hdi/config.json`

use clap::Args;

use crate::config::{load_config, save_config, HdiConfig};
use crate::Result;

/// Show or update stored connection settings
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Subscription id
    #[arg(long)]
    pub subscription_id: Option<String>,

    /// Management endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bearer token for the management endpoint
    #[arg(long)]
    pub access_token: Option<String>,

    /// Refuse to create a cluster that already exists
    #[arg(long)]
    pub require_import: Option<bool>,

    /// Seconds between operation status checks
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl ConfigureArgs {
    fn as_config(&self) -> HdiConfig {
        HdiConfig {
            subscription_id: self.subscription_id.clone(),
            endpoint: self.endpoint.clone(),
            access_token: self.access_token.clone(),
            require_import: self.require_import,
            poll_interval_secs: self.poll_interval_secs,
            timeout_secs: self.timeout_secs,
        }
    }
}

fn redacted(config: &HdiConfig) -> HdiConfig {
    let mut shown = config.clone();
    if shown.access_token.is_some() {
        shown.access_token = Some("<redacted>".to_string());
    }
    shown
}

pub fn run(args: ConfigureArgs) -> Result<()> {
    let updates = args.as_config();
    let mut config = load_config()?;

    if updates != HdiConfig::default() {
        config.merge(updates);
        let path = save_config(&config)?;
        eprintln!("saved {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(&redacted(&config))?);
    Ok(())
}
