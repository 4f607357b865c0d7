use std::path::PathBuf;

use clap::Args;

use crate::config::ConfigOverrides;
use crate::library::FailurePolicy;

/// Configuration flags shared by every binary. Anything left unset falls back
/// to the environment, `.env` and `config.json`.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// JSON config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Env file with KEY=value lines
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Tube Archivist base URL
    #[arg(long)]
    pub ta_url: Option<String>,

    /// Jellyfin base URL
    #[arg(long)]
    pub jf_url: Option<String>,

    /// Archive video root where season folders are created
    #[arg(long, value_name = "PATH")]
    pub video_root: Option<PathBuf>,

    /// Name of the managed Jellyfin collection
    #[arg(long)]
    pub collection: Option<String>,

    /// Image used as the collection's artwork
    #[arg(long, value_name = "PATH")]
    pub collection_art: Option<PathBuf>,

    /// What to do when one show fails: abort or continue
    #[arg(long, value_name = "POLICY")]
    pub on_show_failure: Option<FailurePolicy>,
}

impl ConfigArgs {
    pub fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            ta_url: self.ta_url,
            jf_url: self.jf_url,
            ta_video_path: self.video_root,
            jf_folder: self.collection,
            collection_art: self.collection_art,
            on_show_failure: self.on_show_failure,
            env_path: self.env_file,
            config_path: self.config,
            ..ConfigOverrides::default()
        }
    }
}
