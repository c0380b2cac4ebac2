//! privateer init command

use clap::Args;
use std::path::PathBuf;

use super::serve::DEFAULT_CONFIG_FILE;

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Directory to initialize
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        let path = self.directory.join(DEFAULT_CONFIG_FILE);
        if path.exists() && !self.force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }

        std::fs::create_dir_all(&self.directory)?;
        std::fs::write(&path, serde_json::to_string_pretty(&example_config())?)?;

        println!("✓ Wrote {}", path.display());
        println!("  Start the server with: privateer serve --config {}", path.display());
        Ok(())
    }
}

/// A user, a bag only they can read, and one tiddler in it
fn example_config() -> serde_json::Value {
    serde_json::json!({
        "bindAddress": "127.0.0.1",
        "port": 8080,
        "scheme": "http",
        "maxDelegationDepth": 4,
        "storeDir": "store",
        "users": [
            {"name": "cdent", "password": "cowpoo", "roles": []}
        ],
        "bags": [
            {
                "name": "ho",
                "policy": {"read": ["cdent"], "write": ["cdent"]},
                "tiddlers": [
                    {"title": "junk", "text": "i am unique"}
                ]
            }
        ]
    })
}
