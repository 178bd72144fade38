//! Navigation en ligne de commande dans les dossiers partagés.
//!
//! ```sh
//! PMOSHARE_CONFIG=pmoshare.yaml cargo run --example browse_share -- 1
//! cargo run --example browse_share -- 1.2 --metadata
//! ```

use pmocontentdir::{ActionResult, BrowseRequest, Config, ContentDirectory};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let object_id = args.next().unwrap_or_else(|| "0".to_string());
    let metadata = args.next().as_deref() == Some("--metadata");

    let directory = ContentDirectory::new(Config::load()?);
    let request = if metadata {
        BrowseRequest::metadata(object_id.as_str())
    } else {
        BrowseRequest::direct_children(object_id.as_str(), 0, -1)
    };

    match directory.browse(&request) {
        ActionResult::Fields(fields) => {
            for (name, value) in fields {
                println!("{}: {}", name, value);
            }
        }
        ActionResult::Illegal => {
            eprintln!("Browse of {} failed: illegal object id", object_id);
            std::process::exit(1);
        }
    }
    Ok(())
}
