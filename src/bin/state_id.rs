//! Operator tool for inspecting and building persisted state ids.
//!
//! ```bash
//! state-id decode search-index 'cluster_name:YzE=-index_id:aTE=-project_id:cDE='
//! state-id encode alert-configuration id=5f1b2c3d project_id=60ddf55c
//! state-id import search-index 60ddf55c--Cluster0--5d1268a9
//! ```

use anyhow::{Context, Result, anyhow, bail};
use atlas_provider::{
    config::{ConfigLoader, ProviderConfig},
    state_id::{ImportIdFormat, StateIdParts, StateIdSchema},
    telemetry::init_tracing,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

#[derive(Parser)]
#[command(name = "state-id")]
#[command(version)]
#[command(about = "Encode, decode and convert Atlas provider state ids")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Resource {
    #[value(alias = "alert_configuration")]
    AlertConfiguration,
    #[value(alias = "search_index")]
    SearchIndex,
}

impl Resource {
    fn kind(self) -> &'static str {
        match self {
            Resource::AlertConfiguration => "alert_configuration",
            Resource::SearchIndex => "search_index",
        }
    }

    fn schema(self) -> Result<StateIdSchema> {
        StateIdSchema::lookup(self.kind())
            .ok_or_else(|| anyhow!("no state id schema for {}", self.kind()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parts of an encoded state id as JSON
    Decode { resource: Resource, id: String },

    /// Build a state id from key=value parts
    Encode {
        resource: Resource,
        #[arg(required = true)]
        parts: Vec<String>,
    },

    /// Convert an operator import id into a state id
    Import { resource: Resource, import_id: String },
}

fn parse_pairs(pairs: &[String]) -> Result<StateIdParts> {
    let mut parts = StateIdParts::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{}'", pair))?;
        if parts.insert(key.to_string(), value.to_string()).is_some() {
            bail!("part '{}' given more than once", key);
        }
    }
    Ok(parts)
}

fn run(cli: Cli) -> Result<String> {
    match cli.command {
        Commands::Decode { resource, id } => {
            let parts = resource
                .schema()?
                .decode(&id)
                .with_context(|| format!("decoding {} id", resource.kind()))?;
            serde_json::to_string_pretty(&parts).context("serializing parts")
        }
        Commands::Encode { resource, parts } => {
            let parts = parse_pairs(&parts)?;
            resource
                .schema()?
                .encode(&parts)
                .with_context(|| format!("encoding {} id", resource.kind()))
        }
        Commands::Import {
            resource,
            import_id,
        } => {
            let format = ImportIdFormat::lookup(resource.kind())
                .ok_or_else(|| anyhow!("{} does not support import", resource.kind()))?;
            let parts = format
                .parse(&import_id)
                .with_context(|| format!("parsing {} import id", resource.kind()))?;
            debug!(resource = resource.kind(), parts = parts.len(), "parsed import id");
            format
                .schema()
                .encode(&parts)
                .with_context(|| format!("encoding {} id", resource.kind()))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Decoding ids works offline, so an incomplete environment only costs
    // the configured log settings.
    let config = ConfigLoader::new().load().unwrap_or_else(|err| {
        eprintln!("Warning: {}; using default log settings", err);
        ProviderConfig::default()
    });
    init_tracing(&config).context("initializing tracing")?;

    let output = run(cli)?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_converts_to_state_id() {
        let cli = Cli::parse_from(["state-id", "import", "search-index", "p1--c1--i1"]);
        assert_eq!(
            run(cli).unwrap(),
            "cluster_name:YzE=-index_id:aTE=-project_id:cDE="
        );
    }

    #[test]
    fn test_encode_then_decode() {
        let cli = Cli::parse_from([
            "state-id",
            "encode",
            "alert-configuration",
            "id=a1",
            "project_id=p1",
        ]);
        let id = run(cli).unwrap();

        let cli = Cli::parse_from(["state-id", "decode", "alert-configuration", id.as_str()]);
        let decoded: StateIdParts = serde_json::from_str(&run(cli).unwrap()).unwrap();
        assert_eq!(decoded.get("id").map(String::as_str), Some("a1"));
    }

    #[test]
    fn test_rejects_malformed_pairs() {
        assert!(parse_pairs(&["id".to_string()]).is_err());
        assert!(parse_pairs(&["id=a".to_string(), "id=b".to_string()]).is_err());
    }
}
