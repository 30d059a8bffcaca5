//! Command implementations.

use std::sync::Arc;

use tacindex_core::registry::MsgTypeRegistry;
use tacindex_core::types::IndexStats;
use tacindex_cosmos::{HttpCosmosClient, IndexerBuilder};
use tacindex_storage::InMemoryStorage;

use crate::config::Config;
use crate::error::CmdError;

/// `index` — run the indexer until `end_height` or Ctrl-C.
pub fn run_index(config: Config, registry: MsgTypeRegistry) -> Result<(), CmdError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CmdError::Runtime)?;

    runtime.block_on(index(config, registry))
}

async fn index(config: Config, registry: MsgTypeRegistry) -> Result<(), CmdError> {
    let client = HttpCosmosClient::new(
        &config.probe.rpc,
        &config.probe.api,
        config.http_client_config(),
    )?;

    let builder = IndexerBuilder::from_config(config.indexer_config()).registry(Arc::new(registry));
    let builder = match &config.database.url {
        Some(url) => with_postgres(builder, url, &config).await?,
        None => {
            tracing::warn!("no database configured; indexed data is kept in memory");
            builder.store(Arc::new(InMemoryStorage::new()))
        }
    };
    let mut index_loop = builder.build(client);

    tracing::info!(
        chain_id = %config.probe.chain_id,
        rpc = %config.probe.rpc,
        api = %config.probe.api,
        indexer_id = %config.base.indexer_id,
        "starting indexer"
    );

    let finished = tokio::select! {
        res = index_loop.run() => Some(res),
        _ = tokio::signal::ctrl_c() => None,
    };

    let stats = match finished {
        Some(res) => res?,
        None => {
            tracing::info!("shutdown requested");
            index_loop.shutdown().await?;
            index_loop.stats()
        }
    };

    log_summary(&stats, index_loop.last_indexed());
    Ok(())
}

#[cfg(feature = "postgres")]
async fn with_postgres(
    builder: IndexerBuilder,
    url: &str,
    config: &Config,
) -> Result<IndexerBuilder, CmdError> {
    use tacindex_storage::postgres::{PostgresOptions, PostgresStorage};

    let opts = PostgresOptions {
        max_connections: config.database.max_connections,
        ..PostgresOptions::default()
    };
    let storage = PostgresStorage::connect_with_options(url, opts).await?;
    tracing::info!("connected to PostgreSQL");
    Ok(builder.store(Arc::new(storage)))
}

#[cfg(not(feature = "postgres"))]
async fn with_postgres(
    _builder: IndexerBuilder,
    _url: &str,
    _config: &Config,
) -> Result<IndexerBuilder, CmdError> {
    Err(CmdError::Config(
        "database.url is set but this build has no PostgreSQL support".into(),
    ))
}

fn log_summary(stats: &IndexStats, last: Option<u64>) {
    tracing::info!(
        blocks = stats.blocks,
        txs = stats.txs,
        known_msgs = stats.known_msgs,
        unknown_msgs = stats.unknown_msgs,
        invalid_msgs = stats.invalid_msgs,
        last_height = last,
        "indexing finished"
    );
}

/// `types` — one line per registered type URL.
pub fn print_types(registry: &MsgTypeRegistry) {
    for line in type_lines(registry) {
        println!("{line}");
    }
}

fn type_lines(registry: &MsgTypeRegistry) -> Vec<String> {
    if registry.is_empty() {
        return vec!["no message types registered".to_string()];
    }
    registry
        .type_urls()
        .into_iter()
        .filter_map(|url| {
            let msg = registry.get(url)?;
            Some(format!(
                "{url:<45} route={:<8} type={} ({msg})",
                msg.route(),
                msg.msg_type()
            ))
        })
        .collect()
}

/// `info` — the effective configuration as TOML, secrets masked.
pub fn print_info(config: &Config, registry: &MsgTypeRegistry) -> Result<(), CmdError> {
    print!("{}", info_text(config, registry)?);
    Ok(())
}

fn info_text(config: &Config, registry: &MsgTypeRegistry) -> Result<String, CmdError> {
    let rendered = toml::to_string_pretty(&config.redacted())
        .map_err(|e| CmdError::Config(format!("cannot render configuration: {e}")))?;
    let storage = if config.database.url.is_some() { "postgres" } else { "memory" };
    Ok(format!(
        "tac-indexer v{}\n  Registered message types: {}\n  Storage: {storage}\n\n{rendered}",
        env!("CARGO_PKG_VERSION"),
        registry.len(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use tacindex_core::error::MsgError;
    use tacindex_core::msg::{AccAddress, Msg, ProtoMessage};

    #[derive(Debug)]
    struct Delegate;

    impl fmt::Display for Delegate {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("MsgDelegate")
        }
    }

    impl ProtoMessage for Delegate {
        fn reset(&mut self) {}
    }

    impl Msg for Delegate {
        fn route(&self) -> &str {
            "staking"
        }
        fn msg_type(&self) -> &str {
            "delegate"
        }
        fn validate_basic(&self) -> Result<(), MsgError> {
            Ok(())
        }
        fn sign_bytes(&self) -> Vec<u8> {
            vec![]
        }
        fn signers(&self) -> Vec<AccAddress> {
            vec![]
        }
    }

    #[test]
    fn type_lines_list_registered_types() {
        let mut registry = MsgTypeRegistry::new();
        assert_eq!(type_lines(&registry), vec!["no message types registered"]);

        registry
            .register("/cosmos.staking.v1beta1.MsgDelegate", Box::new(Delegate))
            .unwrap();
        let lines = type_lines(&registry);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("/cosmos.staking.v1beta1.MsgDelegate"));
        assert!(lines[0].contains("route=staking"));
        assert!(lines[0].contains("type=delegate (MsgDelegate)"));
    }

    #[test]
    fn print_info_renders_defaults() {
        print_info(&Config::default(), &MsgTypeRegistry::new()).unwrap();
    }

    #[test]
    fn info_text_never_shows_the_database_password() {
        let mut config = Config::default();
        config.database.url = Some("postgres://tac:s3cr3t@db:5432/tac".into());
        let text = info_text(&config, &MsgTypeRegistry::new()).unwrap();
        assert!(!text.contains("s3cr3t"), "{text}");
        assert!(text.contains("postgres://tac:***@db:5432/tac"), "{text}");
        assert!(text.contains("Storage: postgres"), "{text}");
    }
}
