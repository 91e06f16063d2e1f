use std::{sync::Arc, time::Duration};

use clap::Parser;
use petitions::{
    config::{ConfigError, PetitionsConfig},
    render::{ListView, PetitionDetail},
    store::LoadState,
    transport::HttpTransport,
    GetPetitions, Store,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    main_inner().await?;
    Ok(())
}

async fn main_inner() -> Result<(), Error> {
    let args = cli::PetitionsCli::parse();
    debug!("Got the following args: {args:?}");

    let mut config = PetitionsConfig::from_env()?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(limit) = args.limit {
        config.limit = limit;
    }
    let endpoint = config.endpoint_url()?;
    info!("Using feed {endpoint}");

    let store = Store::new();
    let pipeline = GetPetitions::builder()
        .store(store.clone())
        .transport(Arc::new(HttpTransport::new()))
        .endpoint(endpoint)
        .build();

    // subscribe before fetching so the first change cannot be missed
    let changes = store.subscribe();
    pipeline.fetch();
    let wait = Duration::from_secs(args.wait_secs);
    match tokio::time::timeout(wait, changes.recv_async()).await {
        Ok(Ok(change)) => debug!(?change, "Store changed"),
        _ => warn!("No petitions after {}s, still loading", args.wait_secs),
    }

    let petitions = store.petitions();
    match args.command {
        cli::Command::List => {
            let view = ListView {
                state: store.load_state(),
                petitions: &petitions,
            };
            println!("{view}");
        }
        cli::Command::Show { id, confirm } => {
            if store.load_state() == LoadState::Loading {
                return Err(Error::NotLoaded);
            }
            let petition = store.get(&id).ok_or(Error::UnknownPetition(id))?;
            let view = PetitionDetail {
                petition: &petition,
                show_confirmation: confirm,
            };
            println!("{view}");
        }
    }
    Ok(())
}

#[derive(Error, Debug)]
enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Petitions could not be loaded")]
    NotLoaded,
    #[error("No petition with id {0} in the current page")]
    UnknownPetition(String),
}
