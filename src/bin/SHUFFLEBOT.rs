//! SHUFFLE, SHUFFLE, SEND IT OUT
#![allow(non_snake_case)]

use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;

use gifshuffle::{providers, router, Config, Dispatcher, MattermostFace, MessagingHost, Shuffler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    simple_logger::init_with_env().ok();

    let config = Arc::new(Config::from_env()?);

    let provider = providers::from_config(&config)?;
    log::info!("SEARCHING {} FOR `{}` GIFS", provider.name(), config.rendition);

    let host: Arc<dyn MessagingHost> = Arc::new(
        MattermostFace::new(config.mattermost_url.clone(), config.mattermost_token.clone())
            .context("Unable to build the chat server client")?,
    );
    log::info!("CHAT SERVER @ {}", config.mattermost_url);

    let shuffler = Shuffler::new(config.clone(), provider, host.clone())?;
    let dispatcher = Arc::new(Dispatcher::new(&config, shuffler, host));
    let app = router(dispatcher, &config.route_prefix);

    let bind = format!("{}:{}", config.host, config.port);
    let addr = tokio::net::lookup_host(&bind)
        .await
        .with_context(|| format!("Unable to resolve {bind}"))?
        .next()
        .with_context(|| format!("{bind} resolved to nothing"))?;
    log::info!("SHUFFLEBOT TAKING REQUESTS ON {addr}; BUTTONS POINT AT {}", config.public_url);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .context("The HTTP server stopped")?;

    Ok(())
}
