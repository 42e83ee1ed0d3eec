#![deny(clippy::all)]
#![deny(clippy::dbg_macro)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Error;
use env_logger::{Builder, Env};
use log::{error, info};
use memes_tracker::{TrackerConfig, TrackerService};
use structopt::StructOpt;

mod api;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "Memes tracker API params",
    about = "Collection and wallet holdings API for The Memes."
)]
struct Opt {
    /// Set logging level
    #[structopt(short, long, default_value = "warn")]
    log: String,

    /// Set IP address
    #[structopt(long, short, default_value = "127.0.0.1")]
    ip: String,

    /// Set port number
    #[structopt(long, short, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() -> ! {
    dotenv::dotenv().ok();

    let opt = Opt::from_args();

    Builder::from_env(Env::default().default_filter_or(opt.log)).init();

    let tracker = match build_tracker().await {
        Ok(tracker) => web::Data::new(tracker),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    loop {
        if let Err(e) = try_main(&opt.ip, opt.port, tracker.clone()).await {
            error!("{e}");
        } else {
            info!("Exiting gracefully");
            std::process::exit(0);
        }
    }
}

async fn build_tracker() -> Result<TrackerService, Error> {
    let config = TrackerConfig::from_env().map_err(Error::msg)?;
    info!(
        "Tracking {} tokens of {:#x}",
        config.collection.size, config.contract
    );

    TrackerService::from_config(config)
        .await
        .map_err(Error::msg)
}

async fn try_main(ip: &str, port: u16, tracker: web::Data<TrackerService>) -> Result<(), Error> {
    info!("Listening on http://{}:{}", ip, port);

    HttpServer::new(move || {
        App::new()
            .app_data(tracker.clone())
            .wrap(Logger::default())
            .configure(api::router::configure)
    })
    .bind((ip, port))
    .map_err(Error::msg)?
    .run()
    .await
    .map_err(Error::msg)
}
