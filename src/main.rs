use crate::config::Config;

mod apis;
mod config;
mod logger;
mod routes;
mod server;
mod storage;
mod upload;

#[cfg(test)]
mod test_fixtures;

#[tokio::main]
async fn main() {
    logger::init();
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    if let Err(err) = server::run(config).await {
        log::error!("server error: {err}");
        std::process::exit(1);
    }
}
