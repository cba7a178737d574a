use std::net::SocketAddr;

use log::{error, info};
use tokio::net::TcpListener;

use sam::logger::Logger;
use sam::{build_app, Config, WikiError};

#[tokio::main]
async fn main() {
    if let Err(e) = Logger::init() {
        eprintln!("failed to initialize logger: {}", e);
    }

    if let Err(e) = run(Config::load()).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), WikiError> {
    let addr = config.addr.clone();
    let app = build_app(config)?;

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
