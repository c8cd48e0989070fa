//! Runs the mock authorization server and partner interaction endpoint.

// crates.io
use color_eyre::Result;
use tokio::net::TcpListener;
// self
use partner_schema_mock::{
	config::{self, MockConfig},
	server::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	config::load_dotenv()?;
	server::init_tracing();

	let config = MockConfig::load()?;
	let state = AppState::from_config(&config)?;
	let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;

	tracing::info!(addr = %listener.local_addr()?, ?config, "partner schema mock listening");

	server::serve(listener, state).await?;

	Ok(())
}
