mod cli;
mod infra;
mod lead;
mod routes;
mod server;

use lead_gateway::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
