// Infrastructure: Server setup and configuration

use std::env;
use std::net::SocketAddr;

use tonic::transport::Server;
use tracing::info;

use crate::application::mappers::refinement::refinement_solver_server::RefinementSolverServer;
use crate::application::GrpcRefinementService;
use crate::solver::SolverFactory;

/// Environment variable holding the listen address.
pub const ADDR_ENV: &str = "LETSREFINE_ADDR";
pub const DEFAULT_ADDR: &str = "0.0.0.0:50051";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

impl ServerConfig {
    pub fn new(address: SocketAddr) -> Self {
        Self { address }
    }

    /// Listen address from `LETSREFINE_ADDR`, or the default port.
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        let address = env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        Ok(Self::new(address.parse()?))
    }
}

pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let backends: Vec<String> = SolverFactory::available()
        .iter()
        .map(|solver| solver.name().to_string())
        .collect();
    info!(
        address = %config.address,
        backends = ?backends,
        "letsrefine listening"
    );

    Server::builder()
        .add_service(RefinementSolverServer::new(GrpcRefinementService::new()))
        .serve(config.address)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_address_parses() {
        let address: SocketAddr = DEFAULT_ADDR.parse().unwrap();
        assert_eq!(ServerConfig::new(address).address.port(), 50051);
    }
}
