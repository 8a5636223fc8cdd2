use std::io;

use saw_rank_mcp::SawServer;
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let mode = std::env::var("SAW_RANKD_TRANSPORT").unwrap_or_else(|_| "stdio".to_string());
    let server =
        SawServer::new().map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;
    match mode.as_str() {
        "stdio" => server.serve_stdio(),
        "http" => {
            let addr = std::env::var("SAW_RANK_HTTP_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8787".to_string());
            server.serve_http(&addr)
        }
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "SAW_RANKD_TRANSPORT must be stdio or http",
        )),
    }
}
