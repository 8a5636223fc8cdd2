pub mod config;
pub mod protocol;
pub mod server;

pub use server::SawServer;
