mod handler;
mod recon_server;
mod snapshot_watcher;

pub use recon_server::ReconServer;
