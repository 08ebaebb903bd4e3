mod connection;
mod server;
mod server_config;

pub use connection::ConnectionRecord;
pub use server::Server;
pub use server_config::ServerConfig;
