mod quota;
mod server;

pub use quota::{FileConfig, QuotaConfig};
pub use server::ServerConfig;
