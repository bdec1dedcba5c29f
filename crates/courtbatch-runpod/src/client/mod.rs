//! RunPod HTTP client module.

mod rp_client;
mod rp_config;
mod status;

pub use rp_client::RunpodClient;
pub use rp_config::RunpodConfig;
pub use status::JobStatus;
