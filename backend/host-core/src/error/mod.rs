pub mod certificate;
pub mod config;
pub mod data_area;
pub mod engine;
pub mod host;
pub mod log_sink;

pub use certificate::CertificateError;
pub use config::ConfigError;
pub use data_area::DataAreaError;
pub use engine::EngineError;
pub use host::HostError;
pub use log_sink::LogSinkError;
