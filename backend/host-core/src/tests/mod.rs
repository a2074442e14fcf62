mod certificate;
mod config;
mod engine;
mod registry;
