//! Preset clients for hosted providers

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "azure")]
pub mod azure;
