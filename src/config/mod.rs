//! Configuration module for Skrift.
//!
//! Handles loading settings and rendering external command templates.

mod command;
mod settings;

pub use command::CommandSpec;
pub use settings::{
    AudioSettings, BrowserSettings, ChainSettings, GeneralSettings, LookupSettings, Settings,
    StrategyKind, TranscriptionSettings,
};
