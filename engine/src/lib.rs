//! Photo wallpaper generator.
//!
//! Fetches a profile's photos from a [`sources::MediaSource`], keeps them in
//! a disk [`cache::ImageCache`], lays them out on a square or justified grid
//! and composites a single JPEG wallpaper.
//!
//! [`pipeline::run`] drives one complete run from resolved
//! [`config::Settings`].

#[macro_use]
mod macros;

pub mod cache;
pub mod codec;
pub mod compositor;
pub mod config;
pub mod downloader;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod setter;
pub mod sources;

pub use config::{Config, Settings};
pub use downloader::{DownloadOutcome, DownloadReport, HttpTransport, Transport};
pub use pipeline::{PipelineError, RunSummary};
pub use sources::{MediaSource, Provider};
