// Crate wiring: fetch -> select -> resolve -> transfer

pub mod config;
pub mod download;
pub mod errors;
pub mod models;
pub mod naming;
pub mod resolve;
pub mod select;
pub mod source;
pub mod ui;

pub use errors::DownloadError;
pub use models::{
    DownloadOutcome, FetchWindow, ProfileInfo, SortSpec, Subject, VideoRecord,
};
pub use select::{select_top, Selection};
