pub mod clock;
pub mod config;
pub mod date;
pub mod error;
pub mod logic;
pub mod model;
pub mod notify;
pub mod parser;
pub mod refresh;
pub mod search;
pub mod storage;
pub mod store;
pub mod tags;
pub mod undo;
pub mod view;

pub use error::AppError;
pub use logic::{Logic, Snapshot, Status};
