pub mod collab;
pub mod config;
pub mod editor;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod history;
pub mod input;
pub mod logging;
pub mod output;
pub mod render;
pub mod scene;
pub mod session;
pub mod state;
pub mod tools;
pub mod worker;

pub use editor::Editor;
pub use error::{EngineError, EngineResult};
