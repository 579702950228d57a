pub mod archive;
pub mod args;
pub mod encode;
pub mod logging;
pub mod settings;
pub mod solve;
pub mod sweep;
pub mod utils;
