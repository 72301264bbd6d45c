pub mod app;
pub mod dialogs;
pub mod surface;


pub use app::*;
pub use dialogs::RfdFileSelector;
