pub mod events;
pub mod manager;


pub use events::TransportHotkey;
pub use manager::{resolve_bindings, HotkeyManager};
