pub mod cache;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod events;
pub mod schedule;
pub mod sources;
pub mod processing {
    pub mod compositor;
    pub mod decode;
    pub mod layout;
    pub mod resize;
}
pub mod render {
    pub mod pan;
    pub mod surface;
}
pub mod tasks {
    pub mod settings;
    pub mod shell;
    pub mod wallpaper;
}

pub use engine::Engine;
pub use error::Error;
