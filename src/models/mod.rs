pub mod directory;
pub mod media_item;
pub mod path_registry;

pub use directory::*;
pub use media_item::*;
pub use path_registry::*;
