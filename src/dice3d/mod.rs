pub mod body;
pub mod face;
pub mod plugin;
pub mod session;
pub mod systems;
pub mod throw_control;
pub mod types;

pub use body::*;
pub use face::*;
pub use plugin::*;
pub use session::*;
pub use systems::*;
pub use throw_control::*;
pub use types::*;
