pub mod entities;
pub mod session;
pub mod tentative;

pub use entities::EntityTable;
pub use session::{Session, SessionConfig, SessionPhase};
pub use tentative::{TentativeBlock, TentativeList};
