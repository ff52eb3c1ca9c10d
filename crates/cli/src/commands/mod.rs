pub mod cache;
pub mod check;
pub mod recompile;
pub mod scan;
pub mod util;

pub use cache::*;
pub use check::*;
pub use recompile::*;
pub use scan::*;
pub use util::*;
