pub mod events;
pub mod indicators;
pub mod price;
pub mod signals;
pub mod trading;
pub mod trend;

pub use events::*;
pub use indicators::*;
pub use price::*;
pub use signals::*;
pub use trading::*;
pub use trend::*;
