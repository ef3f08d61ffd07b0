//! Domain models for the Gôndola retail platform

mod alert;
mod insight;
mod product;
mod sale;
mod stock;
mod tenant;
mod validity;

pub use alert::*;
pub use insight::*;
pub use product::*;
pub use sale::*;
pub use stock::*;
pub use tenant::*;
pub use validity::*;
