pub mod button;
pub mod led;

pub use button::{Button, ButtonPin};
pub use led::Led;
