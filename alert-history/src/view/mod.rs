//! Alert history view: state machine plus the controller that drives it

pub mod controller;
pub mod state;

pub use controller::{SetupError, ViewHandle, ViewRequestError, ViewStateController};
pub use state::{transition, Command, Phase, ViewError, ViewEvent, ViewState};
