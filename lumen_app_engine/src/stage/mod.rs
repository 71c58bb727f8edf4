//! Stage module - the ordered container of active controls and the control
//! kinds that live in it

// Module declarations
mod control;
mod stage;

pub use control::{Control, WindowControl};
pub use stage::Stage;
