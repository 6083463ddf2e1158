pub mod agenda;
pub mod enums;
pub mod intake;
pub mod reminder;

pub use agenda::*;
pub use enums::*;
pub use intake::*;
pub use reminder::*;
