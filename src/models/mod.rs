pub mod assessment;
pub mod enums;
pub mod user;

pub use assessment::*;
pub use enums::*;
pub use user::*;
