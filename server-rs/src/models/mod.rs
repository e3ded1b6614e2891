pub mod booking;
pub mod enquiry;
pub mod field;
pub mod page;
pub mod review;
pub mod settings;
pub mod team;
pub mod user;

pub use booking::*;
pub use enquiry::*;
pub use field::*;
pub use page::*;
pub use review::*;
pub use settings::*;
pub use team::*;
pub use user::*;
