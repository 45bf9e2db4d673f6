
pub mod enums;
