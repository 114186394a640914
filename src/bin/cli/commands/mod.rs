pub mod check;
pub mod due;
pub mod fix;
pub mod record;
