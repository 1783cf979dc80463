pub mod bill;
pub mod investment;
pub mod kit;
pub mod projection;
