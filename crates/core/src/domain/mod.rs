pub mod answers;
pub mod customer;
pub mod quote;
pub mod session;
