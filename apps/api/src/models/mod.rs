pub mod customer;
pub mod job;
