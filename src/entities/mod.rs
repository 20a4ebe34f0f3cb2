pub mod booking;
pub mod maintenance_record;
pub mod trip;
pub mod user;
pub mod vehicle;
