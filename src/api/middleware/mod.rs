pub mod admission;
pub mod request_id;
