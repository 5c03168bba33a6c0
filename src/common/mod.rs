pub mod ids;
pub mod response;
pub mod upload;
