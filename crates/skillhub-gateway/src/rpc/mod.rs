pub mod dispatch;
pub mod handlers;
