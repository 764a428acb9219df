// Axum 中间件与请求分发
pub mod cors;
pub mod dispatch;

pub use cors::cors_layer;
pub use dispatch::dispatch;
