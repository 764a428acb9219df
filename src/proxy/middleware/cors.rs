// CORS 支持
use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// 创建 CORS layer
///
/// 在全部路由注册完成后、开始监听之前挂载。
/// 网关对外只有 POST 端点和健康检查，方法集相应收窄。
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(600))
}
