// 请求分发包装层
// 整条管线唯一的失败兜底点：处理器不捕获自己的上游错误

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderValue, Response, StatusCode};
use futures::FutureExt;
use tracing::{error, info};

use crate::proxy::error::ProxyError;
use crate::proxy::server::AppState;

/// 包装一次路由处理调用
///
/// 共享句柄（认证网关、上游客户端、配置）随 state 注入处理器；
/// 四种结局统一收口：
/// - 正常响应原样返回
/// - 无响应补 204 空响应
/// - Err 记录错误日志（含请求路径）后替换为固定的 500 文案
/// - panic 与 Err 同等对待
///
/// 无论哪条路径，最后都记录一行微秒级耗时日志。
pub async fn dispatch<F, Fut>(state: AppState, request: Request, handler: F) -> Response<Body>
where
    F: FnOnce(AppState, Request) -> Fut,
    Fut: Future<Output = Result<Option<Response<Body>>, ProxyError>>,
{
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let outcome = AssertUnwindSafe(handler(state, request)).catch_unwind().await;

    let response = match outcome {
        Ok(Ok(Some(response))) => response,
        Ok(Ok(None)) => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::NO_CONTENT;
            response
        }
        Ok(Err(err)) => {
            error!("request to {} failed: {:?}", path, err);
            internal_error_reply()
        }
        Err(panic) => {
            error!("request to {} panicked: {}", path, panic_message(&panic));
            internal_error_reply()
        }
    };

    info!(
        "call to {} took {} microseconds",
        path,
        start.elapsed().as_micros()
    );

    response
}

/// 对外不区分"上游挂了"和"处理器有 bug"，一律同一句话
fn internal_error_reply() -> Response<Body> {
    let mut response = Response::new(Body::from("internal server error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn panic_message(panic: &Box<dyn Any + Send>) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
