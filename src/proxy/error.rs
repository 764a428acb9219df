// 管线错误类型
use thiserror::Error;

/// 转发管线内部错误
///
/// 处理器一律用 `?` 向上冒泡，不在原地消化；
/// 转换为响应只发生在 dispatch 层，且整条管线只发生一次。
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("outbound request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("auth service error: {0}")]
    AuthService(String),

    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),

    #[error("invalid upstream url: {0}")]
    UpstreamUrl(#[from] url::ParseError),
}
