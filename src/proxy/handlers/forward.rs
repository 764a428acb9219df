// 转发处理器
// 五个端点共用同一套流程：认证 → 项目审批 → 读取请求体 → 透传上游 → 原样回传

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderValue, Response, StatusCode};

use crate::proxy::auth::{Approval, AuthOutcome};
use crate::proxy::config::UpstreamFamily;
use crate::proxy::error::ProxyError;
use crate::proxy::server::AppState;
use crate::proxy::upstream::UpstreamClient;

/// 单个转发端点的静态描述
#[derive(Debug, Clone, Copy)]
pub struct ProxyEndpoint {
    /// 对外公开路径
    pub path: &'static str,
    /// 审批查询用的项目名，同时拼进拒绝提示的 URL 片段
    pub project: &'static str,
    /// 上游端点族
    pub family: UpstreamFamily,
    /// 替换到上游基础地址上的固定路径
    pub upstream_path: &'static str,
}

/// 全部转发端点，启动时一次性注册，之后只读
pub const ENDPOINTS: &[ProxyEndpoint] = &[
    ProxyEndpoint {
        path: "/whisper/file/",
        project: "whisper",
        family: UpstreamFamily::Whisper,
        upstream_path: "/api/whisper/transcribe/file/",
    },
    ProxyEndpoint {
        path: "/whisper/raw/",
        project: "whisper",
        family: UpstreamFamily::Whisper,
        upstream_path: "/api/whisper/transcribe/raw/",
    },
    ProxyEndpoint {
        path: "/chat/",
        project: "chat",
        family: UpstreamFamily::Chat,
        upstream_path: "/api/chat/",
    },
    ProxyEndpoint {
        path: "/emotion/",
        project: "emotion",
        family: UpstreamFamily::Emotion,
        upstream_path: "/api/emotion/",
    },
    ProxyEndpoint {
        path: "/diffusion/",
        project: "diffusion",
        family: UpstreamFamily::Diffusion,
        upstream_path: "/api/diffusion/",
    },
];

/// 转发主流程
///
/// 返回 Ok(None) 表示处理器自身不产生响应，由 dispatch 统一补 204。
/// 上游或认证服务的传输失败不在这里捕获，直接以 Err 冒泡。
pub async fn forward(
    state: AppState,
    endpoint: &'static ProxyEndpoint,
    request: Request,
) -> Result<Option<Response<Body>>, ProxyError> {
    let (parts, body) = request.into_parts();

    let principal = match state.auth.authenticate(&parts.headers).await? {
        // 认证服务的拒绝响应原样返回，状态码和正文都归它定义
        AuthOutcome::Denied(reply) => return Ok(Some(reply)),
        AuthOutcome::Authenticated(principal) => principal,
    };
    let user = principal.into_user();

    let approval = state.auth.project_status(&user, endpoint.project).await?;
    if approval != Approval::Approved {
        return Ok(Some(denied_reply(endpoint.project)));
    }

    // 请求体按原始字节读取：不解析、不限长（部署前置层如需限流自行处理）
    let body = axum::body::to_bytes(body, usize::MAX).await?;

    let base = state.config.upstream.base_for(endpoint.family);
    let url = UpstreamClient::resolve_url(base, endpoint.upstream_path, parts.uri.query())?;

    // 头与查询串原样透传，包括调用方的 Authorization / Cookie
    let response = state.upstream.forward(url, parts.headers, body).await?;

    Ok(Some(relay_reply(response).await?))
}

/// 审批未通过的固定 401 文案
fn denied_reply(project: &str) -> Response<Body> {
    let text = format!(
        "Please apply for project at https://auth.skystuff.cc/projects#{}",
        project
    );

    let mut reply = Response::new(Body::from(text));
    *reply.status_mut() = StatusCode::UNAUTHORIZED;
    reply.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    reply
}

/// 上游响应原样回传：状态码、content-type、完整响应体
async fn relay_reply(upstream: reqwest::Response) -> Result<Response<Body>, ProxyError> {
    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let body = upstream.bytes().await?;

    let mut reply = Response::new(Body::from(body));
    *reply.status_mut() = status;
    if let Some(value) = content_type {
        reply.headers_mut().insert(header::CONTENT_TYPE, value);
    }

    Ok(reply)
}
