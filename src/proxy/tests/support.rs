// 测试支撑：可编程的认证网关桩 + 回环地址上的真实上游

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;

use crate::proxy::auth::{Approval, AuthGate, AuthOutcome, Key, Principal, User};
use crate::proxy::config::{GatewayConfig, UpstreamConfig};
use crate::proxy::error::ProxyError;
use crate::proxy::server::AppState;
use crate::proxy::upstream::UpstreamClient;

pub fn sample_user(id: &str) -> User {
    User {
        id: id.to_string(),
        username: format!("user-{}", id),
        email: None,
    }
}

pub fn direct_principal(id: &str) -> Principal {
    Principal::Direct(sample_user(id))
}

pub fn key_principal(id: &str) -> Principal {
    Principal::Key(Key {
        id: format!("key-of-{}", id),
        user: sample_user(id),
    })
}

enum GateMode {
    Deny {
        status: StatusCode,
        body: &'static str,
    },
    Allow(Principal),
    Fail,
}

/// 可编程认证网关
///
/// queries 记录每次审批查询的 (用户 id, 项目名)，供断言使用。
pub struct MockGate {
    mode: GateMode,
    approval: Approval,
    pub queries: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockGate {
    pub fn allow(principal: Principal, approval: Approval) -> Self {
        Self {
            mode: GateMode::Allow(principal),
            approval,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn deny(status: StatusCode, body: &'static str) -> Self {
        Self {
            mode: GateMode::Deny { status, body },
            approval: Approval::None,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: GateMode::Fail,
            approval: Approval::None,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl AuthGate for MockGate {
    async fn authenticate(&self, _headers: &HeaderMap) -> Result<AuthOutcome, ProxyError> {
        match &self.mode {
            GateMode::Deny { status, body } => {
                let mut reply = Response::new(Body::from(*body));
                *reply.status_mut() = *status;
                // 额外头用于验证拒绝响应被原样转交
                reply
                    .headers_mut()
                    .insert("www-authenticate", HeaderValue::from_static("Bearer"));
                Ok(AuthOutcome::Denied(reply))
            }
            GateMode::Allow(principal) => Ok(AuthOutcome::Authenticated(principal.clone())),
            GateMode::Fail => Err(ProxyError::AuthService("auth service unreachable".into())),
        }
    }

    async fn project_status(&self, user: &User, project: &str) -> Result<Approval, ProxyError> {
        self.queries
            .lock()
            .unwrap()
            .push((user.id.clone(), project.to_string()));
        Ok(self.approval)
    }
}

/// 以给定网关桩和上游基础地址组装应用状态
pub fn test_state(gate: MockGate, upstream_base: &str) -> AppState {
    let config = GatewayConfig {
        upstream: UpstreamConfig {
            whisper: upstream_base.to_string(),
            chat: upstream_base.to_string(),
            emotion: upstream_base.to_string(),
            diffusion: upstream_base.to_string(),
        },
        ..GatewayConfig::default()
    };

    AppState {
        auth: Arc::new(gate),
        upstream: Arc::new(UpstreamClient::new(&config)),
        config: Arc::new(config),
    }
}

/// 在回环地址上真实起一个上游，返回其基础地址
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

/// 申请一个确定无人监听的回环端口
pub async fn dead_upstream_base() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// 计数上游：任何 POST 都返回固定 JSON，并累计命中次数
pub fn counting_upstream(reply_status: StatusCode) -> (Router, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let router = Router::new().route(
        "/*rest",
        post(move |_request: Request| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (
                    reply_status,
                    [(header::CONTENT_TYPE, "application/json")],
                    r#"{"ok":true}"#,
                )
                    .into_response()
            }
        }),
    );

    (router, hits)
}

/// 回声上游：把收到的查询串、部分头和请求体长度原样报告回来
pub fn echo_upstream() -> Router {
    Router::new().route(
        "/*rest",
        post(|request: Request| async move {
            let query = request.uri().query().unwrap_or("").to_string();
            let authorization = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            let trace = request
                .headers()
                .get("x-request-trace")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            let body = axum::body::to_bytes(request.into_body(), usize::MAX)
                .await
                .unwrap();

            axum::Json(serde_json::json!({
                "query": query,
                "authorization": authorization,
                "trace": trace,
                "body_len": body.len(),
            }))
        }),
    )
}

/// 读出响应体字节
pub async fn read_body(response: Response<Body>) -> bytes::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}
