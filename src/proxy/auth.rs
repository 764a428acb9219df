// 认证网关
// 身份与项目审批都由外部认证服务裁决，网关只消费其结论

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Response};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::proxy::config::GatewayConfig;
use crate::proxy::error::ProxyError;

/// 认证服务返回的用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// API Key，解析到其所属用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub id: String,
    pub user: User,
}

/// 调用方主体：直接登录的用户，或解析到用户的 API Key
#[derive(Debug, Clone)]
pub enum Principal {
    Key(Key),
    Direct(User),
}

impl Principal {
    /// 统一解包为具体用户
    ///
    /// 所有转发处理器都经由这一处归一化，后续逻辑不再区分凭证形态。
    pub fn into_user(self) -> User {
        match self {
            Principal::Key(key) => key.user,
            Principal::Direct(user) => user,
        }
    }
}

/// 项目审批状态
///
/// 每次请求都重新查询，网关不缓存。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approval {
    Approved,
    Pending,
    Rejected,
    None,
}

/// authenticate 的结果
///
/// Denied 携带认证服务给出的完整拒绝响应，处理器必须原样返回；
/// Authenticated 携带已确认身份的调用方主体。
pub enum AuthOutcome {
    Denied(Response<Body>),
    Authenticated(Principal),
}

/// 认证网关接口
///
/// 传输层失败（认证服务不可达等）以 Err 冒泡，由 dispatch 层统一兜底。
#[async_trait]
pub trait AuthGate: Send + Sync {
    /// 校验调用方身份
    async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthOutcome, ProxyError>;

    /// 查询 (用户, 项目) 的审批状态
    async fn project_status(&self, user: &User, project: &str) -> Result<Approval, ProxyError>;
}

/// 基于 HTTP 的认证服务客户端
pub struct AuthClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(config: &GatewayConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            base_url: config.auth_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AuthGate for AuthClient {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthOutcome, ProxyError> {
        let mut request = self
            .http_client
            .get(format!("{}/api/authenticate", self.base_url));

        // 调用方凭证原样转交认证服务
        if let Some(value) = headers.get(header::AUTHORIZATION) {
            request = request.header(header::AUTHORIZATION, value.clone());
        }
        if let Some(value) = headers.get(header::COOKIE) {
            request = request.header(header::COOKIE, value.clone());
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let session: SessionReply = response.json().await?;
            return Ok(AuthOutcome::Authenticated(session.into_principal()));
        }

        // 拒绝响应由认证服务全权定义，状态码与正文一并转交
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await?;

        let mut reply = Response::new(Body::from(body));
        *reply.status_mut() = status;
        if let Some(value) = content_type {
            reply.headers_mut().insert(header::CONTENT_TYPE, value);
        }

        Ok(AuthOutcome::Denied(reply))
    }

    async fn project_status(&self, user: &User, project: &str) -> Result<Approval, ProxyError> {
        let response = self
            .http_client
            .get(format!("{}/api/project/status", self.base_url))
            .query(&[("user", user.id.as_str()), ("project", project)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::AuthService(format!(
                "project status query for '{}' returned {}",
                project, status
            )));
        }

        let reply: ProjectStatusReply = response.json().await?;
        Ok(reply.status)
    }
}

/// /api/authenticate 的响应体
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SessionReply {
    Key(Key),
    User(User),
}

impl SessionReply {
    fn into_principal(self) -> Principal {
        match self {
            SessionReply::Key(key) => Principal::Key(key),
            SessionReply::User(user) => Principal::Direct(user),
        }
    }
}

/// /api/project/status 的响应体
#[derive(Debug, Deserialize)]
struct ProjectStatusReply {
    status: Approval,
}
