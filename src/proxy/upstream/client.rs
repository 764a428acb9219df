// 上游客户端
// 全进程共享一个连接池，所有并发请求复用

use axum::http::HeaderMap;
use bytes::Bytes;
use reqwest::{Client, Response};
use tokio::time::Duration;
use url::Url;

use crate::proxy::config::GatewayConfig;
use crate::proxy::error::ProxyError;

pub struct UpstreamClient {
    http_client: Client,
}

impl UpstreamClient {
    pub fn new(config: &GatewayConfig) -> Self {
        let http_client = Client::builder()
            // Connection settings (优化连接复用，减少建立开销)
            .connect_timeout(Duration::from_secs(20))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            // 整体超时来自配置，是单次转发唯一的时限
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { http_client }
    }

    /// 构建上游地址：基础地址的路径替换为端点固定路径
    ///
    /// 查询串原样拼接，不做解析或重排。
    pub fn resolve_url(
        base_url: &str,
        upstream_path: &str,
        query: Option<&str>,
    ) -> Result<Url, ProxyError> {
        let mut url = Url::parse(base_url)?;
        url.set_path(upstream_path);
        url.set_query(query);
        Ok(url)
    }

    /// 透传转发：方法固定 POST，头与请求体原样送达
    ///
    /// 不重试。失败以 Err 冒泡，由 dispatch 层兜底。
    pub async fn forward(
        &self,
        url: Url,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, ProxyError> {
        let response = self
            .http_client
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        Ok(response)
    }
}
