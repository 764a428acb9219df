// Axum 服务器与路由注册

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::proxy::auth::AuthGate;
use crate::proxy::config::GatewayConfig;
use crate::proxy::handlers::forward::{self, ProxyEndpoint, ENDPOINTS};
use crate::proxy::middleware;
use crate::proxy::upstream::UpstreamClient;

/// Axum 应用状态
///
/// 全部字段为进程级共享句柄，随路由分发注入每个处理器。
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthGate>,
    pub upstream: Arc<UpstreamClient>,
    pub config: Arc<GatewayConfig>,
}

/// 构建网关路由
///
/// 转发端点逐个注册并留一行启动日志；跨域与请求追踪
/// 在全部路由就位后统一挂载。
pub fn build_router(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new().route("/healthz", get(health_check_handler));

    for endpoint in ENDPOINTS {
        info!("  ↳ POST {} -> {}", endpoint.path, endpoint.upstream_path);
        router = router.route(endpoint.path, endpoint_route(endpoint));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .with_state(state)
}

/// 把一个静态端点描述变成路由处理器
///
/// 处理器本体只是 dispatch 对 forward 的组合，在路由构建期完成。
fn endpoint_route(endpoint: &'static ProxyEndpoint) -> MethodRouter<AppState> {
    post(move |State(state): State<AppState>, request: Request| {
        middleware::dispatch(state, request, move |state, request| {
            forward::forward(state, endpoint, request)
        })
    })
}

/// 健康检查处理器
async fn health_check_handler() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}

/// Axum 服务器实例
pub struct AxumServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl AxumServer {
    /// 启动网关服务器
    pub async fn start(
        host: String,
        port: u16,
        config: GatewayConfig,
        auth: Arc<dyn AuthGate>,
        upstream: Arc<UpstreamClient>,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), String> {
        let state = AppState {
            auth,
            upstream,
            config: Arc::new(config),
        };

        let app = build_router(state);

        let addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("地址 {} 绑定失败: {}", addr, e))?;

        tracing::info!("网关服务器启动在 http://{}", addr);

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server_instance = Self {
            shutdown_tx: Some(shutdown_tx),
        };

        // 每个连接一个任务；连接断开时任务随之结束，
        // 进行中的上游调用一并中止
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("连接处理结束或出错: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("接收连接失败: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("网关服务器停止监听");
                        break;
                    }
                }
            }
        });

        Ok((server_instance, handle))
    }

    /// 停止服务器
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
