use serde::{Deserialize, Serialize};

/// 上游端点族
///
/// 每个族对应一个内部 AI 服务，基础地址来自 [`UpstreamConfig`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFamily {
    Whisper,
    Chat,
    Emotion,
    Diffusion,
}

/// 各端点族的上游基础地址
///
/// 启动时读入一次，进程生命周期内不变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_whisper_url")]
    pub whisper: String,

    #[serde(default = "default_chat_url")]
    pub chat: String,

    #[serde(default = "default_emotion_url")]
    pub emotion: String,

    #[serde(default = "default_diffusion_url")]
    pub diffusion: String,
}

impl UpstreamConfig {
    /// 按端点族取基础地址
    pub fn base_for(&self, family: UpstreamFamily) -> &str {
        match family {
            UpstreamFamily::Whisper => &self.whisper,
            UpstreamFamily::Chat => &self.chat,
            UpstreamFamily::Emotion => &self.emotion,
            UpstreamFamily::Diffusion => &self.diffusion,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            whisper: default_whisper_url(),
            chat: default_chat_url(),
            emotion: default_emotion_url(),
            diffusion: default_diffusion_url(),
        }
    }
}

/// 网关服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// 是否允许局域网访问
    /// - false: 仅本机访问 127.0.0.1（默认）
    /// - true: 允许局域网访问 0.0.0.0
    #[serde(default)]
    pub allow_lan_access: bool,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 认证服务基础地址
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,

    /// 上游服务地址表
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// 出站请求整体超时（秒）
    ///
    /// 这是系统中唯一的请求时限，由共享客户端统一执行；
    /// 单次转发不设置额外的超时。
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            allow_lan_access: false,
            port: default_port(),
            auth_base_url: default_auth_base_url(),
            upstream: UpstreamConfig::default(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl GatewayConfig {
    /// 获取实际的监听地址
    pub fn get_bind_address(&self) -> &str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }
}

fn default_port() -> u16 {
    8046
}

fn default_auth_base_url() -> String {
    "https://auth.skystuff.cc".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_whisper_url() -> String {
    "http://127.0.0.1:8101".to_string()
}

fn default_chat_url() -> String {
    "http://127.0.0.1:8102".to_string()
}

fn default_emotion_url() -> String {
    "http://127.0.0.1:8103".to_string()
}

fn default_diffusion_url() -> String {
    "http://127.0.0.1:8104".to_string()
}
