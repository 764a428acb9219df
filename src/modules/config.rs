use std::fs;
use std::path::PathBuf;

use crate::proxy::GatewayConfig;

const CONFIG_FILE: &str = "gateway_config.json";

/// 获取数据目录 (~/.skystuff-gateway)，不存在时自动创建
pub fn get_data_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("无法获取用户主目录")?;
    let dir = home.join(".skystuff-gateway");

    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| format!("创建数据目录失败: {}", e))?;
    }

    Ok(dir)
}

/// 加载网关配置
pub fn load_gateway_config() -> Result<GatewayConfig, String> {
    let config_path = get_data_dir()?.join(CONFIG_FILE);

    if !config_path.exists() {
        return Err(format!("配置文件不存在: {}", config_path.display()));
    }

    let content = fs::read_to_string(&config_path)
        .map_err(|e| format!("读取配置文件失败: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("解析配置文件失败: {}", e))
}

/// 保存网关配置
pub fn save_gateway_config(config: &GatewayConfig) -> Result<(), String> {
    let config_path = get_data_dir()?.join(CONFIG_FILE);

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("序列化配置失败: {}", e))?;

    fs::write(&config_path, content).map_err(|e| format!("保存配置失败: {}", e))
}
