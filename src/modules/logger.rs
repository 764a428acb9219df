// 日志初始化
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化全局日志：控制台输出 + 数据目录下按天滚动的日志文件
///
/// 返回的 guard 必须在进程生命周期内持有，否则文件日志会被丢弃。
pub fn init_logger() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("skystuff_gateway=info,tower_http=info"));

    match crate::modules::config::get_data_dir() {
        Ok(data_dir) => {
            let appender = tracing_appender::rolling::daily(data_dir.join("logs"), "gateway.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();

            Some(guard)
        }
        Err(err) => {
            // 数据目录不可用时退化为纯控制台日志
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();

            tracing::warn!("file logging disabled: {}", err);
            None
        }
    }
}
