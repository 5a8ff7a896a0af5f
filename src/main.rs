use anyhow::Result;
use crawl_batch_submit::utils::logging;
use crawl_batch_submit::{App, Config};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(&config.log_file)?;

    let app = App::initialize(config)?;

    // Ctrl+C：停止启动新批次，已启动的批次继续跑完
    let cancel = app.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⛔ 收到中断信号，不再启动新批次，等待已启动的批次结束...");
            cancel.cancel();
        }
    });

    app.run().await?;

    Ok(())
}
