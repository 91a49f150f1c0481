use anyhow::Result;
use omr_grader::utils::logging;
use omr_grader::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let _stats = App::initialize(config)?.run().await?;

    Ok(())
}
