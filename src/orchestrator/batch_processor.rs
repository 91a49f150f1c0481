//! 批量阅卷处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量阅卷任务的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、初始化日志文件、创建 LLM 客户端
//! 2. **批量加载**：扫描并加载所有阅卷任务（`Vec<GradingJob>`）
//! 3. **顺序处理**：逐个任务委托 job_processor 处理
//! 4. **全局统计**：汇总所有答题卡的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单张答题卡的细节
//! - **资源所有者**：唯一持有 LLM 客户端的模块，启动时创建一次
//! - **失败隔离**：单个任务失败不影响其它任务

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{load_all_jobs, GradingJob};
use crate::orchestrator::job_processor::{self, SheetStats};
use crate::services::{LlmService, ReportWriter, VisionModel};
use crate::utils::logging::{
    init_log_file, log_job_complete, log_job_start, log_jobs_loaded, log_startup,
    print_final_stats,
};
use crate::workflow::GradingFlow;

/// 应用主结构
pub struct App<M = LlmService> {
    config: Config,
    flow: GradingFlow<M>,
    writer: ReportWriter,
}

impl App<LlmService> {
    /// 初始化应用
    ///
    /// 缺少 API 密钥等配置错误会直接返回，不会开始处理。
    /// 只做本地构造，不发起网络请求。
    pub fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        let service = LlmService::new(&config)?;
        Self::with_model(config, service)
    }
}

impl<M: VisionModel> App<M> {
    /// 使用指定模型初始化应用
    pub fn with_model(config: Config, model: M) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)
            .with_context(|| format!("无法创建日志文件: {}", config.output_log_file))?;

        log_startup(&config);

        Ok(Self {
            flow: GradingFlow::new(model, &config),
            writer: ReportWriter::new(&config.output_folder),
            config,
        })
    }

    /// 运行应用主逻辑，返回全部答题卡的统计
    pub async fn run(&self) -> Result<SheetStats> {
        let jobs = self.load_jobs().await?;

        if jobs.is_empty() {
            warn!("⚠️ 没有找到待处理的阅卷任务，程序结束");
            return Ok(SheetStats::default());
        }

        let total_sheets: usize = jobs.iter().map(|job| job.students.len()).sum();
        log_jobs_loaded(jobs.len(), total_sheets);

        let stats = self.process_all_jobs(&jobs).await;

        print_final_stats(
            stats.graded,
            stats.failed,
            total_sheets,
            &self.config.output_log_file,
        );
        info!("📁 成绩报告目录: {}", self.writer.output_folder().display());

        Ok(stats)
    }

    /// 加载任务
    async fn load_jobs(&self) -> Result<Vec<GradingJob>> {
        info!("\n📁 正在扫描阅卷任务...");
        load_all_jobs(&self.config.job_folder)
            .await
            .with_context(|| format!("无法加载阅卷任务: {}", self.config.job_folder))
    }

    /// 逐个处理任务
    async fn process_all_jobs(&self, jobs: &[GradingJob]) -> SheetStats {
        let mut stats = SheetStats::default();

        for (idx, job) in jobs.iter().enumerate() {
            let job_index = idx + 1;
            log_job_start(job_index, jobs.len(), &job.name, job.num_questions.get());

            match job_processor::process_job(
                &self.flow,
                &self.writer,
                job,
                job_index,
                &self.config.output_log_file,
            )
            .await
            {
                Ok(job_stats) => {
                    stats.graded += job_stats.graded;
                    stats.failed += job_stats.failed;
                    log_job_complete(job_index, job_stats.graded, job.students.len());
                }
                Err(e) => {
                    error!("[任务 #{}] ❌ 处理过程中发生错误: {:#}", job_index, e);
                    stats.failed += job.students.len();
                }
            }
        }

        stats
    }
}
