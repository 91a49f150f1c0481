use crate::error::ConfigError;

/// Gemini 的 OpenAI 兼容端点
const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// 单次模型调用最多识别的题目数，超过后识别准确率明显下降
pub const DEFAULT_BATCH_SIZE: usize = 40;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,
    // --- 识别配置 ---
    /// 每批题目数量
    pub batch_size: usize,
    /// 同一张答题卡的多个批次是否并发调用模型
    pub concurrent_batches: bool,
    // --- 文件配置 ---
    /// 阅卷任务 TOML 文件存放目录
    pub job_folder: String,
    /// 成绩报告输出目录
    pub output_folder: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: None,
            llm_api_base_url: DEFAULT_API_BASE_URL.to_string(),
            llm_model_name: "gemini-1.5-flash".to_string(),
            llm_max_tokens: 4096,
            llm_temperature: 0.0,
            batch_size: DEFAULT_BATCH_SIZE,
            concurrent_batches: false,
            job_folder: "omr_jobs".to_string(),
            output_folder: "omr_results".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量读取配置，未设置的项使用默认值
    ///
    /// 能解析但取值非法的项（如批大小为 0）留给 [`Config::validate`] 处理。
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            llm_api_key: first_non_empty(&["LLM_API_KEY", "GOOGLE_API_KEY", "GEMINI_API_KEY"]),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: first_non_empty(&["LLM_MODEL_NAME", "GEMINI_MODEL"])
                .unwrap_or(default.llm_model_name),
            llm_max_tokens: parse_env("LLM_MAX_TOKENS", "u32")?.unwrap_or(default.llm_max_tokens),
            llm_temperature: parse_env("LLM_TEMPERATURE", "f32")?
                .unwrap_or(default.llm_temperature),
            batch_size: parse_env("OMR_BATCH_SIZE", "usize")?.unwrap_or(default.batch_size),
            concurrent_batches: parse_env("OMR_CONCURRENT_BATCHES", "bool")?
                .unwrap_or(default.concurrent_batches),
            job_folder: std::env::var("JOB_FOLDER").unwrap_or(default.job_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(default.output_folder),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: parse_env("VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
        })
    }

    /// 校验配置，缺少 API 密钥或批大小为 0 时直接失败
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_key()?;
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        Ok(())
    }

    /// 获取 API 密钥
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.llm_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

/// 按顺序返回第一个非空的环境变量
fn first_non_empty(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(
    var_name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
