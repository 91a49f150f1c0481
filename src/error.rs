use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 模型响应解析错误
    #[error("解析错误: {0}")]
    Extraction(#[from] ExtractionError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

/// 配置错误
///
/// 全部是致命错误，不会产生任何部分结果。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少 API 密钥
    #[error("未设置 API 密钥，请设置 LLM_API_KEY、GOOGLE_API_KEY 或 GEMINI_API_KEY 环境变量")]
    MissingApiKey,
    /// 题目数量超出允许范围
    #[error("题目数量 {value} 超出范围 [1, {max}]")]
    InvalidQuestionCount { value: usize, max: usize },
    /// 批大小非法
    #[error("批大小必须大于 0")]
    InvalidBatchSize,
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 请求构建失败
    #[error("构建 LLM 请求失败: {0}")]
    RequestBuildFailed(String),
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回结果为空
    #[error("LLM返回结果为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 模型响应解析错误
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// 响应文本为空
    #[error("模型响应为空 (题目 {range})")]
    EmptyResponse { range: String },
    /// 响应中找不到 JSON 对象
    #[error("无法从模型响应中提取 JSON 对象 (题目 {range}): {preview}")]
    NoJsonObject { range: String, preview: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 图片文件为空
    #[error("图片文件为空: {path}")]
    EmptyImage { path: String },
    /// 不支持的图片格式
    #[error("不支持的图片格式: {path}")]
    UnsupportedImage { path: String },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
