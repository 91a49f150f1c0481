//! LLM 服务 - 业务能力层
//!
//! 只负责"让 Vision 模型读一批题目"能力，不解释返回内容
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini、Azure 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use std::future::Future;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ConfigError, LlmError};
use crate::infrastructure::SheetImage;
use crate::models::{AnswerOutcome, QuestionRange};
use crate::utils::logging::truncate_text;

const SYSTEM_MESSAGE: &str = "You are an OMR (optical mark recognition) bubble reader. \
You look at photographed multiple-choice answer sheets and report exactly which bubbles are darkened. \
You answer with strict JSON only.";

/// Vision 模型调用能力
///
/// 给定答题卡图片和题号区间，返回模型的原始文本。
/// 调用失败或返回为空时报错，不重试。
pub trait VisionModel {
    fn read_answers(
        &self,
        image: &SheetImage,
        range: QuestionRange,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// LLM 服务
///
/// 职责：
/// - 构建识别提示词
/// - 携带图片调用 Vision API
/// - 只处理单个批次
/// - 不解析 JSON，不计分
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmService {
    /// 创建新的 LLM 服务，缺少 API 密钥时失败
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key()?)
            .with_api_base(&config.llm_api_base_url);

        Ok(Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            max_tokens: config.llm_max_tokens,
            temperature: config.llm_temperature,
        })
    }

    /// 通用的 Vision 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `image_urls`: 图片地址，会追加到用户消息中
    ///
    /// # 返回
    /// 返回去掉首尾空白的响应内容
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        image_urls: &[&str],
    ) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符，图片 {} 张", user_message.len(), image_urls.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| LlmError::RequestBuildFailed(e.to_string()))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let mut content_parts: Vec<ChatCompletionRequestUserMessageContentPart> = Vec::new();
        content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
            ChatCompletionRequestMessageContentPartText {
                text: user_message.to_string(),
            },
        ));
        for url in image_urls {
            content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: url.to_string(),
                        // 气泡很小，需要高分辨率
                        detail: Some(ImageDetail::High),
                    },
                },
            ));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()
            .map_err(|e| LlmError::RequestBuildFailed(e.to_string()))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| LlmError::RequestBuildFailed(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            LlmError::ApiCallFailed {
                model: self.model_name.clone(),
                source: Box::new(e),
            }
        })?;

        debug!("LLM API 调用成功");

        let choice = response.choices.first().ok_or_else(|| LlmError::EmptyResponse {
            model: self.model_name.clone(),
        })?;

        let content = choice
            .message
            .content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        debug!("LLM 响应: {}", truncate_text(content, 200));

        Ok(content.to_string())
    }
}

impl VisionModel for LlmService {
    async fn read_answers(
        &self,
        image: &SheetImage,
        range: QuestionRange,
    ) -> Result<String, LlmError> {
        let prompt = build_omr_prompt(range);
        self.send_to_llm(&prompt, Some(SYSTEM_MESSAGE), &[image.url()])
            .await
    }
}

/// 构建识别一个批次的提示词
///
/// 只描述输出格式，批次划分由调用方决定。
pub fn build_omr_prompt(range: QuestionRange) -> String {
    let options = AnswerOutcome::OPTIONS.map(AnswerOutcome::as_str).join(", ");
    let first = range.start;
    let last = range.last();

    format!(
        r#"TASK:
- Read ONLY questions {first} to {last} (inclusive) on this OMR answer sheet. Ignore every other question.
- Options per question: {options}
- Cases:
  * One fully filled bubble -> that option, e.g. ["A"]
  * Several fully filled bubbles -> all of them, e.g. ["B","D"]
  * Half-filled / partially darkened bubble -> ["half-X"] where X is the option letter
  * No filled bubble -> []

OUTPUT FORMAT (strict JSON only, no commentary, no code fences):
{{
  "answers": {{
    "{first}": ["A"],
    "{second}": []
  }}
}}

RULES:
- Keys are question numbers as strings, from "{first}" to "{last}".
- Return exactly {count} entries.
- Values are always lists of strings."#,
        second = (first + 1).min(last),
        count = range.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_covers_batch_window() {
        let prompt = build_omr_prompt(QuestionRange::new(41, 81));
        assert!(prompt.contains("questions 41 to 80"));
        assert!(prompt.contains("Return exactly 40 entries"));
        assert!(prompt.contains("\"41\": [\"A\"]"));
        assert!(prompt.contains("A, B, C, D"));
        assert!(prompt.contains("half-X"));
    }

    #[test]
    fn test_prompt_single_question() {
        let prompt = build_omr_prompt(QuestionRange::new(1, 2));
        assert!(prompt.contains("questions 1 to 1"));
        assert!(prompt.contains("Return exactly 1 entries"));
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = Config::default();
        assert!(matches!(LlmService::new(&config), Err(ConfigError::MissingApiKey)));
    }

    /// 测试 Vision API 真实调用
    ///
    /// 运行方式：
    /// ```bash
    /// LLM_API_KEY=... OMR_TEST_IMAGE=sheet.jpg cargo test test_read_answers_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_read_answers_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env().expect("环境变量解析失败");
        let service = LlmService::new(&config).expect("缺少 API 密钥");
        let image_path = std::env::var("OMR_TEST_IMAGE").expect("请设置 OMR_TEST_IMAGE");
        let image = SheetImage::load(&image_path).await.expect("加载图片失败");

        let response = service
            .read_answers(&image, QuestionRange::new(1, 11))
            .await
            .expect("Vision API 调用失败");

        println!("\n========== LLM 响应 ==========");
        println!("{}", response);
        println!("==============================\n");
        assert!(!response.is_empty());
    }
}
