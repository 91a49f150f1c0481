//! 答题卡图片加载 - 基础设施层
//!
//! 把图片路径或 URL 转换为可以放进 Vision 请求的 `image_url`：
//! - `http(s)://`、`data:` 地址原样使用
//! - 本地文件读取后编码为 `data:<mime>;base64,...`

use base64::{engine::general_purpose::STANDARD, Engine};
use phf::phf_map;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::error::{AppError, AppResult, FileError};
use crate::models::job::is_remote;

/// 扩展名 → MIME 类型
static IMAGE_MIME_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "bmp" => "image/bmp",
    "tif" => "image/tiff",
    "tiff" => "image/tiff",
    "heic" => "image/heic",
};

/// 一张待识别的答题卡图片
#[derive(Clone)]
pub struct SheetImage {
    /// 原始位置（用于日志）
    source: String,
    /// 传给模型的地址
    url: String,
}

impl SheetImage {
    /// 从路径或 URL 加载图片
    pub async fn load(location: &str) -> AppResult<Self> {
        if is_remote(location) {
            return Ok(Self::from_url(location));
        }

        let path = Path::new(location);
        let mime = mime_type_for(path).ok_or_else(|| FileError::UnsupportedImage {
            path: location.to_string(),
        })?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(location, e))?;

        debug!("已读取图片 {} ({} 字节)", location, bytes.len());
        Self::from_bytes(location, &bytes, mime)
    }

    /// 使用远程 URL 或 data URL
    pub fn from_url(url: &str) -> Self {
        let url = url.trim().to_string();
        Self {
            source: url.clone(),
            url,
        }
    }

    /// 从内存中的图片数据构造
    pub fn from_bytes(source: &str, bytes: &[u8], mime: &str) -> AppResult<Self> {
        if bytes.is_empty() {
            return Err(FileError::EmptyImage {
                path: source.to_string(),
            }
            .into());
        }
        Ok(Self {
            source: source.to_string(),
            url: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for SheetImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // data URL 可能有几 MB，只打印来源
        f.debug_struct("SheetImage")
            .field("source", &self.source)
            .field("url_len", &self.url.len())
            .finish()
    }
}

fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_MIME_TYPES.get(ext.as_str()).copied()
}
