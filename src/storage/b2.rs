//! # Backblaze B2 上传客户端
//!
//! ## 设计思路
//!
//! 直接使用 B2 原生 API（v2），只覆盖发布所需的最小子集：
//! 1. `b2_authorize_account`：用应用密钥换取账户令牌与 API 地址
//! 2. `b2_list_buckets`：按名称解析桶 ID（密钥已限定到该桶时直接复用）
//! 3. `b2_get_upload_url`：每次上传前获取上传地址与上传令牌
//! 4. `POST uploadUrl`：写入对象
//!
//! ## 实现思路
//!
//! - 认证在 `connect` 中一次完成，之后只持有令牌，不再读取环境变量。
//! - 非 2xx 响应解析 B2 的 `{status, code, message}` 错误体并并入错误文本。
//! - 不设置请求超时，也不做重试。

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{UploadedObject, Uploader};
use crate::publish::PublishError;

pub const DEFAULT_B2_API_URL: &str = "https://api.backblazeb2.com";

/// B2 无法识别类型时由服务端按扩展名推断。
const AUTO_CONTENT_TYPE: &str = "b2/x-auto";
const FILE_NAME_HEADER: &str = "X-Bz-File-Name";
const CONTENT_SHA1_HEADER: &str = "X-Bz-Content-Sha1";

/// 应用密钥。`Debug` 输出不包含密钥本身。
#[derive(Clone)]
pub struct B2Credentials {
    pub key_id: String,
    pub application_key: String,
}

impl fmt::Debug for B2Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("B2Credentials")
            .field("key_id", &self.key_id)
            .field("application_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeResponse {
    account_id: String,
    authorization_token: String,
    api_url: String,
    #[serde(default)]
    allowed: Option<AllowedScope>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllowedScope {
    bucket_id: Option<String>,
    bucket_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListBucketsResponse {
    buckets: Vec<BucketInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketInfo {
    bucket_id: String,
    bucket_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadTarget {
    upload_url: String,
    authorization_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadFileResponse {
    file_id: String,
    file_name: String,
}

#[derive(Debug, Deserialize)]
struct B2ErrorBody {
    status: u16,
    code: String,
    message: String,
}

/// 已认证的 B2 桶客户端。
pub struct B2Uploader {
    http: reqwest::Client,
    api_url: String,
    account_token: String,
    bucket_id: String,
    bucket_name: String,
}

impl fmt::Debug for B2Uploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("B2Uploader")
            .field("api_url", &self.api_url)
            .field("bucket_id", &self.bucket_id)
            .field("bucket_name", &self.bucket_name)
            .finish_non_exhaustive()
    }
}

impl B2Uploader {
    /// 认证账户并解析目标桶。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use imgpub::storage::{B2Credentials, B2Uploader, DEFAULT_B2_API_URL};
    ///
    /// # async fn demo() -> Result<(), imgpub::publish::PublishError> {
    /// let credentials = B2Credentials {
    ///     key_id: "key-id".into(),
    ///     application_key: "secret".into(),
    /// };
    /// let uploader = B2Uploader::connect(&credentials, DEFAULT_B2_API_URL, "my-bucket").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(
        credentials: &B2Credentials,
        auth_base_url: &str,
        bucket_name: &str,
    ) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("imgpub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PublishError::Authorization(format!("HTTP 客户端初始化失败：{}", e)))?;

        log::debug!("🔑 B2 认证 - key_id={}", credentials.key_id);
        let response = http
            .get(format!("{}/b2api/v2/b2_authorize_account", trim_base(auth_base_url)))
            .basic_auth(&credentials.key_id, Some(&credentials.application_key))
            .send()
            .await
            .map_err(|e| PublishError::Authorization(format!("请求失败：{}", e)))?;
        let auth: AuthorizeResponse = read_json(response, PublishError::Authorization).await?;

        let bucket_id = match auth.allowed.as_ref() {
            Some(AllowedScope {
                bucket_id: Some(id),
                bucket_name: Some(name),
            }) if name == bucket_name => id.clone(),
            _ => Self::lookup_bucket_id(&http, &auth, bucket_name).await?,
        };

        log::info!("🪣 已连接 B2 桶 {}（{}）", bucket_name, bucket_id);

        Ok(Self {
            http,
            api_url: trim_base(&auth.api_url).to_string(),
            account_token: auth.authorization_token,
            bucket_id,
            bucket_name: bucket_name.to_string(),
        })
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    async fn lookup_bucket_id(
        http: &reqwest::Client,
        auth: &AuthorizeResponse,
        bucket_name: &str,
    ) -> Result<String, PublishError> {
        let response = http
            .post(format!("{}/b2api/v2/b2_list_buckets", trim_base(&auth.api_url)))
            .header(AUTHORIZATION, &auth.authorization_token)
            .json(&json!({ "accountId": auth.account_id, "bucketName": bucket_name }))
            .send()
            .await
            .map_err(|e| PublishError::Authorization(format!("查询桶失败：{}", e)))?;
        let listed: ListBucketsResponse = read_json(response, PublishError::Authorization).await?;

        listed
            .buckets
            .into_iter()
            .find(|bucket| bucket.bucket_name == bucket_name)
            .map(|bucket| bucket.bucket_id)
            .ok_or_else(|| PublishError::Authorization(format!("桶不存在或无权访问：{}", bucket_name)))
    }

    async fn get_upload_target(&self) -> Result<UploadTarget, PublishError> {
        let response = self
            .http
            .post(format!("{}/b2api/v2/b2_get_upload_url", self.api_url))
            .header(AUTHORIZATION, &self.account_token)
            .json(&json!({ "bucketId": self.bucket_id }))
            .send()
            .await
            .map_err(|e| PublishError::Upload(format!("获取上传地址失败：{}", e)))?;
        read_json(response, PublishError::Upload).await
    }
}

#[async_trait]
impl Uploader for B2Uploader {
    async fn upload(&self, key: &str, bytes: Bytes) -> Result<UploadedObject, PublishError> {
        let target = self.get_upload_target().await?;
        let content_type = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or(AUTO_CONTENT_TYPE);

        log::debug!("⬆️ 上传 {}（{} 字节，{}）", key, bytes.len(), content_type);

        let response = self
            .http
            .post(&target.upload_url)
            .header(AUTHORIZATION, &target.authorization_token)
            .header(FILE_NAME_HEADER, encode_file_name(key))
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_SHA1_HEADER, "do_not_verify")
            .body(bytes)
            .send()
            .await
            .map_err(|e| PublishError::Upload(format!("{}：{}", key, e)))?;
        let uploaded: UploadFileResponse = read_json(response, PublishError::Upload).await?;

        Ok(UploadedObject {
            file_name: uploaded.file_name,
            file_id: uploaded.file_id,
        })
    }
}

fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// 读取 JSON 响应；非 2xx 时解析 B2 错误体。
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    to_error: fn(String) -> PublishError,
) -> Result<T, PublishError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| to_error(format!("读取响应失败：{}", e)))?;

    if !status.is_success() {
        let detail = match serde_json::from_str::<B2ErrorBody>(&body) {
            Ok(err) => format!("{} {}: {}", err.status, err.code, err.message),
            Err(_) => format!("{} {}", status, body.trim()),
        };
        return Err(to_error(detail));
    }

    serde_json::from_str(&body).map_err(|e| to_error(format!("响应格式错误：{}", e)))
}

/// B2 要求文件名按 UTF-8 百分号编码，`/` 保留。
fn encode_file_name(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const BASIC_AUTH: &str = "Basic a2V5LWlkOmtleS1zZWNyZXQ=";

    fn credentials() -> B2Credentials {
        B2Credentials {
            key_id: "key-id".to_string(),
            application_key: "key-secret".to_string(),
        }
    }

    fn authorize_body(api_url: &str, allowed: serde_json::Value) -> String {
        json!({
            "accountId": "acct-1",
            "authorizationToken": "acct-token",
            "apiUrl": api_url,
            "downloadUrl": api_url,
            "allowed": allowed,
        })
        .to_string()
    }

    #[test]
    fn file_name_encoding_keeps_slashes() {
        assert_eq!(encode_file_name("images/photo_full.jpg"), "images/photo_full.jpg");
        assert_eq!(encode_file_name("images/my cat+1.jpg"), "images/my%20cat%2B1.jpg");
        assert_eq!(encode_file_name("images/猫.png"), "images/%E7%8C%AB.png");
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let printed = format!("{:?}", credentials());
        assert!(printed.contains("key-id"));
        assert!(!printed.contains("key-secret"));
    }

    #[tokio::test]
    async fn connect_and_upload_speaks_b2_protocol() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();

        let authorize = server
            .mock("GET", "/b2api/v2/b2_authorize_account")
            .match_header("authorization", BASIC_AUTH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(authorize_body(&base, json!({ "capabilities": ["writeFiles"] })))
            .create_async()
            .await;

        let list = server
            .mock("POST", "/b2api/v2/b2_list_buckets")
            .match_header("authorization", "acct-token")
            .match_body(Matcher::PartialJson(json!({ "accountId": "acct-1", "bucketName": "nino-public" })))
            .with_status(200)
            .with_body(json!({ "buckets": [{ "bucketId": "bucket-42", "bucketName": "nino-public" }] }).to_string())
            .create_async()
            .await;

        let upload_url = server
            .mock("POST", "/b2api/v2/b2_get_upload_url")
            .match_header("authorization", "acct-token")
            .match_body(Matcher::PartialJson(json!({ "bucketId": "bucket-42" })))
            .with_status(200)
            .with_body(
                json!({
                    "bucketId": "bucket-42",
                    "uploadUrl": format!("{}/upload/bucket-42", base),
                    "authorizationToken": "upload-token",
                })
                .to_string(),
            )
            .create_async()
            .await;

        let upload = server
            .mock("POST", "/upload/bucket-42")
            .match_header("authorization", "upload-token")
            .match_header("x-bz-file-name", "images/photo_full.jpg")
            .match_header("x-bz-content-sha1", "do_not_verify")
            .match_body("pixels")
            .with_status(200)
            .with_body(json!({ "fileId": "file-1", "fileName": "images/photo_full.jpg" }).to_string())
            .create_async()
            .await;

        let uploader = B2Uploader::connect(&credentials(), &base, "nino-public")
            .await
            .expect("connect should succeed");
        let uploaded = uploader
            .upload("images/photo_full.jpg", Bytes::from_static(b"pixels"))
            .await
            .expect("upload should succeed");

        assert_eq!(uploaded.file_name, "images/photo_full.jpg");
        assert_eq!(uploaded.file_id, "file-1");
        authorize.assert_async().await;
        list.assert_async().await;
        upload_url.assert_async().await;
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn restricted_key_skips_bucket_listing() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();

        let _authorize = server
            .mock("GET", "/b2api/v2/b2_authorize_account")
            .with_status(200)
            .with_body(authorize_body(
                &base,
                json!({ "bucketId": "bucket-7", "bucketName": "nino-public" }),
            ))
            .create_async()
            .await;
        let list = server
            .mock("POST", "/b2api/v2/b2_list_buckets")
            .expect(0)
            .create_async()
            .await;

        let uploader = B2Uploader::connect(&credentials(), &base, "nino-public")
            .await
            .expect("connect should succeed");

        assert_eq!(uploader.bucket_id, "bucket-7");
        assert_eq!(uploader.bucket_name(), "nino-public");
        list.assert_async().await;
    }

    #[tokio::test]
    async fn bad_credentials_are_authorization_errors() {
        let mut server = mockito::Server::new_async().await;
        let _authorize = server
            .mock("GET", "/b2api/v2/b2_authorize_account")
            .with_status(401)
            .with_body(json!({ "status": 401, "code": "unauthorized", "message": "bad key" }).to_string())
            .create_async()
            .await;

        let result = B2Uploader::connect(&credentials(), &server.url(), "nino-public").await;
        match result {
            Err(PublishError::Authorization(message)) => assert!(message.contains("unauthorized")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn unknown_bucket_is_authorization_error() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let _authorize = server
            .mock("GET", "/b2api/v2/b2_authorize_account")
            .with_status(200)
            .with_body(authorize_body(&base, serde_json::Value::Null))
            .create_async()
            .await;
        let _list = server
            .mock("POST", "/b2api/v2/b2_list_buckets")
            .with_status(200)
            .with_body(json!({ "buckets": [] }).to_string())
            .create_async()
            .await;

        let result = B2Uploader::connect(&credentials(), &base, "nino-public").await;
        assert!(matches!(result, Err(PublishError::Authorization(_))));
    }

    #[tokio::test]
    async fn failed_upload_is_upload_error() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        let _authorize = server
            .mock("GET", "/b2api/v2/b2_authorize_account")
            .with_status(200)
            .with_body(authorize_body(
                &base,
                json!({ "bucketId": "bucket-7", "bucketName": "nino-public" }),
            ))
            .create_async()
            .await;
        let _upload_url = server
            .mock("POST", "/b2api/v2/b2_get_upload_url")
            .with_status(200)
            .with_body(
                json!({
                    "bucketId": "bucket-7",
                    "uploadUrl": format!("{}/upload/bucket-7", base),
                    "authorizationToken": "upload-token",
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _upload = server
            .mock("POST", "/upload/bucket-7")
            .with_status(503)
            .with_body(json!({ "status": 503, "code": "service_unavailable", "message": "try later" }).to_string())
            .create_async()
            .await;

        let uploader = B2Uploader::connect(&credentials(), &base, "nino-public")
            .await
            .expect("connect should succeed");
        let result = uploader
            .upload("images/photo_thumb.jpg", Bytes::from_static(b"thumb"))
            .await;

        match result {
            Err(PublishError::Upload(message)) => assert!(message.contains("service_unavailable")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
