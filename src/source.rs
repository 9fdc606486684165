//! 노트 소스 모듈
//!
//! 덱 목록과 노트를 가져오는 `NoteSource` 트레이트와
//! AnkiConnect HTTP API 구현을 담당합니다.

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::error::{ExportError, Result};

/// AnkiConnect 기본 주소
pub const DEFAULT_ANKI_URL: &str = "http://localhost:8765";

/// AnkiConnect 프로토콜 버전
const API_VERSION: u32 = 6;

/// 노트 필드 값
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteField {
    pub value: String,
    #[serde(default)]
    pub order: u32,
}

/// AnkiConnect `notesInfo`가 돌려주는 노트 (필요한 부분만)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default)]
    pub note_id: u64,
    #[serde(default)]
    pub fields: HashMap<String, NoteField>,
}

impl Note {
    /// 필드 없는 노트 생성
    pub fn new(note_id: u64) -> Self {
        Self {
            note_id,
            fields: HashMap::new(),
        }
    }

    /// 필드 추가 (빌더)
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        let order = self.fields.len() as u32;
        self.fields.insert(
            name.to_string(),
            NoteField {
                value: value.to_string(),
                order,
            },
        );
        self
    }

    /// 필드 값 조회 (필드가 없으면 None)
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|f| f.value.as_str())
    }
}

/// 덱과 노트를 제공하는 외부 협력자
///
/// 워커 스레드들이 동시에 호출하므로 `Send + Sync`여야 합니다.
pub trait NoteSource: Send + Sync {
    /// 사용 가능한 모든 덱 이름
    fn list_decks(&self) -> Result<Vec<String>>;

    /// 덱에 속한 모든 노트 (노트가 없으면 빈 벡터)
    fn fetch_notes(&self, deck: &str) -> Result<Vec<Note>>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: Option<T>,
    error: Option<String>,
}

/// AnkiConnect 클라이언트
#[derive(Debug, Clone)]
pub struct AnkiConnect {
    client: Client,
    url: String,
}

impl AnkiConnect {
    /// 새 클라이언트 생성
    ///
    /// # Arguments
    /// * `url` - AnkiConnect 주소 (예: "http://localhost:8765")
    /// * `timeout` - 요청 타임아웃
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExportError::Request {
                action: "client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// 설정된 주소
    pub fn url(&self) -> &str {
        &self.url
    }

    /// AnkiConnect 버전 조회 (연결 확인용)
    pub fn version(&self) -> Result<u32> {
        Ok(self.request::<u32>("version", None)?.unwrap_or_default())
    }

    fn find_note_ids(&self, query: &str) -> Result<Vec<u64>> {
        let ids = self.request("findNotes", Some(json!({ "query": query })))?;
        Ok(ids.unwrap_or_default())
    }

    fn notes_info(&self, ids: &[u64]) -> Result<Vec<Note>> {
        let notes = self.request("notesInfo", Some(json!({ "notes": ids })))?;
        Ok(notes.unwrap_or_default())
    }

    fn request<T: DeserializeOwned>(&self, action: &str, params: Option<Value>) -> Result<Option<T>> {
        let body = request_body(action, params);
        let request_error = |e: reqwest::Error| ExportError::Request {
            action: action.to_string(),
            reason: e.to_string(),
        };

        let response: ApiResponse<T> = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(request_error)?
            .json()
            .map_err(request_error)?;

        if let Some(message) = response.error {
            return Err(ExportError::Api {
                action: action.to_string(),
                message,
            });
        }

        Ok(response.result)
    }
}

impl NoteSource for AnkiConnect {
    fn list_decks(&self) -> Result<Vec<String>> {
        Ok(self.request("deckNames", None)?.unwrap_or_default())
    }

    fn fetch_notes(&self, deck: &str) -> Result<Vec<Note>> {
        let ids = self.find_note_ids(&deck_query(deck))?;
        debug!(deck, count = ids.len(), "노트 ID 조회");

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let notes = self.notes_info(&ids)?;
        // 삭제된 노트는 빈 객체로 돌아옴
        Ok(notes.into_iter().filter(|n| n.note_id != 0).collect())
    }
}

/// AnkiConnect 요청 본문 생성
fn request_body(action: &str, params: Option<Value>) -> Value {
    let mut body = Map::new();
    body.insert("action".to_string(), Value::String(action.to_string()));
    body.insert("version".to_string(), Value::from(API_VERSION));

    if let Some(params) = params {
        body.insert("params".to_string(), params);
    }

    Value::Object(body)
}

/// 덱 검색 쿼리 (하위 덱 포함)
fn deck_query(deck: &str) -> String {
    format!("deck:\"{}\"", deck.replace('"', "\\\""))
}
