//! 에러 타입 정의 모듈
//!
//! ankidata에서 발생할 수 있는 에러 타입을 정의합니다.
//! 실행 전체를 중단시키는 `ExportError`와, 노트/덱 단위로 기록만 되고
//! 전파되지 않는 `NoteFailure`, `DeckFailure`로 나뉩니다.

use std::path::PathBuf;
use thiserror::Error;

/// 실행 단위 에러 (호출자에게 전파됨)
#[derive(Error, Debug)]
pub enum ExportError {
    /// AnkiConnect 요청 실패 (연결 불가, HTTP 오류, 응답 파싱 실패)
    #[error("AnkiConnect 요청 실패 ({action}): {reason}")]
    Request { action: String, reason: String },

    /// AnkiConnect가 error 필드를 돌려줌
    #[error("AnkiConnect 오류 ({action}): {message}")]
    Api { action: String, message: String },

    /// 파일 시스템 작업 실패
    #[error("파일 시스템 오류 ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 직렬화 실패
    #[error("JSON 직렬화 실패 ({file}): {reason}")]
    SerializeError { file: PathBuf, reason: String },

    /// 스레드 풀 초기화 실패
    #[error("스레드 풀 초기화 실패: {reason}")]
    ThreadPoolError { reason: String },

    /// 출력 경로가 폴더가 아님
    #[error("출력 경로가 폴더가 아닙니다: {path}")]
    NotADirectory { path: PathBuf },
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }
}

/// 노트 하나를 건너뛴 이유
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoteFailure {
    /// 필수 필드 검사 실패 (위반 항목 전부)
    #[error("{}", .0.join(", "))]
    Invalid(Vec<String>),

    #[error("invalid sound tag")]
    InvalidSoundTag,

    #[error("media file not found: {0}")]
    MediaNotFound(String),

    #[error("failed to copy {file}: {reason}")]
    CopyFailed { file: String, reason: String },

    #[error("transcription empty after cleaning")]
    EmptyTranscription,
}

impl NoteFailure {
    /// 로그/리포트용 사유 목록
    pub fn reasons(&self) -> Vec<String> {
        match self {
            NoteFailure::Invalid(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// 건너뛴 노트와 그 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedNote {
    pub note_id: u64,
    pub reasons: Vec<String>,
}

/// 덱 하나가 내보내지지 못한 이유
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeckFailure {
    #[error("deck name has no usable characters for a directory name")]
    EmptyDirectoryName,

    #[error("no notes found")]
    NoNotes,

    #[error("failed to fetch notes: {0}")]
    Fetch(String),

    #[error("{}", describe_skipped(.0))]
    NoValidNotes(Vec<SkippedNote>),

    #[error("failed to write deck output: {0}")]
    Write(String),

    #[error("directory name '{dir_name}' already used by deck '{other}'")]
    DuplicateDirectory { dir_name: String, other: String },

    #[error("export cancelled")]
    Cancelled,
}

fn describe_skipped(skipped: &[SkippedNote]) -> String {
    if skipped.is_empty() {
        return "no valid notes (no specific errors reported)".to_string();
    }

    let details = skipped
        .iter()
        .map(|s| format!("note {}: {}", s.note_id, s.reasons.join(", ")))
        .collect::<Vec<_>>()
        .join("; ");

    format!("no valid notes ({} notes skipped: {})", skipped.len(), details)
}

/// ankidata 결과 타입 별칭
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_valid_notes_lists_every_note() {
        let failure = DeckFailure::NoValidNotes(vec![
            SkippedNote {
                note_id: 1,
                reasons: vec!["missing or empty 'sound' field".to_string()],
            },
            SkippedNote {
                note_id: 2,
                reasons: vec!["invalid sound tag".to_string()],
            },
        ]);

        let msg = failure.to_string();
        assert!(msg.starts_with("no valid notes (2 notes skipped"));
        assert!(msg.contains("note 1: missing or empty 'sound' field"));
        assert!(msg.contains("note 2: invalid sound tag"));
    }

    #[test]
    fn test_no_valid_notes_without_details() {
        let failure = DeckFailure::NoValidNotes(Vec::new());
        assert_eq!(
            failure.to_string(),
            "no valid notes (no specific errors reported)"
        );
    }

    #[test]
    fn test_note_failure_reasons() {
        let invalid = NoteFailure::Invalid(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(invalid.reasons(), vec!["a", "b"]);
        assert_eq!(invalid.to_string(), "a, b");

        let missing = NoteFailure::MediaNotFound("x.mp3".to_string());
        assert_eq!(missing.reasons(), vec!["media file not found: x.mp3"]);
    }
}
