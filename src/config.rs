//! 내보내기 설정 모듈

use std::path::PathBuf;

use crate::normalize::Alphabet;

/// 기본 워커 수
pub const DEFAULT_WORKERS: usize = 3;

/// 덱 매니페스트 파일 이름
pub const DECKS_FILE: &str = "decks.json";

/// 덱별 노트 파일 이름
pub const NOTES_FILE: &str = "notes.json";

/// 노트 필드 이름 매핑
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub sound: String,
    pub transcription: String,
    pub meaning: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self::new("sound", "transcription", "meaning")
    }
}

impl FieldNames {
    pub fn new(sound: &str, transcription: &str, meaning: &str) -> Self {
        Self {
            sound: sound.trim().to_string(),
            transcription: transcription.trim().to_string(),
            meaning: meaning.trim().to_string(),
        }
    }
}

/// 내보내기 실행 설정
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// 출력 루트 폴더 (`decks.json`과 덱 폴더가 생성됨)
    pub output_dir: PathBuf,
    /// Anki `collection.media` 폴더
    pub media_dir: PathBuf,
    /// 필드 이름 매핑
    pub fields: FieldNames,
    /// 전사 정리용 알파벳
    pub alphabet: Alphabet,
    /// 동시 처리 워커 수
    pub workers: usize,
    /// 매니페스트에 있지만 `notes.json`이 사라진 덱을 다시 내보낼지 여부
    pub recheck_existing: bool,
}

impl ExportConfig {
    /// 기본 옵션 생성
    pub fn new(output_dir: impl Into<PathBuf>, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            media_dir: media_dir.into(),
            fields: FieldNames::default(),
            alphabet: Alphabet::default(),
            workers: DEFAULT_WORKERS,
            recheck_existing: false,
        }
    }

    /// 필드 이름 설정
    pub fn with_fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }

    /// 알파벳 설정
    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    /// 워커 수 설정 (최소 1)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// 사라진 덱 재확인 설정
    pub fn with_recheck_existing(mut self, recheck: bool) -> Self {
        self.recheck_existing = recheck;
        self
    }

    /// `decks.json` 경로
    pub fn decks_file(&self) -> PathBuf {
        self.output_dir.join(DECKS_FILE)
    }

    /// 덱 폴더 경로
    pub fn deck_dir(&self, dir_name: &str) -> PathBuf {
        self.output_dir.join(dir_name)
    }
}
