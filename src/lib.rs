//! ankidata - ANKI DECK EXPORTER
//!
//! AnkiConnect로 덱의 노트를 가져와 덱마다 폴더를 만들고,
//! 정리된 노트 목록(`notes.json`)과 오디오 파일을 저장하는 CLI 도구입니다.
//!
//! # 주요 기능
//!
//! - 🚀 **병렬 처리**: 고정 크기 워커 풀로 여러 덱을 동시에 내보내기
//! - 🔁 **증분 실행**: `decks.json`에 있는 덱은 다시 가져오지 않음
//! - 🧹 **데이터 정리**: 필수 필드 검사, 전사 앞뒤 잡음 제거
//! - 🧯 **실패 격리**: 노트 실패는 덱을, 덱 실패는 실행을 멈추지 않음
//! - 🗑️ **롤백**: 쓸 수 있는 노트가 없는 덱은 폴더를 남기지 않음
//! - 📈 **상세 통계**: 내보낸/실패한 덱, 노트 수, 오디오 용량 표시
//!
//! # 출력 구조
//!
//! ```text
//! <output>/decks.json
//! <output>/<덱 폴더>/notes.json
//! <output>/<덱 폴더>/<오디오 파일>
//! ```
//!
//! # 예제
//!
//! ```bash
//! # 덱 목록 확인
//! ankidata --list
//!
//! # 특정 덱 내보내기
//! ankidata -d "German::Basics" -o ./data
//!
//! # 모든 덱, 처리될 덱만 미리 보기
//! ankidata --all --dry-run
//! ```

pub mod cli;
pub mod config;
pub mod deck;
pub mod discovery;
pub mod error;
pub mod export;
pub mod manifest;
pub mod media;
pub mod normalize;
pub mod source;
pub mod stats;
pub mod validate;

// Re-exports for convenient access
pub use cli::Args;
pub use config::{ExportConfig, FieldNames};
pub use deck::{process_deck, DeckExport, DeckOutcome};
pub use error::{DeckFailure, ExportError, NoteFailure, Result, SkippedNote};
pub use export::{DeckGroup, ExportPlan, ExportReport, Exporter};
pub use manifest::Manifest;
pub use media::{materialize_note, NormalizedNote};
pub use normalize::{clean_transcription, sanitize_deck_name, Alphabet};
pub use source::{AnkiConnect, Note, NoteField, NoteSource};
pub use stats::{format_bytes, Statistics};
pub use validate::{validate_note, ValidationResult};
