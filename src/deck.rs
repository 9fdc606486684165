//! 덱 처리 모듈
//!
//! 덱 하나의 노트를 가져와 검사, 구체화하고 `notes.json`을 씁니다.
//! 쓸 수 있는 노트가 하나도 없으면 덱 폴더를 지웁니다.
//! 덱 폴더는 `notes.json`에 노트가 하나 이상 있을 때만 남습니다.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::config::{ExportConfig, NOTES_FILE};
use crate::error::{DeckFailure, SkippedNote};
use crate::manifest::write_json_atomic;
use crate::media::{materialize_note, NormalizedNote};
use crate::normalize::sanitize_deck_name;
use crate::source::NoteSource;
use crate::validate::validate_note;

/// 내보낸 덱 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckExport {
    /// `notes.json`에 기록된 노트 수
    pub notes_written: usize,
    /// 건너뛴 노트
    pub skipped: Vec<SkippedNote>,
    /// 복사된 오디오 총 크기
    pub media_bytes: u64,
}

/// 덱 처리 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckOutcome {
    /// 원래 덱 이름
    pub deck: String,
    /// 정리된 폴더 이름
    pub dir_name: String,
    pub result: Result<DeckExport, DeckFailure>,
}

impl DeckOutcome {
    pub fn is_exported(&self) -> bool {
        self.result.is_ok()
    }

    /// 실패 사유 (성공이면 None)
    pub fn reason(&self) -> Option<String> {
        self.result.as_ref().err().map(|e| e.to_string())
    }
}

/// 덱 하나 처리
///
/// # Arguments
/// * `deck` - 덱 이름 (`::` 계층 포함 가능)
/// * `source` - 노트 소스
/// * `config` - 내보내기 설정
/// * `cancel` - 실행 취소 플래그
pub fn process_deck(
    deck: &str,
    source: &dyn NoteSource,
    config: &ExportConfig,
    cancel: &AtomicBool,
) -> DeckOutcome {
    let dir_name = sanitize_deck_name(deck);
    let result = process_deck_internal(deck, &dir_name, source, config, cancel);

    match &result {
        Ok(export) => info!(
            deck,
            dir = %dir_name,
            notes = export.notes_written,
            skipped = export.skipped.len(),
            "덱 내보내기 완료"
        ),
        Err(failure) => info!(deck, dir = %dir_name, reason = %failure, "덱 내보내기 실패"),
    }

    DeckOutcome {
        deck: deck.to_string(),
        dir_name,
        result,
    }
}

/// 내부 덱 처리 로직
fn process_deck_internal(
    deck: &str,
    dir_name: &str,
    source: &dyn NoteSource,
    config: &ExportConfig,
    cancel: &AtomicBool,
) -> Result<DeckExport, DeckFailure> {
    if cancel.load(Ordering::Relaxed) {
        return Err(DeckFailure::Cancelled);
    }
    if dir_name.is_empty() {
        return Err(DeckFailure::EmptyDirectoryName);
    }

    debug!(deck, "노트 가져오는 중");
    let notes = source
        .fetch_notes(deck)
        .map_err(|e| DeckFailure::Fetch(e.to_string()))?;

    if notes.is_empty() {
        return Err(DeckFailure::NoNotes);
    }

    let deck_dir = config.deck_dir(dir_name);
    fs::create_dir_all(&deck_dir).map_err(|e| DeckFailure::Write(e.to_string()))?;

    let mut valid_notes: Vec<NormalizedNote> = Vec::with_capacity(notes.len());
    let mut skipped: Vec<SkippedNote> = Vec::new();
    let mut media_bytes = 0u64;

    for note in &notes {
        if cancel.load(Ordering::Relaxed) {
            rollback(&deck_dir);
            return Err(DeckFailure::Cancelled);
        }

        let validation = validate_note(note, &config.fields);
        if !validation.is_valid() {
            debug!(deck, note_id = note.note_id, errors = ?validation.errors, "유효하지 않은 노트 건너뜀");
            skipped.push(SkippedNote {
                note_id: note.note_id,
                reasons: validation.errors,
            });
            continue;
        }

        match materialize_note(
            note,
            &config.media_dir,
            &deck_dir,
            &config.fields,
            &config.alphabet,
        ) {
            Ok(materialized) => {
                media_bytes += materialized.bytes_copied;
                valid_notes.push(materialized.note);
            }
            Err(failure) => {
                debug!(deck, note_id = note.note_id, reason = %failure, "노트 건너뜀");
                skipped.push(SkippedNote {
                    note_id: note.note_id,
                    reasons: failure.reasons(),
                });
            }
        }
    }

    if valid_notes.is_empty() {
        warn!(deck, dir = %deck_dir.display(), "유효한 노트가 없어 폴더를 삭제합니다");
        rollback(&deck_dir);
        return Err(DeckFailure::NoValidNotes(skipped));
    }

    if let Err(e) = write_json_atomic(&deck_dir.join(NOTES_FILE), &valid_notes) {
        rollback(&deck_dir);
        return Err(DeckFailure::Write(e.to_string()));
    }

    Ok(DeckExport {
        notes_written: valid_notes.len(),
        skipped,
        media_bytes,
    })
}

/// 덱 폴더 전체 삭제
fn rollback(deck_dir: &Path) {
    if let Err(e) = fs::remove_dir_all(deck_dir) {
        warn!(dir = %deck_dir.display(), error = %e, "덱 폴더 삭제 실패");
    }
}
