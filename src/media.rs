//! 노트 구체화 모듈
//!
//! 검사를 통과한 노트의 오디오 파일을 덱 폴더로 복사하고
//! 정리된 `NormalizedNote`를 만듭니다.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path};
use std::sync::OnceLock;

use crate::config::{FieldNames, NOTES_FILE};
use crate::error::NoteFailure;
use crate::normalize::Alphabet;
use crate::source::Note;

/// `notes.json`에 기록되는 노트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedNote {
    /// 덱 폴더 안의 오디오 파일 이름
    pub sound: String,
    pub transcription: String,
    pub meaning: String,
}

/// 구체화 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub note: NormalizedNote,
    /// 복사된 오디오 파일 크기
    pub bytes_copied: u64,
}

fn sound_tag() -> &'static Regex {
    static SOUND_TAG: OnceLock<Regex> = OnceLock::new();
    SOUND_TAG.get_or_init(|| Regex::new(r"^\[sound:(.*?)\]").expect("valid sound tag regex"))
}

/// `[sound:파일]` 형식에서 파일 이름 추출
///
/// 빈 이름, 경로 구분자가 들어간 이름, 덱 폴더의 `notes.json` 파일과
/// 겹치는 이름은 거부합니다.
///
/// # Examples
/// ```
/// use ankidata::media::extract_sound_filename;
///
/// assert_eq!(extract_sound_filename("[sound:a.mp3]"), Some("a.mp3"));
/// assert_eq!(extract_sound_filename("a.mp3"), None);
/// ```
pub fn extract_sound_filename(value: &str) -> Option<&str> {
    let file = sound_tag().captures(value)?.get(1)?.as_str();
    if is_reserved_name(file) {
        return None;
    }

    let mut components = Path::new(file).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !file.contains(['/', '\\']) => Some(file),
        _ => None,
    }
}

/// `notes.json`과 그 임시 파일 이름
fn is_reserved_name(file: &str) -> bool {
    file == NOTES_FILE || file.strip_prefix(NOTES_FILE) == Some(".tmp")
}

/// 노트 하나를 덱 폴더에 구체화
///
/// # Arguments
/// * `note` - `validate_note`를 통과한 노트
/// * `media_dir` - Anki 미디어 폴더
/// * `deck_dir` - 덱 출력 폴더 (이미 존재해야 함)
/// * `fields` - 필드 이름 매핑
/// * `alphabet` - 전사 정리용 알파벳
pub fn materialize_note(
    note: &Note,
    media_dir: &Path,
    deck_dir: &Path,
    fields: &FieldNames,
    alphabet: &Alphabet,
) -> Result<Materialized, NoteFailure> {
    let sound_value = note.field(&fields.sound).unwrap_or_default();
    let file = extract_sound_filename(sound_value).ok_or(NoteFailure::InvalidSoundTag)?;

    let src = media_dir.join(file);
    if !src.is_file() {
        return Err(NoteFailure::MediaNotFound(file.to_string()));
    }

    // 복사 전에 확인해 쓰이지 않는 오디오 파일이 남지 않게 함
    let raw_transcription = note.field(&fields.transcription).unwrap_or_default();
    let transcription = alphabet.clean(raw_transcription);
    if transcription.is_empty() {
        return Err(NoteFailure::EmptyTranscription);
    }

    let bytes_copied = copy_preserving(&src, &deck_dir.join(file)).map_err(|e| {
        NoteFailure::CopyFailed {
            file: file.to_string(),
            reason: e.to_string(),
        }
    })?;

    Ok(Materialized {
        note: NormalizedNote {
            sound: file.to_string(),
            transcription: transcription.to_string(),
            meaning: note.field(&fields.meaning).unwrap_or_default().to_string(),
        },
        bytes_copied,
    })
}

/// 내용, 권한, 수정 시간을 유지하며 복사
///
/// 같은 크기와 수정 시간의 파일이 이미 있으면 그대로 둡니다.
/// 다른 파일은 지운 뒤 다시 만들므로 읽기 전용 사본도 덮어쓸 수 있습니다.
fn copy_preserving(src: &Path, dst: &Path) -> io::Result<u64> {
    let meta = fs::metadata(src)?;
    let modified = meta.modified().ok();

    if let Ok(existing) = fs::metadata(dst) {
        if modified.is_some() && existing.len() == meta.len() && existing.modified().ok() == modified
        {
            return Ok(meta.len());
        }
        fs::remove_file(dst)?;
    }

    let mut reader = File::open(src)?;
    let mut writer = File::create(dst)?;
    let bytes = io::copy(&mut reader, &mut writer)?;
    if let Some(time) = modified {
        writer.set_modified(time)?;
    }
    drop(writer);

    // 권한은 마지막에 복사해야 읽기 전용 원본도 수정 시간이 유지됨
    fs::set_permissions(dst, meta.permissions())?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn note(sound: &str, transcription: &str) -> Note {
        Note::new(42)
            .with_field("sound", sound)
            .with_field("transcription", transcription)
            .with_field("meaning", "dog")
    }

    fn setup() -> (TempDir, TempDir) {
        let media = TempDir::new().unwrap();
        fs::write(media.path().join("a.mp3"), b"ID3 fake audio").unwrap();
        (media, TempDir::new().unwrap())
    }

    #[test]
    fn test_extract_sound_filename() {
        assert_eq!(extract_sound_filename("[sound:a.mp3]"), Some("a.mp3"));
        assert_eq!(
            extract_sound_filename("[sound:hund 1.mp3][sound:b.mp3]"),
            Some("hund 1.mp3")
        );
        assert_eq!(extract_sound_filename("text [sound:a.mp3]"), None);
        assert_eq!(extract_sound_filename("[sound:]"), None);
        assert_eq!(extract_sound_filename("[sound:a.mp3"), None);
    }

    #[test]
    fn test_extract_rejects_paths() {
        assert_eq!(extract_sound_filename("[sound:../secret.mp3]"), None);
        assert_eq!(extract_sound_filename("[sound:sub/a.mp3]"), None);
        assert_eq!(extract_sound_filename("[sound:..]"), None);
        assert_eq!(extract_sound_filename("[sound:/etc/passwd]"), None);
    }

    #[test]
    fn test_extract_rejects_record_file_names() {
        assert_eq!(extract_sound_filename("[sound:notes.json]"), None);
        assert_eq!(extract_sound_filename("[sound:notes.json.tmp]"), None);
        assert_eq!(extract_sound_filename("[sound:notes.json.mp3]"), Some("notes.json.mp3"));
    }

    #[test]
    fn test_materialize_success() {
        let (media, deck) = setup();
        let result = materialize_note(
            &note("[sound:a.mp3]", ".Hund."),
            media.path(),
            deck.path(),
            &FieldNames::default(),
            &Alphabet::default(),
        )
        .unwrap();

        assert_eq!(
            result.note,
            NormalizedNote {
                sound: "a.mp3".to_string(),
                transcription: "Hund".to_string(),
                meaning: "dog".to_string(),
            }
        );
        assert_eq!(result.bytes_copied, 14);
        assert_eq!(fs::read(deck.path().join("a.mp3")).unwrap(), b"ID3 fake audio");
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let (media, deck) = setup();
        let fields = FieldNames::default();
        let alphabet = Alphabet::default();
        let n = note("[sound:a.mp3]", "Hund");

        materialize_note(&n, media.path(), deck.path(), &fields, &alphabet).unwrap();
        let again = materialize_note(&n, media.path(), deck.path(), &fields, &alphabet);
        assert!(again.is_ok());
    }

    #[test]
    fn test_shared_read_only_audio() {
        let (media, deck) = setup();
        let src = media.path().join("a.mp3");
        let mut perms = fs::metadata(&src).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&src, perms).unwrap();

        let fields = FieldNames::default();
        let alphabet = Alphabet::default();
        let first = note("[sound:a.mp3]", "Hund");
        let second = note("[sound:a.mp3]", "der Hund");

        materialize_note(&first, media.path(), deck.path(), &fields, &alphabet).unwrap();
        let copied = deck.path().join("a.mp3");
        assert!(fs::metadata(&copied).unwrap().permissions().readonly());

        let result = materialize_note(&second, media.path(), deck.path(), &fields, &alphabet);
        assert_eq!(result.unwrap().note.transcription, "der Hund");
        assert_eq!(fs::read(&copied).unwrap(), b"ID3 fake audio");
    }

    #[test]
    fn test_stale_read_only_copy_is_replaced() {
        let (media, deck) = setup();
        let copied = deck.path().join("a.mp3");
        fs::write(&copied, b"old").unwrap();
        let mut perms = fs::metadata(&copied).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&copied, perms).unwrap();

        let result = materialize_note(
            &note("[sound:a.mp3]", "Hund"),
            media.path(),
            deck.path(),
            &FieldNames::default(),
            &Alphabet::default(),
        );

        assert_eq!(result.unwrap().bytes_copied, 14);
        assert_eq!(fs::read(&copied).unwrap(), b"ID3 fake audio");
    }

    #[test]
    fn test_materialize_preserves_mtime() {
        let (media, deck) = setup();
        let src = media.path().join("a.mp3");
        let past = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        File::options().write(true).open(&src).unwrap().set_modified(past).unwrap();

        materialize_note(
            &note("[sound:a.mp3]", "Hund"),
            media.path(),
            deck.path(),
            &FieldNames::default(),
            &Alphabet::default(),
        )
        .unwrap();

        let copied = fs::metadata(deck.path().join("a.mp3")).unwrap().modified().unwrap();
        assert_eq!(copied, past);
    }

    #[test]
    fn test_materialize_failures() {
        let (media, deck) = setup();
        let fields = FieldNames::default();
        let alphabet = Alphabet::default();
        let run = |n: Note| materialize_note(&n, media.path(), deck.path(), &fields, &alphabet);

        assert_eq!(run(note("a.mp3", "Hund")), Err(NoteFailure::InvalidSoundTag));
        assert_eq!(
            run(note("[sound:missing.mp3]", "Hund")),
            Err(NoteFailure::MediaNotFound("missing.mp3".to_string()))
        );
        assert_eq!(
            run(note("[sound:a.mp3]", "?!123")),
            Err(NoteFailure::EmptyTranscription)
        );
        assert!(!deck.path().join("missing.mp3").exists());
        assert!(!deck.path().join("a.mp3").exists());
    }
}
