//! 노트 필드 검사 모듈

use crate::config::FieldNames;
use crate::source::Note;

/// 필드 검사 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// 위반 항목 (비어 있으면 유효)
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// 필수 필드 규칙으로 노트 검사
///
/// 모든 규칙을 검사하고 위반 항목을 전부 돌려줍니다.
/// 의미(meaning) 필드는 존재만 하면 값이 비어 있어도 됩니다.
pub fn validate_note(note: &Note, fields: &FieldNames) -> ValidationResult {
    let mut errors = Vec::new();

    if note.field(&fields.sound).map_or(true, str::is_empty) {
        errors.push(format!("missing or empty '{}' field", fields.sound));
    }
    if note.field(&fields.transcription).map_or(true, str::is_empty) {
        errors.push(format!("missing or empty '{}' field", fields.transcription));
    }
    if note.field(&fields.meaning).is_none() {
        errors.push(format!("missing '{}' field", fields.meaning));
    }

    ValidationResult { errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_note() -> Note {
        Note::new(1)
            .with_field("sound", "[sound:a.mp3]")
            .with_field("transcription", "Hund")
            .with_field("meaning", "dog")
    }

    #[test]
    fn test_valid_note() {
        let result = validate_note(&full_note(), &FieldNames::default());
        assert!(result.is_valid());
    }

    #[test]
    fn test_empty_meaning_is_allowed() {
        let note = Note::new(1)
            .with_field("sound", "[sound:a.mp3]")
            .with_field("transcription", "Hund")
            .with_field("meaning", "");
        assert!(validate_note(&note, &FieldNames::default()).is_valid());
    }

    #[test]
    fn test_reports_every_violation() {
        let note = Note::new(7).with_field("meaning", "dog");
        let result = validate_note(&note, &FieldNames::default());

        assert!(!result.is_valid());
        assert_eq!(
            result.errors,
            vec![
                "missing or empty 'sound' field",
                "missing or empty 'transcription' field",
            ]
        );
    }

    #[test]
    fn test_empty_values_and_missing_meaning() {
        let note = Note::new(3)
            .with_field("sound", "")
            .with_field("transcription", "");
        let result = validate_note(&note, &FieldNames::default());
        assert_eq!(result.errors.len(), 3);
        assert_eq!(result.errors[2], "missing 'meaning' field");
    }

    #[test]
    fn test_custom_field_names() {
        let fields = FieldNames::new("Audio", "Wort", "Bedeutung");
        let result = validate_note(&full_note(), &fields);
        assert_eq!(result.errors.len(), 3);
        assert!(result.errors[0].contains("'Audio'"));
    }
}
