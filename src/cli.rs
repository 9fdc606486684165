//! CLI 인자 파싱 모듈
//!
//! clap을 사용한 명령줄 인자 정의 및 파싱을 담당합니다.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{ExportConfig, FieldNames, DEFAULT_WORKERS};
use crate::normalize::{Alphabet, GERMAN_LETTERS};
use crate::source::DEFAULT_ANKI_URL;

/// ankidata CLI 인자 구조체
#[derive(Parser, Debug)]
#[command(
    name = "ankidata",
    author = "YourName <your@email.com>",
    version,
    about = "ANKI DECK EXPORTER - Anki 덱을 노트 매니페스트와 오디오 파일 폴더로 내보내는 CLI 도구",
    long_about = r#"
ANKI DECK EXPORTER
==================

AnkiConnect로 덱의 노트를 가져와 덱마다 폴더를 만들고,
정리된 노트 목록(notes.json)과 오디오 파일을 저장합니다.

특징:
  • 여러 덱을 워커 풀로 동시에 처리
  • 이미 내보낸 덱은 decks.json을 보고 건너뜀
  • 노트 단위/덱 단위 실패를 격리하고 사유를 보고
  • 쓸 수 있는 노트가 없는 덱은 폴더를 남기지 않음

예제:
  ankidata --list
  ankidata -d "German::Basics" -o ./data
  ankidata --all -m ~/.local/share/Anki2/User\ 1/collection.media
  ankidata --all --dry-run
  ankidata -d Verben --sound-field Audio --transcription-field Wort --meaning-field Bedeutung
"#
)]
pub struct Args {
    /// 출력 루트 폴더 (decks.json과 덱 폴더가 생성됨)
    #[arg(short, long, default_value = "data")]
    pub output: PathBuf,

    /// Anki collection.media 폴더 (기본값: 자동 탐색)
    #[arg(short, long)]
    pub media: Option<PathBuf>,

    /// 내보낼 덱 이름 (여러 번 지정 가능)
    #[arg(short, long = "deck")]
    pub decks: Vec<String>,

    /// AnkiConnect가 알려주는 모든 덱 내보내기
    #[arg(short, long, conflicts_with = "decks")]
    pub all: bool,

    /// 덱 목록만 출력
    #[arg(short, long)]
    pub list: bool,

    /// 오디오 필드 이름
    #[arg(long, default_value = "sound")]
    pub sound_field: String,

    /// 전사 필드 이름
    #[arg(long, default_value = "transcription")]
    pub transcription_field: String,

    /// 의미 필드 이름 (값은 비어 있어도 됨)
    #[arg(long, default_value = "meaning")]
    pub meaning_field: String,

    /// 전사 정리 시 글자로 취급할 비ASCII 문자
    #[arg(long, default_value = GERMAN_LETTERS)]
    pub extra_letters: String,

    /// 동시 처리 워커 수
    #[arg(short = 'j', long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// AnkiConnect 주소
    #[arg(long, env = "ANKI_CONNECT_URL", default_value = DEFAULT_ANKI_URL)]
    pub anki_url: String,

    /// AnkiConnect 요청 타임아웃 (초)
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// decks.json에 있지만 notes.json이 사라진 덱을 다시 내보냄
    #[arg(long)]
    pub recheck: bool,

    /// 실제 내보내기 없이 처리될 덱 목록만 표시
    #[arg(long)]
    pub dry_run: bool,

    /// 실패한 덱 로그 파일 경로
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// 상세 출력 모드
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 필드 이름 매핑
    pub fn field_names(&self) -> FieldNames {
        FieldNames::new(
            &self.sound_field,
            &self.transcription_field,
            &self.meaning_field,
        )
    }

    /// 내보내기 설정 생성
    pub fn export_config(&self, media_dir: PathBuf) -> ExportConfig {
        ExportConfig::new(self.output.clone(), media_dir)
            .with_fields(self.field_names())
            .with_alphabet(Alphabet::with_extra(&self.extra_letters))
            .with_workers(self.workers)
            .with_recheck_existing(self.recheck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["ankidata", "-d", "German::Basics"]).unwrap();

        assert_eq!(args.output, PathBuf::from("data"));
        assert_eq!(args.decks, vec!["German::Basics"]);
        assert_eq!(args.workers, 3);
        assert_eq!(args.field_names(), FieldNames::default());
        assert!(!args.all);
    }

    #[test]
    fn test_repeated_decks_and_fields() {
        let args = Args::try_parse_from([
            "ankidata",
            "-d",
            "A",
            "--deck",
            "B::C",
            "--sound-field",
            " Audio ",
            "-j",
            "8",
            "--recheck",
        ])
        .unwrap();

        assert_eq!(args.decks, vec!["A", "B::C"]);

        let config = args.export_config(PathBuf::from("media"));
        assert_eq!(config.fields.sound, "Audio");
        assert_eq!(config.workers, 8);
        assert!(config.recheck_existing);
        assert_eq!(config.media_dir, PathBuf::from("media"));
    }

    #[test]
    fn test_all_conflicts_with_decks() {
        let result = Args::try_parse_from(["ankidata", "--all", "-d", "A"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_extra_letters() {
        let args = Args::try_parse_from(["ankidata", "--all", "--extra-letters", "éè"]).unwrap();
        let config = args.export_config(PathBuf::from("media"));
        assert!(config.alphabet.contains('é'));
        assert!(!config.alphabet.contains('ß'));
    }
}
