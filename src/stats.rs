//! 통계 및 유틸리티 모듈
//!
//! 내보내기 통계 수집 및 포맷팅을 담당합니다.

use colored::Colorize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::deck::DeckOutcome;

/// 내보내기 통계 구조체
#[derive(Debug, Default)]
pub struct Statistics {
    /// 선택된 덱 수
    pub total_decks: usize,
    /// 이번 실행에서 내보낸 덱 수
    pub exported_count: AtomicUsize,
    /// 실패한 덱 수
    pub failed_count: AtomicUsize,
    /// 이미 내보내져 건너뛴 덱 수
    pub already_exported: AtomicUsize,
    /// 기록된 노트 수
    pub notes_written: AtomicUsize,
    /// 건너뛴 노트 수
    pub notes_skipped: AtomicUsize,
    /// 복사된 오디오 총 바이트
    pub media_bytes: AtomicU64,
    /// 처리 시작 시간
    start_time: Option<Instant>,
}

impl Statistics {
    /// 새 통계 인스턴스 생성
    pub fn new(total_decks: usize) -> Self {
        Self {
            total_decks,
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// 덱 처리 결과 반영
    pub fn record(&self, outcome: &DeckOutcome) {
        match &outcome.result {
            Ok(export) => {
                self.exported_count.fetch_add(1, Ordering::Relaxed);
                self.notes_written
                    .fetch_add(export.notes_written, Ordering::Relaxed);
                self.notes_skipped
                    .fetch_add(export.skipped.len(), Ordering::Relaxed);
                self.media_bytes
                    .fetch_add(export.media_bytes, Ordering::Relaxed);
            }
            Err(_) => self.increment_failed(),
        }
    }

    /// 실패 카운트 증가
    pub fn increment_failed(&self) {
        self.failed_count.fetch_add(1, Ordering::Relaxed);
    }

    /// 이미 내보낸 덱 수 추가
    pub fn add_already_exported(&self, count: usize) {
        self.already_exported.fetch_add(count, Ordering::Relaxed);
    }

    /// 내보낸 덱 수 반환
    pub fn get_exported_count(&self) -> usize {
        self.exported_count.load(Ordering::Relaxed)
    }

    /// 실패 수 반환
    pub fn get_failed_count(&self) -> usize {
        self.failed_count.load(Ordering::Relaxed)
    }

    pub fn get_already_exported(&self) -> usize {
        self.already_exported.load(Ordering::Relaxed)
    }

    pub fn get_notes_written(&self) -> usize {
        self.notes_written.load(Ordering::Relaxed)
    }

    pub fn get_notes_skipped(&self) -> usize {
        self.notes_skipped.load(Ordering::Relaxed)
    }

    /// 경과 시간 반환
    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// 내보내기 통계 요약 출력
    pub fn print_summary(&self) {
        let exported = self.get_exported_count();
        let failed = self.get_failed_count();
        let media_bytes = self.media_bytes.load(Ordering::Relaxed);

        println!("\n{}", "═".repeat(50).bright_blue());
        println!("{}", " 📊 내보내기 통계".bright_white().bold());
        println!("{}", "═".repeat(50).bright_blue());

        println!(
            "  {} 선택한 덱:    {}",
            "📚".bright_cyan(),
            self.total_decks
        );
        println!(
            "  {} 내보냄:       {}",
            "✅".bright_green(),
            exported.to_string().green()
        );
        println!(
            "  {} 이미 완료:    {}",
            "⏭️".bright_white(),
            self.get_already_exported()
        );

        if failed > 0 {
            println!(
                "  {} 실패:         {}",
                "❌".bright_red(),
                failed.to_string().red()
            );
        } else {
            println!("  {} 실패:         {}", "✅".bright_green(), "0".green());
        }

        println!(
            "  {} 노트:         {} (건너뜀 {})",
            "📝".bright_yellow(),
            self.get_notes_written(),
            self.get_notes_skipped()
        );
        println!(
            "  {} 오디오 용량:  {}",
            "🔊".bright_magenta(),
            format_bytes(media_bytes)
        );
        println!(
            "  {} 처리 시간:    {}",
            "⏱️".bright_cyan(),
            format_duration(self.elapsed())
        );

        println!("{}", "═".repeat(50).bright_blue());
    }
}

/// 바이트를 읽기 쉬운 형식으로 변환
///
/// # Examples
/// ```
/// use ankidata::stats::format_bytes;
///
/// assert_eq!(format_bytes(500), "500 B");
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(1048576), "1.00 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// 경과 시간을 읽기 쉬운 형식으로 변환
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}시간 {}분", hours, mins)
    } else if secs >= 60 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        format!("{}분 {}초", mins, remaining_secs)
    } else if secs > 0 {
        format!("{}.{:03}초", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DeckExport;
    use crate::error::{DeckFailure, SkippedNote};

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5.000초");
        assert_eq!(format_duration(Duration::from_secs(65)), "1분 5초");
        assert_eq!(format_duration(Duration::from_secs(3665)), "1시간 1분");
    }

    #[test]
    fn test_record_outcomes() {
        let stats = Statistics::new(3);

        stats.record(&DeckOutcome {
            deck: "A".to_string(),
            dir_name: "A".to_string(),
            result: Ok(DeckExport {
                notes_written: 4,
                skipped: vec![SkippedNote {
                    note_id: 9,
                    reasons: vec!["invalid sound tag".to_string()],
                }],
                media_bytes: 2048,
            }),
        });
        stats.record(&DeckOutcome {
            deck: "B".to_string(),
            dir_name: "B".to_string(),
            result: Err(DeckFailure::NoNotes),
        });
        stats.add_already_exported(1);

        assert_eq!(stats.get_exported_count(), 1);
        assert_eq!(stats.get_failed_count(), 1);
        assert_eq!(stats.get_already_exported(), 1);
        assert_eq!(stats.get_notes_written(), 4);
        assert_eq!(stats.get_notes_skipped(), 1);
        assert_eq!(stats.media_bytes.load(Ordering::Relaxed), 2048);
    }
}
