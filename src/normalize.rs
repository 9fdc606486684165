//! 텍스트 정리 모듈
//!
//! 전사(transcription) 필드의 앞뒤 잡음 제거와
//! 덱 이름을 폴더 이름으로 바꾸는 작업을 담당합니다.

/// 기본 추가 문자 (독일어)
pub const GERMAN_LETTERS: &str = "äöüÄÖÜß";

/// 덱 계층 구분자
const DECK_SEPARATOR: &str = "::";

/// 전사 정리에 쓰는 알파벳
///
/// ASCII 영문자는 항상 포함되며, 학습 대상 언어의 추가 문자를 지정할 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    extra: Vec<char>,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::with_extra(GERMAN_LETTERS)
    }
}

impl Alphabet {
    /// ASCII 영문자 + `extra` 문자로 구성된 알파벳
    pub fn with_extra(extra: &str) -> Self {
        let mut chars: Vec<char> = extra.chars().filter(|c| !c.is_whitespace()).collect();
        chars.sort_unstable();
        chars.dedup();
        Self { extra: chars }
    }

    /// 문자가 알파벳에 속하는지 확인
    pub fn contains(&self, c: char) -> bool {
        c.is_ascii_alphabetic() || self.extra.binary_search(&c).is_ok()
    }

    /// 앞뒤의 알파벳이 아닌 문자열을 제거
    ///
    /// 내부 문자는 건드리지 않습니다.
    ///
    /// # Examples
    /// ```
    /// use ankidata::normalize::Alphabet;
    ///
    /// let alphabet = Alphabet::default();
    /// assert_eq!(alphabet.clean(".Hallo!"), "Hallo");
    /// assert_eq!(alphabet.clean("(die Tür)"), "die Tür");
    /// assert_eq!(alphabet.clean("---"), "");
    /// ```
    pub fn clean<'a>(&self, text: &'a str) -> &'a str {
        text.trim_matches(|c: char| !self.contains(c))
    }
}

/// 기본 알파벳으로 전사 정리
pub fn clean_transcription(text: &str) -> &str {
    Alphabet::default().clean(text)
}

/// 덱 이름을 파일 시스템에 안전한 폴더 이름으로 변환
///
/// 마지막 `::` 구간만 사용하고, 앞뒤 공백을 제거한 뒤
/// 영숫자와 `_`가 아닌 문자는 모두 `_`로 바꿉니다.
///
/// # Examples
/// ```
/// use ankidata::normalize::sanitize_deck_name;
///
/// assert_eq!(sanitize_deck_name("German::Basics"), "Basics");
/// assert_eq!(sanitize_deck_name("A1 :: Kapitel 2 (neu)"), "Kapitel_2__neu_");
/// ```
pub fn sanitize_deck_name(name: &str) -> String {
    let last = name.rsplit(DECK_SEPARATOR).next().unwrap_or(name);

    last.trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
