//! Static texts used when no provider can be reached.

use super::{Difficulty, Language};

const RU_EASY: &[&str] = &[
    "мама мыла раму а папа читал книгу у окна",
    "кот спит на теплой печи и видит добрые сны",
    "утром мы пошли в лес за грибами и ягодами",
];

const RU_MEDIUM: &[&str] = &[
    "Летний вечер был тихим, и над рекой медленно поднимался туман.",
    "Каждое утро начинается с чашки чая и короткой прогулки по парку.",
    "Старый мастер показал ученику, как правильно держать инструмент.",
];

const RU_HARD: &[&str] = &[
    "Несмотря на дождь, экспедиция продолжила путь: карты были точны, а проводник — опытен.",
    "Программист внимательно изучил журнал ошибок; причина сбоя оказалась неожиданной!",
    "«Терпение и труд всё перетрут», — повторял дедушка, разбирая сложный механизм часов.",
];

const EN_EASY: &[&str] = &[
    "the quick brown fox jumps over the lazy dog",
    "a small cat sat on the warm mat by the door",
    "we went to the park and played in the sun",
];

const EN_MEDIUM: &[&str] = &[
    "Practice makes progress, so type a little every day and watch your speed grow.",
    "The morning train was late again, but the book in my bag kept me company.",
    "Good habits are built slowly, one small and steady step at a time.",
];

const EN_HARD: &[&str] = &[
    "Despite the storm, the crew kept sailing north; the compass, however, was failing.",
    "She asked: \"Why measure speed at all?\" The answer was simple - to improve!",
    "Complex systems fail in surprising ways; robust ones recover (most of the time).",
];

pub fn samples_for(language: Language, difficulty: Difficulty) -> &'static [&'static str] {
    match (language, difficulty) {
        (Language::Ru, Difficulty::Easy) => RU_EASY,
        (Language::Ru, Difficulty::Medium) => RU_MEDIUM,
        (Language::Ru, Difficulty::Hard) => RU_HARD,
        (Language::En, Difficulty::Easy) => EN_EASY,
        (Language::En, Difficulty::Medium) => EN_MEDIUM,
        (Language::En, Difficulty::Hard) => EN_HARD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pair_has_samples() {
        for language in [Language::Ru, Language::En] {
            for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
                let samples = samples_for(language, difficulty);
                assert!(!samples.is_empty());
                assert!(samples.iter().all(|s| !s.trim().is_empty()));
            }
        }
    }

    #[test]
    fn easy_samples_have_no_punctuation() {
        for language in [Language::Ru, Language::En] {
            for sample in samples_for(language, Difficulty::Easy) {
                assert!(sample.chars().all(|c| c.is_alphabetic() || c == ' '));
            }
        }
    }
}
