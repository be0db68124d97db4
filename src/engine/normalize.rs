use icu_normalizer::ComposingNormalizerBorrowed;

/// Canonical form used to compare typed answers with translations:
/// NFC, trimmed, lowercased, inner whitespace collapsed to single spaces.
pub fn normalize_answer(raw: &str) -> String {
    let composed = ComposingNormalizerBorrowed::new_nfc().normalize(raw);
    composed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
