use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

/// Lowercased unicode-word tokens. Hangul words segment on their natural
/// boundaries and Han ideographs per character, so overlap ratios stay
/// meaningful for Korean regulatory text.
pub fn tokenize(text: &str) -> Vec<String> {
	text.unicode_words().map(|word| word.to_lowercase()).collect()
}

pub fn token_set(text: &str) -> HashSet<String> {
	tokenize(text).into_iter().collect()
}

/// Fraction of `text` tokens present in `reference`. 0.0 when `text` has no
/// tokens.
pub fn token_overlap(text: &str, reference: &HashSet<String>) -> f32 {
	let tokens = tokenize(text);

	if tokens.is_empty() {
		return 0.0;
	}

	let matched = tokens.iter().filter(|token| reference.contains(token.as_str())).count();

	matched as f32 / tokens.len() as f32
}

/// Split answer text into sentence fragments longer than 10 characters.
/// A period between two digits is a decimal point, not a boundary.
pub fn split_sentences(text: &str) -> Vec<String> {
	let mut sentences = Vec::new();
	let mut current = String::new();
	let mut chars = text.chars().peekable();

	while let Some(ch) = chars.next() {
		match ch {
			'\n' | '!' | '?' => flush_sentence(&mut current, &mut sentences),
			'.' => {
				let prev_is_digit =
					current.chars().last().map(|c| c.is_ascii_digit()).unwrap_or(false);
				let next_is_digit = chars.peek().map(|c| c.is_ascii_digit()).unwrap_or(false);

				if prev_is_digit && next_is_digit {
					current.push('.');
				} else {
					flush_sentence(&mut current, &mut sentences);
				}
			},
			_ => current.push(ch),
		}
	}

	flush_sentence(&mut current, &mut sentences);

	sentences
}

fn flush_sentence(current: &mut String, sentences: &mut Vec<String>) {
	let sentence = current.trim();

	if sentence.chars().count() > 10 {
		sentences.push(sentence.to_string());
	}

	current.clear();
}

/// Char-boundary-safe truncation by character count.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
	if text.chars().count() <= max_chars {
		return text.to_string();
	}

	text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tokenizes_mixed_korean_and_english() {
		let tokens = tokenize("The FSC raised 기준금리 today");

		assert!(tokens.contains(&"fsc".to_string()));
		assert!(tokens.iter().any(|token| token.contains('기')));
	}

	#[test]
	fn overlap_is_zero_for_empty_text() {
		assert_eq!(token_overlap("", &token_set("reference text")), 0.0);
	}

	#[test]
	fn overlap_is_one_for_full_containment() {
		let reference = token_set("the base rate was raised to three percent");

		assert_eq!(token_overlap("base rate raised", &reference), 1.0);
	}

	#[test]
	fn short_fragments_are_not_sentences() {
		let sentences = split_sentences("Yes. The regulation applies to all licensed banks.");

		assert_eq!(sentences.len(), 1);
	}

	#[test]
	fn decimal_points_do_not_split_sentences() {
		let sentences = split_sentences("금리는 3.5%입니다 [1]");

		assert_eq!(sentences, vec!["금리는 3.5%입니다 [1]".to_string()]);
	}

	#[test]
	fn truncation_respects_char_boundaries() {
		let truncated = truncate_chars("금융위원회는 오늘", 5);

		assert_eq!(truncated.chars().count(), 5);
	}
}
