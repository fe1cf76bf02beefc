//! Word solvability: which words can a net of a given class generate?

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::synth::properties::PNProperties;
use crate::synth::synthesize::Synthesis;
use crate::synth::SynthesisError;
use crate::ts::system::TransitionSystem;

/// The linear transition system of a word: `s0 -w1-> s1 -w2-> ...`.
pub fn ts_from_word<S: AsRef<str>>(word: &[S]) -> TransitionSystem {
    let name: String = word.iter().map(|letter| letter.as_ref()).collect();
    let mut ts = TransitionSystem::new(name);
    let mut previous = ts
        .create_state("s0")
        .expect("generated state names are unique");
    ts.set_initial(previous);
    for (idx, letter) in word.iter().enumerate() {
        let next = ts
            .create_state(format!("s{}", idx + 1))
            .expect("generated state names are unique");
        ts.create_arc(previous, next, letter.as_ref());
        previous = next;
    }
    ts
}

/// Can a net with the given properties generate exactly this word?
pub fn is_solvable_word<S: AsRef<str>>(
    word: &[S],
    properties: &PNProperties,
) -> Result<bool, SynthesisError> {
    let ts = ts_from_word(word);
    let synthesis = Synthesis::builder(&ts)
        .properties(properties.clone())
        .quick_fail()
        .build()?;
    Ok(synthesis.was_successfully_separated())
}

/// Rewrite a word so that, read from the back, fresh letters appear in
/// alphabet order. Words equal up to renaming letters normalize to the
/// same representative.
pub fn normalize_word(word: &[String], alphabet: &[String]) -> Vec<String> {
    let mut morphism: HashMap<&str, &str> = HashMap::new();
    let mut fresh = alphabet.iter();
    let mut result = vec![String::new(); word.len()];
    for (idx, letter) in word.iter().enumerate().rev() {
        let replacement = *morphism.entry(letter.as_str()).or_insert_with(|| {
            fresh
                .next()
                .expect("the alphabet covers every letter of the word")
                .as_str()
        });
        result[idx] = replacement.to_owned();
    }
    result
}

#[derive(Debug, Default)]
pub struct WordsReport {
    pub solvable: Vec<Vec<String>>,
    pub unsolvable: Vec<Vec<String>>,
}

/// Level-wise enumeration of solvable and minimally unsolvable words up to
/// the given length, one representative per letter-renaming class.
///
/// Words grow by prepending: a net generating `cw` also generates `w`
/// after firing `c`, so unsolvable words only ever grow from solvable
/// ones. Without a k-bound the same holds for prefixes, which prunes the
/// search further.
pub fn enumerate_words(
    properties: &PNProperties,
    alphabet: &[String],
    max_length: usize,
) -> Result<WordsReport, SynthesisError> {
    let mut alphabet = alphabet.to_vec();
    alphabet.sort();
    alphabet.dedup();

    let mut report = WordsReport::default();
    let mut current: IndexSet<Vec<String>> = IndexSet::new();
    current.insert(Vec::new());

    for _length in 1..=max_length {
        let mut next_level: IndexSet<Vec<String>> = IndexSet::new();
        for current_word in &current {
            for letter in &alphabet {
                let new_letter = !current_word.contains(letter);
                let mut word = Vec::with_capacity(current_word.len() + 1);
                word.push(letter.clone());
                word.extend(current_word.iter().cloned());

                // Without bounded places every prefix of a solvable word
                // is solvable, so a failed prefix rules the word out.
                if properties.k_bounded.is_none() && word.len() > 1 {
                    let prefix = normalize_word(&word[..word.len() - 1], &alphabet);
                    if !current.contains(&prefix) {
                        continue;
                    }
                }

                if is_solvable_word(&word, properties)? {
                    next_level.insert(word.clone());
                    report.solvable.push(word);
                } else {
                    report.unsolvable.push(word);
                }

                // Letters are tried in alphabet order, so every later
                // letter would be fresh too and only produce words that
                // rename this one.
                if new_letter {
                    break;
                }
            }
        }
        current = next_level;
        if current.is_empty() {
            break;
        }
    }

    Ok(report)
}
