//! Matching of search phrases against task names.
//!
//! Every whitespace-separated clause has to match. Clauses of up to two
//! characters only match whole words; longer ones match substrings or names
//! (or words of names) within one edit.

pub const WHOLE_WORD_MAX_LEN: usize = 2;
pub const FUZZY_DISTANCE: usize = 1;

/// Keys from `corpus` whose text matches `phrase`, in corpus order.
pub fn search<'a, K, I>(phrase: &str, corpus: I) -> Vec<K>
where
    I: IntoIterator<Item = (K, &'a str)>,
{
    let clauses: Vec<String> = phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();
    if clauses.is_empty() {
        return Vec::new();
    }

    corpus
        .into_iter()
        .filter(|(_, name)| {
            let name = name.to_lowercase();
            clauses.iter().all(|clause| clause_matches(clause, &name))
        })
        .map(|(key, _)| key)
        .collect()
}

fn clause_matches(clause: &str, name: &str) -> bool {
    let mut words = name
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty());

    if clause.chars().count() <= WHOLE_WORD_MAX_LEN {
        return words.any(|word| word == clause);
    }

    name.contains(clause)
        || levenshtein(name, clause) <= FUZZY_DISTANCE
        || words.any(|word| levenshtein(word, clause) <= FUZZY_DISTANCE)
}

pub fn levenshtein(left: &str, right: &str) -> usize {
    let right: Vec<char> = right.chars().collect();
    let mut previous: Vec<usize> = (0..=right.len()).collect();
    let mut current = vec![0; right.len() + 1];

    for (i, left_char) in left.chars().enumerate() {
        current[0] = i + 1;
        for (j, right_char) in right.iter().enumerate() {
            let substitution = previous[j] + usize::from(left_char != *right_char);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[right.len()]
}
