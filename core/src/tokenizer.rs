use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref ZERO_PREFIXED: Regex = Regex::new(r"\b0\w*\b").expect("valid regex");
    static ref TOKEN: Regex = Regex::new(r"\w+|[^\w\s]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","ain","all","am","an","and","any","are","aren","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","couldn","couldn't",
            "d","did","didn","didn't","do","does","doesn","doesn't","doing","don","don't","down","during",
            "each","few","for","from","further",
            "had","hadn","hadn't","has","hasn","hasn't","have","haven","haven't","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","isn","isn't","it","it's","its","itself",
            "just","ll","m","ma","me","mightn","mightn't","more","most","mustn","mustn't","my","myself",
            "needn","needn't","no","nor","not","now",
            "o","of","off","on","once","only","or","other","our","ours","ourselves","out","over","own",
            "re","s","same","shan","shan't","she","she's","should","should've","shouldn","shouldn't","so","some","such",
            "t","than","that","that'll","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","wasn","wasn't","we","were","weren","weren't","what","when","where","which","while","who","whom","why","will","with","won","won't","wouldn","wouldn't",
            "y","you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

fn is_punctuation(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_punctuation())
}

fn is_indexable(token: &str) -> bool {
    !is_stopword(token)
        && !is_punctuation(token)
        && token.chars().all(char::is_alphanumeric)
        && token.chars().count() > 2
}

/// Normalize text into its ordered sequence of canonical terms.
///
/// NFKC + lowercase, drop words starting with `0`, split words from
/// punctuation, filter stopwords, punctuation, non-alphanumeric and short
/// (≤ 2 chars) tokens, then Snowball-stem what is left. A stem that itself
/// ends up short or a stopword is dropped too. Duplicates are kept.
pub fn normalize(text: &str) -> Vec<String> {
    let lowered = text.nfkc().collect::<String>().to_lowercase();
    let cleaned = ZERO_PREFIXED.replace_all(&lowered, "");
    TOKEN
        .find_iter(&cleaned)
        .map(|m| m.as_str())
        .filter(|token| is_indexable(token))
        .map(|token| STEMMER.stem(token).into_owned())
        .filter(|stem| stem.chars().count() > 2 && !is_stopword(stem))
        .collect()
}
