use itertools::Itertools;


// Lazily compiled regex, in the spirit of https://docs.rs/once_cell/latest/once_cell/#lazily-compiled-regex
#[macro_export]
macro_rules! once_cell_regex {
    ($re:expr $(,)?) => {{
        static RE: std::sync::OnceLock<regex_lite::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex_lite::Regex::new($re).unwrap())
    }};
}

pub fn sort_two<T: Ord>((a, b): (T, T)) -> (T, T) {
    if a < b { (a, b) } else { (b, a) }
}

// If a string consists of a single character, returns the character. Otherwise returns none.
pub fn as_single_char(s: &str) -> Option<char> {
    s.chars().collect_tuple().map(|(single_char,)| single_char)
}
