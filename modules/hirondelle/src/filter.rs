//! Track-expression construction for the filtered stream.

/// Build the `track` parameter from the keyword set.
///
/// Every keyword contributes a mention token and a hashtag token, so the
/// stream matches both `@golang` and `#golang` traffic. The trailing comma
/// is harmless to the streaming API and kept for simplicity.
pub fn track_expression(keywords: &[String]) -> String {
    let mut expr = String::new();
    for keyword in keywords {
        expr.push_str(&format!("@{keyword},#{keyword},"));
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn two_tokens_per_keyword_in_order() {
        let expr = track_expression(&kw(&["golang", "rustlang"]));
        let tokens: Vec<&str> = expr.split(',').filter(|t| !t.is_empty()).collect();
        assert_eq!(tokens, vec!["@golang", "#golang", "@rustlang", "#rustlang"]);
    }

    #[test]
    fn token_count_is_twice_the_keyword_count() {
        for n in 0..5 {
            let words: Vec<String> = (0..n).map(|i| format!("kw{i}")).collect();
            let expr = track_expression(&words);
            let count = expr.split(',').filter(|t| !t.is_empty()).count();
            assert_eq!(count, 2 * n);
        }
    }

    #[test]
    fn empty_keyword_set_yields_empty_expression() {
        assert_eq!(track_expression(&[]), "");
    }
}
