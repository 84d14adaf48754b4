use crate::ComparisonOp::*;
use crate::{Lexeme, RuleError, Token};
use std::collections::HashSet;

/// Split a rule string into a vector of `Lexeme`s, terminated by `Token::End`.
///
/// Whitespace only separates tokens. Multi-character comparators are matched before their
/// single-character prefixes. A name may also be written in double quotes, in which case
/// it can contain any character except `"`. If a prefix of the remaining input is one of
/// the `known_identifiers` and it is longer than the plain identifier starting at the same
/// position, the known identifier wins. This way, `PI3K/AKT` is a single identifier when
/// it is declared as such.
pub fn tokenize(text: &str, known_identifiers: &HashSet<String>) -> Result<Vec<Lexeme>, RuleError> {
    let chars: Vec<char> = text.chars().collect();
    let known: Vec<Vec<char>> = known_identifiers
        .iter()
        .filter(|it| !it.is_empty())
        .map(|it| it.chars().collect())
        .collect();

    let mut output = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let word_len = chars[i..].iter().take_while(|c| is_valid_in_name(**c)).count();
        let known_len = longest_known_prefix(&chars[i..], &known);
        if known_len > word_len {
            let name: String = chars[i..(i + known_len)].iter().collect();
            output.push(lexeme(Token::Identifier(name), i));
            i += known_len;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let (token, length) = match c {
            '&' => (Token::And, 1),
            '|' => (Token::Or, 1),
            '^' => (Token::Xor, 1),
            ':' => (Token::Colon, 1),
            '(' => (Token::ParenOpen, 1),
            ')' => (Token::ParenClose, 1),
            '!' if next == Some('=') => (Token::Comparator(Neq), 2),
            '!' => (Token::Not, 1),
            '>' if next == Some('=') => (Token::Comparator(Ge), 2),
            '>' => (Token::Comparator(Gt), 1),
            '<' if next == Some('=') => (Token::Comparator(Le), 2),
            '<' => (Token::Comparator(Lt), 1),
            '=' if next == Some('=') => (Token::Comparator(Eq), 2),
            '=' => (Token::Comparator(Eq), 1),
            '"' => {
                let length = chars[(i + 1)..].iter().take_while(|c| **c != '"').count();
                if i + 1 + length >= chars.len() || length == 0 {
                    // Unterminated or empty quotes.
                    return Err(RuleError::Lex {
                        position: i,
                        character: c,
                    });
                }
                let name: String = chars[(i + 1)..(i + 1 + length)].iter().collect();
                (Token::Identifier(name), length + 2)
            }
            c if is_valid_in_name(c) => {
                let word: String = chars[i..(i + word_len)].iter().collect();
                (read_word(word, known_identifiers, i)?, word_len)
            }
            _ => {
                return Err(RuleError::Lex {
                    position: i,
                    character: c,
                })
            }
        };
        output.push(lexeme(token, i));
        i += length;
    }
    output.push(lexeme(Token::End, chars.len()));
    Ok(output)
}

/// **(internal)** Check if given char can appear in an unquoted name.
fn is_valid_in_name(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// **(internal)** Length of the longest known identifier that is a prefix of `data`.
fn longest_known_prefix(data: &[char], known: &[Vec<char>]) -> usize {
    known
        .iter()
        .filter(|it| data.starts_with(it.as_slice()))
        .map(|it| it.len())
        .max()
        .unwrap_or(0)
}

/// **(internal)** Classify a word of name characters as an integer, a Boolean literal,
/// or an identifier. Declared identifiers always stay identifiers.
fn read_word(word: String, known: &HashSet<String>, position: usize) -> Result<Token, RuleError> {
    if known.contains(&word) {
        return Ok(Token::Identifier(word));
    }
    if word.chars().all(|c| c.is_ascii_digit()) {
        return word.parse::<u32>().map(Token::Integer).map_err(|_| RuleError::Syntax {
            position,
            expected: "an integer level that fits into 32 bits".to_string(),
        });
    }
    if word.eq_ignore_ascii_case("true") {
        Ok(Token::Boolean(true))
    } else if word.eq_ignore_ascii_case("false") {
        Ok(Token::Boolean(false))
    } else {
        Ok(Token::Identifier(word))
    }
}

fn lexeme(token: Token, position: usize) -> Lexeme {
    Lexeme { token, position }
}
