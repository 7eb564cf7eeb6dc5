//! Tokenizer shared by key paths and diagram source text.

use crate::error::{DiagramError, DiagramResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Quoted(String),
    Bare(String),
    Dot,
    Colon,
    Arrow,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Newline,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Quoted(s) => format!("{s:?}"),
            Self::Bare(s) => s.clone(),
            Self::Dot => "'.'".into(),
            Self::Colon => "':'".into(),
            Self::Arrow => "'->'".into(),
            Self::LBrace => "'{'".into(),
            Self::RBrace => "'}'".into(),
            Self::LParen => "'('".into(),
            Self::RParen => "')'".into(),
            Self::LBracket => "'['".into(),
            Self::RBracket => "']'".into(),
            Self::Newline => "end of line".into(),
        }
    }
}

/// A token with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Spanned {
    pub(crate) token: Token,
    pub(crate) line: usize,
}

fn is_bare_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-')
}

pub(crate) fn lex(text: &str) -> DiagramResult<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        let token = match c {
            '\n' | ';' => {
                let t = Spanned {
                    token: Token::Newline,
                    line,
                };
                if c == '\n' {
                    line += 1;
                }
                tokens.push(t);
                continue;
            }
            c if c.is_whitespace() => continue,
            '#' => {
                // comment until end of line
                while chars.peek().is_some_and(|&c| c != '\n') {
                    chars.next();
                }
                continue;
            }
            '.' => Token::Dot,
            ':' => Token::Colon,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '-' if chars.peek() == Some(&'>') => {
                chars.next();
                Token::Arrow
            }
            '"' => {
                let start = line;
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => s.push('\n'),
                            Some(other) => s.push(other),
                            None => break,
                        },
                        Some('\n') => {
                            return Err(DiagramError::Parse {
                                line: start,
                                message: "unterminated string".into(),
                            });
                        }
                        Some(other) => s.push(other),
                        None => {
                            return Err(DiagramError::Parse {
                                line: start,
                                message: "unterminated string".into(),
                            });
                        }
                    }
                }
                Token::Quoted(s)
            }
            c if is_bare_char(c) => {
                let mut s = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next == '-' {
                        let mut ahead = chars.clone();
                        ahead.next();
                        if ahead.peek() == Some(&'>') {
                            break;
                        }
                    } else if !is_bare_char(next) {
                        break;
                    }
                    s.push(next);
                    chars.next();
                }
                Token::Bare(s)
            }
            other => {
                return Err(DiagramError::Parse {
                    line,
                    message: format!("unexpected character {other:?}"),
                });
            }
        };
        tokens.push(Spanned { token, line });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<Token> {
        lex(text).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_lex_connection() {
        assert_eq!(
            kinds(r#""a"."b" -> c-d"#),
            vec![
                Token::Quoted("a".into()),
                Token::Dot,
                Token::Quoted("b".into()),
                Token::Arrow,
                Token::Bare("c-d".into()),
            ]
        );
    }

    #[test]
    fn test_lex_bare_stops_before_arrow() {
        assert_eq!(
            kinds("a->b"),
            vec![Token::Bare("a".into()), Token::Arrow, Token::Bare("b".into())]
        );
    }

    #[test]
    fn test_lex_escapes_and_lines() {
        let tokens = lex("x: \"say \\\"hi\\\"\"\n# comment\ny").unwrap();

        assert_eq!(tokens[2].token, Token::Quoted("say \"hi\"".into()));
        assert_eq!(tokens.last().unwrap().token, Token::Bare("y".into()));
        assert_eq!(tokens.last().unwrap().line, 3);
    }

    #[test]
    fn test_lex_unterminated_string() {
        let err = lex("\"abc").unwrap_err();
        assert!(matches!(err, DiagramError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_lex_rejects_unknown_character() {
        assert!(lex("a = b").is_err());
    }
}
