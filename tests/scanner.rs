#[cfg(test)]
mod scanner_tests {
    use pron::scanner::*;
    use pron::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenKind, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.collect();

        assert_eq!(
            tokens.len(),
            expected.len(),
            "token count mismatch: {:?}",
            tokens
        );

        for (actual, (expected_kind, expected_literal)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.kind, *expected_kind);
            assert_eq!(actual.literal, *expected_literal);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+%})",
            &[
                (TokenKind::LParen, "("),
                (TokenKind::LBrace, "{"),
                (TokenKind::Asterisk, "*"),
                (TokenKind::Dot, "."),
                (TokenKind::Comma, ","),
                (TokenKind::Plus, "+"),
                (TokenKind::Modulo, "%"),
                (TokenKind::RBrace, "}"),
                (TokenKind::RParen, ")"),
                (TokenKind::Eof, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators() {
        assert_token_sequence(
            "i++ j-- a == b != c = d",
            &[
                (TokenKind::Ident, "i"),
                (TokenKind::Increment, "++"),
                (TokenKind::Ident, "j"),
                (TokenKind::Decrement, "--"),
                (TokenKind::Ident, "a"),
                (TokenKind::Eq, "=="),
                (TokenKind::Ident, "b"),
                (TokenKind::NotEq, "!="),
                (TokenKind::Ident, "c"),
                (TokenKind::Assign, "="),
                (TokenKind::Ident, "d"),
                (TokenKind::Eof, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "var func class Init this new for from to in if elif else return true false Person",
            &[
                (TokenKind::Var, "var"),
                (TokenKind::Function, "func"),
                (TokenKind::Class, "class"),
                (TokenKind::Init, "Init"),
                (TokenKind::This, "this"),
                (TokenKind::New, "new"),
                (TokenKind::For, "for"),
                (TokenKind::From, "from"),
                (TokenKind::To, "to"),
                (TokenKind::In, "in"),
                (TokenKind::If, "if"),
                (TokenKind::Elif, "elif"),
                (TokenKind::Else, "else"),
                (TokenKind::Return, "return"),
                (TokenKind::True, "true"),
                (TokenKind::False, "false"),
                (TokenKind::Ident, "Person"),
                (TokenKind::Eof, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_numbers_and_strings() {
        assert_token_sequence(
            r#"42 4.5 7. "hello world""#,
            &[
                (TokenKind::Int, "42"),
                (TokenKind::Real, "4.5"),
                (TokenKind::Int, "7"),
                (TokenKind::Dot, "."),
                (TokenKind::Str, "hello world"),
                (TokenKind::Eof, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_comments_are_skipped() {
        let source = "var a = 1; // trailing\n/* block\ncomment */ a";
        let tokens: Vec<_> = Scanner::new(source).collect();

        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Var,
                TokenKind::Ident,
                TokenKind::Assign,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );

        // the block comment spans a newline
        assert_eq!(tokens[5].line, 3);
    }

    #[test]
    fn test_unexpected_chars_become_illegal_tokens() {
        let source = ",.$(#";
        let tokens: Vec<_> = Scanner::new(source).collect();

        // 0: COMMA  1: DOT  2: ILLEGAL $  3: LPAREN  4: ILLEGAL #  5: EOF
        assert_eq!(tokens.len(), 6, "Expected 6 tokens");

        assert_eq!(tokens[2].kind, TokenKind::Illegal);
        assert_eq!(tokens[2].literal, "$");
        assert_eq!(tokens[4].kind, TokenKind::Illegal);
        assert_eq!(tokens[4].literal, "#");
        assert_eq!(tokens[5].kind, TokenKind::Eof);
    }

    #[test]
    fn test_unterminated_string_is_illegal() {
        let tokens: Vec<_> = Scanner::new("\"never closed").collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Illegal);
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_scanner_emits_single_eof_and_stays_fused() {
        let mut scanner = Scanner::new("x");

        assert_eq!(scanner.next().map(|t| t.kind), Some(TokenKind::Ident));
        assert_eq!(scanner.next().map(|t| t.kind), Some(TokenKind::Eof));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_line_numbers_track_newlines() {
        let tokens: Vec<_> = Scanner::new("a\nb\n\"multi\nline\" c").collect();

        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 3);
        assert_eq!(tokens[3].line, 4);
    }

    #[test]
    fn test_lookup_ident() {
        assert_eq!(lookup_ident("func"), TokenKind::Function);
        assert_eq!(lookup_ident("Init"), TokenKind::Init);
        assert_eq!(lookup_ident("init"), TokenKind::Ident);
    }
}
