#[cfg(test)]
mod parser_tests {
    use pron::ast::*;
    use pron::parse_source;
    use pron::parser::Parser;
    use pron::scanner::Scanner;

    fn parse_ok(source: &str) -> Program {
        let (program, errors) = parse_source(source);
        assert!(
            errors.is_empty(),
            "unexpected parser errors for {:?}: {:?}",
            source,
            errors
        );
        program
    }

    fn single_expression(source: &str) -> Expression {
        let program = parse_ok(source);
        assert_eq!(program.statements.len(), 1, "{:?}", program.statements);

        match &program.statements[0] {
            Statement::Expression(expr) => expr.clone(),
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_operator_precedence_rendering() {
        let cases = [
            ("a + b * c", "(a + (b * c))"),
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b / c", "((a * b) / c)"),
            ("a % b * c", "((a % b) * c)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))",
            ),
            ("(5 + 5) * 2", "((5 + 5) * 2)"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            (
                "a * [1, 2, 3, 4][b * c] * d",
                "((a * ([1, 2, 3, 4][(b * c)])) * d)",
            ),
            (
                "add(a * b[2], b[1], 2 * [1, 2][1])",
                "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))",
            ),
            ("x = y + 1", "(x = (y + 1))"),
            ("this.name = n", "(this.name = n)"),
            ("p.GetAge() + 1", "(p.GetAge() + 1)"),
        ];

        for (source, expected) in cases {
            let program = parse_ok(source);
            assert_eq!(program.to_string(), expected, "source: {}", source);
        }
    }

    #[test]
    fn test_var_statements() {
        let program = parse_ok("var x = 5; var y; var name = \"pron\"");

        assert_eq!(program.statements.len(), 3);
        assert_eq!(
            program.statements[0],
            Statement::Var {
                name: Identifier::new("x"),
                value: Expression::Integer(5),
            }
        );
        assert_eq!(
            program.statements[1],
            Statement::Var {
                name: Identifier::new("y"),
                value: Expression::Null,
            }
        );
        assert_eq!(program.to_string(), "var x = 5;var y = null;var name = \"pron\";");
    }

    #[test]
    fn test_return_statements() {
        let program = parse_ok("return x + 1; return;");

        assert_eq!(program.to_string(), "return (x + 1);return null;");
    }

    #[test]
    fn test_literals() {
        assert_eq!(single_expression("42"), Expression::Integer(42));
        assert_eq!(single_expression("2.5"), Expression::Real(2.5));
        assert_eq!(single_expression("true"), Expression::Boolean(true));
        assert_eq!(
            single_expression("\"hello world\""),
            Expression::Str("hello world".to_string())
        );
        assert_eq!(single_expression("[]"), Expression::Array(vec![]));
        assert_eq!(single_expression("{}"), Expression::Hash(vec![]));
    }

    #[test]
    fn test_hash_literal_keeps_source_order() {
        let expr = single_expression(r#"{"one": 1, 2: "two", true: 3}"#);

        let Expression::Hash(pairs) = &expr else {
            panic!("expected a hash literal, got {:?}", expr);
        };

        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].0, Expression::Str("one".to_string()));
        assert_eq!(pairs[1].0, Expression::Integer(2));
        assert_eq!(pairs[2].0, Expression::Boolean(true));
        assert_eq!(expr.to_string(), r#"{"one": 1, 2: "two", true: 3}"#);
    }

    #[test]
    fn test_function_declaration_visibility() {
        let program = parse_ok("func Add(a, b) { return a + b; } func helper() { 1 }");

        let Statement::Function(add) = &program.statements[0] else {
            panic!("expected function declaration");
        };
        assert!(add.is_public);
        assert_eq!(add.function.parameters.len(), 2);

        let Statement::Function(helper) = &program.statements[1] else {
            panic!("expected function declaration");
        };
        assert!(!helper.is_public);

        assert_eq!(
            program.to_string(),
            "func Add(a, b) {return (a + b);}func helper() {1}"
        );
    }

    #[test]
    fn test_function_literal_and_call() {
        assert_eq!(
            single_expression("func(x, y) { x + y; }").to_string(),
            "func(x, y) {(x + y)}"
        );
        assert_eq!(
            single_expression("add(1, 2 * 3, 4 + 5)").to_string(),
            "add(1, (2 * 3), (4 + 5))"
        );
        assert_eq!(
            single_expression("func(x) { x }(5)").to_string(),
            "func(x) {x}(5)"
        );
    }

    #[test]
    fn test_if_elif_else() {
        let expr = single_expression("if (x < y) { x } elif (x > y) { y } else { z }");

        let Expression::If {
            branches,
            alternative,
        } = &expr
        else {
            panic!("expected an if expression");
        };

        assert_eq!(branches.len(), 2);
        assert!(alternative.is_some());
        assert_eq!(
            expr.to_string(),
            "if ((x < y)) {x} elif ((x > y)) {y} else {z}"
        );
    }

    #[test]
    fn test_for_loops() {
        assert_eq!(
            single_expression("for (i from 0 to 10) { x = x + i }").to_string(),
            "for (i from 0 to 10) {(x = (x + i))}"
        );
        assert_eq!(
            single_expression("for (e in arr) { print(e) }").to_string(),
            "for (e in arr) {print(e)}"
        );
    }

    #[test]
    fn test_for_loop_needs_from_or_in() {
        let (_, errors) = parse_source("for (i of arr) { i }");

        assert_eq!(
            errors.first().map(String::as_str),
            Some("expected next token to be FROM or IN, got IDENT instead")
        );
    }

    #[test]
    fn test_class_statement() {
        let source = r#"
            class Person {
                var name = "";
                var age = 0;

                Init(this.name, years) {
                    this.age = years;
                }

                func GetName() { return name; }
                func secret() { return 1; }
            }
        "#;

        let program = parse_ok(source);
        let Statement::Class(class) = &program.statements[0] else {
            panic!("expected class statement");
        };

        assert_eq!(class.name.name, "Person");
        assert_eq!(class.fields.len(), 2);
        assert_eq!(class.methods.len(), 2);
        assert!(class.methods[0].is_public);
        assert!(!class.methods[1].is_public);

        let init = class.constructor.as_ref().expect("constructor");
        assert_eq!(init.parameters.len(), 2);
        assert!(init.parameters[0].this_bound);
        assert_eq!(init.parameters[0].name.name, "name");
        assert!(!init.parameters[1].this_bound);

        assert_eq!(
            program.to_string(),
            "class Person {var name = \"\";var age = 0;Init(this.name, years) {(this.age = years)}\
             func GetName() {return name;}func secret() {return 1;}}"
        );
    }

    #[test]
    fn test_object_forms() {
        assert_eq!(
            single_expression("new Person(\"A\", 1)").to_string(),
            "new Person(\"A\", 1)"
        );
        assert_eq!(
            single_expression("p.SetAge(5)"),
            Expression::MethodCall {
                object: Identifier::new("p"),
                method: Identifier::new("SetAge"),
                arguments: vec![Expression::Integer(5)],
            }
        );
        assert_eq!(
            single_expression("i++"),
            Expression::Increment(Identifier::new("i"))
        );
        assert_eq!(
            single_expression("i--"),
            Expression::Decrement(Identifier::new("i"))
        );
        assert_eq!(
            single_expression("this.age"),
            Expression::Identifier(Identifier::this_prefixed("age"))
        );
    }

    #[test]
    fn test_expected_token_errors() {
        let (_, errors) = parse_source("var = 5;");

        assert_eq!(
            errors,
            vec![
                "expected next token to be IDENT, got = instead".to_string(),
                "no prefix parse function for = found".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_prefix_uses_placeholder_and_continues() {
        let (program, errors) = parse_source("5 +; var ok = 1;");

        assert_eq!(errors, vec!["no prefix parse function for ; found".to_string()]);
        assert_eq!(program.statements.len(), 2);
        assert_eq!(
            program.statements[0],
            Statement::Expression(Expression::Null)
        );
        assert_eq!(
            program.statements[1],
            Statement::Var {
                name: Identifier::new("ok"),
                value: Expression::Integer(1),
            }
        );
    }

    #[test]
    fn test_unterminated_class_body_reports_eof() {
        let (_, errors) = parse_source("class A { var x = 1;");

        assert!(
            errors.contains(&"expected next token to be }, got EOF instead".to_string()),
            "{:?}",
            errors
        );
    }

    #[test]
    fn test_multiple_errors_in_one_pass() {
        let (_, errors) = parse_source("var = 1; var y = ; new 5()");

        assert!(errors.len() >= 3, "{:?}", errors);
        assert_eq!(errors[0], "expected next token to be IDENT, got = instead");
        assert!(errors
            .iter()
            .any(|e| e == "expected next token to be IDENT, got INT instead"));
    }

    #[test]
    fn test_ast_serializes_to_json() {
        let program = parse_ok("var x = 5;");
        let json = serde_json::to_value(&program).expect("serialize");

        assert_eq!(json["statements"][0]["Var"]["name"]["name"], "x");
        assert_eq!(json["statements"][0]["Var"]["value"]["Integer"], 5);
    }

    #[test]
    fn test_errors_accumulate_across_statements() {
        let mut parser = Parser::new(Scanner::new("var = 1; var y = 2; return"));
        let program = parser.parse_program();

        assert_eq!(
            parser.errors()[0],
            "expected next token to be IDENT, got = instead"
        );
        assert!(program
            .statements
            .iter()
            .any(|stmt| matches!(stmt, Statement::Var { name, .. } if name.name == "y")));
    }
}
