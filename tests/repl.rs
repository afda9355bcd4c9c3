#[cfg(test)]
mod repl_tests {
    use pron::interpreter::Evaluator;
    use pron::loader::MemoryLoader;
    use pron::repl::{print_parser_errors, Repl};

    fn run_session(input: &str) -> String {
        let mut repl = Repl::new(Evaluator::with_loader(MemoryLoader::new()));
        let mut out = Vec::new();

        repl.run(input.as_bytes(), &mut out).expect("in-memory I/O");

        String::from_utf8(out).expect("utf-8 output")
    }

    #[test]
    fn test_session_keeps_bindings_and_stops_at_quit() {
        let output = run_session("var x = 5\nx * 2\nvar = \nquit\nx\n");

        assert_eq!(
            output,
            ">> >> 10\n>>  parser errors:\n\
             \t- expected next token to be IDENT, got = instead\n\
             \t- no prefix parse function for = found\n>> "
        );
    }

    #[test]
    fn test_bindings_survive_in_session_env() {
        let mut repl = Repl::new(Evaluator::with_loader(MemoryLoader::new()));
        let mut out = Vec::new();

        repl.run("var x = 5\nx++\n".as_bytes(), &mut out)
            .expect("in-memory I/O");

        let x = repl.env().borrow().get("x");
        assert_eq!(x.and_then(|v| v.as_integer()), Some(6));
    }

    #[test]
    fn test_null_results_are_not_echoed() {
        let output = run_session("var s = \"hi\"\nif (false) { 1 }\ns\n");

        assert_eq!(output, ">> >> >> hi\n>> ");
    }

    #[test]
    fn test_runtime_errors_are_printed() {
        let output = run_session("nope\n1 + 1\n");

        assert_eq!(output, ">> ERROR: identifier not found: nope\n>> 2\n>> ");
    }

    #[test]
    fn test_print_parser_errors_format() {
        let mut out = Vec::new();
        let errors = vec!["first".to_string(), "second".to_string()];

        print_parser_errors(&mut out, &errors).expect("in-memory I/O");

        assert_eq!(
            String::from_utf8(out).expect("utf-8 output"),
            " parser errors:\n\t- first\n\t- second\n"
        );
    }
}
