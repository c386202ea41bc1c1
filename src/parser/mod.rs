// RuleScript parser - pest grammar wiring and entry points

pub mod errors;
mod expressions;
mod toplevel;
mod utils;

use pest::Parser;
use pest_derive::Parser;

use crate::ast::Stmt;
use errors::ParseError;

#[derive(Parser)]
#[grammar = "rulescript.pest"]
pub struct RuleScriptParser;

/// Parse a complete build file or include into its statement list.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, ParseError> {
    let mut pairs = RuleScriptParser::parse(Rule::program, source)
        .map_err(|e| ParseError::Syntax(Box::new(e)))?;
    let program = pairs
        .next()
        .ok_or_else(|| ParseError::MissingNode { node: "program".to_string() })?;
    toplevel::build_program(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Arg, CallExpr, Expr, Literal, Stmt};

    #[test]
    fn parses_assignments_and_calls() {
        let program = parse_program("SRCS = [\"a.c\", 'b.c']\ncc_library(name = \"lib\", srcs = SRCS)\n").unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(
            program[0],
            Stmt::Assign {
                name: "SRCS".to_string(),
                value: Expr::List(vec![
                    Expr::Literal(Literal::Str("a.c".to_string())),
                    Expr::Literal(Literal::Str("b.c".to_string())),
                ]),
            }
        );
        match &program[1] {
            Stmt::Expr(Expr::Call(CallExpr { callee, args })) => {
                assert_eq!(callee, "cc_library");
                assert_eq!(args.len(), 2);
                assert!(matches!(&args[0], Arg::Keyword(name, _) if name == "name"));
            }
            other => panic!("expected call statement, got {:?}", other),
        }
    }

    #[test]
    fn parses_function_definitions() {
        let source = "\
def helper(name, deps = []) {
    add_rule({\"name\": name, \"deps\": deps})
    return none
}
";
        let program = parse_program(source).unwrap();
        assert_eq!(program.len(), 1);
        match &program[0] {
            Stmt::Def(def) => {
                assert_eq!(def.name, "helper");
                assert_eq!(def.params.len(), 2);
                assert_eq!(def.params[0].name, "name");
                assert!(def.params[0].default.is_none());
                assert_eq!(def.params[1].default, Some(Expr::List(vec![])));
                assert_eq!(def.body.len(), 2);
                assert_eq!(def.body[1], Stmt::Return(Expr::Literal(Literal::None)));
            }
            other => panic!("expected def statement, got {:?}", other),
        }
    }

    #[test]
    fn distinguishes_tuples_from_parenthesized_expressions() {
        let program = parse_program("A = (\"x\", \"y\")\nB = (\"x\")\nC = (\"x\",)\n").unwrap();
        assert!(matches!(&program[0], Stmt::Assign { value: Expr::Tuple(items), .. } if items.len() == 2));
        assert!(matches!(&program[1], Stmt::Assign { value: Expr::Literal(Literal::Str(_)), .. }));
        assert!(matches!(&program[2], Stmt::Assign { value: Expr::Tuple(items), .. } if items.len() == 1));
    }

    #[test]
    fn parses_concatenation_left_associative() {
        let program = parse_program("X = [1] + [2] + [3]").unwrap();
        match &program[0] {
            Stmt::Assign { value: Expr::Add(lhs, _), .. } => {
                assert!(matches!(**lhs, Expr::Add(..)));
            }
            other => panic!("expected nested add, got {:?}", other),
        }
    }

    #[test]
    fn statements_separated_by_newlines_only() {
        let program = parse_program("FOO\nBAR = FOO\n# trailing comment\n").unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program[0], Stmt::Expr(Expr::Ident("FOO".to_string())));
    }

    #[test]
    fn rejects_unknown_syntax() {
        assert!(parse_program("FOO = = 1").is_err());
        assert!(parse_program("def broken(").is_err());
        assert!(parse_program("1.5").is_err());
    }
}
