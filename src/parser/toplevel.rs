// Statement-level AST builders

use pest::iterators::Pair;

use super::errors::ParseError;
use super::expressions::build_expr;
use super::Rule;
use crate::ast::{FunctionDef, Param, Stmt};

pub(super) fn build_program(pair: Pair<Rule>) -> Result<Vec<Stmt>, ParseError> {
    let mut statements = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::EOI {
            continue;
        }
        statements.push(build_stmt(inner)?);
    }
    Ok(statements)
}

pub(super) fn build_stmt(pair: Pair<Rule>) -> Result<Stmt, ParseError> {
    match pair.as_rule() {
        Rule::def_stmt => build_def(pair),
        Rule::return_stmt => {
            let expr = pair
                .into_inner()
                .find(|p| p.as_rule() == Rule::expr)
                .ok_or_else(|| ParseError::MissingNode { node: "return expression".to_string() })?;
            Ok(Stmt::Return(build_expr(expr)?))
        }
        Rule::assign_stmt => {
            let mut inner = pair.into_inner();
            let name = inner
                .next()
                .ok_or_else(|| ParseError::MissingNode { node: "assignment target".to_string() })?
                .as_str()
                .to_string();
            let value = inner
                .next()
                .ok_or_else(|| ParseError::MissingNode { node: "assignment value".to_string() })?;
            Ok(Stmt::Assign { name, value: build_expr(value)? })
        }
        Rule::expr_stmt => {
            let expr = pair
                .into_inner()
                .next()
                .ok_or_else(|| ParseError::MissingNode { node: "expression".to_string() })?;
            Ok(Stmt::Expr(build_expr(expr)?))
        }
        rule => Err(ParseError::UnexpectedNode {
            expected: "statement".to_string(),
            found: format!("{:?}", rule),
        }),
    }
}

fn build_def(pair: Pair<Rule>) -> Result<Stmt, ParseError> {
    let mut name = None;
    let mut params = Vec::new();
    let mut body = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::kw_def => {}
            Rule::ident => name = Some(inner.as_str().to_string()),
            Rule::param_list => {
                for param in inner.into_inner() {
                    params.push(build_param(param)?);
                }
            }
            _ => body.push(build_stmt(inner)?),
        }
    }
    let name = name.ok_or_else(|| ParseError::MissingNode { node: "function name".to_string() })?;
    Ok(Stmt::Def(FunctionDef { name, params, body }))
}

fn build_param(pair: Pair<Rule>) -> Result<Param, ParseError> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| ParseError::MissingNode { node: "parameter name".to_string() })?
        .as_str()
        .to_string();
    let default = match inner.next() {
        Some(expr) => Some(build_expr(expr)?),
        None => None,
    };
    Ok(Param { name, default })
}
