// Expression-level AST builders

use pest::iterators::Pair;

use super::errors::ParseError;
use super::utils::unescape;
use super::Rule;
use crate::ast::{Arg, CallExpr, Expr, Literal};

pub(super) fn build_expr(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| ParseError::MissingNode { node: "expression term".to_string() })?;
    let mut expr = build_term(first)?;
    while let Some(op) = inner.next() {
        if op.as_rule() != Rule::add_op {
            return Err(ParseError::UnexpectedNode {
                expected: "operator".to_string(),
                found: format!("{:?}", op.as_rule()),
            });
        }
        let rhs = inner
            .next()
            .ok_or_else(|| ParseError::MissingNode { node: "right operand".to_string() })?;
        expr = Expr::Add(Box::new(expr), Box::new(build_term(rhs)?));
    }
    Ok(expr)
}

fn build_term(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    match pair.as_rule() {
        Rule::literal => Ok(Expr::Literal(build_literal(pair)?)),
        Rule::list => {
            let items: Result<Vec<Expr>, ParseError> = pair.into_inner().map(build_expr).collect();
            Ok(Expr::List(items?))
        }
        Rule::tuple => {
            let items: Result<Vec<Expr>, ParseError> = pair.into_inner().map(build_expr).collect();
            Ok(Expr::Tuple(items?))
        }
        Rule::dict => {
            let mut entries = Vec::new();
            for entry in pair.into_inner() {
                let mut kv = entry.into_inner();
                let key = kv
                    .next()
                    .ok_or_else(|| ParseError::MissingNode { node: "dict key".to_string() })?;
                let value = kv
                    .next()
                    .ok_or_else(|| ParseError::MissingNode { node: "dict value".to_string() })?;
                entries.push((build_expr(key)?, build_expr(value)?));
            }
            Ok(Expr::Dict(entries))
        }
        Rule::paren => {
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| ParseError::MissingNode { node: "parenthesized expression".to_string() })?;
            build_expr(inner)
        }
        Rule::call => build_call(pair),
        Rule::ident => Ok(Expr::Ident(pair.as_str().to_string())),
        rule => Err(ParseError::UnexpectedNode {
            expected: "expression term".to_string(),
            found: format!("{:?}", rule),
        }),
    }
}

fn build_call(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    let mut inner = pair.into_inner();
    let callee = inner
        .next()
        .ok_or_else(|| ParseError::MissingNode { node: "call target".to_string() })?
        .as_str()
        .to_string();
    let mut args = Vec::new();
    if let Some(arg_list) = inner.next() {
        for arg in arg_list.into_inner() {
            let concrete = arg
                .into_inner()
                .next()
                .ok_or_else(|| ParseError::MissingNode { node: "argument".to_string() })?;
            match concrete.as_rule() {
                Rule::kwarg => {
                    let mut kv = concrete.into_inner();
                    let name = kv
                        .next()
                        .ok_or_else(|| ParseError::MissingNode { node: "keyword name".to_string() })?
                        .as_str()
                        .to_string();
                    let value = kv
                        .next()
                        .ok_or_else(|| ParseError::MissingNode { node: "keyword value".to_string() })?;
                    args.push(Arg::Keyword(name, build_expr(value)?));
                }
                Rule::expr => args.push(Arg::Positional(build_expr(concrete)?)),
                rule => {
                    return Err(ParseError::UnexpectedNode {
                        expected: "argument".to_string(),
                        found: format!("{:?}", rule),
                    });
                }
            }
        }
    }
    Ok(Expr::Call(CallExpr { callee, args }))
}

fn build_literal(pair: Pair<Rule>) -> Result<Literal, ParseError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::MissingNode { node: "literal".to_string() })?;
    match inner.as_rule() {
        Rule::string => {
            let raw = inner.as_str();
            let body = &raw[1..raw.len() - 1];
            Ok(Literal::Str(unescape(body)?))
        }
        Rule::integer => inner
            .as_str()
            .parse()
            .map(Literal::Int)
            .map_err(|_| ParseError::InvalidInteger { text: inner.as_str().to_string() }),
        Rule::boolean => Ok(Literal::Bool(inner.as_str() == "true")),
        Rule::none => Ok(Literal::None),
        rule => Err(ParseError::UnexpectedNode {
            expected: "literal".to_string(),
            found: format!("{:?}", rule),
        }),
    }
}
