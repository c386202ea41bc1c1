// Statement and expression evaluation for RuleScript

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{Arg, CallExpr, Expr, FunctionDef, Literal, Stmt};
use crate::runtime::environment::SharedNamespace;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::processor::BuildFileProcessor;
use crate::runtime::values::{Closure, ClosureParam, Function, Value};

/// Where one statement sequence executes: an optional local frame (function
/// bodies only) over the executing unit's namespace.
pub struct ExecEnv {
    pub locals: Option<HashMap<String, Value>>,
    pub unit: SharedNamespace,
}

/// Statement outcome; `Return` unwinds to the nearest enclosing call.
pub enum Flow {
    Normal,
    Return(Value),
}

/// Evaluated call arguments, positional and keyword, in source order.
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keywords: Vec<(String, Value)>,
}

impl BuildFileProcessor {
    /// Execute a file or include body against its namespace.
    pub(crate) fn exec_unit(&mut self, program: &[Stmt], namespace: &SharedNamespace) -> RuntimeResult<()> {
        let mut env = ExecEnv { locals: None, unit: Rc::clone(namespace) };
        match self.exec_body(program, &mut env)? {
            Flow::Normal => Ok(()),
            Flow::Return(_) => Err(RuntimeError::ReturnOutsideFunction),
        }
    }

    fn exec_body(&mut self, statements: &[Stmt], env: &mut ExecEnv) -> RuntimeResult<Flow> {
        for statement in statements {
            match self.exec_stmt(statement, env)? {
                Flow::Normal => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, statement: &Stmt, env: &mut ExecEnv) -> RuntimeResult<Flow> {
        match statement {
            Stmt::Assign { name, value } => {
                let value = self.eval_expr(value, env)?;
                self.assign(name, value, env);
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval_expr(expr, env)?;
                Ok(Flow::Normal)
            }
            Stmt::Def(def) => {
                let closure = self.make_closure(def, env)?;
                self.assign(&def.name, closure, env);
                Ok(Flow::Normal)
            }
            Stmt::Return(expr) => {
                if env.locals.is_none() {
                    return Err(RuntimeError::ReturnOutsideFunction);
                }
                let value = self.eval_expr(expr, env)?;
                Ok(Flow::Return(value))
            }
        }
    }

    fn assign(&mut self, name: &str, value: Value, env: &mut ExecEnv) {
        match &mut env.locals {
            Some(locals) => {
                locals.insert(name.to_string(), value);
            }
            None => env.unit.borrow_mut().set(name, value),
        }
    }

    /// Defaults are evaluated now, in the defining environment; the closure
    /// keeps a handle to the defining unit's namespace.
    fn make_closure(&mut self, def: &FunctionDef, env: &mut ExecEnv) -> RuntimeResult<Value> {
        let mut params = Vec::with_capacity(def.params.len());
        for param in &def.params {
            let default = match &param.default {
                Some(expr) => Some(self.eval_expr(expr, env)?),
                None => None,
            };
            params.push(ClosureParam { name: param.name.clone(), default });
        }
        Ok(Value::Function(Function::Closure(Rc::new(Closure {
            name: def.name.clone(),
            params,
            body: def.body.clone(),
            globals: Rc::clone(&env.unit),
        }))))
    }

    pub(crate) fn eval_expr(&mut self, expr: &Expr, env: &mut ExecEnv) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(eval_literal(literal)),
            Expr::Ident(name) => self.lookup(name, env),
            Expr::List(items) => {
                let values: RuntimeResult<Vec<Value>> =
                    items.iter().map(|item| self.eval_expr(item, env)).collect();
                Ok(Value::List(values?))
            }
            Expr::Tuple(items) => {
                let values: RuntimeResult<Vec<Value>> =
                    items.iter().map(|item| self.eval_expr(item, env)).collect();
                Ok(Value::Tuple(values?))
            }
            Expr::Dict(entries) => {
                let mut map = indexmap::IndexMap::new();
                for (key_expr, value_expr) in entries {
                    let key = match self.eval_expr(key_expr, env)? {
                        Value::Str(key) => key,
                        other => {
                            return Err(RuntimeError::TypeError {
                                expected: "a string".to_string(),
                                actual: other.type_name().to_string(),
                                operation: "dict key".to_string(),
                            });
                        }
                    };
                    let value = self.eval_expr(value_expr, env)?;
                    map.insert(key, value);
                }
                Ok(Value::Dict(map))
            }
            Expr::Add(lhs, rhs) => {
                let lhs = self.eval_expr(lhs, env)?;
                let rhs = self.eval_expr(rhs, env)?;
                eval_add(lhs, rhs)
            }
            Expr::Call(call) => self.eval_call(call, env),
        }
    }

    fn lookup(&self, name: &str, env: &ExecEnv) -> RuntimeResult<Value> {
        if let Some(locals) = &env.locals {
            if let Some(value) = locals.get(name) {
                return Ok(value.clone());
            }
        }
        if let Some(value) = env.unit.borrow().get(name) {
            return Ok(value);
        }
        if let Some(value) = self.builtins.get(name) {
            return Ok(value.clone());
        }
        Err(RuntimeError::UndefinedName(name.to_string()))
    }

    fn eval_call(&mut self, call: &CallExpr, env: &mut ExecEnv) -> RuntimeResult<Value> {
        let callee = self.lookup(&call.callee, env)?;
        let mut args = CallArgs { positional: Vec::new(), keywords: Vec::new() };
        for arg in &call.args {
            match arg {
                Arg::Positional(expr) => args.positional.push(self.eval_expr(expr, env)?),
                Arg::Keyword(name, expr) => {
                    let value = self.eval_expr(expr, env)?;
                    args.keywords.push((name.clone(), value));
                }
            }
        }
        match callee {
            Value::Function(Function::Closure(closure)) => self.call_closure(closure, args),
            Value::Function(Function::Builtin(builtin)) => self.call_builtin(builtin, args),
            _ => Err(RuntimeError::NotCallable(call.callee.clone())),
        }
    }

    fn call_closure(&mut self, closure: Rc<Closure>, args: CallArgs) -> RuntimeResult<Value> {
        let locals = bind_closure_args(&closure, args)?;

        // The closure's defining unit becomes the executing unit for the
        // duration of the call, so `include_defs` from inside the body
        // merges into that unit's namespace.
        self.unit_stack.push(Rc::clone(&closure.globals));
        let mut env = ExecEnv { locals: Some(locals), unit: Rc::clone(&closure.globals) };
        let result = self.exec_body(&closure.body, &mut env);
        self.unit_stack.pop();

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
        }
    }
}

fn eval_literal(literal: &Literal) -> Value {
    match literal {
        Literal::None => Value::None,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

fn eval_add(lhs: Value, rhs: Value) -> RuntimeResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (lhs, rhs) => Err(RuntimeError::TypeError {
            expected: format!("matching operands, left was {}", lhs.type_name()),
            actual: rhs.type_name().to_string(),
            operation: "+".to_string(),
        }),
    }
}

fn bind_closure_args(closure: &Closure, args: CallArgs) -> RuntimeResult<HashMap<String, Value>> {
    if args.positional.len() > closure.params.len() {
        return Err(RuntimeError::ArityMismatch {
            function: closure.name.clone(),
            expected: format!("at most {}", closure.params.len()),
            actual: args.positional.len(),
        });
    }

    let mut locals = HashMap::new();
    for (param, value) in closure.params.iter().zip(args.positional) {
        locals.insert(param.name.clone(), value);
    }
    for (name, value) in args.keywords {
        if !closure.params.iter().any(|param| param.name == name) {
            return Err(RuntimeError::UnexpectedKeyword {
                function: closure.name.clone(),
                name,
            });
        }
        if locals.contains_key(&name) {
            return Err(RuntimeError::DuplicateArgument {
                function: closure.name.clone(),
                name,
            });
        }
        locals.insert(name, value);
    }
    for param in &closure.params {
        if locals.contains_key(&param.name) {
            continue;
        }
        match &param.default {
            Some(default) => {
                locals.insert(param.name.clone(), default.clone());
            }
            None => {
                return Err(RuntimeError::MissingArgument {
                    function: closure.name.clone(),
                    name: param.name.clone(),
                });
            }
        }
    }
    Ok(locals)
}
