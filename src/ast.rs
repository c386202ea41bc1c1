// AST for RuleScript - the declarative language evaluated for build files

/// A literal value as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Ident(String),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Call(CallExpr),
    /// Binary `+`: integer addition, string or list concatenation.
    Add(Box<Expr>, Box<Expr>),
}

/// A call to a named function: positional arguments, then keyword arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: String,
    pub args: Vec<Arg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Positional(Expr),
    Keyword(String, Expr),
}

/// A declared function parameter; the default expression is evaluated once,
/// when the `def` statement executes.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign { name: String, value: Expr },
    Expr(Expr),
    Def(FunctionDef),
    Return(Expr),
}
