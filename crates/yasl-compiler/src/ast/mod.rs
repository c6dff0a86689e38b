//! Abstract Syntax Tree (AST) definitions for YASL.
//!
//! The tree is a closed set of node types. Every node records the source
//! line of the token it started at, which is what diagnostics report.

/// A complete YASL program or REPL line.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The statements in the program
    pub body: Vec<Statement>,
}

/// An identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    /// The name of the identifier
    pub name: String,
    /// Source line
    pub line: usize,
}

/// A YASL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `print expr`
    Print(PrintStatement),
    /// `if` without an alternate
    If(IfStatement),
    /// `if` with an `elseif` or `else` alternate
    IfElse(IfElseStatement),
    /// `while expr { ... }`
    While(WhileStatement),
    /// `let name = expr`
    Let(LetStatement),
    /// `func name: params -> { ... }`
    Function(FunctionDeclaration),
    /// `return expr`
    Return(ReturnStatement),
    /// Expression statement
    Expression(ExpressionStatement),
    /// Block statement { ... }
    Block(BlockStatement),
}

/// A print statement.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintStatement {
    /// The printed value
    pub argument: Expression,
    /// Source line
    pub line: usize,
}

/// An if statement with no alternate.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// The condition
    pub test: Expression,
    /// Runs when the condition holds
    pub consequent: BlockStatement,
    /// Source line
    pub line: usize,
}

/// An if statement with an alternate.
#[derive(Debug, Clone, PartialEq)]
pub struct IfElseStatement {
    /// The condition
    pub test: Expression,
    /// Runs when the condition holds
    pub consequent: BlockStatement,
    /// A block for `else`, or a nested conditional for `elseif`
    pub alternate: Box<Statement>,
    /// Source line
    pub line: usize,
}

/// A while statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    /// The loop condition
    pub test: Expression,
    /// The loop body
    pub body: BlockStatement,
    /// Source line
    pub line: usize,
}

/// A variable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct LetStatement {
    /// The declared name
    pub name: String,
    /// The initial value, `undef` when none was written
    pub init: Expression,
    /// Source line
    pub line: usize,
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    /// Function name
    pub name: String,
    /// Parameters, in order
    pub params: Vec<Identifier>,
    /// Function body
    pub body: BlockStatement,
    /// Source line
    pub line: usize,
}

impl FunctionDeclaration {
    /// Counts the distinct `let` names in the body that are not parameters.
    ///
    /// Nested blocks are included, nested function declarations are not.
    pub fn local_count(&self) -> usize {
        fn collect<'a>(statements: &'a [Statement], names: &mut Vec<&'a str>) {
            for statement in statements {
                match statement {
                    Statement::Let(decl) => {
                        if !names.contains(&decl.name.as_str()) {
                            names.push(&decl.name);
                        }
                    }
                    Statement::If(stmt) => collect(&stmt.consequent.body, names),
                    Statement::IfElse(stmt) => {
                        collect(&stmt.consequent.body, names);
                        collect(std::slice::from_ref(stmt.alternate.as_ref()), names);
                    }
                    Statement::While(stmt) => collect(&stmt.body.body, names),
                    Statement::Block(block) => collect(&block.body, names),
                    Statement::Print(_)
                    | Statement::Function(_)
                    | Statement::Return(_)
                    | Statement::Expression(_) => {}
                }
            }
        }

        let mut names: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();
        collect(&self.body.body, &mut names);
        names.len() - self.params.len()
    }
}

/// A return statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    /// The returned value
    pub argument: Expression,
    /// Source line
    pub line: usize,
}

/// An expression evaluated for its side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    /// The expression
    pub expression: Expression,
    /// Source line
    pub line: usize,
}

/// A braced block of statements.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    /// The statements in the block
    pub body: Vec<Statement>,
    /// Line of the opening brace
    pub line: usize,
}

impl Statement {
    /// Returns the source line this statement starts on.
    pub fn line(&self) -> usize {
        match self {
            Statement::Print(s) => s.line,
            Statement::If(s) => s.line,
            Statement::IfElse(s) => s.line,
            Statement::While(s) => s.line,
            Statement::Let(s) => s.line,
            Statement::Function(s) => s.line,
            Statement::Return(s) => s.line,
            Statement::Expression(s) => s.line,
            Statement::Block(s) => s.line,
        }
    }
}

/// A YASL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Scalar literal
    Literal(LiteralExpression),
    /// `[a, b, c]`
    List(ListExpression),
    /// `[k -> v, ...]`
    Map(MapExpression),
    /// Variable reference
    Variable(Identifier),
    /// Arithmetic, comparison or concatenation
    Binary(BinaryExpression),
    /// Prefix operator
    Unary(UnaryExpression),
    /// Short-circuit `and` / `or`
    Logical(LogicalExpression),
    /// `test ? consequent : alternate`
    Ternary(TernaryExpression),
    /// `left ?? right`
    NullCoalesce(NullCoalesceExpression),
    /// `object[index]`
    Index(IndexExpression),
    /// `target = value`
    Assignment(AssignmentExpression),
    /// `name(args)`
    Call(CallExpression),
    /// `receiver.name(args)`
    MethodCall(MethodCallExpression),
}

impl Expression {
    /// Returns the source line this expression starts on.
    pub fn line(&self) -> usize {
        match self {
            Expression::Literal(e) => e.line,
            Expression::List(e) => e.line,
            Expression::Map(e) => e.line,
            Expression::Variable(e) => e.line,
            Expression::Binary(e) => e.line,
            Expression::Unary(e) => e.line,
            Expression::Logical(e) => e.line,
            Expression::Ternary(e) => e.line,
            Expression::NullCoalesce(e) => e.line,
            Expression::Index(e) => e.line,
            Expression::Assignment(e) => e.line,
            Expression::Call(e) => e.line,
            Expression::MethodCall(e) => e.line,
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal
    Integer(i64),
    /// Floating point literal
    Float(f64),
    /// `true` / `false`
    Boolean(bool),
    /// String literal
    String(String),
    /// `undef`
    Undefined,
}

/// A literal in expression position.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpression {
    /// The value
    pub value: Literal,
    /// Source line
    pub line: usize,
}

/// A list literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ListExpression {
    /// Elements, in order
    pub elements: Vec<Expression>,
    /// Source line
    pub line: usize,
}

/// A map literal.
#[derive(Debug, Clone, PartialEq)]
pub struct MapExpression {
    /// Key/value pairs, in order
    pub entries: Vec<(Expression, Expression)>,
    /// Source line
    pub line: usize,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `//`
    IntegerDivide,
    /// `%`
    Modulo,
    /// `||`
    Concat,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `===`
    Identical,
    /// `!==`
    NotIdentical,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
}

/// A binary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    /// The operator
    pub operator: BinaryOperator,
    /// Left operand
    pub left: Box<Expression>,
    /// Right operand
    pub right: Box<Expression>,
    /// Source line
    pub line: usize,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `-`
    Negate,
    /// `+`
    Plus,
    /// `!`
    Not,
    /// `#`
    Length,
}

/// A unary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    /// The operator
    pub operator: UnaryOperator,
    /// The operand
    pub argument: Box<Expression>,
    /// Source line
    pub line: usize,
}

/// Short-circuit operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// `and`
    And,
    /// `or`
    Or,
}

/// A short-circuit expression.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    /// The operator
    pub operator: LogicalOperator,
    /// Always evaluated
    pub left: Box<Expression>,
    /// Evaluated only when `left` does not decide the result
    pub right: Box<Expression>,
    /// Source line
    pub line: usize,
}

/// A conditional expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TernaryExpression {
    /// The condition
    pub test: Box<Expression>,
    /// Value when the condition holds
    pub consequent: Box<Expression>,
    /// Value otherwise
    pub alternate: Box<Expression>,
    /// Source line
    pub line: usize,
}

/// A null-coalescing expression.
#[derive(Debug, Clone, PartialEq)]
pub struct NullCoalesceExpression {
    /// Always evaluated
    pub left: Box<Expression>,
    /// Evaluated only when `left` is undefined
    pub right: Box<Expression>,
    /// Source line
    pub line: usize,
}

/// An index access.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    /// The container
    pub object: Box<Expression>,
    /// The key
    pub index: Box<Expression>,
    /// Source line
    pub line: usize,
}

/// Something that can appear left of `=`.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignmentTarget {
    /// A variable
    Variable(Identifier),
    /// A container slot
    Index(IndexExpression),
}

impl AssignmentTarget {
    /// Returns the target read back as an rvalue.
    pub fn to_expression(&self) -> Expression {
        match self {
            AssignmentTarget::Variable(id) => Expression::Variable(id.clone()),
            AssignmentTarget::Index(index) => Expression::Index(index.clone()),
        }
    }
}

/// An assignment expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpression {
    /// What is assigned to
    pub target: AssignmentTarget,
    /// The assigned value
    pub value: Box<Expression>,
    /// Source line
    pub line: usize,
}

/// A call to a builtin or a declared function.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    /// The called name
    pub callee: String,
    /// Arguments, in order
    pub arguments: Vec<Expression>,
    /// Source line
    pub line: usize,
}

/// A method call.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCallExpression {
    /// The object the method is called on
    pub receiver: Box<Expression>,
    /// Method name
    pub method: String,
    /// Arguments, in order
    pub arguments: Vec<Expression>,
    /// Source line
    pub line: usize,
}
