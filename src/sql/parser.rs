// Expression parser - converts tokens to a raw syntax tree

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::access::DataType;
use crate::expression::{BinaryOperator, UnaryOperator};
use anyhow::{bail, Context, Result};

/// Deepest tree the parser will build, and deepest it will recurse
///
/// Binding, type resolution, folding and evaluation all recurse over the
/// tree, so this bound keeps every pass within a worker thread's stack.
pub const MAX_DEPTH: usize = 128;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    /// Current recursion depth of the parse functions
    depth: usize,
}

impl Parser {
    pub fn new(text: &str) -> Self {
        let tokens = Lexer::new(text).tokenize();
        Parser {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Parse the whole input as a single scalar expression
    pub fn parse(&mut self) -> Result<Expression> {
        if self.match_token(&Token::Eof) {
            bail!("empty expression");
        }
        let expression = self.parse_expression()?;
        match self.current_token() {
            Token::Eof => Ok(expression),
            token => bail!("unexpected trailing input at {:?}", token),
        }
    }

    fn parse_expression(&mut self) -> Result<Expression> {
        self.descend()?;
        let expression = self.parse_or()?;
        self.depth -= 1;
        Ok(expression)
    }

    /// Parse OR expression
    fn parse_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;

        while self.match_token(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = self.bounded(binary(left, BinaryOperator::Or, right))?;
        }

        Ok(left)
    }

    /// Parse AND expression
    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_not()?;

        while self.match_token(&Token::And) {
            self.advance();
            let right = self.parse_not()?;
            left = self.bounded(binary(left, BinaryOperator::And, right))?;
        }

        Ok(left)
    }

    /// Parse NOT expression
    fn parse_not(&mut self) -> Result<Expression> {
        if self.match_token(&Token::Not) {
            self.advance();
            self.descend()?;
            let operand = self.parse_not()?;
            self.depth -= 1;
            self.bounded(unary(UnaryOperator::Not, operand))
        } else {
            self.parse_is_null()
        }
    }

    /// Parse `expr IS [NOT] NULL`
    fn parse_is_null(&mut self) -> Result<Expression> {
        let mut expression = self.parse_comparison()?;

        while self.match_token(&Token::Is) {
            self.advance();
            let op = if self.match_token(&Token::Not) {
                self.advance();
                UnaryOperator::IsNotNull
            } else {
                UnaryOperator::IsNull
            };
            self.expect_token(Token::Null)?;
            expression = self.bounded(unary(op, expression))?;
        }

        Ok(expression)
    }

    /// Parse comparison expression (non-associative)
    fn parse_comparison(&mut self) -> Result<Expression> {
        let left = self.parse_concat()?;

        let op = match self.current_token() {
            Token::Equal => BinaryOperator::Eq,
            Token::NotEqual => BinaryOperator::Ne,
            Token::Less => BinaryOperator::Lt,
            Token::LessEqual => BinaryOperator::Le,
            Token::Greater => BinaryOperator::Gt,
            Token::GreaterEqual => BinaryOperator::Ge,
            _ => return Ok(left),
        };
        self.advance();

        let right = self.parse_concat()?;
        self.bounded(binary(left, op, right))
    }

    /// Parse string concatenation
    fn parse_concat(&mut self) -> Result<Expression> {
        let mut left = self.parse_addition()?;

        while self.match_token(&Token::Concat) {
            self.advance();
            let right = self.parse_addition()?;
            left = self.bounded(binary(left, BinaryOperator::Concat, right))?;
        }

        Ok(left)
    }

    /// Parse addition/subtraction expression
    fn parse_addition(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplication()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance();

            let right = self.parse_multiplication()?;
            left = self.bounded(binary(left, op, right))?;
        }

        Ok(left)
    }

    /// Parse multiplication/division expression
    fn parse_multiplication(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                Token::Percent => BinaryOperator::Mod,
                _ => break,
            };
            self.advance();

            let right = self.parse_unary()?;
            left = self.bounded(binary(left, op, right))?;
        }

        Ok(left)
    }

    /// Parse unary expression
    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match self.current_token() {
            Token::Plus => UnaryOperator::Plus,
            Token::Minus => UnaryOperator::Minus,
            _ => return self.parse_postfix(),
        };
        self.advance();
        self.descend()?;
        let operand = self.parse_unary()?;
        self.depth -= 1;

        match (op, operand) {
            // Keep negative numbers as constants so i64::MIN is representable
            (UnaryOperator::Minus, Expression::NumericConstant(n)) if !n.starts_with('-') => {
                Ok(Expression::NumericConstant(format!("-{}", n)))
            }
            (op, operand) => self.bounded(unary(op, operand)),
        }
    }

    /// Parse `::T` casts and `:::T` annotations
    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut expression = self.parse_primary()?;

        loop {
            match self.current_token() {
                Token::DoubleColon => {
                    self.advance();
                    let data_type = self.parse_data_type()?;
                    expression = self.bounded(Expression::Cast {
                        expression: Box::new(expression),
                        data_type,
                    })?;
                }
                Token::TripleColon => {
                    self.advance();
                    let data_type = self.parse_data_type()?;
                    expression = self.bounded(Expression::Annotation {
                        expression: Box::new(expression),
                        data_type,
                    })?;
                }
                _ => break,
            }
        }

        Ok(expression)
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> Result<Expression> {
        match self.current_token() {
            Token::Number(n) => {
                self.advance();
                Ok(Expression::NumericConstant(n))
            }
            Token::String(s) => {
                self.advance();
                Ok(Expression::StringConstant(s))
            }
            Token::True => {
                self.advance();
                Ok(Expression::Boolean(true))
            }
            Token::False => {
                self.advance();
                Ok(Expression::Boolean(false))
            }
            Token::Null => {
                self.advance();
                Ok(Expression::Null)
            }
            Token::Placeholder(digits) => {
                self.advance();
                let ordinal = digits
                    .parse::<u64>()
                    .with_context(|| format!("placeholder @{} is out of range", digits))?;
                Ok(Expression::Placeholder(ordinal))
            }
            Token::Identifier(name) => {
                self.advance();
                if !self.match_token(&Token::LeftParen) {
                    bail!(
                        "unexpected identifier \"{}\": input columns are referenced by ordinal (@1, @2, ...)",
                        name
                    );
                }
                self.advance();

                let args = if self.match_token(&Token::RightParen) {
                    vec![]
                } else {
                    self.parse_expression_list()?
                };
                self.expect_token(Token::RightParen)?;

                self.bounded(Expression::Function {
                    name: name.to_lowercase(),
                    args,
                })
            }
            Token::LeftParen => {
                self.advance();
                let expression = self.parse_expression()?;
                self.expect_token(Token::RightParen)?;
                Ok(expression)
            }
            Token::Array => self.parse_array(),
            Token::Case => self.parse_case_expression(),
            Token::Cast => self.parse_cast_expression(),
            Token::Illegal(c) => bail!("unexpected character '{}'", c),
            Token::Eof => bail!("unexpected end of input"),
            token => bail!("unexpected token {:?}", token),
        }
    }

    /// Parse `ARRAY[e1, e2, ...]`
    fn parse_array(&mut self) -> Result<Expression> {
        self.expect_token(Token::Array)?;
        self.expect_token(Token::LeftBracket)?;

        let elements = if self.match_token(&Token::RightBracket) {
            vec![]
        } else {
            self.parse_expression_list()?
        };
        self.expect_token(Token::RightBracket)?;

        self.bounded(Expression::Array(elements))
    }

    /// Parse CASE expression
    fn parse_case_expression(&mut self) -> Result<Expression> {
        self.expect_token(Token::Case)?;

        // Check if there's an operand
        let operand = if !self.match_token(&Token::When) {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        let mut when_clauses = vec![];

        while self.match_token(&Token::When) {
            self.advance();
            let condition = self.parse_expression()?;
            self.expect_token(Token::Then)?;
            let result = self.parse_expression()?;
            when_clauses.push(WhenClause { condition, result });
        }

        if when_clauses.is_empty() {
            bail!("CASE requires at least one WHEN clause");
        }

        let else_clause = if self.match_token(&Token::Else) {
            self.advance();
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect_token(Token::End)?;

        self.bounded(Expression::Case {
            operand,
            when_clauses,
            else_clause,
        })
    }

    /// Parse CAST expression
    fn parse_cast_expression(&mut self) -> Result<Expression> {
        self.expect_token(Token::Cast)?;
        self.expect_token(Token::LeftParen)?;

        let expression = self.parse_expression()?;

        self.expect_token(Token::As)?;

        let data_type = self.parse_data_type()?;

        self.expect_token(Token::RightParen)?;

        self.bounded(Expression::Cast {
            expression: Box::new(expression),
            data_type,
        })
    }

    /// Parse a type name with optional `[]` suffixes
    fn parse_data_type(&mut self) -> Result<DataType> {
        let name = self.expect_identifier()?;
        let mut data_type = match DataType::from_sql_name(&name) {
            Some(data_type) => data_type,
            None => bail!("type \"{}\" does not exist", name),
        };

        while self.match_token(&Token::LeftBracket) {
            self.advance();
            self.expect_token(Token::RightBracket)?;
            data_type = DataType::array_of(data_type);
        }

        Ok(data_type)
    }

    /// Parse list of expressions
    fn parse_expression_list(&mut self) -> Result<Vec<Expression>> {
        let mut expressions = vec![];

        loop {
            expressions.push(self.parse_expression()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(expressions)
    }

    // Helper methods

    /// Enter one more level of parser recursion, failing past `MAX_DEPTH`
    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            bail!("expression nested too deeply (more than {} levels)", MAX_DEPTH);
        }
        Ok(())
    }

    /// Reject a freshly built node whose tree is higher than `MAX_DEPTH`
    ///
    /// Its children already passed this check, so measuring it recurses at
    /// most `MAX_DEPTH` levels.
    fn bounded(&self, expression: Expression) -> Result<Expression> {
        if expression.height() > MAX_DEPTH {
            bail!("expression nested too deeply (more than {} levels)", MAX_DEPTH);
        }
        Ok(expression)
    }

    /// Get current token
    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .cloned()
            .unwrap_or(Token::Eof)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Check if current token matches
    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    /// Expect a specific token
    fn expect_token(&mut self, token: Token) -> Result<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            bail!("expected {:?}, found {:?}", token, self.current_token())
        }
    }

    /// Expect an identifier
    fn expect_identifier(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            token => bail!("expected type name, found {:?}", token),
        }
    }
}

fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
    Expression::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn unary(op: UnaryOperator, operand: Expression) -> Expression {
    Expression::UnaryOp {
        op,
        operand: Box::new(operand),
    }
}

/// Parse expression text into a raw syntax tree
pub fn parse_expression(text: &str) -> Result<Expression> {
    Parser::new(text).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder(k: u64) -> Expression {
        Expression::Placeholder(k)
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse_expression("@1 * (@2 + @3) + @1").unwrap();
        assert_eq!(
            expr,
            binary(
                binary(
                    placeholder(1),
                    BinaryOperator::Mul,
                    binary(placeholder(2), BinaryOperator::Add, placeholder(3)),
                ),
                BinaryOperator::Add,
                placeholder(1),
            )
        );

        let expr = parse_expression("@1 + @2 * @3 = @4 AND NOT @5").unwrap();
        match expr {
            Expression::BinaryOp {
                op: BinaryOperator::And,
                left,
                right,
            } => {
                assert!(matches!(
                    *left,
                    Expression::BinaryOp {
                        op: BinaryOperator::Eq,
                        ..
                    }
                ));
                assert!(matches!(
                    *right,
                    Expression::UnaryOp {
                        op: UnaryOperator::Not,
                        ..
                    }
                ));
            }
            other => panic!("Expected AND, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_annotated_array() {
        let expr = parse_expression("ARRAY[1:::INT,2:::INT]").unwrap();
        let annotated = |n: &str| Expression::Annotation {
            expression: Box::new(Expression::NumericConstant(n.to_string())),
            data_type: DataType::Int,
        };
        assert_eq!(expr, Expression::Array(vec![annotated("1"), annotated("2")]));
    }

    #[test]
    fn test_parse_casts() {
        let expr = parse_expression("CAST(@1 AS FLOAT)").unwrap();
        assert_eq!(
            expr,
            Expression::Cast {
                expression: Box::new(placeholder(1)),
                data_type: DataType::Float,
            }
        );

        let expr = parse_expression("@1::STRING[]").unwrap();
        assert_eq!(
            expr,
            Expression::Cast {
                expression: Box::new(placeholder(1)),
                data_type: DataType::array_of(DataType::String),
            }
        );

        // Cast binds tighter than unary minus
        let expr = parse_expression("-@1::INT").unwrap();
        assert!(matches!(
            expr,
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_negative_constant() {
        assert_eq!(
            parse_expression("-9223372036854775808").unwrap(),
            Expression::NumericConstant("-9223372036854775808".to_string())
        );
        assert_eq!(
            parse_expression("- -1").unwrap(),
            unary(
                UnaryOperator::Minus,
                Expression::NumericConstant("-1".to_string())
            )
        );
    }

    #[test]
    fn test_parse_is_null_and_case() {
        let expr = parse_expression("@1 IS NOT NULL").unwrap();
        assert_eq!(expr, unary(UnaryOperator::IsNotNull, placeholder(1)));

        let expr = parse_expression("CASE @1 WHEN 1 THEN 'one' ELSE 'other' END").unwrap();
        match expr {
            Expression::Case {
                operand,
                when_clauses,
                else_clause,
            } => {
                assert_eq!(operand, Some(Box::new(placeholder(1))));
                assert_eq!(when_clauses.len(), 1);
                assert!(else_clause.is_some());
            }
            other => panic!("Expected CASE, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_function_call() {
        let expr = parse_expression("ABS(@2 - 10)").unwrap();
        match expr {
            Expression::Function { name, args } => {
                assert_eq!(name, "abs");
                assert_eq!(args.len(), 1);
            }
            other => panic!("Expected function call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_expression("").is_err());
        assert!(parse_expression("@1 +").is_err());
        assert!(parse_expression("(@1").is_err());
        assert!(parse_expression("@1 @2").is_err());
        assert!(parse_expression("foo + 1").is_err());
        assert!(parse_expression("1:::NOPE").is_err());
        assert!(parse_expression("ARRAY[1,2").is_err());
        assert!(parse_expression("@99999999999999999999999").is_err());
        assert!(parse_expression("CASE ELSE 1 END").is_err());
        assert!(parse_expression("1 # 2").is_err());
    }

    fn assert_too_deep(text: &str) {
        let err = parse_expression(text).unwrap_err();
        assert!(
            err.to_string().contains("nested too deeply"),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn test_parse_rejects_deep_nesting() {
        let parens = |n: usize| format!("{}@1{}", "(".repeat(n), ")".repeat(n));
        assert_eq!(parse_expression(&parens(100)).unwrap(), placeholder(1));
        assert_too_deep(&parens(10_000));

        assert_too_deep(&"NOT ".repeat(10_000));
        assert_too_deep(&format!("{}1", "- ".repeat(10_000)));
        assert_too_deep(&format!("ARRAY[{}1{}]", "ARRAY[".repeat(200), "]".repeat(200)));
        assert_too_deep(&format!("@1{}", "::INT".repeat(10_000)));
    }

    #[test]
    fn test_parse_rejects_long_chains() {
        let chain = |n: usize| vec!["1"; n].join(" + ");
        let expr = parse_expression(&chain(MAX_DEPTH)).unwrap();
        assert_eq!(expr.height(), MAX_DEPTH);
        assert_too_deep(&chain(10_000));

        // Chains nested inside the first operand of an outer chain add up
        let mut text = "1".to_string();
        for _ in 0..20 {
            text = format!("({}){}", text, " * 2".repeat(10));
        }
        assert_too_deep(&text);
    }
}
