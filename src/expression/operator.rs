//! Operator definitions for expressions.

use crate::access::DataType;

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // String
    Concat,
}

impl BinaryOperator {
    /// Get the output type of this operator given input types
    ///
    /// Operand types are expected to be already coerced; `Int` and `Float` are
    /// not mixed here.
    pub fn output_type(&self, left: &DataType, right: &DataType) -> Option<DataType> {
        match self {
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Mod => match (left, right) {
                (DataType::Int, DataType::Int) => Some(DataType::Int),
                (DataType::Float, DataType::Float) => Some(DataType::Float),
                _ => None,
            },

            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => {
                if self.types_compatible_for_comparison(left, right) {
                    Some(DataType::Boolean)
                } else {
                    None
                }
            }

            BinaryOperator::And | BinaryOperator::Or => match (left, right) {
                (DataType::Boolean, DataType::Boolean) => Some(DataType::Boolean),
                _ => None,
            },

            BinaryOperator::Concat => match (left, right) {
                (DataType::String, DataType::String) => Some(DataType::String),
                _ => None,
            },
        }
    }

    /// Only identical scalar types are comparable
    fn types_compatible_for_comparison(&self, left: &DataType, right: &DataType) -> bool {
        left == right && !matches!(left, DataType::Array(_) | DataType::Unknown)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Sub
                | BinaryOperator::Mul
                | BinaryOperator::Div
                | BinaryOperator::Mod
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Concat => "||",
        }
    }
}

/// Unary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    // Logical
    Not,

    // NULL checks
    IsNull,
    IsNotNull,

    // Arithmetic
    Plus,
    Minus,
}

impl UnaryOperator {
    /// Get the output type of this operator given input type
    pub fn output_type(&self, operand: &DataType) -> Option<DataType> {
        match self {
            UnaryOperator::Not => match operand {
                DataType::Boolean => Some(DataType::Boolean),
                _ => None,
            },

            // NULL checks always return boolean regardless of input type
            UnaryOperator::IsNull | UnaryOperator::IsNotNull => Some(DataType::Boolean),

            UnaryOperator::Plus | UnaryOperator::Minus => match operand {
                DataType::Int => Some(DataType::Int),
                DataType::Float => Some(DataType::Float),
                _ => None,
            },
        }
    }

    /// NULL checks are written after their operand
    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOperator::IsNull | UnaryOperator::IsNotNull)
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "NOT",
            UnaryOperator::IsNull => "IS NULL",
            UnaryOperator::IsNotNull => "IS NOT NULL",
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_operator_output_types() {
        // Arithmetic operators
        assert_eq!(
            BinaryOperator::Add.output_type(&DataType::Int, &DataType::Int),
            Some(DataType::Int)
        );
        assert_eq!(
            BinaryOperator::Div.output_type(&DataType::Float, &DataType::Float),
            Some(DataType::Float)
        );
        assert_eq!(
            BinaryOperator::Mod.output_type(&DataType::Int, &DataType::Int),
            Some(DataType::Int)
        );

        // Mixed numeric types must be coerced first
        assert_eq!(
            BinaryOperator::Add.output_type(&DataType::Int, &DataType::Float),
            None
        );
        assert_eq!(
            BinaryOperator::Add.output_type(&DataType::String, &DataType::String),
            None
        );

        // Comparison operators
        assert_eq!(
            BinaryOperator::Lt.output_type(&DataType::String, &DataType::String),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::Eq.output_type(&DataType::Int, &DataType::String),
            None
        );
        let int_array = DataType::array_of(DataType::Int);
        assert_eq!(BinaryOperator::Eq.output_type(&int_array, &int_array), None);

        // Logical operators
        assert_eq!(
            BinaryOperator::Or.output_type(&DataType::Boolean, &DataType::Boolean),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::And.output_type(&DataType::Int, &DataType::Boolean),
            None
        );

        // String operators
        assert_eq!(
            BinaryOperator::Concat.output_type(&DataType::String, &DataType::String),
            Some(DataType::String)
        );
    }

    #[test]
    fn test_unary_operator_output_types() {
        assert_eq!(
            UnaryOperator::Not.output_type(&DataType::Boolean),
            Some(DataType::Boolean)
        );
        assert_eq!(UnaryOperator::Not.output_type(&DataType::Int), None);

        assert_eq!(
            UnaryOperator::IsNull.output_type(&DataType::array_of(DataType::Int)),
            Some(DataType::Boolean)
        );
        assert_eq!(
            UnaryOperator::Minus.output_type(&DataType::Float),
            Some(DataType::Float)
        );
        assert_eq!(UnaryOperator::Plus.output_type(&DataType::String), None);
    }

    #[test]
    fn test_operator_classes() {
        assert!(BinaryOperator::Mod.is_arithmetic());
        assert!(BinaryOperator::Ge.is_comparison());
        assert!(BinaryOperator::Or.is_logical());
        assert!(!BinaryOperator::Concat.is_arithmetic());
        assert!(UnaryOperator::IsNotNull.is_postfix());
        assert!(!UnaryOperator::Minus.is_postfix());
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(BinaryOperator::Add.as_str(), "+");
        assert_eq!(BinaryOperator::Ne.as_str(), "!=");
        assert_eq!(BinaryOperator::And.as_str(), "AND");
        assert_eq!(BinaryOperator::Concat.as_str(), "||");
        assert_eq!(UnaryOperator::IsNull.as_str(), "IS NULL");
    }
}
