//! Formula compiler
//!
//! Lowers a parsed expression tree into a [`Program`]: every variable
//! reference is resolved to a direct [`VarId`] accessor and every function
//! call to its implementation pointer, so evaluation never performs a name
//! lookup. Unknown names surface here, not at parse time.

use crate::ast::{BinaryOperator, Expr, ParsedFormula, UnaryOperator};
use crate::error::{ExprError, ExprResult};
use crate::functions::{FunctionImpl, FunctionRegistry};
use std::collections::BTreeSet;
use varflow_core::{Formula, ValueSource, VarId, VariableResolver};

/// A lowered, directly executable formula body
#[derive(Debug, Clone)]
pub enum Program {
    /// Literal constant
    Const(f64),
    /// Direct read of a variable slot
    Load(VarId),
    /// Negation
    Neg(Box<Program>),
    /// Binary arithmetic
    Binary {
        op: BinaryOperator,
        left: Box<Program>,
        right: Box<Program>,
    },
    /// Call to a resolved function implementation
    Call {
        func: FunctionImpl,
        args: Vec<Program>,
    },
}

impl Program {
    /// Evaluate over the current values. Pure: the result depends only on
    /// the values read through `values`. Arithmetic follows IEEE binary64
    /// conventions and never fails.
    pub fn eval(&self, values: &dyn ValueSource) -> f64 {
        match self {
            Program::Const(n) => *n,
            Program::Load(id) => values.value(*id),
            Program::Neg(operand) => -operand.eval(values),
            Program::Binary { op, left, right } => {
                let l = left.eval(values);
                let r = right.eval(values);
                match op {
                    BinaryOperator::Add => l + r,
                    BinaryOperator::Subtract => l - r,
                    BinaryOperator::Multiply => l * r,
                    BinaryOperator::Divide => l / r,
                    BinaryOperator::Power => l.powf(r),
                }
            }
            Program::Call { func, args } => {
                let args: Vec<f64> = args.iter().map(|a| a.eval(values)).collect();
                func(&args)
            }
        }
    }
}

/// A compiled formula: the program plus the variables it captured
#[derive(Debug, Clone)]
pub struct CompiledFormula {
    /// Executable body
    pub program: Program,
    /// Referenced variable names
    pub variables: BTreeSet<String>,
    /// Resolved ids of the referenced variables, in first-reference order
    pub var_ids: Vec<VarId>,
}

impl Formula for CompiledFormula {
    fn eval(&self, values: &dyn ValueSource) -> f64 {
        self.program.eval(values)
    }

    fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(String::as_str).collect()
    }
}

/// Compile a parsed formula against a variable resolver and function table.
///
/// Fails with [`ExprError::UnknownVariable`], [`ExprError::UnknownFunction`]
/// or [`ExprError::ArgumentCount`]; on failure nothing has been registered
/// anywhere, so the caller's state is untouched.
pub fn compile(
    parsed: &ParsedFormula,
    resolver: &dyn VariableResolver,
    functions: &FunctionRegistry,
) -> ExprResult<CompiledFormula> {
    let mut lowering = Lowering {
        resolver,
        functions,
        var_ids: Vec::new(),
    };

    let program = lowering.lower(&parsed.expr)?;

    Ok(CompiledFormula {
        program,
        variables: parsed.variables.clone(),
        var_ids: lowering.var_ids,
    })
}

struct Lowering<'a> {
    resolver: &'a dyn VariableResolver,
    functions: &'a FunctionRegistry,
    var_ids: Vec<VarId>,
}

impl<'a> Lowering<'a> {
    fn lower(&mut self, expr: &Expr) -> ExprResult<Program> {
        match expr {
            Expr::Number(n) => Ok(Program::Const(*n)),

            Expr::Variable(name) => {
                let id = self
                    .resolver
                    .resolve(name)
                    .ok_or_else(|| ExprError::UnknownVariable(name.clone()))?;
                if !self.var_ids.contains(&id) {
                    self.var_ids.push(id);
                }
                Ok(Program::Load(id))
            }

            Expr::UnaryOp { op, operand } => {
                let operand = self.lower(operand)?;
                match op {
                    UnaryOperator::Negate => Ok(Program::Neg(Box::new(operand))),
                }
            }

            Expr::BinaryOp { op, left, right } => Ok(Program::Binary {
                op: *op,
                left: Box::new(self.lower(left)?),
                right: Box::new(self.lower(right)?),
            }),

            Expr::Function { name, args } => {
                let def = self
                    .functions
                    .get(name)
                    .ok_or_else(|| ExprError::UnknownFunction(name.clone()))?;

                if !def.arity_ok(args.len()) {
                    return Err(ExprError::ArgumentCount {
                        function: name.clone(),
                        expected: def.expected_args(),
                        actual: args.len(),
                    });
                }

                let args = args
                    .iter()
                    .map(|a| self.lower(a))
                    .collect::<ExprResult<Vec<_>>>()?;

                Ok(Program::Call {
                    func: def.implementation,
                    args,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::builtins;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;
    use varflow_core::VariableRegistry;

    fn eval_with(registry: &VariableRegistry, text: &str) -> f64 {
        let parsed = parse_formula(text).unwrap();
        let compiled = compile(&parsed, registry, builtins()).unwrap();
        compiled.program.eval(registry)
    }

    fn eval(text: &str) -> f64 {
        eval_with(&VariableRegistry::new(), text)
    }

    #[test]
    fn test_arithmetic_oracle() {
        assert_eq!(eval("2 + 3 * 4"), 14.0);
        assert_eq!(eval("(2 + 3) * 4"), 20.0);
        assert_eq!(eval("2 ^ 3 ^ 2"), 512.0);
        assert_eq!(eval("-2 ^ 2"), -4.0);
        assert_eq!(eval("2 ^ -2"), 0.25);
        assert_eq!(eval("8 - 3 - 2"), 3.0);
    }

    #[test]
    fn test_ieee_semantics() {
        assert_eq!(eval("10 / 0"), f64::INFINITY);
        assert_eq!(eval("-10 / 0"), f64::NEG_INFINITY);
        assert!(eval("0 / 0").is_nan());
        assert!(eval("(0 - 4) ^ 0.5").is_nan());
    }

    #[test]
    fn test_variable_loads() {
        let mut registry = VariableRegistry::new();
        registry.add_input("x", 3.0).unwrap();
        registry.add_input("y", 4.0).unwrap();

        assert_eq!(eval_with(&registry, "x * x + y * y"), 25.0);
    }

    #[test]
    fn test_function_calls() {
        let mut registry = VariableRegistry::new();
        registry.add_input("x", 9.0).unwrap();

        assert_eq!(eval_with(&registry, "sqrt(x)"), 3.0);
        assert_eq!(eval_with(&registry, "max(x, 10, 2)"), 10.0);
        assert_eq!(eval_with(&registry, "pi()"), std::f64::consts::PI);
    }

    #[test]
    fn test_captured_var_ids_deduplicated() {
        let mut registry = VariableRegistry::new();
        let x = registry.add_input("x", 1.0).unwrap();
        let y = registry.add_input("y", 2.0).unwrap();

        let parsed = parse_formula("x + x * y").unwrap();
        let compiled = compile(&parsed, &registry, builtins()).unwrap();

        assert_eq!(compiled.var_ids, vec![x, y]);
        let names: Vec<_> = compiled.variables.iter().cloned().collect();
        assert_eq!(names, ["x", "y"]);
    }

    #[test]
    fn test_unknown_variable() {
        let registry = VariableRegistry::new();
        let parsed = parse_formula("x + 1").unwrap();
        let err = compile(&parsed, &registry, builtins()).unwrap_err();
        assert_eq!(err, ExprError::UnknownVariable("x".into()));
    }

    #[test]
    fn test_unknown_function() {
        let registry = VariableRegistry::new();
        let parsed = parse_formula("frobnicate(1)").unwrap();
        let err = compile(&parsed, &registry, builtins()).unwrap_err();
        assert_eq!(err, ExprError::UnknownFunction("frobnicate".into()));
    }

    #[test]
    fn test_wrong_arity() {
        let registry = VariableRegistry::new();
        let parsed = parse_formula("sqrt(1, 2)").unwrap();
        let err = compile(&parsed, &registry, builtins()).unwrap_err();
        assert_eq!(
            err,
            ExprError::ArgumentCount {
                function: "sqrt".into(),
                expected: "1".into(),
                actual: 2,
            }
        );
    }

    #[test]
    fn test_referential_transparency() {
        let mut registry = VariableRegistry::new();
        registry.add_input("x", 0.3).unwrap();

        let parsed = parse_formula("sin(x) * cos(x) / (1 + x ^ 2)").unwrap();
        let compiled = compile(&parsed, &registry, builtins()).unwrap();

        let first = compiled.program.eval(&registry);
        let second = compiled.program.eval(&registry);
        assert_eq!(first.to_bits(), second.to_bits());
    }
}
