use crate::ast::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::context::EvaluationContext;
use crate::fault::{Fault, FailureReport};
use crate::parse;
use crate::value::Value;

/// The evaluate-and-capture capability a session runner drives.
///
/// One evaluator serves one example block: it owns whatever state the block
/// accumulates and is dropped with the block. Implementations append
/// whatever the session would display to `output`; text printed before a
/// fault stays in `output` when `Err` is returned.
pub trait Evaluator {
    fn eval(&mut self, input: &str, output: &mut String) -> Result<(), FailureReport>;
}

/// The built-in evaluator: an untyped expression language with
/// interactive-session echo, covering the constructs the corpus exercises.
#[derive(Debug, Default)]
pub struct Interpreter {
    context: EvaluationContext,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            context: EvaluationContext::new(),
        }
    }
}

impl Evaluator for Interpreter {
    fn eval(&mut self, input: &str, output: &mut String) -> Result<(), FailureReport> {
        let stmts = parse::parse_input(input)?;
        for stmt in stmts {
            match stmt {
                Stmt::Assign { target, value } => {
                    let v = self.eval_expr(&value, output)?;
                    self.context.set(&target, v);
                }
                Stmt::Expr(expr) => {
                    let v = self.eval_expr(&expr, output)?;
                    // A bare expression echoes its value, except None.
                    if !matches!(v, Value::None) {
                        output.push_str(&v.repr());
                        output.push('\n');
                    }
                }
            }
        }
        Ok(())
    }
}

impl Interpreter {
    fn eval_expr(&mut self, expr: &Expr, output: &mut String) -> Result<Value, Fault> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),

            Expr::Name(name) => self
                .context
                .get(name)
                .cloned()
                .ok_or_else(|| Fault::UndefinedName(name.clone())),

            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, output)?);
                }
                Ok(Value::List(values))
            }
            Expr::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, output)?);
                }
                Ok(Value::Tuple(values))
            }

            Expr::Unary { op, operand } => {
                let v = self.eval_expr(operand, output)?;
                match op {
                    UnaryOp::Neg => match v {
                        Value::Int(n) => Ok(Value::Int(-n)),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        Value::Bool(b) => Ok(Value::Int(-(b as i64))),
                        other => Err(Fault::TypeMismatch(format!(
                            "bad operand type for unary -: '{}'",
                            other.type_name()
                        ))),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
                }
            }

            Expr::Binary { op, left, right } => {
                // `and`/`or` short-circuit and yield an operand, not a bool.
                if *op == BinaryOp::And {
                    let l = self.eval_expr(left, output)?;
                    return if l.is_truthy() {
                        self.eval_expr(right, output)
                    } else {
                        Ok(l)
                    };
                }
                if *op == BinaryOp::Or {
                    let l = self.eval_expr(left, output)?;
                    return if l.is_truthy() {
                        Ok(l)
                    } else {
                        self.eval_expr(right, output)
                    };
                }
                let l = self.eval_expr(left, output)?;
                let r = self.eval_expr(right, output)?;
                eval_binary(*op, l, r)
            }

            Expr::Attribute { target, name } => {
                // A bound-method reference is only useful when called.
                let v = self.eval_expr(target, output)?;
                if method_exists(&v, name) {
                    Err(Fault::TypeMismatch(format!(
                        "method '{}' of '{}' object must be called",
                        name,
                        v.type_name()
                    )))
                } else {
                    Err(Fault::UnknownAttribute {
                        type_name: v.type_name().to_string(),
                        attribute: name.clone(),
                    })
                }
            }

            Expr::Call { callee, args } => self.eval_call(callee, args, output),

            Expr::Index { target, index } => {
                let t = self.eval_expr(target, output)?;
                let idx = self.eval_expr(index, output)?;
                eval_index(&t, &idx)
            }
        }
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        output: &mut String,
    ) -> Result<Value, Fault> {
        match callee {
            Expr::Attribute { target, name } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, output)?);
                }
                // Mutating methods write the updated value back when the
                // target is a plain name; on a temporary the result is
                // simply discarded with the temporary.
                if let Expr::Name(var) = target.as_ref() {
                    let mut v = self
                        .context
                        .get(var)
                        .cloned()
                        .ok_or_else(|| Fault::UndefinedName(var.clone()))?;
                    let result = call_method(&mut v, name, values)?;
                    self.context.set(var, v);
                    Ok(result)
                } else {
                    let mut v = self.eval_expr(target, output)?;
                    call_method(&mut v, name, values)
                }
            }
            Expr::Name(name) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, output)?);
                }
                match name.as_str() {
                    "print" => {
                        let parts: Vec<String> =
                            values.iter().map(|v| v.to_string()).collect();
                        output.push_str(&parts.join(" "));
                        output.push('\n');
                        Ok(Value::None)
                    }
                    "len" => {
                        let [v] = values.as_slice() else {
                            return Err(Fault::TypeMismatch(format!(
                                "len() takes exactly one argument ({} given)",
                                values.len()
                            )));
                        };
                        match v {
                            Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                            Value::List(items) | Value::Tuple(items) => {
                                Ok(Value::Int(items.len() as i64))
                            }
                            other => Err(Fault::TypeMismatch(format!(
                                "object of type '{}' has no len()",
                                other.type_name()
                            ))),
                        }
                    }
                    "abs" => {
                        let [v] = values.as_slice() else {
                            return Err(Fault::TypeMismatch(format!(
                                "abs() takes exactly one argument ({} given)",
                                values.len()
                            )));
                        };
                        match v {
                            Value::Int(n) => Ok(Value::Int(n.abs())),
                            Value::Float(f) => Ok(Value::Float(f.abs())),
                            other => Err(Fault::TypeMismatch(format!(
                                "bad operand type for abs(): '{}'",
                                other.type_name()
                            ))),
                        }
                    }
                    "int" => {
                        let [v] = values.as_slice() else {
                            return Err(Fault::TypeMismatch(format!(
                                "int() takes exactly one argument ({} given)",
                                values.len()
                            )));
                        };
                        match v {
                            Value::Int(n) => Ok(Value::Int(*n)),
                            Value::Float(f) => Ok(Value::Int(*f as i64)),
                            Value::Bool(b) => Ok(Value::Int(*b as i64)),
                            Value::Str(s) => {
                                s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                                    Fault::InvalidValue(format!(
                                        "invalid literal for int() with base 10: '{}'",
                                        s
                                    ))
                                })
                            }
                            other => Err(Fault::TypeMismatch(format!(
                                "int() argument must be a string or a number, not '{}'",
                                other.type_name()
                            ))),
                        }
                    }
                    _ => match self.context.get(name) {
                        Some(v) => Err(Fault::TypeMismatch(format!(
                            "'{}' object is not callable",
                            v.type_name()
                        ))),
                        None => Err(Fault::UndefinedName(name.clone())),
                    },
                }
            }
            other_expr => {
                let v = self.eval_expr(other_expr, output)?;
                Err(Fault::TypeMismatch(format!(
                    "'{}' object is not callable",
                    v.type_name()
                )))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

fn eval_binary(op: BinaryOp, l: Value, r: Value) -> Result<Value, Fault> {
    match op {
        BinaryOp::Add => match (l, r) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Ok(Value::List(a))
            }
            (Value::Tuple(mut a), Value::Tuple(b)) => {
                a.extend(b);
                Ok(Value::Tuple(a))
            }
            (l, r) => numeric_op(op, l, r),
        },
        BinaryOp::Mul => match (&l, &r) {
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                Ok(Value::Str(s.repeat((*n).max(0) as usize)))
            }
            (Value::List(items), Value::Int(n)) | (Value::Int(n), Value::List(items)) => {
                let mut out = Vec::new();
                for _ in 0..(*n).max(0) {
                    out.extend(items.iter().cloned());
                }
                Ok(Value::List(out))
            }
            _ => numeric_op(op, l, r),
        },
        BinaryOp::Sub | BinaryOp::TrueDiv | BinaryOp::FloorDiv | BinaryOp::Mod | BinaryOp::Pow => {
            numeric_op(op, l, r)
        }
        BinaryOp::Eq => Ok(Value::Bool(l == r)),
        BinaryOp::Ne => Ok(Value::Bool(l != r)),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => compare(op, l, r),
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators handled by caller"),
    }
}

/// Arithmetic on ints and floats; bools coerce to ints the way sessions
/// expect. Integer overflow falls back to float arithmetic.
fn numeric_op(op: BinaryOp, l: Value, r: Value) -> Result<Value, Fault> {
    let type_error = |l: &Value, r: &Value| {
        Fault::TypeMismatch(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op_symbol(op),
            l.type_name(),
            r.type_name()
        ))
    };

    match (as_number(&l), as_number(&r)) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => int_op(op, a, b),
        (Some(a), Some(b)) => float_op(op, a.as_f64(), b.as_f64()),
        _ => Err(type_error(&l, &r)),
    }
}

enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(&self) -> f64 {
        match self {
            Number::Int(n) => *n as f64,
            Number::Float(f) => *f,
        }
    }
}

fn as_number(v: &Value) -> Option<Number> {
    match v {
        Value::Int(n) => Some(Number::Int(*n)),
        Value::Float(f) => Some(Number::Float(*f)),
        Value::Bool(b) => Some(Number::Int(*b as i64)),
        _ => None,
    }
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> Result<Value, Fault> {
    match op {
        BinaryOp::Add => Ok(a
            .checked_add(b)
            .map(Value::Int)
            .unwrap_or(Value::Float(a as f64 + b as f64))),
        BinaryOp::Sub => Ok(a
            .checked_sub(b)
            .map(Value::Int)
            .unwrap_or(Value::Float(a as f64 - b as f64))),
        BinaryOp::Mul => Ok(a
            .checked_mul(b)
            .map(Value::Int)
            .unwrap_or(Value::Float(a as f64 * b as f64))),
        BinaryOp::TrueDiv => {
            if b == 0 {
                Err(Fault::DivisionByZero("division by zero".into()))
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                Err(Fault::DivisionByZero(
                    "integer division or modulo by zero".into(),
                ))
            } else {
                Ok(Value::Int(floor_div(a, b)))
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                Err(Fault::DivisionByZero(
                    "integer division or modulo by zero".into(),
                ))
            } else {
                Ok(Value::Int(a - floor_div(a, b) * b))
            }
        }
        BinaryOp::Pow => {
            if b < 0 {
                Ok(Value::Float((a as f64).powf(b as f64)))
            } else {
                match u32::try_from(b).ok().and_then(|e| a.checked_pow(e)) {
                    Some(n) => Ok(Value::Int(n)),
                    None => Ok(Value::Float((a as f64).powf(b as f64))),
                }
            }
        }
        _ => unreachable!("non-arithmetic operator in int_op"),
    }
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> Result<Value, Fault> {
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::TrueDiv => {
            if b == 0.0 {
                Err(Fault::DivisionByZero("float division by zero".into()))
            } else {
                Ok(Value::Float(a / b))
            }
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                Err(Fault::DivisionByZero("float floor division by zero".into()))
            } else {
                Ok(Value::Float((a / b).floor()))
            }
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                Err(Fault::DivisionByZero("float modulo".into()))
            } else {
                Ok(Value::Float(a - (a / b).floor() * b))
            }
        }
        BinaryOp::Pow => Ok(Value::Float(a.powf(b))),
        _ => unreachable!("non-arithmetic operator in float_op"),
    }
}

/// Floor division rounding toward negative infinity.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn compare(op: BinaryOp, l: Value, r: Value) -> Result<Value, Fault> {
    let ord = match (&l, &r) {
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        (l, r) => match (as_number(l), as_number(r)) {
            (Some(a), Some(b)) => a.as_f64().partial_cmp(&b.as_f64()),
            _ => {
                return Err(Fault::TypeMismatch(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    op_symbol(op),
                    l.type_name(),
                    r.type_name()
                )));
            }
        },
    };
    let Some(ord) = ord else {
        return Ok(Value::Bool(false)); // NaN comparisons
    };
    Ok(Value::Bool(match op {
        BinaryOp::Lt => ord.is_lt(),
        BinaryOp::Gt => ord.is_gt(),
        BinaryOp::Le => ord.is_le(),
        BinaryOp::Ge => ord.is_ge(),
        _ => unreachable!("non-comparison operator in compare"),
    }))
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::TrueDiv => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Mod => "%",
        BinaryOp::Pow => "**",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::Le => "<=",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

// ---------------------------------------------------------------------------
// Methods
// ---------------------------------------------------------------------------

fn method_exists(v: &Value, name: &str) -> bool {
    match v {
        Value::List(_) => matches!(name, "append" | "pop"),
        Value::Str(_) => matches!(name, "upper" | "lower"),
        _ => false,
    }
}

fn call_method(v: &mut Value, name: &str, mut args: Vec<Value>) -> Result<Value, Fault> {
    match (&mut *v, name) {
        (Value::List(items), "append") => {
            if args.len() != 1 {
                return Err(Fault::TypeMismatch(format!(
                    "append() takes exactly one argument ({} given)",
                    args.len()
                )));
            }
            items.push(args.remove(0));
            Ok(Value::None)
        }
        (Value::List(items), "pop") => {
            if !args.is_empty() {
                return Err(Fault::TypeMismatch(
                    "pop() takes no arguments".into(),
                ));
            }
            items
                .pop()
                .ok_or_else(|| Fault::IndexOutOfRange("pop from empty list".into()))
        }
        (Value::Str(s), "upper") => Ok(Value::Str(s.to_uppercase())),
        (Value::Str(s), "lower") => Ok(Value::Str(s.to_lowercase())),
        (v, name) => Err(Fault::UnknownAttribute {
            type_name: v.type_name().to_string(),
            attribute: name.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Indexing
// ---------------------------------------------------------------------------

fn eval_index(target: &Value, index: &Value) -> Result<Value, Fault> {
    let items: &[Value] = match target {
        Value::List(items) | Value::Tuple(items) => items,
        Value::Str(s) => {
            let Value::Int(i) = index else {
                return Err(Fault::TypeMismatch(
                    "string indices must be integers".into(),
                ));
            };
            let chars: Vec<char> = s.chars().collect();
            let pos = resolve_index(*i, chars.len())
                .ok_or_else(|| Fault::IndexOutOfRange("string index out of range".into()))?;
            return Ok(Value::Str(chars[pos].to_string()));
        }
        other => {
            return Err(Fault::TypeMismatch(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            )));
        }
    };
    let Value::Int(i) = index else {
        return Err(Fault::TypeMismatch(format!(
            "{} indices must be integers",
            target.type_name()
        )));
    };
    let pos = resolve_index(*i, items.len()).ok_or_else(|| {
        Fault::IndexOutOfRange(format!("{} index out of range", target.type_name()))
    })?;
    Ok(items[pos].clone())
}

/// Negative indices count from the end.
fn resolve_index(i: i64, len: usize) -> Option<usize> {
    let idx = if i < 0 { i + len as i64 } else { i };
    if idx < 0 || idx as usize >= len {
        None
    } else {
        Some(idx as usize)
    }
}
