use std::fmt;

use doctest::session::TRACEBACK_HEADER;

/// A runtime failure raised by a statement's own input.
///
/// Kind names follow the corpus convention so expected failure headers in
/// doc comments compare byte-exact.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    DivisionByZero(String),
    TypeMismatch(String),
    UndefinedName(String),
    UnknownAttribute { type_name: String, attribute: String },
    IndexOutOfRange(String),
    InvalidValue(String),
    InvalidSyntax(String),
}

impl Fault {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Fault::DivisionByZero(_) => "ZeroDivisionError",
            Fault::TypeMismatch(_) => "TypeError",
            Fault::UndefinedName(_) => "NameError",
            Fault::UnknownAttribute { .. } => "AttributeError",
            Fault::IndexOutOfRange(_) => "IndexError",
            Fault::InvalidValue(_) => "ValueError",
            Fault::InvalidSyntax(_) => "SyntaxError",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Fault::DivisionByZero(msg)
            | Fault::TypeMismatch(msg)
            | Fault::IndexOutOfRange(msg)
            | Fault::InvalidValue(msg)
            | Fault::InvalidSyntax(msg) => msg.clone(),
            Fault::UndefinedName(name) => format!("name '{}' is not defined", name),
            Fault::UnknownAttribute {
                type_name,
                attribute,
            } => {
                format!("'{}' object has no attribute '{}'", type_name, attribute)
            }
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind_name(), self.message())
    }
}

impl std::error::Error for Fault {}

/// The structured failure report a session displays when a statement fails:
/// the failure kind name and its final message line. The stack-trace detail
/// in between is inherently non-reproducible and is never compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub kind: String,
    pub message: String,
}

impl FailureReport {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        FailureReport {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// The last line of the rendered report.
    pub fn final_line(&self) -> String {
        if self.message.is_empty() {
            self.kind.clone()
        } else {
            format!("{}: {}", self.kind, self.message)
        }
    }

    /// The report as a session displays it, trailing newline included.
    pub fn render(&self) -> String {
        format!("{}\n...\n{}\n", TRACEBACK_HEADER, self.final_line())
    }
}

impl From<Fault> for FailureReport {
    fn from(fault: Fault) -> Self {
        FailureReport::new(fault.kind_name(), fault.message())
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.final_line())
    }
}
