// Predicate Support
//
// Three-valued truth and LIKE pattern matching, the two building blocks the
// expression evaluator uses for WHERE, ON and HAVING conditions.

use std::fmt;
use std::ops::Not;

use crate::query::executor::result::DataValue;

/// Result of a SQL condition: true, false or unknown (NULL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    /// Three-valued AND: false dominates, then unknown
    pub fn and(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::False, _) | (_, Truth::False) => Truth::False,
            (Truth::True, Truth::True) => Truth::True,
            _ => Truth::Unknown,
        }
    }

    /// Three-valued OR: true dominates, then unknown
    pub fn or(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::True, _) | (_, Truth::True) => Truth::True,
            (Truth::False, Truth::False) => Truth::False,
            _ => Truth::Unknown,
        }
    }

    /// Only `True` keeps a row
    pub fn is_true(self) -> bool {
        self == Truth::True
    }

    /// Interpret a value as a condition result. NULL is unknown; anything
    /// that is not a boolean yields `None`.
    pub fn from_value(value: &DataValue) -> Option<Truth> {
        match value {
            DataValue::Null => Some(Truth::Unknown),
            DataValue::Boolean(b) => Some(Truth::from(*b)),
            _ => None,
        }
    }

    /// The value form of this truth: unknown becomes NULL
    pub fn into_value(self) -> DataValue {
        match self {
            Truth::True => DataValue::Boolean(true),
            Truth::False => DataValue::Boolean(false),
            Truth::Unknown => DataValue::Null,
        }
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value { Truth::True } else { Truth::False }
    }
}

impl Not for Truth {
    type Output = Truth;

    fn not(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Truth::True => write!(f, "TRUE"),
            Truth::False => write!(f, "FALSE"),
            Truth::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PatternToken {
    /// `%`
    AnySequence,
    /// `_`
    AnyChar,
    Literal(char),
}

/// A compiled LIKE pattern, anchored at both ends
#[derive(Debug, Clone, PartialEq)]
pub struct LikePattern {
    tokens: Vec<PatternToken>,
    case_sensitive: bool,
}

impl LikePattern {
    /// Compile `%` (zero or more characters) and `_` (exactly one)
    pub fn compile(pattern: &str, case_sensitive: bool) -> Self {
        let mut tokens = Vec::with_capacity(pattern.len());
        for c in pattern.chars() {
            let token = match c {
                '%' => PatternToken::AnySequence,
                '_' => PatternToken::AnyChar,
                c => PatternToken::Literal(c),
            };
            // Runs of % collapse into one
            if token == PatternToken::AnySequence && tokens.last() == Some(&PatternToken::AnySequence) {
                continue;
            }
            tokens.push(token);
        }
        LikePattern { tokens, case_sensitive }
    }

    /// Match the whole of `text` against the pattern
    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let n = self.tokens.len();

        // reachable[j]: tokens[..j] can consume the text read so far
        let mut reachable = vec![false; n + 1];
        reachable[0] = true;
        for j in 0..n {
            if self.tokens[j] == PatternToken::AnySequence {
                reachable[j + 1] = reachable[j];
            } else {
                break;
            }
        }

        for &c in &text {
            let mut next = vec![false; n + 1];
            for j in 0..n {
                next[j + 1] = match &self.tokens[j] {
                    PatternToken::AnySequence => next[j] || reachable[j + 1],
                    PatternToken::AnyChar => reachable[j],
                    PatternToken::Literal(p) => reachable[j] && self.char_eq(*p, c),
                };
            }
            reachable = next;
        }
        reachable[n]
    }

    fn char_eq(&self, a: char, b: char) -> bool {
        if self.case_sensitive {
            a == b
        } else {
            a == b || a.to_lowercase().eq(b.to_lowercase())
        }
    }
}
