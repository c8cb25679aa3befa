//! Model terms and the `y ~ a + b` formula syntax
//!
//! [`Formula::parse`] is a convenience at the boundary. Everything downstream
//! works on the structured [`Term`] list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A predictor term
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    /// A single column
    Column(String),
    /// Product of two or more columns
    Interaction(Vec<String>),
}

impl Term {
    pub fn column(name: impl Into<String>) -> Self {
        Term::Column(name.into())
    }

    /// Interaction of the named columns. A single name gives a plain column
    /// term and repeated names collapse.
    pub fn interaction(names: &[&str]) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !unique.iter().any(|u| u == name) {
                unique.push(name.to_string());
            }
        }
        if unique.len() == 1 {
            Term::Column(unique.remove(0))
        } else {
            Term::Interaction(unique)
        }
    }

    /// Constituent column names
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Term::Column(name) => vec![name.as_str()],
            Term::Interaction(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// Label used in coefficient and ANOVA tables, e.g. `a:b`
    pub fn label(&self) -> String {
        self.columns().join(":")
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Response, terms and intercept flag of a linear model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub response: String,
    pub terms: Vec<Term>,
    pub intercept: bool,
}

impl Formula {
    pub fn new(response: impl Into<String>, terms: Vec<Term>) -> Self {
        Formula {
            response: response.into(),
            terms,
            intercept: true,
        }
    }

    pub fn without_intercept(mut self) -> Self {
        self.intercept = false;
        self
    }

    /// Parse `response ~ rhs`.
    ///
    /// The right-hand side supports `+` (add a term), `:` (interaction), `*`
    /// (main effects plus all interactions), `- term` (remove a term),
    /// `- 1` / `+ 0` (drop the intercept) and `1` (keep it).
    pub fn parse(formula: &str) -> Result<Formula> {
        let fail = |reason: &str| Error::FormulaParse {
            formula: formula.to_string(),
            reason: reason.to_string(),
        };

        let mut sides = formula.split('~');
        let (lhs, rhs) = match (sides.next(), sides.next(), sides.next()) {
            (Some(lhs), Some(rhs), None) => (lhs.trim(), rhs.trim()),
            (_, None, _) => return Err(fail("missing '~'")),
            _ => return Err(fail("more than one '~'")),
        };
        if lhs.is_empty() {
            return Err(fail("missing response"));
        }
        if !is_name(lhs) {
            return Err(fail("response must be a single column name"));
        }
        if rhs.is_empty() {
            return Err(fail("missing right-hand side"));
        }

        let tokens = tokenize(rhs).map_err(|reason| fail(&reason))?;
        let mut parser = Parser { tokens, pos: 0 };
        let mut result = Formula::new(lhs, Vec::new());

        let mut sign = match parser.peek() {
            Some(Token::Minus) => {
                parser.pos += 1;
                Sign::Minus
            }
            Some(Token::Plus) => {
                parser.pos += 1;
                Sign::Plus
            }
            _ => Sign::Plus,
        };

        loop {
            let item = parser.product().map_err(|reason| fail(&reason))?;
            match (item, sign) {
                (Item::Constant(one), Sign::Plus) => result.intercept = one,
                (Item::Constant(one), Sign::Minus) => result.intercept = !one,
                (Item::Terms(terms), Sign::Plus) => {
                    for term in terms {
                        if !result.terms.contains(&term) {
                            result.terms.push(term);
                        }
                    }
                }
                (Item::Terms(terms), Sign::Minus) => {
                    result.terms.retain(|t| !terms.contains(t));
                }
            }

            sign = match parser.next() {
                None => break,
                Some(Token::Plus) => Sign::Plus,
                Some(Token::Minus) => Sign::Minus,
                Some(other) => return Err(fail(&format!("unexpected '{}'", other))),
            };
        }

        Ok(result)
    }
}

impl FromStr for Formula {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Formula::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ ", self.response)?;
        let labels: Vec<String> = self.terms.iter().map(Term::label).collect();
        match (labels.is_empty(), self.intercept) {
            (true, true) => write!(f, "1"),
            (true, false) => write!(f, "0"),
            (false, true) => write!(f, "{}", labels.join(" + ")),
            (false, false) => write!(f, "{} - 1", labels.join(" + ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Plus,
    Minus,
    Colon,
    Star,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => f.write_str(name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Colon => f.write_str(":"),
            Token::Star => f.write_str("*"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Sign {
    Plus,
    Minus,
}

enum Item {
    /// `1` (true) or `0` (false)
    Constant(bool),
    Terms(Vec<Term>),
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn is_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_name_char)
}

fn tokenize(rhs: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = rhs.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            c if is_name_char(c) => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_name_char(c) {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                tokens.push(Token::Name(name));
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// `factor ('*' factor)*` where a factor is `name (':' name)*`
    fn product(&mut self) -> std::result::Result<Item, String> {
        let mut factors: Vec<Vec<String>> = Vec::new();
        loop {
            let factor = self.interaction()?;
            factors.push(factor);
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                }
                _ => break,
            }
        }

        if factors.len() == 1 && factors[0].len() == 1 {
            match factors[0][0].as_str() {
                "1" => return Ok(Item::Constant(true)),
                "0" => return Ok(Item::Constant(false)),
                _ => {}
            }
        }
        if factors.iter().flatten().any(|n| n == "0" || n == "1") {
            return Err("constants cannot appear inside ':' or '*'".to_string());
        }

        Ok(Item::Terms(expand_product(&factors)))
    }

    fn interaction(&mut self) -> std::result::Result<Vec<String>, String> {
        let mut names = Vec::new();
        loop {
            match self.next() {
                Some(Token::Name(name)) => names.push(name),
                Some(other) => return Err(format!("expected a column name, found '{}'", other)),
                None => return Err("expected a column name at end of formula".to_string()),
            }
            match self.peek() {
                Some(Token::Colon) => {
                    self.pos += 1;
                }
                _ => return Ok(names),
            }
        }
    }
}

/// `a * b * c` expands to every non-empty subset of the factors, lower
/// orders first: a, b, c, a:b, a:c, b:c, a:b:c
fn expand_product(factors: &[Vec<String>]) -> Vec<Term> {
    let k = factors.len();
    let mut subsets: Vec<Vec<usize>> = (1u32..(1 << k))
        .map(|mask| (0..k).filter(|i| mask & (1 << i) != 0).collect())
        .collect();
    subsets.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    let mut terms: Vec<Term> = Vec::new();
    for subset in subsets {
        let names: Vec<&str> = subset
            .iter()
            .flat_map(|&i| factors[i].iter().map(String::as_str))
            .collect();
        let term = Term::interaction(&names);
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_terms() {
        let f = Formula::parse("y ~ a + b + a:b").unwrap();
        assert_eq!(f.response, "y");
        assert_eq!(
            f.terms,
            vec![
                Term::column("a"),
                Term::column("b"),
                Term::interaction(&["a", "b"])
            ]
        );
        assert!(f.intercept);
        assert_eq!(f.to_string(), "y ~ a + b + a:b");
    }

    #[test]
    fn test_star_expands() {
        let f: Formula = "len ~ supp * dose".parse().unwrap();
        assert_eq!(
            f.terms,
            vec![
                Term::column("supp"),
                Term::column("dose"),
                Term::interaction(&["supp", "dose"])
            ]
        );

        let three = Formula::parse("y ~ a*b*c").unwrap();
        let labels: Vec<String> = three.terms.iter().map(Term::label).collect();
        assert_eq!(labels, vec!["a", "b", "c", "a:b", "a:c", "b:c", "a:b:c"]);
    }

    #[test]
    fn test_intercept_controls() {
        assert!(!Formula::parse("y ~ x - 1").unwrap().intercept);
        assert!(!Formula::parse("y ~ 0 + x").unwrap().intercept);
        assert!(!Formula::parse("y ~ x + 0").unwrap().intercept);
        let only = Formula::parse("y ~ 1").unwrap();
        assert!(only.intercept);
        assert!(only.terms.is_empty());
    }

    #[test]
    fn test_removal() {
        let f = Formula::parse("y ~ a * b - a:b").unwrap();
        assert_eq!(f.terms, vec![Term::column("a"), Term::column("b")]);
    }

    #[test]
    fn test_errors() {
        for bad in ["y a", "~ a", "y ~", "y ~ a +", "y ~ a ++ b", "y ~ a:1", "y ~ a $ b", "y ~ a ~ b", "y + z ~ a"] {
            assert!(
                matches!(Formula::parse(bad), Err(Error::FormulaParse { .. })),
                "{bad} should fail"
            );
        }
    }
}
