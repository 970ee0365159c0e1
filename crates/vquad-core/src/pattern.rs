//! Structured queries over the current view.
//!
//! [`QueryTranslator`] is the seam where a full query-language engine plugs
//! in. [`QuadPatternTranslator`] is the built-in engine: it evaluates a union
//! of quad patterns.
//!
//! ```text
//! [SELECT * [WHERE]] { ?s <http://ex/p> ?o . ?s a <http://ex/C> ?g }
//! ```
//!
//! Each pattern has three or four slots (subject, predicate, object and
//! optionally graph), separated from the next pattern by `.`. A slot is a
//! variable (`?x` / `$x`), an IRI (`<...>`), a literal (`"..."` with
//! optional `@lang` or `^^<datatype>`), a blank node (`_:b`), `a` for
//! `rdf:type` in predicate position, or `DEFAULT` in graph position. A
//! variable repeated within one pattern must bind the same term.

use std::{collections::HashMap, iter::Peekable, str::Chars};

use crate::{
  Error, Result,
  quad::AnnotatedQuad,
  term::{GraphName, RDF_TYPE, Term, XSD_STRING},
};

/// Evaluates query text against the facts valid at the newest version.
pub trait QueryTranslator: Send + Sync {
  fn evaluate(
    &self,
    query: &str,
    current: &[AnnotatedQuad],
  ) -> Result<Vec<AnnotatedQuad>>;
}

/// The built-in translator; see the module docs for the accepted syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadPatternTranslator;

impl QueryTranslator for QuadPatternTranslator {
  fn evaluate(
    &self,
    query: &str,
    current: &[AnnotatedQuad],
  ) -> Result<Vec<AnnotatedQuad>> {
    let patterns = parse(query)?;
    Ok(
      current
        .iter()
        .filter(|quad| patterns.iter().any(|p| p.matches(quad)))
        .cloned()
        .collect(),
    )
  }
}

fn invalid(msg: impl Into<String>) -> Error { Error::InvalidQuery(msg.into()) }

// ─── Pattern model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Slot<T> {
  Var(String),
  Fixed(T),
}

#[derive(Debug, Clone, PartialEq)]
struct QuadPattern {
  subject:   Slot<Term>,
  predicate: Slot<Term>,
  object:    Slot<Term>,
  graph:     Option<Slot<GraphName>>,
}

/// A value bound to a variable; terms and graphs share one namespace.
#[derive(Debug, PartialEq)]
enum Bound<'q> {
  Term(&'q Term),
  Graph(&'q GraphName),
}

type Bindings<'p, 'q> = HashMap<&'p str, Bound<'q>>;

fn bind<'p, 'q, T: PartialEq>(
  slot: &'p Slot<T>,
  value: &'q T,
  wrap: impl Fn(&'q T) -> Bound<'q>,
  bindings: &mut Bindings<'p, 'q>,
) -> bool {
  match slot {
    Slot::Fixed(expected) => expected == value,
    Slot::Var(name) => {
      let bound = wrap(value);
      match bindings.get(name.as_str()) {
        Some(existing) => *existing == bound,
        None => {
          bindings.insert(name.as_str(), bound);
          true
        }
      }
    }
  }
}

impl QuadPattern {
  fn matches(&self, quad: &AnnotatedQuad) -> bool {
    let mut bindings = Bindings::new();
    bind(&self.subject, &quad.subject, Bound::Term, &mut bindings)
      && bind(&self.predicate, &quad.predicate, Bound::Term, &mut bindings)
      && bind(&self.object, &quad.object, Bound::Term, &mut bindings)
      && self
        .graph
        .as_ref()
        .is_none_or(|g| bind(g, &quad.graph, Bound::Graph, &mut bindings))
  }
}

// ─── Lexer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
  Iri(String),
  Literal(Term),
  Blank(String),
  Var(String),
  Word(String),
  Dot,
  Open,
  Close,
  Star,
}

fn is_name_char(c: char) -> bool { c.is_alphanumeric() || c == '_' || c == '-' }

fn take_name(chars: &mut Peekable<Chars<'_>>) -> String {
  let mut name = String::new();
  while let Some(&c) = chars.peek() {
    if !is_name_char(c) {
      break;
    }
    name.push(c);
    chars.next();
  }
  name
}

fn take_iri(chars: &mut Peekable<Chars<'_>>) -> Result<String> {
  let mut iri = String::new();
  for c in chars.by_ref() {
    if c == '>' {
      return Ok(iri);
    }
    iri.push(c);
  }
  Err(invalid(format!("unterminated IRI <{iri}")))
}

fn take_literal(chars: &mut Peekable<Chars<'_>>) -> Result<Term> {
  let mut value = String::new();
  loop {
    match chars.next() {
      None => return Err(invalid(format!("unterminated literal \"{value}"))),
      Some('"') => break,
      Some('\\') => match chars.next() {
        Some('n') => value.push('\n'),
        Some('r') => value.push('\r'),
        Some('t') => value.push('\t'),
        Some(c @ ('"' | '\\')) => value.push(c),
        other => return Err(invalid(format!("bad escape \\{other:?}"))),
      },
      Some(c) => value.push(c),
    }
  }

  match chars.peek() {
    Some('@') => {
      chars.next();
      let lang = take_name(chars);
      if lang.is_empty() {
        return Err(invalid("empty language tag"));
      }
      Ok(Term::lang_literal(value, lang))
    }
    Some('^') => {
      chars.next();
      if chars.next() != Some('^') || chars.next() != Some('<') {
        return Err(invalid("expected ^^<datatype> after literal"));
      }
      Ok(Term::typed_literal(value, take_iri(chars)?))
    }
    _ => Ok(Term::typed_literal(value, XSD_STRING)),
  }
}

fn tokenize(query: &str) -> Result<Vec<Token>> {
  let mut tokens = Vec::new();
  let mut chars = query.chars().peekable();

  while let Some(&c) = chars.peek() {
    if c.is_whitespace() {
      chars.next();
      continue;
    }
    chars.next();
    let token = match c {
      '<' => Token::Iri(take_iri(&mut chars)?),
      '"' => Token::Literal(take_literal(&mut chars)?),
      '?' | '$' => {
        let name = take_name(&mut chars);
        if name.is_empty() {
          return Err(invalid("variable without a name"));
        }
        Token::Var(name)
      }
      '_' if chars.peek() == Some(&':') => {
        chars.next();
        Token::Blank(take_name(&mut chars))
      }
      '.' => Token::Dot,
      '{' => Token::Open,
      '}' => Token::Close,
      '*' => Token::Star,
      c if c.is_alphabetic() => {
        let mut word = c.to_string();
        word.push_str(&take_name(&mut chars));
        Token::Word(word)
      }
      other => return Err(invalid(format!("unexpected character {other:?}"))),
    };
    tokens.push(token);
  }

  Ok(tokens)
}

// ─── Parser ──────────────────────────────────────────────────────────────────

fn is_word(token: Option<&Token>, word: &str) -> bool {
  matches!(token, Some(Token::Word(w)) if w.eq_ignore_ascii_case(word))
}

fn term_slot(token: Token, position: &str) -> Result<Slot<Term>> {
  match token {
    Token::Var(name) => Ok(Slot::Var(name)),
    Token::Iri(iri) => Ok(Slot::Fixed(Term::Iri(iri))),
    Token::Blank(id) => Ok(Slot::Fixed(Term::BlankNode(id))),
    Token::Literal(term) => Ok(Slot::Fixed(term)),
    Token::Word(w) if position == "predicate" && w == "a" => {
      Ok(Slot::Fixed(Term::iri(RDF_TYPE)))
    }
    other => Err(invalid(format!("unexpected {other:?} in {position} position"))),
  }
}

fn graph_slot(token: Token) -> Result<Slot<GraphName>> {
  match token {
    Token::Var(name) => Ok(Slot::Var(name)),
    Token::Iri(iri) => Ok(Slot::Fixed(GraphName::Named(iri))),
    Token::Word(w) if w.eq_ignore_ascii_case("default") => {
      Ok(Slot::Fixed(GraphName::Default))
    }
    other => Err(invalid(format!("unexpected {other:?} in graph position"))),
  }
}

fn pattern(slots: Vec<Token>) -> Result<QuadPattern> {
  let count = slots.len();
  if !(3..=4).contains(&count) {
    return Err(invalid(format!("pattern has {count} terms, expected 3 or 4")));
  }
  let mut slots = slots.into_iter();
  let mut next = || slots.next().ok_or_else(|| invalid("truncated pattern"));
  Ok(QuadPattern {
    subject:   term_slot(next()?, "subject")?,
    predicate: term_slot(next()?, "predicate")?,
    object:    term_slot(next()?, "object")?,
    graph:     if count == 4 { Some(graph_slot(next()?)?) } else { None },
  })
}

fn parse(query: &str) -> Result<Vec<QuadPattern>> {
  let mut tokens = tokenize(query)?.into_iter().peekable();

  if is_word(tokens.peek(), "select") {
    tokens.next();
    while matches!(tokens.peek(), Some(Token::Star | Token::Var(_))) {
      tokens.next();
    }
    if is_word(tokens.peek(), "where") {
      tokens.next();
    }
    if tokens.peek() != Some(&Token::Open) {
      return Err(invalid("expected WHERE or '{' after SELECT"));
    }
  }

  let braced = tokens.peek() == Some(&Token::Open);
  if braced {
    tokens.next();
  }

  let mut patterns = Vec::new();
  let mut current = Vec::new();
  let mut closed = false;
  for token in tokens.by_ref() {
    match token {
      Token::Dot => {
        if !current.is_empty() {
          patterns.push(pattern(std::mem::take(&mut current))?);
        }
      }
      Token::Close if braced => {
        closed = true;
        break;
      }
      Token::Open | Token::Close | Token::Star => {
        return Err(invalid(format!("unexpected {token:?}")));
      }
      slot => current.push(slot),
    }
  }
  if !current.is_empty() {
    patterns.push(pattern(current)?);
  }

  if braced && !closed {
    return Err(invalid("missing closing brace"));
  }
  if let Some(extra) = tokens.next() {
    return Err(invalid(format!("unexpected {extra:?} after closing brace")));
  }
  if patterns.is_empty() {
    return Err(invalid("query contains no patterns"));
  }
  Ok(patterns)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::validity::Validity;

  fn ex(local: &str) -> Term { Term::iri(format!("http://example.org/{local}")) }

  fn fact(s: Term, p: Term, o: Term, g: GraphName) -> AnnotatedQuad {
    AnnotatedQuad {
      subject:   s,
      predicate: p,
      object:    o,
      graph:     g,
      validity:  Validity::zeros(1),
    }
  }

  fn sample() -> Vec<AnnotatedQuad> {
    vec![
      fact(ex("a"), ex("p"), ex("b"), GraphName::Default),
      fact(ex("a"), ex("q"), Term::lang_literal("chat", "fr"), GraphName::Default),
      fact(ex("c"), Term::iri(RDF_TYPE), ex("C"), GraphName::named("http://example.org/g")),
      fact(ex("d"), ex("p"), ex("d"), GraphName::Default),
    ]
  }

  fn run(query: &str) -> Result<Vec<AnnotatedQuad>> {
    QuadPatternTranslator.evaluate(query, &sample())
  }

  #[test]
  fn wildcard_pattern_returns_everything() {
    assert_eq!(run("?s ?p ?o").unwrap().len(), 4);
    assert_eq!(run("SELECT * WHERE { ?s ?p ?o . }").unwrap().len(), 4);
  }

  #[test]
  fn where_keyword_is_optional() {
    assert_eq!(run("SELECT ?s { ?s ?p ?o }").unwrap().len(), 4);
    assert_eq!(run("select * { ?s a <http://example.org/C> }").unwrap().len(), 1);
  }

  #[test]
  fn fixed_predicate_filters() {
    let found = run("{ ?s <http://example.org/p> ?o }").unwrap();
    assert_eq!(found.len(), 2);
  }

  #[test]
  fn literals_and_rdf_type_shorthand() {
    assert_eq!(run(r#"?s ?p "chat"@fr"#).unwrap().len(), 1);
    assert_eq!(run(r#"?s ?p "chat""#).unwrap().len(), 0);
    assert_eq!(run("?s a <http://example.org/C>").unwrap().len(), 1);
  }

  #[test]
  fn graph_slot_restricts_graph() {
    assert_eq!(run("?s ?p ?o DEFAULT").unwrap().len(), 3);
    assert_eq!(run("?s ?p ?o <http://example.org/g>").unwrap().len(), 1);
  }

  #[test]
  fn repeated_variable_must_agree() {
    let found = run("?x <http://example.org/p> ?x").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].subject, ex("d"));
  }

  #[test]
  fn union_of_patterns_does_not_duplicate() {
    let found =
      run("?s <http://example.org/p> ?o . <http://example.org/a> ?p ?o").unwrap();
    assert_eq!(found.len(), 3);
  }

  #[test]
  fn malformed_queries_are_rejected() {
    for query in [
      "",
      "?s ?p",
      "{ ?s ?p ?o",
      "?s ?p ?o ?g ?x",
      "<unterminated",
      "SELECT ?s ?p ?o",
      "SELECT * WHERE ?s ?p ?o",
    ] {
      assert!(
        matches!(run(query), Err(Error::InvalidQuery(_))),
        "accepted {query:?}"
      );
    }
  }
}
