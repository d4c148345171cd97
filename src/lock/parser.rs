//! Lock expression grammar
//!
//! ```text
//! expr   := term ( '|' expr )?
//! term   := factor ( '&' term )?
//! factor := '!' factor | '@' leaf | '=' leaf | '+' leaf | '$' leaf | leaf
//! leaf   := '(' expr ')' | reference
//! ```
//!
//! References are left as text; [`super::Lock`] resolution decides whether
//! each one names an object or an attribute test.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt, verify},
    sequence::{delimited, preceded, terminated},
    IResult,
};

/// Parsed but unresolved lock expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Syntax<'a> {
    And(Box<Syntax<'a>>, Box<Syntax<'a>>),
    Or(Box<Syntax<'a>>, Box<Syntax<'a>>),
    Not(Box<Syntax<'a>>),
    Indir(Box<Syntax<'a>>),
    Is(Box<Syntax<'a>>),
    Carry(Box<Syntax<'a>>),
    Owner(Box<Syntax<'a>>),
    Ref(&'a str),
}

fn expr(input: &str) -> IResult<&str, Syntax<'_>> {
    let (input, left) = term(input)?;
    let (input, right) = opt(preceded(preceded(multispace0, char('|')), expr))(input)?;
    Ok(match right {
        Some(right) => (input, Syntax::Or(Box::new(left), Box::new(right))),
        None => (input, left),
    })
}

fn term(input: &str) -> IResult<&str, Syntax<'_>> {
    let (input, left) = factor(input)?;
    let (input, right) = opt(preceded(preceded(multispace0, char('&')), term))(input)?;
    Ok(match right {
        Some(right) => (input, Syntax::And(Box::new(left), Box::new(right))),
        None => (input, left),
    })
}

fn boxed<'a>(wrap: fn(Box<Syntax<'a>>) -> Syntax<'a>) -> impl Fn(Syntax<'a>) -> Syntax<'a> {
    move |s| wrap(Box::new(s))
}

fn factor(input: &str) -> IResult<&str, Syntax<'_>> {
    preceded(
        multispace0,
        alt((
            map(preceded(char('!'), factor), boxed(Syntax::Not)),
            map(preceded(char('@'), leaf), boxed(Syntax::Indir)),
            map(preceded(char('='), leaf), boxed(Syntax::Is)),
            map(preceded(char('+'), leaf), boxed(Syntax::Carry)),
            map(preceded(char('$'), leaf), boxed(Syntax::Owner)),
            leaf,
        )),
    )(input)
}

fn leaf(input: &str) -> IResult<&str, Syntax<'_>> {
    preceded(
        multispace0,
        alt((
            delimited(char('('), expr, preceded(multispace0, char(')'))),
            map(
                verify(take_while1(|c| !matches!(c, '&' | '|' | ')')), |r: &str| {
                    !r.starts_with('(')
                }),
                |r: &str| Syntax::Ref(r.trim()),
            ),
        )),
    )(input)
}

/// Parse a whole lock expression; trailing text is an error
pub(crate) fn parse(text: &str) -> Option<Syntax<'_>> {
    all_consuming(terminated(expr, multispace0))(text)
        .ok()
        .map(|(_, tree)| tree)
}
