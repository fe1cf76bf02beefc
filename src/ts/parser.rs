//! APT 风格 `.ts` 文本格式的解析与渲染.
//!
//! ```text
//! .name "example"
//! .type LTS
//! .states
//! s0[initial]
//! s1
//! .labels
//! a
//! b[location="left"]
//! .arcs
//! s0 a s1
//! s1 b s0
//! ```

use std::fmt::Write as FmtWrite;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::char;
use nom::combinator::opt;
use nom::multi::many0;
use nom::IResult;
use thiserror::Error;

use crate::ts::system::{TransitionSystem, TsError};

#[derive(Debug, Error)]
pub enum TsParseError {
    #[error("syntax error near '{0}'")]
    Syntax(String),
    #[error("more than one initial state ('{0}' and '{1}')")]
    DuplicateInitial(String, String),
    #[error("arc references unknown state '{0}'")]
    UnknownState(String),
    #[error("arc references undeclared label '{0}'")]
    UnknownLabel(String),
    #[error(transparent)]
    Structure(#[from] TsError),
}

#[derive(Debug)]
enum Section {
    Name(String),
    Type,
    States(Vec<(String, bool)>),
    Labels(Vec<(String, Option<String>)>),
    Arcs(Vec<(String, String, String)>),
}

fn ws(mut input: &str) -> IResult<&str, ()> {
    loop {
        let trimmed = input.trim_start();
        if let Some(comment) = trimmed.strip_prefix("//") {
            input = match comment.find('\n') {
                Some(pos) => &comment[pos..],
                None => "",
            };
        } else {
            return Ok((trimmed, ()));
        }
    }
}

fn ident(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    let (input, _) = char('"')(input)?;
    let (input, value) = take_while(|c| c != '"')(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, value))
}

/// Fails on end of input or the start of the next `.section`.
fn item_start(input: &str) -> IResult<&str, ()> {
    let (input, _) = ws(input)?;
    if input.is_empty() || input.starts_with('.') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    Ok((input, ()))
}

fn name_section(input: &str) -> IResult<&str, Section> {
    let (input, _) = tag(".name")(input)?;
    let (input, _) = ws(input)?;
    let (input, name) = quoted(input)?;
    Ok((input, Section::Name(name.to_owned())))
}

fn type_section(input: &str) -> IResult<&str, Section> {
    let (input, _) = tag(".type")(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = ident(input)?;
    Ok((input, Section::Type))
}

fn state_item(input: &str) -> IResult<&str, (String, bool)> {
    let (input, _) = item_start(input)?;
    let (input, id) = ident(input)?;
    let (input, flag) = opt(initial_flag)(input)?;
    Ok((input, (id.to_owned(), flag.is_some())))
}

fn initial_flag(input: &str) -> IResult<&str, ()> {
    let (input, _) = char('[')(input)?;
    let (input, _) = tag("initial")(input)?;
    let (input, _) = char(']')(input)?;
    Ok((input, ()))
}

fn states_section(input: &str) -> IResult<&str, Section> {
    let (input, _) = tag(".states")(input)?;
    let (input, states) = many0(state_item)(input)?;
    Ok((input, Section::States(states)))
}

fn label_item(input: &str) -> IResult<&str, (String, Option<String>)> {
    let (input, _) = item_start(input)?;
    let (input, id) = ident(input)?;
    let (input, location) = opt(location_attr)(input)?;
    Ok((input, (id.to_owned(), location)))
}

fn location_attr(input: &str) -> IResult<&str, String> {
    let (input, _) = char('[')(input)?;
    let (input, _) = tag("location=")(input)?;
    let (input, value) = quoted(input)?;
    let (input, _) = char(']')(input)?;
    Ok((input, value.to_owned()))
}

fn labels_section(input: &str) -> IResult<&str, Section> {
    let (input, _) = tag(".labels")(input)?;
    let (input, labels) = many0(label_item)(input)?;
    Ok((input, Section::Labels(labels)))
}

fn arc_item(input: &str) -> IResult<&str, (String, String, String)> {
    let (input, _) = item_start(input)?;
    let (input, source) = ident(input)?;
    let (input, _) = ws(input)?;
    let (input, label) = ident(input)?;
    let (input, _) = ws(input)?;
    let (input, target) = ident(input)?;
    Ok((input, (source.to_owned(), label.to_owned(), target.to_owned())))
}

fn arcs_section(input: &str) -> IResult<&str, Section> {
    let (input, _) = tag(".arcs")(input)?;
    let (input, arcs) = many0(arc_item)(input)?;
    Ok((input, Section::Arcs(arcs)))
}

fn section(input: &str) -> IResult<&str, Section> {
    let (input, _) = ws(input)?;
    alt((
        name_section,
        type_section,
        states_section,
        labels_section,
        arcs_section,
    ))(input)
}

fn snippet(input: &str) -> String {
    input.chars().take(24).collect()
}

pub fn parse_ts(input: &str) -> Result<TransitionSystem, TsParseError> {
    let (rest, sections) =
        many0(section)(input).map_err(|_| TsParseError::Syntax(snippet(input)))?;
    let (rest, _) = ws(rest).map_err(|_| TsParseError::Syntax(snippet(rest)))?;
    if !rest.is_empty() {
        return Err(TsParseError::Syntax(snippet(rest)));
    }
    build(sections)
}

fn build(sections: Vec<Section>) -> Result<TransitionSystem, TsParseError> {
    let mut name = String::new();
    let mut states = Vec::new();
    let mut labels = Vec::new();
    let mut arcs = Vec::new();
    for section in sections {
        match section {
            Section::Name(n) => name = n,
            Section::Type => {}
            Section::States(s) => states.extend(s),
            Section::Labels(l) => labels.extend(l),
            Section::Arcs(a) => arcs.extend(a),
        }
    }

    let mut ts = TransitionSystem::new(name);
    let mut initial: Option<String> = None;
    for (state, is_initial) in states {
        let node = ts.create_state(&state).map_err(TsParseError::Structure)?;
        if is_initial {
            if let Some(previous) = &initial {
                return Err(TsParseError::DuplicateInitial(previous.clone(), state));
            }
            initial = Some(state);
            ts.set_initial(node);
        }
    }

    let declared_labels = !labels.is_empty();
    for (label, location) in labels {
        ts.ensure_event(&label);
        ts.set_event_location(&label, location)
            .map_err(TsParseError::Structure)?;
    }

    for (source, label, target) in arcs {
        let source = ts
            .state_named(&source)
            .ok_or(TsParseError::UnknownState(source))?;
        let target = ts
            .state_named(&target)
            .ok_or(TsParseError::UnknownState(target))?;
        if declared_labels && ts.event_id(&label).is_none() {
            return Err(TsParseError::UnknownLabel(label));
        }
        ts.create_arc(source, target, &label);
    }

    Ok(ts)
}

/// Render back into the `.ts` text shape accepted by [`parse_ts`].
pub fn render_ts(ts: &TransitionSystem) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, ".name \"{}\"", ts.name());
    let _ = writeln!(&mut out, ".type LTS");
    let _ = writeln!(&mut out);

    let _ = writeln!(&mut out, ".states");
    for node in ts.states() {
        if Some(node) == ts.initial() {
            let _ = writeln!(&mut out, "{}[initial]", ts.state_name(node));
        } else {
            let _ = writeln!(&mut out, "{}", ts.state_name(node));
        }
    }
    let _ = writeln!(&mut out);

    let _ = writeln!(&mut out, ".labels");
    for (_, event) in ts.events() {
        match &event.location {
            Some(location) => {
                let _ = writeln!(&mut out, "{}[location=\"{}\"]", event.label, location);
            }
            None => {
                let _ = writeln!(&mut out, "{}", event.label);
            }
        }
    }
    let _ = writeln!(&mut out);

    let _ = writeln!(&mut out, ".arcs");
    for arc in ts.arcs() {
        let _ = writeln!(
            &mut out,
            "{} {} {}",
            ts.state_name(ts.arc_source(arc)),
            ts.event_label(ts.arc_event(arc)),
            ts.state_name(ts.arc_target(arc))
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
// two states in a cycle
.name "cycle"
.type LTS
.states
s0[initial]
s1
.labels
a
b[location="left"]
.arcs
s0 a s1
s1 b s0
"#;

    #[test]
    fn parse_sample() {
        let ts = parse_ts(SAMPLE).unwrap();
        assert_eq!(ts.name(), "cycle");
        assert_eq!(ts.state_count(), 2);
        assert_eq!(ts.arc_count(), 2);
        assert_eq!(ts.event_count(), 2);
        let initial = ts.initial().unwrap();
        assert_eq!(ts.state_name(initial), "s0");
        let b = ts.event_id("b").unwrap();
        assert_eq!(ts.event(b).location.as_deref(), Some("left"));
    }

    #[test]
    fn round_trip() {
        let ts = parse_ts(SAMPLE).unwrap();
        let rendered = render_ts(&ts);
        let back = parse_ts(&rendered).unwrap();
        assert_eq!(back.state_count(), ts.state_count());
        assert_eq!(back.arc_count(), ts.arc_count());
        assert_eq!(back.event_count(), ts.event_count());
        assert_eq!(
            back.state_name(back.initial().unwrap()),
            ts.state_name(ts.initial().unwrap())
        );
    }

    #[test]
    fn unknown_state_in_arc() {
        let input = ".states\ns0[initial]\n.arcs\ns0 a s9\n";
        assert!(matches!(
            parse_ts(input),
            Err(TsParseError::UnknownState(_))
        ));
    }

    #[test]
    fn undeclared_label_rejected_when_labels_present() {
        let input = ".states\ns0[initial]\ns1\n.labels\na\n.arcs\ns0 b s1\n";
        assert!(matches!(
            parse_ts(input),
            Err(TsParseError::UnknownLabel(_))
        ));
    }

    #[test]
    fn two_initial_states_rejected() {
        let input = ".states\ns0[initial]\ns1[initial]\n";
        assert!(matches!(
            parse_ts(input),
            Err(TsParseError::DuplicateInitial(_, _))
        ));
    }
}
