//! I/O 支持: JSON 序列化与 APT 风格文本渲染.
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::net::core::Net;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn to_json_string<T>(value: &T) -> Result<String, IoError>
where
    T: Serialize,
{
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn from_json_str<T>(s: &str) -> Result<T, IoError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_str(s)?)
}

pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<(), IoError> {
    let mut file = File::create(path)?;
    let content = to_json_string(value)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn read_json<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, IoError> {
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    from_json_str(&content)
}

/// Render the net in the APT `.pn` text shape.
pub fn render_net(net: &Net) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, ".name \"{}\"", net.name);
    let _ = writeln!(&mut out, ".type LPN");
    let _ = writeln!(&mut out);

    let _ = writeln!(&mut out, ".places");
    for place in net.places.iter() {
        let _ = writeln!(&mut out, "{}", place.name);
    }
    let _ = writeln!(&mut out);

    let _ = writeln!(&mut out, ".transitions");
    for transition in net.transitions.iter() {
        let _ = writeln!(&mut out, "{}", transition.name);
    }
    let _ = writeln!(&mut out);

    let _ = writeln!(&mut out, ".flows");
    for (transition_id, transition) in net.transitions.iter_enumerated() {
        let mut consumed = Vec::new();
        let mut produced = Vec::new();
        for (place_id, place) in net.places.iter_enumerated() {
            let pre = *net.pre.get(place_id, transition_id);
            if pre > 0 {
                consumed.push(format!("{}*{}", pre, place.name));
            }
            let post = *net.post.get(place_id, transition_id);
            if post > 0 {
                produced.push(format!("{}*{}", post, place.name));
            }
        }
        let _ = writeln!(
            &mut out,
            "{}: {{{}}} -> {{{}}}",
            transition.name,
            consumed.join(", "),
            produced.join(", ")
        );
    }
    let _ = writeln!(&mut out);

    let _ = writeln!(&mut out, ".initial_marking");
    let tokens: Vec<String> = net
        .places
        .iter()
        .filter(|p| p.tokens > 0)
        .map(|p| {
            if p.tokens == 1 {
                p.name.clone()
            } else {
                format!("{}*{}", p.tokens, p.name)
            }
        })
        .collect();
    let _ = writeln!(&mut out, "{{{}}}", tokens.join(", "));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::structure::{Place, Transition};

    fn sample_net() -> Net {
        let mut net = Net::empty("sample");
        let p = net.add_place(Place::new("p0", 2));
        let t = net.add_transition(Transition::new("a"));
        net.set_input_weight(p, t, 1);
        net
    }

    #[test]
    fn json_round_trip() {
        let net = sample_net();
        let json = to_json_string(&net).unwrap();
        let back: Net = from_json_str(&json).unwrap();
        assert_eq!(back.places_len(), 1);
        assert_eq!(back.transitions_len(), 1);
        assert_eq!(*back.pre.get(crate::net::index::PlaceId::new(0), crate::net::index::TransitionId::new(0)), 1);
    }

    #[test]
    fn render_mentions_sections() {
        let text = render_net(&sample_net());
        assert!(text.contains(".places"));
        assert!(text.contains(".transitions"));
        assert!(text.contains("a: {1*p0} -> {}"));
        assert!(text.contains("{2*p0}"));
    }
}
