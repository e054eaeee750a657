//! Parser for the compact path grammar (SVG path data).
//!
//! Relative commands, horizontal/vertical lines and smooth continuations are
//! resolved to absolute commands while parsing, so a parsed [`Path`] only
//! holds the canonical command set.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geom::Point;
use crate::path::{Path, PathBuilder};

impl Path {
    /// Parses path data such as `"M0 0 L10 0 A5 5 0 0 1 10 10z"`.
    pub fn parse(text: &str) -> Result<Path> {
        Parser::new(text).parse()
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(text: &str) -> Result<Path> {
        Path::parse(text)
    }
}

struct Parser<'a> {
    text: &'a [u8],
    offset: usize,
    builder: PathBuilder,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Parser<'a> {
        Parser {
            text: text.as_bytes(),
            offset: 0,
            builder: PathBuilder::new(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::MalformedPath {
            position: self.offset,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.offset).copied()
    }

    fn skip_separators(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n' | b',') = self.peek() {
            self.offset += 1;
        }
    }

    fn digits(&mut self) -> bool {
        let start = self.offset;
        while let Some(b'0'..=b'9') = self.peek() {
            self.offset += 1;
        }
        self.offset > start
    }

    fn number(&mut self) -> Result<f64> {
        self.skip_separators();
        let start = self.offset;
        if let Some(b'+' | b'-') = self.peek() {
            self.offset += 1;
        }
        let whole = self.digits();
        let fraction = if let Some(b'.') = self.peek() {
            self.offset += 1;
            self.digits()
        } else {
            false
        };
        if !whole && !fraction {
            self.offset = start;
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected number, found '{}'", c as char)),
                None => self.error("expected number, found end of input"),
            });
        }
        if let Some(b'e' | b'E') = self.peek() {
            let mark = self.offset;
            self.offset += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.offset += 1;
            }
            if !self.digits() {
                self.offset = mark;
            }
        }
        let token = std::str::from_utf8(&self.text[start..self.offset]).map_err(|_| self.error("invalid number"))?;
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(Error::MalformedPath {
                position: start,
                reason: format!("invalid number '{}'", token),
            }),
        }
    }

    fn flag(&mut self) -> Result<bool> {
        self.skip_separators();
        match self.peek() {
            Some(b'0') => {
                self.offset += 1;
                Ok(false)
            }
            Some(b'1') => {
                self.offset += 1;
                Ok(true)
            }
            Some(c) => Err(self.error(format!("expected flag, found '{}'", c as char))),
            None => Err(self.error("expected flag, found end of input")),
        }
    }

    fn point(&mut self, relative: bool) -> Result<Point> {
        let x = self.number()?;
        let y = self.number()?;
        let p = Point::new(x, y);
        Ok(if relative { p + self.builder.current() } else { p })
    }

    fn starts_number(&self) -> bool {
        matches!(self.peek(), Some(b'0'..=b'9' | b'+' | b'-' | b'.'))
    }

    fn parse(mut self) -> Result<Path> {
        let mut prev: Option<u8> = None;
        loop {
            self.skip_separators();
            let Some(c) = self.peek() else { break };

            let cmd = if c.is_ascii_alphabetic() {
                self.offset += 1;
                c
            } else if self.starts_number() {
                match prev {
                    Some(cmd) => cmd,
                    None => return Err(self.error("expected command")),
                }
            } else {
                return Err(self.error(format!("unexpected character '{}'", c as char)));
            };

            let relative = cmd.is_ascii_lowercase();
            let current = self.builder.current();
            match cmd.to_ascii_uppercase() {
                b'M' => {
                    let p = self.point(relative)?;
                    self.builder.move_to(p);
                }
                b'L' => {
                    let p = self.point(relative)?;
                    self.builder.line_to(p);
                }
                b'H' => {
                    let x = self.number()?;
                    let x = if relative { current.x + x } else { x };
                    self.builder.line_to(Point::new(x, current.y));
                }
                b'V' => {
                    let y = self.number()?;
                    let y = if relative { current.y + y } else { y };
                    self.builder.line_to(Point::new(current.x, y));
                }
                b'C' => {
                    let c1 = self.point(relative)?;
                    let c2 = self.point(relative)?;
                    let p = self.point(relative)?;
                    self.builder.cubic_to(c1, c2, p);
                }
                b'S' => {
                    let c2 = self.point(relative)?;
                    let p = self.point(relative)?;
                    self.builder.cubic_smooth_to(c2, p);
                }
                b'Q' => {
                    let c = self.point(relative)?;
                    let p = self.point(relative)?;
                    self.builder.quad_to(c, p);
                }
                b'T' => {
                    let p = self.point(relative)?;
                    self.builder.quad_smooth_to(p);
                }
                b'A' => {
                    let rx = self.number()?;
                    let ry = self.number()?;
                    let rotation = self.number()?;
                    let large_arc = self.flag()?;
                    let sweep = self.flag()?;
                    let p = self.point(relative)?;
                    self.builder.arc_to(Point::new(rx, ry), rotation, large_arc, sweep, p);
                }
                b'Z' => {
                    self.builder.close();
                }
                _ => {
                    self.offset -= 1;
                    return Err(self.error(format!("unknown command '{}'", cmd as char)));
                }
            }

            prev = match cmd {
                b'M' => Some(b'L'),
                b'm' => Some(b'l'),
                b'Z' | b'z' => None,
                other => Some(other),
            };
        }
        Ok(self.builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathCmd;

    fn position_of(err: Error) -> usize {
        match err {
            Error::MalformedPath { position, .. } => position,
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn absolute_and_relative() {
        let path = Path::parse("M1 1 l2 0 v2 H0 z").unwrap();
        assert_eq!(
            path.commands(),
            &[
                PathCmd::Move(Point::new(1.0, 1.0)),
                PathCmd::Line(Point::new(3.0, 1.0)),
                PathCmd::Line(Point::new(3.0, 3.0)),
                PathCmd::Line(Point::new(0.0, 3.0)),
                PathCmd::Close,
            ]
        );
    }

    #[test]
    fn implicit_line_after_move() {
        let path = Path::parse("m1,1 2,0 0,2").unwrap();
        assert_eq!(path.commands()[2], PathCmd::Line(Point::new(3.0, 3.0)));
    }

    #[test]
    fn compact_numbers() {
        let path = Path::parse("M.5.5L-1-1e1").unwrap();
        assert_eq!(
            path.commands(),
            &[PathCmd::Move(Point::new(0.5, 0.5)), PathCmd::Line(Point::new(-1.0, -10.0))]
        );
    }

    #[test]
    fn arc_with_packed_flags() {
        let path = Path::parse("M0 0A5 5 0 1120 0").unwrap();
        assert_eq!(
            path.commands()[1],
            PathCmd::Arc {
                radii: Point::new(5.0, 5.0),
                rotation: 0.0,
                large_arc: true,
                sweep: true,
                to: Point::new(20.0, 0.0),
            }
        );
    }

    #[test]
    fn arc_without_move_starts_at_origin() {
        let path = Path::parse("A10 20 30 0 0 20 0z").unwrap();
        let subpaths = path.subpaths();
        assert_eq!(subpaths.len(), 1);
        assert_eq!(path.commands()[0], PathCmd::Move(Point::new(0.0, 0.0)));
        assert_eq!(*path.commands().last().unwrap(), PathCmd::Close);
        let bounds = path.bounds();
        assert!((bounds.w - 20.0).abs() < 0.2);
        assert!((bounds.x + 0.10857).abs() < 1e-4);
        assert!((bounds.max().x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn smooth_quadratic_chain() {
        let path = Path::parse("M0 0Q1 1 2 0T4 0").unwrap();
        assert_eq!(path.commands()[2], PathCmd::Quadratic(Point::new(3.0, -1.0), Point::new(4.0, 0.0)));
    }

    #[test]
    fn unknown_command() {
        let err = Path::parse("M0 0 X1 1").unwrap_err();
        assert_eq!(position_of(err), 5);
    }

    #[test]
    fn missing_operand() {
        let err = Path::parse("M0 0 L1").unwrap_err();
        assert_eq!(position_of(err), 7);
    }

    #[test]
    fn bad_flag() {
        assert!(Path::parse("M0 0 A1 1 0 2 0 1 1").is_err());
    }

    #[test]
    fn overflowing_number() {
        assert_eq!(position_of(Path::parse("M0 0L1e999 0").unwrap_err()), 5);
        assert_eq!(position_of(Path::parse("M0 0L1 -1e400").unwrap_err()), 7);
    }

    #[test]
    fn numbers_before_any_command() {
        assert_eq!(position_of(Path::parse("10 10").unwrap_err()), 0);
    }

    #[test]
    fn text_round_trip() {
        for text in [
            "M0 0L10 0L10 10z",
            "M1 2C3 4 5 6 7 8S9 10 11 12",
            "M0 0Q5 5 10 0T20 0",
            "M0 0A10 20 30 0 1 20 0z",
            "m5 5h10v10h-10zm20 0l1 1",
        ] {
            let path = Path::parse(text).unwrap();
            let again = Path::parse(&path.to_text()).unwrap();
            let a = path.flatten(0.01);
            let b = again.flatten(0.01);
            assert_eq!(a.len(), b.len());
            for (pa, pb) in a.iter().zip(&b) {
                assert_eq!(pa.points.len(), pb.points.len());
                for (p, q) in pa.points.iter().zip(&pb.points) {
                    assert!(p.distance(*q) < 1e-3, "{:?} vs {:?} in {}", p, q, text);
                }
            }
        }
    }
}
