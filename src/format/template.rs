//! printf-style report templates.

use std::fmt;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder,
}

/// A report template with `%v` placeholders.
///
/// Placeholders are filled from the arguments in order, `%%` renders a single
/// `%`, and any other `%` is kept as-is. A placeholder without a matching
/// argument renders as nothing, and surplus arguments are ignored.
///
/// An empty template is *disabled*: reporters skip the event entirely rather
/// than emitting an empty report.
///
/// ```
/// use loggedio::format::Template;
///
/// let template = Template::new("E [%v: %v]");
/// assert_eq!(template.render(&[&"Read()", &"ERROR!"]), "E [Read(): ERROR!]");
/// assert!(Template::new("").is_disabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template.
    pub fn new(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            match chars.peek() {
                Some('v') => {
                    chars.next();
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder);
                }
                Some('%') => {
                    chars.next();
                    literal.push('%');
                }
                _ => literal.push('%'),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    /// A template which reports nothing.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether this template was empty, and so reports nothing.
    pub fn is_disabled(&self) -> bool {
        self.segments.is_empty()
    }

    /// The number of `%v` placeholders in this template.
    pub fn placeholders(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Placeholder))
            .count()
    }

    /// Render the template, filling placeholders from `args` in order.
    pub fn render(&self, args: &[&dyn fmt::Display]) -> String {
        let mut out = String::new();
        let mut args = args.iter();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder => {
                    if let Some(arg) = args.next() {
                        // Writing to a String can't fail.
                        let _ = write!(out, "{arg}");
                    }
                }
            }
        }
        out
    }
}

impl From<&str> for Template {
    fn from(template: &str) -> Self {
        Template::new(template)
    }
}

impl From<String> for Template {
    fn from(template: String) -> Self {
        Template::new(&template)
    }
}

impl From<&String> for Template {
    fn from(template: &String) -> Self {
        Template::new(template)
    }
}
