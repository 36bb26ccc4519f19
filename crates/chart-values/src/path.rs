use std::{fmt::Display, str::FromStr};

use snafu::{Snafu, ensure};

type Result<T, E = PathError> = std::result::Result<T, E>;

/// The error type for values path parsing operations.
#[derive(Debug, PartialEq, Snafu)]
pub enum PathError {
    /// Indicates that the input is empty. The root of the document cannot be
    /// written in dotted form.
    #[snafu(display("path input cannot be empty"))]
    EmptyInput,

    /// Indicates that the input contains an empty segment, e.g. `a..b` or a
    /// leading/trailing dot.
    #[snafu(display("path segment {index} is empty"))]
    EmptySegment { index: usize },
}

/// A dotted path addressing an entry inside a values document, like
/// `mariadb.auth.password`.
///
/// Every segment names a mapping key. Sequence elements are not addressable;
/// sequences are always read and written wholesale. Keys containing literal
/// dots cannot be expressed in dotted form either, but survive the
/// JSON-pointer conversions below.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ValuesPath {
    segments: Vec<String>,
}

impl ValuesPath {
    /// The root path, addressing the document itself.
    ///
    /// It has no dotted representation and only shows up when a structural
    /// diff replaces a document wholesale.
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Converts a JSON-pointer-like path (`/a/b/c`) into a values path,
    /// unescaping `~1` and `~0` as defined by RFC 6901. The empty pointer
    /// addresses the root.
    pub fn from_json_pointer(pointer: &str) -> Self {
        let Some(pointer) = pointer.strip_prefix('/') else {
            return Self::root();
        };

        Self {
            segments: pointer
                .split('/')
                .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
                .collect(),
        }
    }

    /// Renders the path as a JSON pointer, escaping `~` and `/` in segments.
    /// The root renders as the empty pointer.
    pub fn to_json_pointer(&self) -> String {
        self.segments
            .iter()
            .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
            .collect()
    }

    /// Returns a new path with `segment` appended.
    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_owned());
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl FromStr for ValuesPath {
    type Err = PathError;

    fn from_str(input: &str) -> Result<Self> {
        ensure!(!input.is_empty(), EmptyInputSnafu);

        let segments = input
            .split('.')
            .enumerate()
            .map(|(index, segment)| {
                ensure!(!segment.is_empty(), EmptySegmentSnafu { index });
                Ok(segment.to_owned())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { segments })
    }
}

impl Display for ValuesPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
