//! Start/finish recognizers for segment types

use crate::error::DefinitionError;
use regex::Regex;

/// Decides whether a line opens or closes an instance of a segment type
///
/// Implementations must be stateless: the same line always yields the same
/// answer, so definitions can be evaluated in any order or concurrently.
pub trait SegmentDefinition: Send + Sync {
    /// Name of the segment type, used as the prefix of segment names
    fn type_name(&self) -> &str;

    /// If `line` starts an instance of this type, return the instance tag
    fn is_start<'l>(&self, line: &'l str) -> Option<&'l str>;

    /// If `line` finishes an instance of this type, return the instance tag
    fn is_finish<'l>(&self, line: &'l str) -> Option<&'l str>;
}

/// Segment type recognized by a pair of regular expressions
///
/// Each pattern has exactly one capture group; its text is the tag of the
/// segment instance. A match that captures an empty tag does not count.
///
/// # Example
///
/// ```
/// use eggtimer::definition::{RegexDefinition, SegmentDefinition};
///
/// let def = RegexDefinition::new("Step", r"^BEGIN (\w+)", r"^END (\w+)")?;
/// assert_eq!(def.is_start("BEGIN compile"), Some("compile"));
/// assert_eq!(def.is_finish("END compile"), Some("compile"));
/// assert_eq!(def.is_start("END compile"), None);
/// # Ok::<(), eggtimer::error::DefinitionError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RegexDefinition {
    name: String,
    start: Regex,
    finish: Regex,
}

impl RegexDefinition {
    /// Compile a definition from a type name and start/finish patterns
    pub fn new(
        type_name: impl Into<String>,
        start: &str,
        finish: &str,
    ) -> Result<Self, DefinitionError> {
        let name = type_name.into();
        if name.is_empty() {
            return Err(DefinitionError::EmptyTypeName);
        }

        let start = compile(&name, "start", start)?;
        let finish = compile(&name, "finish", finish)?;

        Ok(Self {
            name,
            start,
            finish,
        })
    }

    /// Source text of the start pattern
    pub fn start_pattern(&self) -> &str {
        self.start.as_str()
    }

    /// Source text of the finish pattern
    pub fn finish_pattern(&self) -> &str {
        self.finish.as_str()
    }
}

fn compile(type_name: &str, which: &'static str, pattern: &str) -> Result<Regex, DefinitionError> {
    let regex = Regex::new(pattern).map_err(|source| DefinitionError::InvalidPattern {
        type_name: type_name.to_string(),
        which,
        source,
    })?;

    // captures_len counts the implicit whole-match group
    let found = regex.captures_len() - 1;
    if found != 1 {
        return Err(DefinitionError::CaptureGroups {
            type_name: type_name.to_string(),
            which,
            found,
        });
    }

    Ok(regex)
}

fn tag<'l>(regex: &Regex, line: &'l str) -> Option<&'l str> {
    regex
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|tag| !tag.is_empty())
}

impl SegmentDefinition for RegexDefinition {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn is_start<'l>(&self, line: &'l str) -> Option<&'l str> {
        tag(&self.start, line)
    }

    fn is_finish<'l>(&self, line: &'l str) -> Option<&'l str> {
        tag(&self.finish, line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rtype() -> RegexDefinition {
        RegexDefinition::new("RType", r"^Start\s+(\w+)", r"^Finish\s+(\w+)").unwrap()
    }

    #[test]
    fn test_start_and_finish_tags() {
        let def = rtype();
        assert_eq!(def.type_name(), "RType");
        assert_eq!(def.is_start("Start x"), Some("x"));
        assert_eq!(def.is_start("Start  y"), Some("y"));
        assert_eq!(def.is_finish("Finish x"), Some("x"));
    }

    #[test]
    fn test_non_matching_lines() {
        let def = rtype();
        assert_eq!(def.is_start("Ignore this string"), None);
        assert_eq!(def.is_finish("Ignore this string"), None);
        assert_eq!(def.is_start("Finish x"), None);
        assert_eq!(def.is_finish("  Finish x"), None);
    }

    #[test]
    fn test_empty_capture_is_not_a_match() {
        let def = RegexDefinition::new("T", r"^go(\w*)", r"^stop(\w*)").unwrap();
        assert_eq!(def.is_start("go"), None);
        assert_eq!(def.is_start("go1"), Some("1"));
        assert_eq!(def.is_finish("stop"), None);
    }

    #[test]
    fn test_optional_group_not_participating() {
        let def = RegexDefinition::new("T", r"^begin(?: (\w+))?", r"^end (\w+)").unwrap();
        assert_eq!(def.is_start("begin"), None);
        assert_eq!(def.is_start("begin a"), Some("a"));
    }

    #[test]
    fn test_rejects_empty_type_name() {
        let err = RegexDefinition::new("", r"(a)", r"(b)").unwrap_err();
        assert!(matches!(err, DefinitionError::EmptyTypeName));
    }

    #[test]
    fn test_rejects_invalid_regex() {
        let err = RegexDefinition::new("T", r"(unclosed", r"(b)").unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::InvalidPattern { which: "start", .. }
        ));
    }

    #[test]
    fn test_rejects_wrong_capture_count() {
        let err = RegexDefinition::new("T", r"^Start \w+", r"(b)").unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::CaptureGroups { which: "start", found: 0, .. }
        ));

        let err = RegexDefinition::new("T", r"(a)", r"^(b) (c)").unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::CaptureGroups { which: "finish", found: 2, .. }
        ));
    }

    #[test]
    fn test_non_capturing_groups_allowed() {
        let def = RegexDefinition::new("T", r"^(?:Start|Begin) (\w+)", r"^End (\w+)").unwrap();
        assert_eq!(def.is_start("Begin q"), Some("q"));
        assert_eq!(def.start_pattern(), r"^(?:Start|Begin) (\w+)");
        assert_eq!(def.finish_pattern(), r"^End (\w+)");
    }
}
