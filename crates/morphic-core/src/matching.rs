//! Automatic member matching strategies
//!
//! Provides [`MatchingStrategy`] and the built-in [`IdenticalNameStrategy`]
//! and [`RegexNameStrategy`].

use crate::error::RegistrationError;
use morphic_reflect::MemberInfo;
use regex::{Regex, RegexBuilder};
use std::fmt::Debug;

/// Proposes a source member for a target member
///
/// Strategies are tried per target member in declaration order; the first
/// proposal wins. Unmatched target members are left untouched.
pub trait MatchingStrategy: Send + Sync + Debug {
    /// First candidate (in enumeration order) matching `target`
    fn find_match<'m>(&self, target: &MemberInfo, candidates: &'m [MemberInfo]) -> Option<&'m MemberInfo>;

    /// Strategy name (for debugging)
    fn name(&self) -> &'static str;
}

/// Pairs members with the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdenticalNameStrategy {
    case_insensitive: bool,
}

impl IdenticalNameStrategy {
    /// Case-sensitive matching
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive matching
    #[inline]
    #[must_use]
    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
        }
    }
}

impl MatchingStrategy for IdenticalNameStrategy {
    fn find_match<'m>(&self, target: &MemberInfo, candidates: &'m [MemberInfo]) -> Option<&'m MemberInfo> {
        let wanted = target.name();
        candidates.iter().find(|c| {
            if self.case_insensitive {
                c.name().eq_ignore_ascii_case(wanted)
            } else {
                c.name() == wanted
            }
        })
    }

    fn name(&self) -> &'static str {
        "identical_name"
    }
}

/// Pairs members through a regex template
///
/// The template contains [`RegexNameStrategy::PLACEHOLDER`]; one member's
/// (escaped) name is substituted into it and the resulting pattern is
/// matched against the other member's name. By default the target name is
/// substituted and candidates' source names are tested; with
/// [`match_target`](Self::match_target) each source name is substituted and
/// the pattern is tested against the target name.
///
/// ```rust
/// use morphic_core::RegexNameStrategy;
///
/// // target `id` matches source `customer_id`
/// let strategy = RegexNameStrategy::new("^(?:customer_)?{name}$")?.case_insensitive();
/// assert_eq!(strategy.template(), "^(?:customer_)?{name}$");
///
/// assert!(RegexNameStrategy::new("^id$").is_err());
/// # Ok::<(), morphic_core::RegistrationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexNameStrategy {
    template: String,
    case_insensitive: bool,
    match_target: bool,
}

impl RegexNameStrategy {
    /// Token replaced by a member name
    pub const PLACEHOLDER: &'static str = "{name}";

    /// Strategy over `template`
    ///
    /// # Errors
    /// Fails if `template` lacks the [`PLACEHOLDER`](Self::PLACEHOLDER) or
    /// does not compile once a member name is substituted
    pub fn new(template: impl Into<String>) -> Result<Self, RegistrationError> {
        let template = template.into();
        if !template.contains(Self::PLACEHOLDER) {
            return Err(RegistrationError::MissingPlaceholder(template));
        }
        let sample = template.replace(Self::PLACEHOLDER, &regex::escape("member"));
        if let Err(e) = Regex::new(&sample) {
            return Err(RegistrationError::InvalidPattern {
                template,
                reason: e.to_string(),
            });
        }
        Ok(Self {
            template,
            case_insensitive: false,
            match_target: false,
        })
    }

    /// Ignore case
    #[inline]
    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Substitute source names and test the target name
    #[inline]
    #[must_use]
    pub fn match_target(mut self) -> Self {
        self.match_target = true;
        self
    }

    /// Pattern template
    #[inline]
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    fn pattern_for(&self, name: &str) -> Option<Regex> {
        let pattern = self
            .template
            .replace(Self::PLACEHOLDER, &regex::escape(name));
        match RegexBuilder::new(&pattern)
            .case_insensitive(self.case_insensitive)
            .build()
        {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "invalid member matching pattern");
                None
            }
        }
    }
}

impl MatchingStrategy for RegexNameStrategy {
    fn find_match<'m>(&self, target: &MemberInfo, candidates: &'m [MemberInfo]) -> Option<&'m MemberInfo> {
        if self.match_target {
            candidates.iter().find(|c| {
                self.pattern_for(c.name())
                    .is_some_and(|re| re.is_match(target.name()))
            })
        } else {
            let pattern = self.pattern_for(target.name())?;
            candidates.iter().find(|c| pattern.is_match(c.name()))
        }
    }

    fn name(&self) -> &'static str {
        "regex_name"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphic_reflect::{MemberKind, TypeKey};

    fn member(name: &str) -> MemberInfo {
        MemberInfo::new(name, TypeKey::of::<()>(), TypeKey::of::<u32>(), MemberKind::Field)
    }

    fn names(members: &[&str]) -> Vec<MemberInfo> {
        members.iter().map(|n| member(n)).collect()
    }

    #[test]
    fn identical_name_respects_case() {
        let candidates = names(&["Id", "Name"]);
        let target = member("id");

        let sensitive = IdenticalNameStrategy::new();
        assert!(sensitive.find_match(&target, &candidates).is_none());

        let insensitive = IdenticalNameStrategy::case_insensitive();
        let found = insensitive.find_match(&target, &candidates).unwrap();
        assert_eq!(found.name(), "Id");
    }

    #[test]
    fn regex_substitutes_target_name() {
        let candidates = names(&["order_total", "customer_id", "id"]);
        let strategy = RegexNameStrategy::new("^customer_{name}$").unwrap();
        let found = strategy.find_match(&member("id"), &candidates).unwrap();
        assert_eq!(found.name(), "customer_id");
    }

    #[test]
    fn regex_returns_first_match() {
        let candidates = names(&["a_id", "b_id"]);
        let strategy = RegexNameStrategy::new("^._{name}$").unwrap();
        let found = strategy.find_match(&member("id"), &candidates).unwrap();
        assert_eq!(found.name(), "a_id");
    }

    #[test]
    fn regex_match_target_flips_direction() {
        let candidates = names(&["total", "code"]);
        let strategy = RegexNameStrategy::new("^{name}_value$").unwrap().match_target();
        let found = strategy.find_match(&member("code_value"), &candidates).unwrap();
        assert_eq!(found.name(), "code");
    }

    #[test]
    fn regex_escapes_names() {
        let candidates = names(&["axb"]);
        let strategy = RegexNameStrategy::new("^{name}$").unwrap();
        assert!(strategy.find_match(&member("a.b"), &candidates).is_none());
    }

    #[test]
    fn regex_case_option() {
        let candidates = names(&["ID"]);
        assert!(RegexNameStrategy::new("^{name}$")
            .unwrap()
            .find_match(&member("id"), &candidates)
            .is_none());
        assert!(RegexNameStrategy::new("^{name}$")
            .unwrap()
            .case_insensitive()
            .find_match(&member("id"), &candidates)
            .is_some());
    }

    #[test]
    fn malformed_templates_are_rejected() {
        assert!(matches!(
            RegexNameStrategy::new("({name}"),
            Err(RegistrationError::InvalidPattern { .. })
        ));
        assert_eq!(
            RegexNameStrategy::new("^id$"),
            Err(RegistrationError::MissingPlaceholder("^id$".to_string()))
        );
    }
}
