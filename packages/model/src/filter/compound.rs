//! Filters combining child filters under a boolean policy.

use std::sync::Arc;

use super::{FilterOptions, ParseFilter};
use crate::error::FilterError;
use crate::qname::QName;

/// How child decisions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundPolicy {
    /// Accept only if every child accepts.
    AcceptableToAll,
    /// Accept if at least one child accepts.
    AcceptableToAny,
    /// Accept only if every child rejects.
    UnacceptableToAll,
    /// Accept if at least one child rejects.
    UnacceptableToAny,
}

impl CompoundPolicy {
    /// Fold child decisions, short-circuiting in child order.
    fn combine(self, mut decisions: impl Iterator<Item = bool>) -> bool {
        match self {
            Self::AcceptableToAll => decisions.all(|accepted| accepted),
            Self::AcceptableToAny => decisions.any(|accepted| accepted),
            Self::UnacceptableToAll => decisions.all(|accepted| !accepted),
            Self::UnacceptableToAny => decisions.any(|accepted| !accepted),
        }
    }
}

/// A filter over an ordered, non-empty list of child filters.
#[derive(Debug, Clone)]
pub struct CompoundParseFilter {
    policy: CompoundPolicy,
    filters: Vec<Arc<dyn ParseFilter>>,
    options: FilterOptions,
}

impl CompoundParseFilter {
    /// Start building a compound filter.
    #[must_use]
    pub fn builder(policy: CompoundPolicy) -> CompoundFilterBuilder {
        CompoundFilterBuilder {
            policy,
            filters: Vec::new(),
            options: FilterOptions::default(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> CompoundPolicy {
        self.policy
    }

    #[must_use]
    pub fn filters(&self) -> &[Arc<dyn ParseFilter>] {
        &self.filters
    }
}

impl ParseFilter for CompoundParseFilter {
    fn acceptable(&self, element: &QName) -> bool {
        self.policy
            .combine(self.filters.iter().map(|f| f.acceptable(element)))
    }

    fn acceptable_attribute(&self, element: &QName, attribute: &QName) -> bool {
        self.policy.combine(
            self.filters
                .iter()
                .map(|f| f.acceptable_attribute(element, attribute)),
        )
    }

    fn options(&self) -> &FilterOptions {
        &self.options
    }
}

/// Builder for [`CompoundParseFilter`].
#[derive(Debug)]
pub struct CompoundFilterBuilder {
    policy: CompoundPolicy,
    filters: Vec<Arc<dyn ParseFilter>>,
    options: FilterOptions,
}

impl CompoundFilterBuilder {
    /// Append a child filter.
    #[must_use]
    pub fn add(mut self, filter: impl ParseFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Append a child filter that is shared with other owners.
    #[must_use]
    pub fn add_shared(mut self, filter: Arc<dyn ParseFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn throw_on_unacceptable(mut self) -> Self {
        self.options.throw_on_unacceptable = true;
        self
    }

    #[must_use]
    pub fn ignore_comments(mut self, ignore: bool) -> Self {
        self.options.ignore_comments = ignore;
        self
    }

    #[must_use]
    pub fn ignore_whitespace(mut self, ignore: bool) -> Self {
        self.options.ignore_whitespace = ignore;
        self
    }

    #[must_use]
    pub fn ignore_processing_instructions(mut self, ignore: bool) -> Self {
        self.options.ignore_processing_instructions = ignore;
        self
    }

    /// Build the filter.
    ///
    /// # Errors
    /// Returns `FilterError::EmptyCompound` when no child filter was added.
    pub fn build(self) -> Result<CompoundParseFilter, FilterError> {
        if self.filters.is_empty() {
            return Err(FilterError::EmptyCompound);
        }
        Ok(CompoundParseFilter {
            policy: self.policy,
            filters: self.filters,
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SetParseFilter;

    fn samples() -> Vec<QName> {
        vec![
            QName::atom("entry"),
            QName::atom("title"),
            QName::atom("content"),
            QName::local("script"),
        ]
    }

    fn children() -> Vec<Arc<dyn ParseFilter>> {
        vec![
            Arc::new(
                SetParseFilter::whitelist()
                    .add(QName::atom("entry"))
                    .add(QName::atom("title"))
                    .add(QName::atom("content"))
                    .build(),
            ),
            Arc::new(SetParseFilter::blacklist().add(QName::atom("content")).build()),
        ]
    }

    fn compound(policy: CompoundPolicy) -> CompoundParseFilter {
        children()
            .into_iter()
            .fold(CompoundParseFilter::builder(policy), |b, f| b.add_shared(f))
            .build()
            .unwrap()
    }

    #[test]
    fn test_acceptable_to_all_is_conjunction() {
        let filter = compound(CompoundPolicy::AcceptableToAll);
        for name in samples() {
            let expected = children().iter().all(|f| f.acceptable(&name));
            assert_eq!(filter.acceptable(&name), expected, "{name}");
        }
        assert!(filter.acceptable(&QName::atom("title")));
        assert!(!filter.acceptable(&QName::atom("content")));
    }

    #[test]
    fn test_acceptable_to_any() {
        let filter = compound(CompoundPolicy::AcceptableToAny);
        assert!(filter.acceptable(&QName::atom("content")));
        // script: whitelist rejects, blacklist accepts
        assert!(filter.acceptable(&QName::local("script")));
    }

    #[test]
    fn test_unacceptable_to_all() {
        let only_scripts_rejected = CompoundParseFilter::builder(CompoundPolicy::UnacceptableToAll)
            .add(SetParseFilter::whitelist().add(QName::local("script")).build())
            .build()
            .unwrap();
        assert!(!only_scripts_rejected.acceptable(&QName::local("script")));
        assert!(only_scripts_rejected.acceptable(&QName::atom("title")));
    }

    #[test]
    fn test_unacceptable_to_any() {
        let filter = compound(CompoundPolicy::UnacceptableToAny);
        // content: blacklist rejects
        assert!(filter.acceptable(&QName::atom("content")));
        // title: both accept
        assert!(!filter.acceptable(&QName::atom("title")));
    }

    #[test]
    fn test_attribute_policy() {
        let link = QName::atom("link");
        let filter = CompoundParseFilter::builder(CompoundPolicy::AcceptableToAll)
            .add(SetParseFilter::blacklist().build())
            .add(
                SetParseFilter::blacklist()
                    .add_attribute(link.clone(), QName::local("onclick"))
                    .build(),
            )
            .build()
            .unwrap();
        assert!(filter.acceptable_attribute(&link, &QName::local("href")));
        assert!(!filter.acceptable_attribute(&link, &QName::local("onclick")));
    }

    #[test]
    fn test_empty_compound_is_error() {
        let result = CompoundParseFilter::builder(CompoundPolicy::AcceptableToAny).build();
        assert_eq!(result.unwrap_err(), FilterError::EmptyCompound);
    }

    #[test]
    fn test_compound_throws_with_own_option() {
        let filter = CompoundParseFilter::builder(CompoundPolicy::AcceptableToAll)
            .add(SetParseFilter::blacklist().add(QName::local("script")).build())
            .throw_on_unacceptable()
            .build()
            .unwrap();
        let err = filter.check(&QName::local("script")).unwrap_err();
        assert_eq!(err.qname(), &QName::local("script"));
    }
}
