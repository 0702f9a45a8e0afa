//! Relative activity per region family, and per-family acceptance bookkeeping.
use crate::error::{Error, Result};

/// Relative activity keyed by region-name prefix.
///
/// Every region whose name starts with a configured prefix belongs to that
/// prefix's family (`Rod` covers `Rod_0_1`, `Rod_5_12`, ...). Prefixes may not
/// be prefixes of one another, so a region name matches at most one family.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivityProfile {
    entries: Vec<(String, f64)>,
}

impl ActivityProfile {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Sets the activity of `prefix`, replacing any previous value.
    pub fn with(mut self, prefix: impl Into<String>, activity: f64) -> Self {
        self.set(prefix, activity);
        self
    }

    pub fn set(&mut self, prefix: impl Into<String>, activity: f64) {
        let prefix = prefix.into();
        match self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = activity,
            None => self.entries.push((prefix, activity)),
        }
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |profile, (p, a)| profile.with(p, a))
    }

    pub fn get(&self, prefix: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, a)| *a)
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(p, a)| (p.as_str(), *a))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_activity(&self) -> f64 {
        self.entries.iter().map(|(_, a)| *a).fold(0.0, f64::max)
    }

    /// Copy of the profile scaled so the largest activity is 1.
    pub fn normalized(&self) -> Result<Self> {
        self.validate()?;
        let max = self.max_activity();
        if max <= 0.0 {
            return Err(Error::InvalidConfig(
                "cannot normalize an activity profile whose activities are all zero".into(),
            ));
        }
        Ok(Self {
            entries: self
                .entries
                .iter()
                .map(|(p, a)| (p.clone(), a / max))
                .collect(),
        })
    }

    /// Checks for at least one entry, non-empty and mutually non-prefix names,
    /// and finite non-negative activities.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(Error::InvalidConfig("activity profile is empty".into()));
        }
        for (i, (prefix, activity)) in self.entries.iter().enumerate() {
            if prefix.is_empty() {
                return Err(Error::InvalidConfig(
                    "activity prefixes must not be empty".into(),
                ));
            }
            if !activity.is_finite() || *activity < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "activity of '{prefix}' is {activity}; activities must be finite and >= 0"
                )));
            }
            for (other, _) in &self.entries[i + 1..] {
                if other.starts_with(prefix.as_str()) || prefix.starts_with(other.as_str()) {
                    return Err(Error::InvalidConfig(format!(
                        "activity prefixes '{prefix}' and '{other}' overlap"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Index of the family `region` belongs to.
    #[inline]
    pub(crate) fn match_prefix(&self, region: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(p, _)| region.starts_with(p.as_str()))
    }

    #[inline]
    pub(crate) fn activity_at(&self, index: usize) -> f64 {
        self.entries[index].1
    }
}

/// Kept and rejected proposal counts for one region family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefixCounts {
    pub kept: u64,
    pub rejected: u64,
}

impl PrefixCounts {
    pub fn proposed(&self) -> u64 {
        self.kept + self.rejected
    }
}

/// Per-family acceptance counters owned by a single generator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptanceCounters {
    prefixes: Vec<String>,
    counts: Vec<PrefixCounts>,
}

impl AcceptanceCounters {
    pub fn for_profile(profile: &ActivityProfile) -> Self {
        let prefixes: Vec<String> = profile.prefixes().map(str::to_owned).collect();
        let counts = vec![PrefixCounts::default(); prefixes.len()];
        Self { prefixes, counts }
    }

    pub fn get(&self, prefix: &str) -> Option<PrefixCounts> {
        self.prefixes
            .iter()
            .position(|p| p == prefix)
            .map(|i| self.counts[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PrefixCounts)> {
        self.prefixes
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }

    pub fn total_kept(&self) -> u64 {
        self.counts.iter().map(|c| c.kept).sum()
    }

    pub fn total_rejected(&self) -> u64 {
        self.counts.iter().map(|c| c.rejected).sum()
    }

    /// Fraction of proposals accepted so far, or `None` before the first proposal.
    pub fn acceptance_ratio(&self) -> Option<f64> {
        let kept = self.total_kept();
        let total = kept + self.total_rejected();
        (total > 0).then(|| kept as f64 / total as f64)
    }

    pub fn reset(&mut self) {
        self.counts.fill(PrefixCounts::default());
    }

    #[inline]
    pub(crate) fn keep(&mut self, index: usize) {
        self.counts[index].kept += 1;
    }

    #[inline]
    pub(crate) fn reject(&mut self, index: usize) {
        self.counts[index].rejected += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_replaces_existing_prefix() {
        let profile = ActivityProfile::new().with("Rod", 2.0).with("Rod", 3.0);
        assert_eq!(profile.len(), 1);
        assert_eq!(profile.get("Rod"), Some(3.0));
    }

    #[test]
    fn normalized_scales_max_to_one() {
        let profile = ActivityProfile::from_pairs([("Body", 0.0), ("Sphere", 1.0), ("Rod", 2.0)])
            .normalized()
            .unwrap();
        assert_eq!(profile.get("Body"), Some(0.0));
        assert_eq!(profile.get("Sphere"), Some(0.5));
        assert_eq!(profile.get("Rod"), Some(1.0));
        assert_eq!(profile.max_activity(), 1.0);
    }

    #[test]
    fn all_zero_profiles_cannot_be_normalized() {
        let profile = ActivityProfile::from_pairs([("Body", 0.0), ("Rod", 0.0)]);
        assert!(profile.validate().is_ok());
        assert!(matches!(profile.normalized(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn overlapping_prefixes_are_rejected() {
        let profile = ActivityProfile::from_pairs([("Rod", 1.0), ("Rod_1", 0.5)]);
        assert!(matches!(profile.validate(), Err(Error::InvalidConfig(_))));
        let profile = ActivityProfile::from_pairs([("Sphere_1", 1.0), ("Sphere", 0.5)]);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn bad_activities_and_empty_profiles_are_rejected() {
        assert!(ActivityProfile::new().validate().is_err());
        assert!(ActivityProfile::new().with("Rod", -1.0).validate().is_err());
        assert!(ActivityProfile::new().with("Rod", f64::NAN).validate().is_err());
        assert!(ActivityProfile::new().with("", 1.0).validate().is_err());
    }

    #[test]
    fn match_prefix_groups_numbered_regions() {
        let profile = ActivityProfile::from_pairs([("Body", 1.0), ("Rod", 0.5), ("Sphere", 0.0)]);
        assert_eq!(profile.match_prefix("Rod_3_17"), Some(1));
        assert_eq!(profile.match_prefix("Sphere_0"), Some(2));
        assert_eq!(profile.match_prefix("Body"), Some(0));
        assert_eq!(profile.match_prefix("World"), None);
    }

    #[test]
    fn counters_track_each_family() {
        let profile = ActivityProfile::from_pairs([("Body", 1.0), ("Rod", 0.5)]);
        let mut counters = AcceptanceCounters::for_profile(&profile);
        assert_eq!(counters.acceptance_ratio(), None);
        counters.keep(0);
        counters.reject(1);
        counters.reject(1);
        counters.keep(1);
        assert_eq!(counters.get("Body"), Some(PrefixCounts { kept: 1, rejected: 0 }));
        assert_eq!(counters.get("Rod").unwrap().proposed(), 3);
        assert_eq!(counters.acceptance_ratio(), Some(0.5));
        counters.reset();
        assert_eq!(counters.total_kept() + counters.total_rejected(), 0);
    }
}
