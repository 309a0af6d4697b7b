//! Map an alert's sender and subject to a known publisher layout.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Publisher {
    GoogleScholar,
    AhaJournals,
    NaturePortfolio,
    Preprint,
    JamaNetwork,
}

impl Publisher {
    pub const ALL: [Publisher; 5] = [
        Publisher::GoogleScholar,
        Publisher::AhaJournals,
        Publisher::NaturePortfolio,
        Publisher::Preprint,
        Publisher::JamaNetwork,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Publisher::GoogleScholar   => "Google Scholar",
            Publisher::AhaJournals     => "AHA Journals",
            Publisher::NaturePortfolio => "Nature Portfolio",
            Publisher::Preprint        => "bioRxiv/medRxiv",
            Publisher::JamaNetwork     => "JAMA Network",
        }
    }

    /// Venue label used when a strategy cannot resolve anything better.
    pub fn default_venue(&self) -> &'static str {
        match self {
            Publisher::GoogleScholar   => "Google Scholar",
            Publisher::AhaJournals     => "AHA Journals",
            Publisher::NaturePortfolio => "Nature",
            Publisher::Preprint        => "bioRxiv",
            Publisher::JamaNetwork     => "JAMA",
        }
    }
}

/// Classified origin of an alert message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "publisher", rename_all = "snake_case")]
pub enum AlertSource {
    Known(Publisher),
    Unknown,
}

impl AlertSource {
    pub fn label(&self) -> &'static str {
        match self {
            AlertSource::Known(p) => p.display_name(),
            AlertSource::Unknown => "Unknown",
        }
    }

    pub fn default_venue(&self) -> &'static str {
        match self {
            AlertSource::Known(p) => p.default_venue(),
            AlertSource::Unknown => "Unknown",
        }
    }
}

/// Sender address fragments, checked first.
const SENDER_RULES: &[(&str, Publisher)] = &[
    ("scholaralerts-noreply@google.com", Publisher::GoogleScholar),
    ("scholar.google", Publisher::GoogleScholar),
    ("ahajournals.org", Publisher::AhaJournals),
    ("heart.org", Publisher::AhaJournals),
    ("nature.com", Publisher::NaturePortfolio),
    ("springernature.com", Publisher::NaturePortfolio),
    ("biorxiv.org", Publisher::Preprint),
    ("medrxiv.org", Publisher::Preprint),
    ("jamanetwork.com", Publisher::JamaNetwork),
    ("ama-assn.org", Publisher::JamaNetwork),
];

/// Subject-line phrases, matched on whole words when no sender rule matched.
const SUBJECT_RULES: &[(&str, Publisher)] = &[
    ("google scholar", Publisher::GoogleScholar),
    ("scholar alert", Publisher::GoogleScholar),
    ("aha journals", Publisher::AhaJournals),
    ("american heart association", Publisher::AhaJournals),
    ("nature portfolio", Publisher::NaturePortfolio),
    ("nature briefing", Publisher::NaturePortfolio),
    ("nature research", Publisher::NaturePortfolio),
    ("biorxiv", Publisher::Preprint),
    ("medrxiv", Publisher::Preprint),
    ("jama network", Publisher::JamaNetwork),
    ("jama", Publisher::JamaNetwork),
];

/// Classify an alert. Sender rules win over subject rules; anything
/// unmatched is `Unknown`.
pub fn classify(sender: &str, subject: &str) -> AlertSource {
    let sender = sender.to_lowercase();
    if let Some((_, p)) = SENDER_RULES.iter().find(|(needle, _)| sender.contains(needle)) {
        return AlertSource::Known(*p);
    }

    let words: String = subject
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let subject = format!(" {} ", words.split_whitespace().collect::<Vec<_>>().join(" "));
    SUBJECT_RULES
        .iter()
        .find(|(needle, _)| subject.contains(&format!(" {needle} ")))
        .map(|(_, p)| AlertSource::Known(*p))
        .unwrap_or(AlertSource::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_rules() {
        assert_eq!(
            classify("scholaralerts-noreply@google.com", "New articles"),
            AlertSource::Known(Publisher::GoogleScholar)
        );
        assert_eq!(
            classify("AHAJournals@ahajournals.org", "Circulation eTOC"),
            AlertSource::Known(Publisher::AhaJournals)
        );
        assert_eq!(classify("alerts@nature.com", "Nature Medicine"), AlertSource::Known(Publisher::NaturePortfolio));
        assert_eq!(classify("no-reply@medrxiv.org", "digest"), AlertSource::Known(Publisher::Preprint));
        assert_eq!(classify("JAMA@jamanetwork.com", "This week"), AlertSource::Known(Publisher::JamaNetwork));
    }

    #[test]
    fn test_sender_beats_subject() {
        // Subject mentions bioRxiv but the sender is Scholar.
        assert_eq!(
            classify("scholaralerts-noreply@google.com", "New bioRxiv results for organoid"),
            AlertSource::Known(Publisher::GoogleScholar)
        );
    }

    #[test]
    fn test_subject_fallback() {
        assert_eq!(
            classify("digest@forwarder.example", "Fwd: JAMA Cardiology table of contents"),
            AlertSource::Known(Publisher::JamaNetwork)
        );
        assert_eq!(classify("me@example.org", "Fwd: weekly bioRxiv alert"), AlertSource::Known(Publisher::Preprint));
    }

    #[test]
    fn test_unknown() {
        let s = classify("newsletter@example.com", "Our spring update");
        assert_eq!(s, AlertSource::Unknown);
        assert_eq!(s.default_venue(), "Unknown");
    }

    #[test]
    fn test_subject_rules_match_whole_words() {
        assert_eq!(classify("x@example.com", "Pajama sale"), AlertSource::Unknown);
        assert_eq!(classify("x@example.com", "[JAMA] Online first"), AlertSource::Known(Publisher::JamaNetwork));
    }
}
