//! Extraction over full fixture alerts, one per supported layout.

use std::collections::HashSet;

use papersift_ingestion::{classify, extract, AlertSource, Publisher};
use papersift_test_utils::*;
use pretty_assertions::assert_eq;

fn titles(msg: &papersift_common::RawMessage) -> Vec<String> {
    let source = classify(&msg.sender_address, &msg.subject);
    extract(msg, source).articles.into_iter().map(|a| a.title).collect()
}

#[test]
fn test_fixtures_classify_to_their_publishers() {
    let cases = [
        (scholar_alert(), Publisher::GoogleScholar),
        (aha_etoc(), Publisher::AhaJournals),
        (jama_digest(), Publisher::JamaNetwork),
        (nature_toc(), Publisher::NaturePortfolio),
        (biorxiv_text(), Publisher::Preprint),
    ];
    for (msg, publisher) in cases {
        assert_eq!(classify(&msg.sender_address, &msg.subject), AlertSource::Known(publisher), "{}", msg.id);
    }
}

#[test]
fn test_scholar_venues_and_snippets() {
    let msg = scholar_alert();
    let out = extract(&msg, AlertSource::Known(Publisher::GoogleScholar));
    assert!(!out.used_fallback());
    assert_eq!(out.articles.iter().map(|a| a.title.as_str()).collect::<Vec<_>>(), SCHOLAR_TITLES.to_vec());

    let venues: Vec<&str> = out.articles.iter().map(|a| a.source_name.as_str()).collect();
    assert_eq!(
        venues,
        vec!["Nature Medicine", "Circulation Research", "Hypertension", "Nature Cardiovascular Research"]
    );
    assert!(out.articles.iter().all(|a| a.abstract_text.is_some() && a.message_id == SCHOLAR_ID));
    assert_eq!(out.articles[1].doi.as_deref(), Some("10.1161/CIRCRESAHA.124.324567"));
}

#[test]
fn test_aha_titles_are_link_text_verbatim() {
    let msg = aha_etoc();
    let out = extract(&msg, AlertSource::Known(Publisher::AhaJournals));
    assert_eq!(out.articles.iter().map(|a| a.title.as_str()).collect::<Vec<_>>(), AHA_TITLES.to_vec());

    let venues: Vec<&str> = out.articles.iter().map(|a| a.source_name.as_str()).collect();
    assert_eq!(
        venues,
        vec!["Circulation Research", "Hypertension", "Stroke", "Arteriosclerosis, Thrombosis, and Vascular Biology"]
    );
    assert_eq!(out.articles[1].authors.as_deref(), Some("Rachel Ng, Sunil Patel, et al."));
    assert_eq!(out.articles[3].authors, None);
}

#[test]
fn test_jama_both_title_variants_and_sub_brands() {
    let msg = jama_digest();
    let out = extract(&msg, AlertSource::Known(Publisher::JamaNetwork));
    assert_eq!(out.articles.iter().map(|a| a.title.as_str()).collect::<Vec<_>>(), JAMA_TITLES.to_vec());

    let venues: Vec<&str> = out.articles.iter().map(|a| a.source_name.as_str()).collect();
    assert_eq!(venues, vec!["JAMA Cardiology", "JAMA Network Open", "JAMA Internal Medicine", "JAMA"]);
    assert_eq!(out.articles[1].authors.as_deref(), Some("Lee A, Moore B, et al"));
}

#[test]
fn test_nature_research_sections_only() {
    let msg = nature_toc();
    let out = extract(&msg, AlertSource::Known(Publisher::NaturePortfolio));
    assert_eq!(out.narrowed, Some(true));
    assert_eq!(
        out.articles.iter().map(|a| a.title.as_str()).collect::<Vec<_>>(),
        vec!["Cardiac organoids map fibrosis trajectories", "Vascular ageing comes into focus"]
    );
    assert!(out.articles.iter().all(|a| a.source_name == "Nature Medicine"));
}

#[test]
fn test_biorxiv_plain_text() {
    let msg = biorxiv_text();
    let out = extract(&msg, AlertSource::Known(Publisher::Preprint));
    let got: Vec<(&str, Option<&str>)> = out
        .articles
        .iter()
        .map(|a| (a.title.as_str(), a.doi.as_deref()))
        .collect();
    assert_eq!(
        got,
        vec![
            ("Single-nucleus profiling of failing human hearts", Some("10.1101/2024.05.10.593001")),
            ("Mechanical loading rewires cardiomyocyte metabolism in organoids", Some("10.1101/2024.05.11.593777")),
        ]
    );
    assert!(out.articles.iter().all(|a| a.source_name == "bioRxiv"));
}

#[test]
fn test_unknown_sender_runs_every_strategy() {
    let mut msg = jama_digest();
    msg.sender_address = "colleague@university.edu".to_string();
    msg.subject = "Fwd: worth a look".to_string();
    assert_eq!(classify(&msg.sender_address, &msg.subject), AlertSource::Unknown);

    let out = extract(&msg, AlertSource::Unknown);
    assert_eq!(out.strategies.len(), 5);
    assert!(!out.used_fallback());
    let got: HashSet<&str> = out.articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(got, JAMA_TITLES.iter().copied().collect::<HashSet<_>>());
}

#[test]
fn test_unstructured_message_falls_back_to_subject() {
    let msg = html_message(
        "m-plain",
        "newsletter@society.example",
        "RE: Society newsletter - spring issue",
        "<html><body><p>Dear members, the spring meeting is in Lyon.</p></body></html>",
    );
    assert_eq!(titles(&msg), vec!["Society newsletter - spring issue".to_string()]);

    let out = extract(&msg, AlertSource::Unknown);
    let failure = out.fallback.expect("fallback reported");
    assert_eq!(failure.message_id, "m-plain");
    assert_eq!(out.articles[0].source_name, "Unknown");
    assert!(out.articles[0].origin_fragment.contains("spring meeting is in Lyon"));
}
