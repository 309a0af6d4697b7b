//! Alert messages modelled on real digests, one builder per layout.
//!
//! The Scholar and AHA digests share two titles, so a session made of
//! [`scholar_alert`], [`aha_etoc`] and [`jama_digest`] yields 12 articles of
//! which 10 survive deduplication.

use chrono::{DateTime, TimeZone, Utc};
use papersift_common::models::{BodyFormat, RawMessage};

pub const SCHOLAR_ID: &str = "m-scholar";
pub const AHA_ID: &str = "m-aha";
pub const JAMA_ID: &str = "m-jama";
pub const NATURE_ID: &str = "m-nature";
pub const BIORXIV_ID: &str = "m-biorxiv";

pub const SCHOLAR_TITLES: [&str; 4] = [
    "Cardiac organoids recapitulate human fibrosis",
    "Endothelial organoids reveal shear-stress programs",
    "Renal denervation outcomes at five years",
    "Single-cell proteomics of aortic organoids",
];

pub const AHA_TITLES: [&str; 4] = [
    "Endothelial organoids reveal shear-stress programs",
    "Renal denervation outcomes at five years",
    "Lipoprotein(a) and incident stroke in young adults",
    "Vascular smooth muscle plasticity in aneurysm",
];

pub const JAMA_TITLES: [&str; 4] = [
    "Colchicine after myocardial infarction in older adults",
    "Semaglutide and heart failure hospitalisation",
    "Blood pressure targets in chronic kidney disease",
    "Sodium intake and incident atrial fibrillation",
];

/// Titles present in both the Scholar and the AHA digest.
pub const DUPLICATE_TITLES: [&str; 2] = [
    "Endothelial organoids reveal shear-stress programs",
    "Renal denervation outcomes at five years",
];

pub fn received_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 14, 8, 30, 0).single().unwrap_or_default()
}

pub fn html_message(id: &str, sender: &str, subject: &str, body: &str) -> RawMessage {
    RawMessage {
        id: id.to_string(),
        sender_address: sender.to_string(),
        subject: subject.to_string(),
        received_at: received_at(),
        body: body.to_string(),
        body_format: BodyFormat::Html,
    }
}

pub fn text_message(id: &str, sender: &str, subject: &str, body: &str) -> RawMessage {
    RawMessage { body_format: BodyFormat::PlainText, ..html_message(id, sender, subject, body) }
}

/// The three-message session used by end-to-end tests.
pub fn session() -> Vec<RawMessage> {
    vec![scholar_alert(), aha_etoc(), jama_digest()]
}

// ── Google Scholar ───────────────────────────────────────────────────────────

fn scholar_item(title: &str, target: &str, citation: &str, snippet: &str) -> String {
    format!(
        r#"<h3 style="font-weight:normal;margin:0;font-size:17px;line-height:20px">
  <a href="https://scholar.google.com/scholar_url?url={target}&amp;hl=en&amp;sa=X" class="gse_alrt_title" style="font-size:17px;color:#1a0dab;line-height:20px">{title}</a>
</h3>
<div style="color:#006621;line-height:18px">{citation}</div>
<div class="gse_alrt_sni" style="line-height:17px;width:100%">{snippet}</div>
<br>"#
    )
}

pub fn scholar_alert() -> RawMessage {
    let items = [
        scholar_item(
            SCHOLAR_TITLES[0],
            "https://www.nature.com/articles/s41591-024-02001-2",
            "J Smith,&nbsp;K Lee - Nature Medicine, 2024 - nature.com",
            "We derive cardiac organoids that model fibrotic remodelling of the adult human heart…",
        ),
        scholar_item(
            SCHOLAR_TITLES[1],
            "https://www.ahajournals.org/doi/10.1161/CIRCRESAHA.124.324567",
            "M Gomez, L Wei, T Baker - Circulation Research, 2024 - Am Heart Assoc",
            "Endothelial organoids exposed to laminar flow activate shear-responsive programs…",
        ),
        scholar_item(
            SCHOLAR_TITLES[2],
            "https://www.ahajournals.org/doi/10.1161/HYPERTENSIONAHA.124.22222",
            "R Ng, S Patel - Hypertension, 2024 - Am Heart Assoc",
            "Five-year follow-up of a sham-controlled renal denervation trial…",
        ),
        scholar_item(
            SCHOLAR_TITLES[3],
            "https://www.nature.com/articles/s44161-024-00444-1",
            "P Ito, Q Chen - Nature Cardiovascular Research, 2024 - nature.com",
            "Single-cell proteomics resolves smooth muscle states in aortic organoids…",
        ),
    ];
    let body = format!(
        r#"<!doctype html><html><head><style>body{{font-family:arial}}</style></head><body>
<div style="font-size:13px;color:#222">Scholar Alert: [ organoid ]</div>
{}
<p style="font-size:11px;color:#666">This alert is sent by Google Scholar. <a href="https://scholar.google.com/scholar_alerts?view_op=cancel">Cancel alert</a></p>
</body></html>"#,
        items.join("\n")
    );
    html_message(SCHOLAR_ID, "scholaralerts-noreply@google.com", "organoid - new results", &body)
}

// ── AHA journals ─────────────────────────────────────────────────────────────

fn aha_rows(title: &str, href: &str, authors: &str) -> String {
    format!(
        r#"<tr><td style="padding:8px 0"><a href="{href}" style="color:#c10e21;font-size:15px">{title}</a></td></tr>
<tr><td style="font-size:12px;color:#444">{authors}</td></tr>
<tr><td><a href="{href}">Full Text</a> | <a href="{href}">PDF</a></td></tr>"#
    )
}

pub fn aha_etoc() -> RawMessage {
    let safelink = "https://nam02.safelinks.protection.outlook.com/?url=https%3A%2F%2Fwww.ahajournals.org%2Fdoi%2F10.1161%2FCIRCRESAHA.124.324567&amp;data=05%7C02%7C&amp;reserved=0";
    let rows = [
        aha_rows(AHA_TITLES[0], safelink, "Maria Gomez, Li Wei, Tom Baker"),
        aha_rows(
            AHA_TITLES[1],
            "https://doi.org/10.1161/HYPERTENSIONAHA.124.22222",
            "Rachel Ng, Sunil Patel, et al.",
        ),
        aha_rows(
            AHA_TITLES[2],
            "https://www.ahajournals.org/doi/10.1161/STROKEAHA.124.045678",
            "Ana Lopez, Ben Cho, Carla Diaz",
        ),
        aha_rows(
            AHA_TITLES[3],
            "https://www.ahajournals.org/doi/10.1161/ATVBAHA.124.320001",
            "Editorial team",
        ),
    ];
    let body = format!(
        r#"<html><body><table width="600">
<tr><td><a href="https://www.ahajournals.org/journal/res">Circulation Research</a></td></tr>
{}
<tr><td style="font-size:10px"><a href="https://www.heart.org/unsubscribe">Unsubscribe</a></td></tr>
</table></body></html>"#,
        rows.join("\n")
    );
    html_message(AHA_ID, "ahajournals@ahajournals.org", "AHA Journals eTOC alert", &body)
}

// ── JAMA Network ─────────────────────────────────────────────────────────────

pub fn jama_digest() -> RawMessage {
    let body = format!(
        r#"<html><body>
<table width="640"><tr><td>
  <table><tr><td>
    <a href="https://jamanetwork.com/journals/jamacardiology/fullarticle/2812345" style="font-weight:bold;color:#000;text-decoration:none">{t0}</a>
    <p style="font-size:13px">Hana Kim, MD; Ivan Petrov, MD, PhD; Jun Sato, MD</p>
    <a href="https://jamanetwork.com/journals/jamacardiology/fullarticle/2812345">Read more</a>
  </td></tr></table>
  <table><tr><td>
    <a href="https://jamanetwork.com/journals/jamanetworkopen/fullarticle/2819999"><span style="font-size:18px;font-weight:700">{t1}</span></a>
  </td></tr>
  <tr><td><span>Lee A, Moore B, et al</span></td></tr></table>
  <table><tr><td>
    <a href="https://jamanetwork.com/journals/jamainternalmedicine/fullarticle/2820001" style="font-size:16px">{t2}</a>
    <p>Omar Farouk, MD, MPH; Priya Nair, MD</p>
  </td></tr></table>
  <table><tr><td>
    <a href="https://jamanetwork.com/journals/jama/fullarticle/2820777" style="font-weight:600">{t3}</a>
    <p>Quinn Roberts, PhD; Rosa Silva, MD, et al</p>
  </td></tr></table>
</td></tr></table>
<p style="font-size:11px"><a href="https://jamanetwork.com/pages/unsubscribe">Unsubscribe</a></p>
</body></html>"#,
        t0 = JAMA_TITLES[0],
        t1 = JAMA_TITLES[1],
        t2 = JAMA_TITLES[2],
        t3 = JAMA_TITLES[3],
    );
    html_message(JAMA_ID, "jamanetwork@jamanetwork.com", "JAMA This Week", &body)
}

// ── Nature portfolio ─────────────────────────────────────────────────────────

fn nature_item(title: &str, slug: &str, summary: &str, authors: &str) -> String {
    format!(
        r#"<table><tr><td>
<a href="https://www.nature.com/articles/{slug}" style="font-size:18px;font-weight:bold;color:#000">{title}</a>
<p style="font-size:15px;color:#333">{summary}</p>
<p style="font-size:12px;color:#666">{authors}</p>
</td></tr></table>"#
    )
}

pub fn nature_toc() -> RawMessage {
    let body = format!(
        r#"<html><body>
<h2 style="font-size:20px">Jobs</h2>
{}
<h2 style="font-size:20px">Articles</h2>
{}
{}
<h2 style="font-size:20px">Events</h2>
{}
</body></html>"#,
        nature_item("Postdoctoral fellow in cardiac regeneration", "job-123", "Apply now.", "Recruiter"),
        nature_item(
            "Cardiac organoids map fibrosis trajectories",
            "s41591-024-0001-1",
            "A time-resolved organoid atlas of fibrotic remodelling.",
            "A. Author, B. Author &amp; C. Author",
        ),
        nature_item(
            "Vascular ageing comes into focus",
            "s41591-024-0002-2",
            "Clonal haematopoiesis and arterial stiffness.",
            "D. Author &amp; E. Author",
        ),
        nature_item("Heart regeneration symposium 2024", "event-9", "Register today.", "Organisers"),
    );
    html_message(NATURE_ID, "alerts@nature.com", "Nature Medicine Volume 30 Issue 5", &body)
}

// ── bioRxiv ──────────────────────────────────────────────────────────────────

pub fn biorxiv_text() -> RawMessage {
    let body = "\
bioRxiv alert for your saved search: cardiac organoid

Single-nucleus profiling of failing human hearts
Ana Ruiz, Ben Ode and Chen Liu
posted on bioRxiv 12 May 2024
doi: 10.1101/2024.05.10.593001v2
[Full text] [PDF]

Mechanical loading rewires cardiomyocyte metabolism in organoids
Dev Gupta, Ela Novak, Finn Berg, Gia Romano
posted on bioRxiv 13 May 2024
https://doi.org/10.1101/2024.05.11.593777v1
[Full text]
";
    text_message(BIORXIV_ID, "cshljnls-mailer@alerts.biorxiv.org", "bioRxiv: new results", body)
}
