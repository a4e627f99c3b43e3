//! Local structural scoring of an extracted page.

use serpsmith_extract::ExtractedPage;

/// Scores the structural quality of a page in [0, 1].
///
/// Three signals, equally observable from the extraction record alone:
/// outline depth (enough headings to segment the content), hierarchy
/// discipline (no level jumps on the way down), and paragraph balance
/// (average paragraph length in a readable range).
#[must_use]
pub fn structural_score(page: &ExtractedPage) -> f64 {
    let outline = outline_signal(page);
    let hierarchy = hierarchy_signal(page);
    let balance = balance_signal(page);
    let score = 0.4 * outline + 0.3 * hierarchy + 0.3 * balance;
    score.clamp(0.0, 1.0)
}

/// Saturates at 5 headings; a flat single-heading page scores low.
#[allow(clippy::cast_precision_loss)]
fn outline_signal(page: &ExtractedPage) -> f64 {
    (page.headings.len() as f64 / 5.0).min(1.0)
}

/// Fraction of descending heading transitions that step one level at a time.
/// A jump from h2 straight to h4 counts against the page; moving back up any
/// number of levels is fine.
#[allow(clippy::cast_precision_loss)]
fn hierarchy_signal(page: &ExtractedPage) -> f64 {
    let levels: Vec<u8> = page.headings.iter().map(|h| h.level).collect();
    if levels.len() < 2 {
        return if levels.is_empty() { 0.0 } else { 1.0 };
    }
    let transitions = levels.len() - 1;
    let clean = levels
        .windows(2)
        .filter(|pair| pair[1] <= pair[0] + 1)
        .count();
    clean as f64 / transitions as f64
}

/// Full credit for an average paragraph length of 30–150 words, tapering
/// linearly to zero at 5 and 400.
#[allow(clippy::cast_precision_loss)]
fn balance_signal(page: &ExtractedPage) -> f64 {
    if page.paragraph_count == 0 {
        return 0.0;
    }
    let avg = page.word_count as f64 / page.paragraph_count as f64;
    if (30.0..=150.0).contains(&avg) {
        1.0
    } else if avg < 30.0 {
        ((avg - 5.0) / 25.0).max(0.0)
    } else {
        ((400.0 - avg) / 250.0).max(0.0)
    }
}
