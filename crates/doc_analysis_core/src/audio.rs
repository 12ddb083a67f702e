//! crates/doc_analysis_core/src/audio.rs
//!
//! Rewrites analysis output into text that reads well aloud, and names the
//! plain-text exports.

use crate::domain::OutputKind;
use crate::templates;
use regex::Regex;
use std::sync::LazyLock;

static EXAMPLE_ABBREV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:e\.g\.|i\.e\.)").expect("valid regex"));
static ETC_ABBREV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\betc\.").expect("valid regex"));
static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)%").expect("valid regex"));
static NUMERIC_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)-(\d+)\b").expect("valid regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Produces the speech-friendly script for an analysis result.
///
/// Abbreviations, percentages and numeric ranges are spelled out, bullet
/// glyphs are dropped and newlines become spaces. The result is framed by a
/// fixed intro naming the output kind and a fixed outro.
pub fn to_audio_text(content: &str, kind: OutputKind) -> String {
    let processed = EXAMPLE_ABBREV.replace_all(content, "for example");
    let processed = ETC_ABBREV.replace_all(&processed, "and so on");
    let processed = PERCENT.replace_all(&processed, "${1} percent");
    let processed = NUMERIC_RANGE.replace_all(&processed, "${1} to ${2}");
    let processed = processed.replace('•', "").replace('\n', " ");

    format!(
        "{}{} {}",
        templates::audio_intro(kind.label()),
        processed,
        templates::AUDIO_OUTRO
    )
}

/// `{file_name}_{kind label with whitespace runs as "_", lowercased}.txt`
pub fn export_file_name(file_name: &str, kind: OutputKind) -> String {
    let slug = WHITESPACE_RUN
        .replace_all(kind.label(), "_")
        .to_lowercase();
    format!("{}_{}.txt", file_name, slug)
}

pub fn audio_script_file_name(file_name: &str) -> String {
    format!("{}_audio_script.txt", file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnalysisKind;

    const SUMMARY: OutputKind = OutputKind::Analysis(AnalysisKind::Summary);

    #[test]
    fn test_framing_sentences() {
        let text = to_audio_text("Body.", SUMMARY);
        assert_eq!(
            text,
            "Here's your summary for this document. Body. That covers the main points from your analysis. Thanks for listening."
        );
    }

    #[test]
    fn test_expands_abbreviations() {
        let text = to_audio_text("Tools, e.g. solar, I.E. wind, etc. and more", SUMMARY);
        assert!(text.contains("Tools, for example solar, for example wind, and so on and more"));
    }

    #[test]
    fn test_spells_out_numbers() {
        let text = to_audio_text("Up 45% within 6-12 months", SUMMARY);
        assert!(text.contains("Up 45 percent within 6 to 12 months"));
    }

    #[test]
    fn test_strips_bullets_and_newlines() {
        let text = to_audio_text("• One\n• Two", OutputKind::Analysis(AnalysisKind::Highlights));
        assert!(text.starts_with("Here's your highlights / key aspects for this document. "));
        assert!(!text.contains('•'));
        assert!(!text.contains('\n'));
        assert!(text.contains(" One  Two "));
    }

    #[test]
    fn test_faq_block_ranges() {
        let text = to_audio_text(
            templates::FAQ_BLOCK,
            OutputKind::Analysis(AnalysisKind::Faqs),
        );
        assert!(text.contains("within 6 to 12 months"));
        assert!(text.contains("within 18 to 24 months"));
    }

    #[test]
    fn test_export_file_names() {
        assert_eq!(
            export_file_name("Report.pdf", OutputKind::Analysis(AnalysisKind::BulletPointBrief)),
            "Report.pdf_bullet-point_brief.txt"
        );
        assert_eq!(
            export_file_name("notes.txt", OutputKind::CustomRequest),
            "notes.txt_custom_request.txt"
        );
        assert_eq!(
            audio_script_file_name("Report.pdf"),
            "Report.pdf_audio_script.txt"
        );
    }
}
