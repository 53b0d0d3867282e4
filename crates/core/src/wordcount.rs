use crate::error::PipelineError;
use crate::extractor::{LopdfExtractor, PageText, PdfExtractor};
use crate::models::{SearchWord, WordCounts};
use crate::progress::{NoopProgress, Stage, StageProgress};
use regex::{Regex, RegexBuilder};
use std::path::Path;
use tracing::debug;

/// Whole-word, case-insensitive matcher for one search word. The word is
/// escaped, so metacharacters match literally.
pub fn word_pattern(word: &SearchWord) -> Result<Regex, PipelineError> {
    let pattern = format!(r"\b{}\b", regex::escape(word.as_str()));
    Ok(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
}

pub struct WordCounter {
    patterns: Vec<Regex>,
    counts: WordCounts,
}

impl WordCounter {
    pub fn new(words: &[SearchWord]) -> Result<Self, PipelineError> {
        let patterns = words.iter().map(word_pattern).collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            counts: WordCounts::zeroed(words),
        })
    }

    /// Adds the matches found in `text` to the running totals.
    pub fn add_text(&mut self, text: &str) {
        let lowered = text.to_lowercase();
        for (pattern, tally) in self.patterns.iter().zip(self.counts.tallies.iter_mut()) {
            tally.count += pattern.find_iter(&lowered).count();
        }
    }

    pub fn finish(self) -> WordCounts {
        self.counts
    }
}

pub fn count_words_in_pages(pages: &[PageText], words: &[SearchWord]) -> Result<WordCounts, PipelineError> {
    let mut counter = WordCounter::new(words)?;
    for page in pages {
        counter.add_text(&page.text);
    }
    Ok(counter.finish())
}

/// Counts `words` over every page of `pdf`, reporting one progress step per
/// page.
pub fn count_word_frequency<E>(
    pdf: &Path,
    words: &[SearchWord],
    extractor: &E,
    progress: &dyn StageProgress,
) -> Result<WordCounts, PipelineError>
where
    E: PdfExtractor + ?Sized,
{
    let pages = extractor.extract_pages(pdf)?;
    debug!(pdf = %pdf.display(), pages = pages.len(), words = words.len(), "counting words");

    let mut counter = WordCounter::new(words)?;
    progress.on_stage_start(Stage::Counting, pages.len());
    for page in &pages {
        counter.add_text(&page.text);
        progress.on_item_done(Stage::Counting);
    }
    progress.on_stage_finish(Stage::Counting);

    Ok(counter.finish())
}

pub fn count_word_frequency_in_pdf(pdf: &Path, words: &[SearchWord]) -> Result<WordCounts, PipelineError> {
    count_word_frequency(pdf, words, &LopdfExtractor, &NoopProgress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::write_text_pdf;
    use tempfile::tempdir;

    fn words(raw: &[&str]) -> Vec<SearchWord> {
        raw.iter().filter_map(|word| SearchWord::parse(word)).collect()
    }

    fn page(text: &str) -> PageText {
        PageText {
            number: 1,
            text: text.to_string(),
        }
    }

    #[test]
    fn counting_ignores_case() -> Result<(), Box<dyn std::error::Error>> {
        let pages = vec![page("Report one. REPORT two. report three.")];

        let upper = count_words_in_pages(&pages, &words(&["Report"]))?;
        let lower = count_words_in_pages(&pages, &words(&["report"]))?;

        assert_eq!(upper.get("report"), Some(3));
        assert_eq!(upper, lower);
        Ok(())
    }

    #[test]
    fn only_whole_words_match() -> Result<(), Box<dyn std::error::Error>> {
        let counts = count_words_in_pages(&[page("the category of concatenation")], &words(&["cat"]))?;
        assert_eq!(counts.get("cat"), Some(0));
        Ok(())
    }

    #[test]
    fn metacharacters_are_literal() -> Result<(), Box<dyn std::error::Error>> {
        let counts = count_words_in_pages(&[page("a.b and axb and a-b")], &words(&["a.b"]))?;
        assert_eq!(counts.get("a.b"), Some(1));
        Ok(())
    }

    #[test]
    fn counts_accumulate_across_pages() -> Result<(), Box<dyn std::error::Error>> {
        let pages = vec![page("budget budget"), page("no match here"), page("Budget")];
        let counts = count_words_in_pages(&pages, &words(&["budget"]))?;
        assert_eq!(counts.get("budget"), Some(3));
        Ok(())
    }

    #[test]
    fn duplicate_words_keep_independent_tallies() -> Result<(), Box<dyn std::error::Error>> {
        let counts = count_words_in_pages(&[page("The cat sat")], &words(&["the", "The"]))?;

        let tallies: Vec<(&str, usize)> = counts.iter().map(|t| (t.word.as_str(), t.count)).collect();
        assert_eq!(tallies, vec![("the", 1), ("the", 1)]);
        Ok(())
    }

    #[test]
    fn no_words_means_no_tallies() -> Result<(), Box<dyn std::error::Error>> {
        let counts = count_words_in_pages(&[page("anything")], &[])?;
        assert!(counts.is_empty());
        Ok(())
    }

    #[test]
    fn counts_come_from_every_pdf_page() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let pdf = dir.path().join("merged.pdf");
        write_text_pdf(&pdf, &["Safety first", "safety checklist", "unsafe"])?;

        let counts = count_word_frequency_in_pdf(&pdf, &words(&["safety", "checklist"]))?;

        assert_eq!(counts.get("safety"), Some(2));
        assert_eq!(counts.get("checklist"), Some(1));
        Ok(())
    }
}
