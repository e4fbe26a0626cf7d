// src/services/announcements.rs

//! Announcement scraper service.
//!
//! Fetches the announcements page and extracts rows that carry the
//! configured two-cell signature.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Announcement, Config};
use crate::utils::http::{create_async_client, fetch_page_async};

/// Anything that can produce the current list of announcements, newest first.
#[async_trait]
pub trait AnnouncementSource: Send + Sync {
    /// Fetch the announcements currently published.
    ///
    /// `Ok(vec![])` means the page was fetched but no row matched.
    async fn fetch(&self) -> Result<Vec<Announcement>>;
}

/// Scrapes announcements from the configured page.
pub struct AnnouncementScraper {
    client: Client,
    url: String,
    row_style: String,
}

impl AnnouncementScraper {
    /// Create a scraper with a client built from the HTTP settings.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_client(
            create_async_client(&config.http)?,
            &config.source.url,
            &config.source.row_style,
        ))
    }

    /// Create a scraper around an existing client.
    pub fn with_client(client: Client, url: &str, row_style: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
            row_style: row_style.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AnnouncementSource for AnnouncementScraper {
    async fn fetch(&self) -> Result<Vec<Announcement>> {
        log::info!("Fetching page: {}", self.url);
        let document = fetch_page_async(&self.client, &self.url).await?;
        let announcements = parse_announcements(&document, &self.row_style)?;
        log::debug!(
            "Parsed {} announcement(s) from {}",
            announcements.len(),
            self.url
        );
        Ok(announcements)
    }
}

/// Extract announcements from a parsed page, in page order.
///
/// A row qualifies when it holds exactly two cells and the first cell's
/// `style` attribute equals `row_style`. Qualifying rows without a bold
/// title or a date are skipped.
pub fn parse_announcements(document: &Html, row_style: &str) -> Result<Vec<Announcement>> {
    let row_sel = parse_selector("tr")?;
    let cell_sel = parse_selector("td")?;
    let title_sel = parse_selector("strong")?;
    let paragraph_sel = parse_selector("p")?;

    let announcements = document
        .select(&row_sel)
        .filter_map(|row| {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            if cells.len() != 2 || cells[0].value().attr("style") != Some(row_style) {
                return None;
            }
            parse_row(cells[0], cells[1], &title_sel, &paragraph_sel)
        })
        .collect();

    Ok(announcements)
}

fn parse_row(
    content_cell: ElementRef,
    date_cell: ElementRef,
    title_sel: &Selector,
    paragraph_sel: &Selector,
) -> Option<Announcement> {
    let title: String = content_cell
        .select(title_sel)
        .next()?
        .text()
        .map(str::trim)
        .collect();
    if title.is_empty() {
        return None;
    }

    let date = date_cell
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .last()?
        .to_string();

    // Line breaks inside a paragraph's source text start new preview lines.
    let preview = content_cell
        .select(paragraph_sel)
        .flat_map(|p| {
            let text = p
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            text.split('\n')
                .map(|line| line.trim().to_string())
                .collect::<Vec<_>>()
        })
        .collect();

    Some(Announcement::new(title, date, preview))
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::crawl("selector", format!("{s}: {e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLE: &str = "border: 1px solid #ababab; text-align: center;";

    fn row(title: &str, paragraphs: &[&str], date_cell: &str) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", p))
            .collect();
        format!(
            r#"<tr><td style="{STYLE}"><strong>{title}</strong>{body}</td><td>{date_cell}</td></tr>"#
        )
    }

    fn page(rows: &[String]) -> Html {
        Html::parse_document(&format!(
            "<html><body><table>{}</table></body></html>",
            rows.concat()
        ))
    }

    #[test]
    fn test_parses_matching_rows_in_page_order() {
        let doc = page(&[
            row("Newest", &["a"], "20/01/2025"),
            row("Older", &["b"], "10/01/2025"),
        ]);
        let anns = parse_announcements(&doc, STYLE).unwrap();
        assert_eq!(anns.len(), 2);
        assert_eq!(anns[0].title(), "Newest");
        assert_eq!(anns[0].id(), "Newest_20/01/2025");
        assert_eq!(anns[1].title(), "Older");
    }

    #[test]
    fn test_date_is_last_non_empty_fragment() {
        let doc = page(&[row(
            "Avis",
            &[],
            "<span>Publié le</span><br>  <b> 05/02/2025 </b>  <span> </span>",
        )]);
        let anns = parse_announcements(&doc, STYLE).unwrap();
        assert_eq!(anns[0].date(), "05/02/2025");
    }

    #[test]
    fn test_title_fragments_are_trimmed() {
        let doc = page(&[row(" Planning <em> S1 </em> ", &[], "01/01/2025")]);
        let anns = parse_announcements(&doc, STYLE).unwrap();
        assert_eq!(anns[0].title(), "PlanningS1");
    }

    #[test]
    fn test_preview_lines_follow_paragraphs() {
        let doc = page(&[row(
            "Avis",
            &["  Première   ligne ", "<span>deux</span> <b>mots</b>", ""],
            "01/01/2025",
        )]);
        let anns = parse_announcements(&doc, STYLE).unwrap();
        assert_eq!(
            anns[0].content_preview(),
            &["Première   ligne", "deux mots", ""]
        );
    }

    #[test]
    fn test_line_breaks_inside_paragraph_split_preview() {
        let doc = page(&[row(
            "Avis",
            &["Les etudiants\n      sont pries\n      de consulter", "x"],
            "01/01/2025",
        )]);
        let anns = parse_announcements(&doc, STYLE).unwrap();
        assert_eq!(
            anns[0].content_preview(),
            &["Les etudiants", "sont pries", "de consulter", "x"]
        );
    }

    #[test]
    fn test_skips_rows_with_other_style() {
        let doc = Html::parse_document(
            r#"<table>
                <tr><td style="text-align: center;"><strong>X</strong></td><td>01/01/2025</td></tr>
            </table>"#,
        );
        assert!(parse_announcements(&doc, STYLE).unwrap().is_empty());
    }

    #[test]
    fn test_skips_rows_without_two_cells() {
        let doc = Html::parse_document(&format!(
            r#"<table>
                <tr><td style="{STYLE}"><strong>X</strong></td><td>01/01/2025</td><td>extra</td></tr>
                <tr><td style="{STYLE}"><strong>Y</strong></td></tr>
            </table>"#
        ));
        assert!(parse_announcements(&doc, STYLE).unwrap().is_empty());
    }

    #[test]
    fn test_skips_rows_missing_title_or_date() {
        let doc = Html::parse_document(&format!(
            r#"<table>
                <tr><td style="{STYLE}"><p>no title</p></td><td>01/01/2025</td></tr>
                <tr><td style="{STYLE}"><strong>  </strong></td><td>01/01/2025</td></tr>
                <tr><td style="{STYLE}"><strong>No date</strong></td><td>   </td></tr>
                <tr><td style="{STYLE}"><strong>Kept</strong></td><td>02/01/2025</td></tr>
            </table>"#
        ));
        let anns = parse_announcements(&doc, STYLE).unwrap();
        assert_eq!(anns.len(), 1);
        assert_eq!(anns[0].title(), "Kept");
    }

    #[test]
    fn test_page_without_rows_is_empty() {
        let doc = Html::parse_document("<html><body><p>Maintenance</p></body></html>");
        assert!(parse_announcements(&doc, STYLE).unwrap().is_empty());
    }
}
