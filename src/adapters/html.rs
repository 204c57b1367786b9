//! One scraper for every HTML venue, driven by its [`HtmlRules`].

use async_trait::async_trait;
use chrono::{DateTime, Local};
use encoding_rs::Encoding;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use url::Url;

use crate::adapters::venues::{DateRule, HtmlRules};
use crate::core::datetime::parse_showing_time_at;
use crate::domain::model::{Showing, TitleShowings};
use crate::domain::ports::SourceAdapter;
use crate::domain::venue::Venue;
use crate::utils::error::{DigestError, Result};

enum DateSelector {
    Text(Selector),
    TrailingLines(Selector, usize),
    AttrWithText(&'static str, Selector),
    CarriedDate { date: Selector, time: Selector },
    HandlerArgument {
        selector: Selector,
        attr: &'static str,
        from_end: usize,
    },
    Spans {
        container: Selector,
        item: Selector,
        date_index: usize,
        time_index: usize,
    },
}

/// [`HtmlRules`] with every selector parsed once.
struct CompiledRules {
    rules: HtmlRules,
    root: Selector,
    title: Selector,
    date: DateSelector,
    link: Option<(Selector, &'static str)>,
    next_page: Option<Selector>,
    /// Forced page encoding, whatever the response headers claim.
    encoding: Option<&'static Encoding>,
}

fn compile(venue: Venue, css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| DigestError::processing(format!("{}: invalid selector {:?}: {:?}", venue, css, e)))
}

impl CompiledRules {
    fn new(rules: HtmlRules) -> Result<Self> {
        let v = rules.venue;
        let date = match rules.date {
            DateRule::Text { selector } => DateSelector::Text(compile(v, selector)?),
            DateRule::TrailingLines { selector, lines } => {
                DateSelector::TrailingLines(compile(v, selector)?, lines)
            }
            DateRule::AttrWithText { attr, time } => {
                DateSelector::AttrWithText(attr, compile(v, time)?)
            }
            DateRule::CarriedDate { date, time } => DateSelector::CarriedDate {
                date: compile(v, date)?,
                time: compile(v, time)?,
            },
            DateRule::HandlerArgument {
                selector,
                attr,
                from_end,
            } => DateSelector::HandlerArgument {
                selector: compile(v, selector)?,
                attr,
                from_end,
            },
            DateRule::Spans {
                container,
                item,
                date_index,
                time_index,
            } => DateSelector::Spans {
                container: compile(v, container)?,
                item: compile(v, item)?,
                date_index,
                time_index,
            },
        };

        let encoding = match rules.charset {
            Some(label) => Some(Encoding::for_label(label.as_bytes()).ok_or_else(|| {
                DigestError::processing(format!("{}: unknown charset {:?}", v, label))
            })?),
            None => None,
        };

        Ok(Self {
            rules,
            encoding,
            root: compile(v, rules.root)?,
            title: compile(v, rules.title)?,
            date,
            link: match rules.link {
                Some(link) => Some((compile(v, link.selector)?, link.attr)),
                None => None,
            },
            next_page: match rules.next_page {
                Some(css) => Some(compile(v, css)?),
                None => None,
            },
        })
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn joined_text(element: ElementRef<'_>, selector: &Selector) -> String {
    element.select(selector).map(text_of).collect()
}

/// What one repertoire page yielded.
#[derive(Debug, Default)]
struct Page {
    showings: Vec<(String, Showing)>,
    links: Vec<Url>,
}

impl CompiledRules {
    fn title_of(&self, element: ElementRef<'_>) -> String {
        let raw = if self.rules.title_first {
            element.select(&self.title).next().map(text_of).unwrap_or_default()
        } else {
            joined_text(element, &self.title)
        };
        raw.trim().to_string()
    }

    /// Raw date/time fragment, or `None` when the element carries no showing.
    fn date_of(&self, element: ElementRef<'_>, carried: &mut String) -> Option<String> {
        match &self.date {
            DateSelector::Text(selector) => Some(joined_text(element, selector)),
            DateSelector::TrailingLines(selector, lines) => {
                let text = joined_text(element, selector);
                let kept: Vec<&str> = text
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect();
                let from = kept.len().saturating_sub(*lines);
                Some(kept[from..].join(" "))
            }
            DateSelector::AttrWithText(attr, time) => {
                let date = element.value().attr(attr).unwrap_or_default();
                Some(format!("{} {}", date, joined_text(element, time)))
            }
            DateSelector::CarriedDate { date, time } => {
                if let Some(separator) = element.select(date).next() {
                    *carried = text_of(separator);
                }
                Some(format!("{} {}", carried, joined_text(element, time)))
            }
            DateSelector::HandlerArgument {
                selector,
                attr,
                from_end,
            } => {
                let anchor = element.select(selector).next()?;
                let handler = anchor.value().attr(attr)?;
                let args: Vec<&str> = handler.split(',').collect();
                let date = args.len().checked_sub(*from_end).map(|i| args[i])?;
                Some(format!("{} {}", date, text_of(anchor)))
            }
            DateSelector::Spans {
                container,
                item,
                date_index,
                time_index,
            } => {
                let container = element.select(container).next()?;
                let items: Vec<String> = container.select(item).map(text_of).collect();
                let date = items.get(*date_index).cloned().unwrap_or_default();
                let time = items.get(*time_index).cloned().unwrap_or_default();
                Some(format!("{} {}", date, time))
            }
        }
    }

    fn link_of(&self, element: ElementRef<'_>, origin: &Url) -> Option<String> {
        let (selector, attr) = self.link.as_ref()?;
        let href = element.select(selector).next()?.value().attr(attr)?;
        origin.join(href.trim()).ok().map(String::from)
    }

    /// Reads every showing on the page. Runs synchronously so the parsed
    /// document never lives across an await point.
    fn parse_page(&self, html: &str, page_url: &Url, origin: &Url, now: DateTime<Local>) -> Page {
        let document = Html::parse_document(html);
        let venue = self.rules.venue;
        let mut page = Page::default();
        let mut carried = String::new();

        for element in document.select(&self.root) {
            let title = self.title_of(element);
            if title.is_empty() {
                continue;
            }

            let Some(raw) = self.date_of(element, &mut carried) else {
                continue;
            };
            let Some(time) = parse_showing_time_at(&raw, venue, now.naive_local()) else {
                continue;
            };
            if self.rules.skip_past && time < now {
                continue;
            }

            let url = self.link_of(element, origin);
            page.showings.push((title, Showing::new(venue, time, url)));
        }

        if let Some(next) = &self.next_page {
            page.links = document
                .select(next)
                .filter_map(|a| a.value().attr("href"))
                .filter_map(|href| page_url.join(href.trim()).ok())
                .collect();
        }

        page
    }
}

/// Shared by every page task of one run.
struct PageReader {
    compiled: CompiledRules,
    client: Client,
    origin: Url,
}

impl PageReader {
    async fn fetch(&self, url: &Url) -> Result<String> {
        tracing::debug!("📡 {}: GET {}", self.compiled.rules.venue, url);
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?;

        let body = match self.compiled.encoding {
            Some(encoding) => {
                let bytes = response.bytes().await?;
                let (text, had_errors) = encoding.decode_without_bom_handling(&bytes);
                if had_errors {
                    tracing::debug!(
                        "🔤 {}: malformed {} bytes on {}",
                        self.compiled.rules.venue,
                        encoding.name(),
                        url
                    );
                }
                text.into_owned()
            }
            None => response.text().await?,
        };
        Ok(body)
    }

    /// Fetches `url`, merges its showings into `sink` and returns the pages it links to.
    async fn visit(
        &self,
        url: &Url,
        now: DateTime<Local>,
        sink: &Mutex<TitleShowings>,
    ) -> Result<Vec<Url>> {
        let body = self.fetch(url).await?;
        let page = self.compiled.parse_page(&body, url, &self.origin, now);

        tracing::debug!(
            "📄 {}: {} showings, {} links on {}",
            self.compiled.rules.venue,
            page.showings.len(),
            page.links.len(),
            url
        );

        let mut titles = sink.lock().await;
        for (title, showing) in page.showings {
            titles.entry(title).or_default().push(showing);
        }
        Ok(page.links)
    }
}

pub struct HtmlAdapter {
    reader: Arc<PageReader>,
    max_depth: usize,
}

impl HtmlAdapter {
    pub fn new(rules: HtmlRules, client: Client, origin: Url, max_depth: usize) -> Result<Self> {
        Ok(Self {
            reader: Arc::new(PageReader {
                compiled: CompiledRules::new(rules)?,
                client,
                origin,
            }),
            max_depth,
        })
    }

    pub fn start_url(&self) -> Result<Url> {
        let rules = &self.reader.compiled.rules;
        self.reader.origin.join(rules.start_path).map_err(|e| {
            DigestError::processing(format!("{}: bad start path {:?}: {}", rules.venue, rules.start_path, e))
        })
    }

    async fn crawl(&self, now: DateTime<Local>) -> Result<TitleShowings> {
        let venue = self.venue();
        let sink = Arc::new(Mutex::new(TitleShowings::new()));

        let start = self.start_url()?;
        let mut visited: HashSet<Url> = HashSet::from([start.clone()]);
        let mut frontier: Vec<Url> = self
            .reader
            .visit(&start, now, &sink)
            .await?
            .into_iter()
            .filter(|u| visited.insert(u.clone()))
            .collect();

        // the start page is depth 1
        let mut depth = 1;
        while depth < self.max_depth && !frontier.is_empty() {
            depth += 1;
            tracing::debug!("📑 {}: {} pages at depth {}", venue, frontier.len(), depth);

            let mut tasks = JoinSet::new();
            for url in frontier.drain(..) {
                let reader = Arc::clone(&self.reader);
                let sink = Arc::clone(&sink);
                tasks.spawn(async move {
                    let links = reader.visit(&url, now, &sink).await;
                    (url, links)
                });
            }

            let mut discovered = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((_, Ok(links))) => discovered.extend(links),
                    Ok((url, Err(e))) => tracing::warn!("⚠️ {}: skipping {} ({})", venue, url, e),
                    Err(e) => tracing::warn!("⚠️ {}: page task failed ({})", venue, e),
                }
            }

            frontier = discovered
                .into_iter()
                .filter(|u| visited.insert(u.clone()))
                .collect();
        }

        let titles = std::mem::take(&mut *sink.lock().await);
        Ok(titles)
    }
}

#[async_trait]
impl SourceAdapter for HtmlAdapter {
    fn venue(&self) -> Venue {
        self.reader.compiled.rules.venue
    }

    async fn run(&self) -> Result<TitleShowings> {
        self.crawl(Local::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::venues::html_rules;
    use chrono::{TimeZone, Timelike};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn parse(venue: Venue, html: &str) -> Page {
        let rules = CompiledRules::new(html_rules(venue).unwrap()).unwrap();
        let origin = Url::parse(rules.rules.origin).unwrap();
        let page_url = origin.join(rules.rules.start_path).unwrap();
        rules.parse_page(html, &page_url, &origin, now())
    }

    fn hm(s: &Showing) -> (u32, u32, u32) {
        let t = s.time.naive_local();
        (chrono::Datelike::day(&t.date()), t.hour(), t.minute())
    }

    #[test]
    fn test_trailing_lines_venue() {
        let html = r#"
            <div class="repertoire-once">
              <a href="/film/1">Anora</a><a href="/film/1">Anora again</a>
              <div class="date">
                czwartek
                17 paź
                18:30
              </div>
              <a class="button" href="rezerwacja/99">Kup bilet</a>
            </div>
            <div class="repertoire-once">
              <a href="/film/2">Yesterday's film</a>
              <div class="date">15 paź
              10:00</div>
            </div>"#;

        let page = parse(Venue::Kika, html);

        assert_eq!(page.showings.len(), 1);
        let (title, showing) = &page.showings[0];
        assert_eq!(title, "Anora");
        assert_eq!(hm(showing), (17, 18, 30));
        assert_eq!(
            showing.url.as_deref(),
            Some("https://bilety.kinokika.pl/rezerwacja/99")
        );
    }

    #[test]
    fn test_carried_date_venue() {
        let html = r#"
            <section class="row">
              <div class="repertoire-separator">sobota, 17 października</div>
              <a class="repertoire-item-title">Flow</a>
              <p class="repertoire-item-hour">16:00</p>
            </section>
            <section class="row">
              <a class="repertoire-item-title">Konklawe</a>
              <p class="repertoire-item-hour">20:15</p>
              <a class="repertoire-item-button" href="/bilety/7">Bilety</a>
            </section>"#;

        let page = parse(Venue::Mikro, html);

        assert_eq!(page.showings.len(), 2);
        assert_eq!(hm(&page.showings[1].1), (17, 20, 15));
        assert_eq!(
            page.showings[1].1.url.as_deref(),
            Some("https://kinomikro.pl/bilety/7")
        );
    }

    #[test]
    fn test_attribute_date_venue() {
        let html = r#"
            <div class="list-item__content__row" data-date="2026-10-18">
              <a class="item-title">Dzikie róże</a>
              <div class="item-time">19:00</div>
              <a class="btn" href="https://bilety.example.com/x/1">Kup</a>
            </div>"#;

        let page = parse(Venue::Paradox, html);

        assert_eq!(page.showings.len(), 1);
        assert_eq!(hm(&page.showings[0].1), (18, 19, 0));
        assert_eq!(
            page.showings[0].1.url.as_deref(),
            Some("https://bilety.example.com/x/1")
        );
    }

    #[test]
    fn test_handler_argument_venue_skips_rows_without_handler() {
        let html = r#"
            <ul>
              <li title="Flow">
                <a href="film.php?id=1">
                  Flow
                </a>
                <span><a href="kup.php?s=5" onclick="book(5,'Flow','2026-10-19',1,2,3,4)">17:45</a></span>
              </li>
              <li title="Anora">
                <a href="film.php?id=2">Anora</a>
                <span><a>20:00</a></span>
              </li>
            </ul>"#;

        let page = parse(Venue::PodBaranami, html);

        assert_eq!(page.showings.len(), 1);
        assert_eq!(page.showings[0].0, "Flow");
        assert_eq!(hm(&page.showings[0].1), (19, 17, 45));
        assert_eq!(
            page.showings[0].1.url.as_deref(),
            Some("https://www.kinopodbaranami.pl/kup.php?s=5")
        );
    }

    #[test]
    fn test_spans_venue_collects_next_pages() {
        let html = r#"
            <span class="zajawka">
              <a href="wydarzenie-1.html"><span class="title">Nosferatu</span></a>
              <span class="kali_data_od"><span>20.10.2026</span><span>|</span><span>18:00</span></span>
            </span>
            <a href="wydarzenia-szukaj-strona-2.html" title="Strona 2">2</a>
            <a href="/inne.html" title="Inne">x</a>"#;

        let page = parse(Venue::Sfinks, html);

        assert_eq!(page.showings.len(), 1);
        assert_eq!(hm(&page.showings[0].1), (20, 18, 0));
        assert_eq!(
            page.links,
            vec![Url::parse("https://kinosfinks.okn.edu.pl/wydarzenia-szukaj-strona-2.html").unwrap()]
        );
    }

    #[test]
    fn test_unresolvable_dates_are_dropped() {
        let html = r#"
            <div class="cd-timeline-block">
              <h2>Flow</h2>
              <span class="cd-date">wkrótce</span>
            </div>
            <div class="cd-timeline-block">
              <h2>   </h2>
              <span class="cd-date">20 paź 18:00</span>
            </div>"#;

        assert!(parse(Venue::Kijow, html).showings.is_empty());
    }

    #[test]
    fn test_start_url_joins_origin_and_path() {
        let adapter = HtmlAdapter::new(
            html_rules(Venue::Mikro).unwrap(),
            Client::new(),
            Url::parse("http://127.0.0.1:8080").unwrap(),
            2,
        )
        .unwrap();

        assert_eq!(
            adapter.start_url().unwrap().as_str(),
            "http://127.0.0.1:8080/repertoire/?view=all"
        );
    }
}
